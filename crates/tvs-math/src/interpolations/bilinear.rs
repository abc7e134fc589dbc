//! Bilinear 2D interpolation on a rectangular grid with flat
//! extrapolation.

use super::locate;
use tvs_core::{errors::Result, Real};

/// 2D interpolation trait.
pub trait Interpolation2D: std::fmt::Debug + Send + Sync {
    /// Evaluate the surface at `(x, y)`.
    fn value(&self, x: Real, y: Real) -> Real;
    /// Lower bound of the x domain.
    fn x_min(&self) -> Real;
    /// Upper bound of the x domain.
    fn x_max(&self) -> Real;
    /// Lower bound of the y domain.
    fn y_min(&self) -> Real;
    /// Upper bound of the y domain.
    fn y_max(&self) -> Real;
}

/// Bilinear interpolation on a rectangular grid.
///
/// Points outside the grid are first clamped onto it, so the surface is
/// extended flat in both directions.
#[derive(Debug, Clone)]
pub struct BilinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
    /// z values stored in row-major order: z[j * nx + i] = f(xs[i], ys[j])
    z: Vec<Real>,
    nx: usize,
}

impl BilinearInterpolation {
    /// Build a bilinear interpolation on the grid `(xs × ys → z)`.
    ///
    /// `z` is row-major: `z[j * nx + i]` = f(xs\[i\], ys\[j\]).
    /// A single node along an axis makes the surface constant along it.
    pub fn new(xs: &[Real], ys: &[Real], z: &[Real]) -> Result<Self> {
        let nx = xs.len();
        let ny = ys.len();
        tvs_core::ensure!(nx >= 1 && ny >= 1, "grid axes must not be empty");
        tvs_core::ensure!(
            z.len() == nx * ny,
            "z length ({}) must equal nx*ny ({}*{}={})",
            z.len(),
            nx,
            ny,
            nx * ny
        );
        tvs_core::ensure!(
            xs.windows(2).all(|w| w[0] < w[1]) && ys.windows(2).all(|w| w[0] < w[1]),
            "grid axes must be strictly increasing"
        );
        tvs_core::ensure!(
            z.iter().all(|v| v.is_finite()),
            "grid values must be finite"
        );
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            z: z.to_vec(),
            nx,
        })
    }

    fn z_at(&self, i: usize, j: usize) -> Real {
        self.z[j * self.nx + i]
    }
}

/// Segment index and weight of the upper node along one axis.
fn axis_weight(vs: &[Real], v: Real) -> (usize, usize, Real) {
    if vs.len() == 1 {
        return (0, 0, 0.0);
    }
    let v = v.clamp(vs[0], vs[vs.len() - 1]);
    let k = locate(vs, v);
    (k, k + 1, (v - vs[k]) / (vs[k + 1] - vs[k]))
}

impl Interpolation2D for BilinearInterpolation {
    fn value(&self, x: Real, y: Real) -> Real {
        let (i0, i1, t) = axis_weight(&self.xs, x);
        let (j0, j1, u) = axis_weight(&self.ys, y);

        (1.0 - t) * (1.0 - u) * self.z_at(i0, j0)
            + t * (1.0 - u) * self.z_at(i1, j0)
            + (1.0 - t) * u * self.z_at(i0, j1)
            + t * u * self.z_at(i1, j1)
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn y_min(&self) -> Real {
        self.ys[0]
    }

    fn y_max(&self) -> Real {
        self.ys[self.ys.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bilinear_exact_on_grid() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0];
        let z = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let interp = BilinearInterpolation::new(&xs, &ys, &z).unwrap();
        for (j, &y) in ys.iter().enumerate() {
            for (i, &x) in xs.iter().enumerate() {
                assert_abs_diff_eq!(interp.value(x, y), z[j * 3 + i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn bilinear_reproduces_plane() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 2.0];
        let z: Vec<Real> = ys
            .iter()
            .flat_map(|&y| xs.iter().map(move |&x| x + 2.0 * y))
            .collect();
        let interp = BilinearInterpolation::new(&xs, &ys, &z).unwrap();
        assert_abs_diff_eq!(interp.value(0.5, 1.5), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn bilinear_flat_extrapolation() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let z = [0.0, 1.0, 2.0, 3.0];
        let interp = BilinearInterpolation::new(&xs, &ys, &z).unwrap();
        assert_abs_diff_eq!(interp.value(-5.0, -5.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.value(5.0, 5.0), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.value(5.0, 0.5), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn bilinear_single_row() {
        let interp = BilinearInterpolation::new(&[0.0, 2.0], &[1.0], &[0.1, 0.3]).unwrap();
        assert_abs_diff_eq!(interp.value(1.0, 42.0), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn bilinear_rejects_bad_grid() {
        assert!(BilinearInterpolation::new(&[0.0, 1.0], &[0.0], &[1.0]).is_err());
        assert!(BilinearInterpolation::new(&[1.0, 0.0], &[0.0], &[1.0, 2.0]).is_err());
    }
}

//! 1D interpolation trait and implementations.
//!
//! Market curves are built from a handful of pillars; these schemes turn
//! the pillars into functions of time. Every scheme is total: outside the
//! pillar range linear schemes extend their edge segment and the flat
//! scheme holds its edge value.

mod bilinear;

pub use bilinear::{BilinearInterpolation, Interpolation2D};

use tvs_core::{errors::Result, Real};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
pub trait Interpolation1D: std::fmt::Debug + Send + Sync {
    /// Evaluate the interpolation at `x`.
    fn value(&self, x: Real) -> Real;

    /// Lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

/// Check that nodes are finite and strictly increasing.
fn check_nodes(xs: &[Real], ys: &[Real]) -> Result<()> {
    tvs_core::ensure!(
        xs.len() == ys.len(),
        "xs and ys must have the same length ({} vs {})",
        xs.len(),
        ys.len()
    );
    tvs_core::ensure!(
        xs.iter().chain(ys.iter()).all(|v| v.is_finite()),
        "interpolation nodes must be finite"
    );
    tvs_core::ensure!(
        xs.windows(2).all(|w| w[0] < w[1]),
        "xs must be strictly increasing"
    );
    Ok(())
}

/// Index `i` of the segment `[xs[i], xs[i+1])` containing `x`, clamped to
/// the first / last segment.
pub(crate) fn locate(xs: &[Real], x: Real) -> usize {
    let n = xs.len();
    if n < 2 || x <= xs[0] {
        return 0;
    }
    if x >= xs[n - 1] {
        return n - 2;
    }
    // first index with xs[i] > x, minus one
    xs.partition_point(|&v| v <= x) - 1
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation, extrapolating the edge segments.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from sorted `xs` and corresponding `ys`.
    ///
    /// # Errors
    /// Mismatched lengths, fewer than 2 points, or unsorted `xs`.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        tvs_core::ensure!(xs.len() >= 2, "need at least 2 points for interpolation");
        check_nodes(xs, ys)?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Slope of the segment containing `x`.
    pub fn derivative(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        (self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i])
    }
}

impl Interpolation1D for LinearInterpolation {
    fn value(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        self.ys[i] + (x - self.xs[i]) * (self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i])
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

// ── Log-linear ────────────────────────────────────────────────────────────────

/// Log-linear interpolation.
///
/// Interpolates `log(y)` linearly and exponentiates the result. Applied to
/// discount factors this gives piecewise-constant instantaneous forward
/// rates.
#[derive(Debug, Clone)]
pub struct LogLinearInterpolation {
    inner: LinearInterpolation,
}

impl LogLinearInterpolation {
    /// Construct a log-linear interpolation.
    ///
    /// All `ys` values must be strictly positive.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        tvs_core::ensure!(
            ys.iter().all(|&y| y > 0.0),
            "all y values must be positive for log-linear interpolation"
        );
        let log_ys: Vec<Real> = ys.iter().map(|&y| y.ln()).collect();
        Ok(Self {
            inner: LinearInterpolation::new(xs, &log_ys)?,
        })
    }

    /// Derivative of `log(f)` at `x`.
    pub fn log_derivative(&self, x: Real) -> Real {
        self.inner.derivative(x)
    }
}

impl Interpolation1D for LogLinearInterpolation {
    fn value(&self, x: Real) -> Real {
        self.inner.value(x).exp()
    }

    fn x_min(&self) -> Real {
        self.inner.x_min()
    }

    fn x_max(&self) -> Real {
        self.inner.x_max()
    }
}

// ── Flat (step function) ─────────────────────────────────────────────────────

/// Right-continuous step function: `f(x) = y[i]` for `x[i] <= x < x[i+1]`,
/// `y[0]` left of the first node and `y[n-1]` from the last node on.
#[derive(Debug, Clone)]
pub struct FlatInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
    /// `areas[i]` = ∫_{x[0]}^{x[i]} f
    areas: Vec<Real>,
}

impl FlatInterpolation {
    /// Construct a flat interpolation.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        tvs_core::ensure!(!xs.is_empty(), "need at least 1 point");
        check_nodes(xs, ys)?;
        let mut areas = Vec::with_capacity(xs.len());
        areas.push(0.0);
        for i in 1..xs.len() {
            areas.push(areas[i - 1] + ys[i - 1] * (xs[i] - xs[i - 1]));
        }
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            areas,
        })
    }

    /// The nodes at which the function may jump.
    pub fn nodes(&self) -> &[Real] {
        &self.xs
    }

    /// `∫_{x[0]}^{x} f` (negative for `x < x[0]`).
    pub fn primitive(&self, x: Real) -> Real {
        if x <= self.xs[0] {
            return self.ys[0] * (x - self.xs[0]);
        }
        let i = self.xs.partition_point(|&v| v <= x) - 1;
        self.areas[i] + self.ys[i] * (x - self.xs[i])
    }
}

impl Interpolation1D for FlatInterpolation {
    fn value(&self, x: Real) -> Real {
        if x < self.xs[0] {
            return self.ys[0];
        }
        self.ys[self.xs.partition_point(|&v| v <= x) - 1]
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_interpolation() {
        let interp = LinearInterpolation::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert_abs_diff_eq!(interp.value(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.value(1.5), 2.5, epsilon = 1e-12);
        // edge segment extended
        assert_abs_diff_eq!(interp.value(3.0), 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.derivative(1.2), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_rejects_unsorted() {
        assert!(LinearInterpolation::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(LinearInterpolation::new(&[0.0], &[0.0]).is_err());
        assert!(LinearInterpolation::new(&[0.0, 1.0], &[0.0]).is_err());
    }

    #[test]
    fn log_linear_interpolation() {
        let ys = [1.0, std::f64::consts::E];
        let interp = LogLinearInterpolation::new(&[0.0, 1.0], &ys).unwrap();
        assert_abs_diff_eq!(interp.value(0.5), std::f64::consts::E.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(interp.log_derivative(0.3), 1.0, epsilon = 1e-12);
        assert!(LogLinearInterpolation::new(&[0.0, 1.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn flat_interpolation_is_right_continuous() {
        let interp = FlatInterpolation::new(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(interp.value(-1.0), 1.0);
        assert_eq!(interp.value(0.5), 1.0);
        assert_eq!(interp.value(1.0), 2.0);
        assert_eq!(interp.value(1.5), 2.0);
        assert_eq!(interp.value(2.0), 3.0);
        assert_eq!(interp.value(10.0), 3.0);
    }

    #[test]
    fn flat_primitive() {
        let interp = FlatInterpolation::new(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(interp.primitive(0.0), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(interp.primitive(0.5), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(interp.primitive(1.5), 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(interp.primitive(3.0), 1.0 + 2.0 + 3.0, epsilon = 1e-15);
        assert_abs_diff_eq!(interp.primitive(-1.0), -1.0, epsilon = 1e-15);
    }

    #[test]
    fn locate_clamps() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(locate(&xs, -5.0), 0);
        assert_eq!(locate(&xs, 0.0), 0);
        assert_eq!(locate(&xs, 1.0), 1);
        assert_eq!(locate(&xs, 2.5), 2);
        assert_eq!(locate(&xs, 3.0), 2);
        assert_eq!(locate(&xs, 9.0), 2);
    }
}

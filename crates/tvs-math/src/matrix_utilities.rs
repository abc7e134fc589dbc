//! Cholesky factorisation and correlation structures.
//!
//! The correlation of the basket is factorised once; every path and every
//! Euler step reuses the lower-triangular factor both to correlate normal
//! draws and to build the diffusion matrix `diag(σ)·L`.

use crate::{Array, Matrix};
use tvs_core::{
    errors::{Error, Result},
    Real,
};

/// Cholesky decomposition of a symmetric positive-definite matrix.
///
/// Returns the lower-triangular factor `L` such that `A = L * Lᵀ`.
pub fn cholesky_decomposition(m: &Matrix) -> Result<Matrix> {
    if m.nrows() != m.ncols() {
        return Err(Error::InvalidArgument("matrix must be square".into()));
    }
    match m.clone().cholesky() {
        Some(chol) => Ok(chol.l()),
        None => Err(Error::InvalidArgument(
            "Cholesky decomposition failed: matrix is not positive-definite".into(),
        )),
    }
}

/// A validated correlation matrix together with its Cholesky factor.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationStructure {
    correlation: Matrix,
    factor: Matrix,
}

impl CorrelationStructure {
    /// Validate `correlation` (square, symmetric, unit diagonal, entries in
    /// `[-1, 1]`, positive-definite) and factorise it.
    pub fn new(correlation: Matrix) -> Result<Self> {
        let n = correlation.nrows();
        tvs_core::ensure!(n > 0, "correlation matrix must not be empty");
        tvs_core::ensure!(
            correlation.ncols() == n,
            "correlation matrix must be square, got {}x{}",
            n,
            correlation.ncols()
        );
        for i in 0..n {
            tvs_core::ensure!(
                (correlation[(i, i)] - 1.0).abs() < 1e-12,
                "diagonal element {i} must be 1, got {}",
                correlation[(i, i)]
            );
            for j in 0..i {
                let rho = correlation[(i, j)];
                tvs_core::ensure!(
                    (rho - correlation[(j, i)]).abs() < 1e-12,
                    "correlation matrix is not symmetric at ({i}, {j})"
                );
                tvs_core::ensure!(
                    (-1.0..=1.0).contains(&rho),
                    "correlation ({i}, {j}) = {rho} outside [-1, 1]"
                );
            }
        }
        let factor = cholesky_decomposition(&correlation)?;
        Ok(Self {
            correlation,
            factor,
        })
    }

    /// Uncorrelated assets.
    pub fn identity(n: usize) -> Self {
        Self {
            correlation: Matrix::identity(n, n),
            factor: Matrix::identity(n, n),
        }
    }

    /// Build from a row-major slice.
    pub fn from_row_slice(n: usize, data: &[Real]) -> Result<Self> {
        tvs_core::ensure!(
            data.len() == n * n,
            "expected {} correlation entries, got {}",
            n * n,
            data.len()
        );
        Self::new(Matrix::from_row_slice(n, n, data))
    }

    /// Number of assets.
    pub fn dimension(&self) -> usize {
        self.correlation.nrows()
    }

    /// The correlation matrix.
    pub fn correlation(&self) -> &Matrix {
        &self.correlation
    }

    /// The lower-triangular Cholesky factor `L`.
    pub fn factor(&self) -> &Matrix {
        &self.factor
    }

    /// Turn independent standard normals into correlated ones: `L·z`.
    pub fn correlate(&self, z: &Array) -> Array {
        &self.factor * z
    }

    /// Diffusion matrix `diag(vols) · L`.
    pub fn diffusion(&self, vols: &[Real]) -> Matrix {
        diag_times(vols, &self.factor)
    }
}

/// `diag(d) · m`, i.e. row `i` of `m` scaled by `d[i]`.
pub fn diag_times(d: &[Real], m: &Matrix) -> Matrix {
    let mut out = m.clone();
    for (i, &di) in d.iter().enumerate() {
        out.row_mut(i).scale_mut(di);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn cholesky_2x2() {
        let m = Matrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 10.0]);
        let l = cholesky_decomposition(&m).unwrap();
        let reconstructed = &l * l.transpose();
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(reconstructed[(i, j)], m[(i, j)], epsilon = 1e-12);
            }
        }
        assert_eq!(l[(0, 1)], 0.0);
    }

    #[test]
    fn cholesky_not_positive_definite() {
        let m = Matrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, 1.0]);
        assert!(cholesky_decomposition(&m).is_err());
    }

    #[test]
    fn correlation_validation() {
        assert!(CorrelationStructure::from_row_slice(2, &[1.0, 0.5, 0.4, 1.0]).is_err());
        assert!(CorrelationStructure::from_row_slice(2, &[2.0, 0.0, 0.0, 1.0]).is_err());
        assert!(CorrelationStructure::from_row_slice(2, &[1.0, 1.5, 1.5, 1.0]).is_err());
        assert!(CorrelationStructure::from_row_slice(2, &[1.0, 0.0, 0.0]).is_err());
        // singular: perfectly correlated
        assert!(CorrelationStructure::from_row_slice(2, &[1.0, 1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn diffusion_scales_rows() {
        let c = CorrelationStructure::from_row_slice(2, &[1.0, 0.6, 0.6, 1.0]).unwrap();
        let nu = c.diffusion(&[0.2, 0.3]);
        let cov = &nu * nu.transpose();
        assert_abs_diff_eq!(cov[(0, 0)], 0.04, epsilon = 1e-14);
        assert_abs_diff_eq!(cov[(1, 1)], 0.09, epsilon = 1e-14);
        assert_abs_diff_eq!(cov[(0, 1)], 0.2 * 0.3 * 0.6, epsilon = 1e-14);
    }

    #[test]
    fn identity_correlation_passes_normals_through() {
        let c = CorrelationStructure::identity(3);
        let z = Array::from_vec(vec![0.1, -0.2, 0.3]);
        assert_eq!(c.correlate(&z), z);
    }

    proptest! {
        #[test]
        fn factor_reconstructs_correlation(
            a in -0.95f64..0.95,
            b in -0.95f64..0.95,
            c in -0.95f64..0.95,
        ) {
            // Build a valid correlation from a random lower-triangular factor.
            let l = Matrix::from_row_slice(3, 3, &[
                1.0, 0.0, 0.0,
                a, (1.0 - a * a).sqrt(), 0.0,
                b, c * (1.0 - b * b).sqrt(), ((1.0 - b * b) * (1.0 - c * c)).sqrt(),
            ]);
            let mut corr = &l * l.transpose();
            for i in 0..3 {
                corr[(i, i)] = 1.0;
            }
            let s = CorrelationStructure::new(corr.clone()).unwrap();
            let rec = s.factor() * s.factor().transpose();
            for i in 0..3 {
                for j in 0..3 {
                    prop_assert!((rec[(i, j)] - corr[(i, j)]).abs() < 1e-10);
                }
            }
        }
    }
}

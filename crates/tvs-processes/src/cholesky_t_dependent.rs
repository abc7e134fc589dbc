//! Time-dependent diffusion matrix `nu(t) = diag(√V(t)) · L`.

use std::sync::Arc;
use tvs_core::{errors::Result, Error, Time};
use tvs_math::{CorrelationStructure, Matrix};
use tvs_termstructures::VarianceCurve;

/// Deterministic diffusion matrix of the basket, from instantaneous
/// variance curves and the correlation Cholesky factor.
#[derive(Debug, Clone)]
pub struct CholeskyTDependent {
    variance_curves: Vec<Arc<dyn VarianceCurve>>,
    correlation: CorrelationStructure,
}

impl CholeskyTDependent {
    /// Create the builder. The number of curves must match the correlation
    /// dimension.
    pub fn new(
        variance_curves: Vec<Arc<dyn VarianceCurve>>,
        correlation: CorrelationStructure,
    ) -> Result<Self> {
        if variance_curves.is_empty() || variance_curves.len() != correlation.dimension() {
            return Err(Error::InvalidArgument(format!(
                "{} variance curves for a {}-asset correlation",
                variance_curves.len(),
                correlation.dimension()
            )));
        }
        Ok(Self {
            variance_curves,
            correlation,
        })
    }

    /// Number of assets.
    pub fn size(&self) -> usize {
        self.variance_curves.len()
    }

    /// The correlation structure.
    pub fn correlation(&self) -> &CorrelationStructure {
        &self.correlation
    }

    /// The variance curves, one per asset.
    pub fn variance_curves(&self) -> &[Arc<dyn VarianceCurve>] {
        &self.variance_curves
    }

    /// Diffusion matrix at `t`.
    pub fn at(&self, t: Time) -> Matrix {
        let vols: Vec<_> = self
            .variance_curves
            .iter()
            .map(|v| v.variance(t).max(0.0).sqrt())
            .collect();
        self.correlation.diffusion(&vols)
    }

    /// Diffusion matrices at each of `times`.
    pub fn evaluate(&self, times: &[Time]) -> Vec<Matrix> {
        times.iter().map(|&t| self.at(t)).collect()
    }
}

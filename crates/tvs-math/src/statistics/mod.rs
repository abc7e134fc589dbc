//! Monte Carlo statistics.
//!
//! [`Statistics`] is a streaming accumulator for one scalar observable; the
//! batch engine feeds it each terminal index value as its path completes. The
//! [`data_blocking()`] estimator works on the full matrix of observations when
//! it is available.

mod data_blocking;

pub use data_blocking::{
    data_blocking, data_blocking_1d, mean_and_error, mean_and_error_1d, BlockRemainder,
    DataBlocking,
};

use tvs_core::Real;

/// Incremental statistics accumulator.
///
/// Accumulates weighted samples and computes mean, variance, standard
/// deviation, min, max, and count.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    count: usize,
    sum_w: Real,
    sum_wx: Real,
    sum_wx2: Real,
    min: Real,
    max: Real,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// Create a new empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
            min: Real::INFINITY,
            max: Real::NEG_INFINITY,
        }
    }

    /// Add a single sample with weight 1.
    pub fn add(&mut self, x: Real) {
        self.add_weighted(x, 1.0);
    }

    /// Add a weighted sample.
    pub fn add_weighted(&mut self, x: Real, weight: Real) {
        self.count += 1;
        self.sum_w += weight;
        self.sum_wx += weight * x;
        self.sum_wx2 += weight * x * x;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Number of samples.
    pub fn samples(&self) -> usize {
        self.count
    }

    /// Weighted mean. `None` if no samples have been added.
    pub fn mean(&self) -> Option<Real> {
        (self.sum_w != 0.0).then(|| self.sum_wx / self.sum_w)
    }

    /// Population variance `⟨x²⟩ − ⟨x⟩²`. `None` if no samples have been
    /// added.
    pub fn population_variance(&self) -> Option<Real> {
        let m = self.mean()?;
        Some((self.sum_wx2 / self.sum_w - m * m).max(0.0))
    }

    /// Bessel-corrected variance. `None` for fewer than 2 samples.
    pub fn variance(&self) -> Option<Real> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as Real;
        self.population_variance().map(|v| v * n / (n - 1.0))
    }

    /// Standard deviation. `None` for fewer than 2 samples.
    pub fn std_dev(&self) -> Option<Real> {
        self.variance().map(Real::sqrt)
    }

    /// Standard error of the mean, population std / √n.
    pub fn error_estimate(&self) -> Option<Real> {
        let v = self.population_variance()?;
        Some((v / self.count as Real).sqrt())
    }

    /// Minimum sample value.
    pub fn minimum(&self) -> Option<Real> {
        (self.count > 0).then_some(self.min)
    }

    /// Maximum sample value.
    pub fn maximum(&self) -> Option<Real> {
        (self.count > 0).then_some(self.max)
    }

    /// Reset the accumulator to its initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

//! Static ("Black") baseline strategies.
//!
//! A [`Strategy`] holds one weight vector per rebalancing date, fixed before
//! simulation from the deterministic drift and diffusion. Between dates the
//! weights are constant.

use crate::optimizer::StrategyOptimizer;
use tracing::debug;
use tvs_core::{errors::Result, Error, Time};
use tvs_math::Array;
use tvs_processes::{CholeskyTDependent, Drift};

/// Piecewise-constant weights over the rebalancing dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    dates: Vec<Time>,
    weights: Vec<Array>,
}

impl Strategy {
    /// Build from explicit weights, one vector per date.
    pub fn from_weights(dates: &[Time], weights: Vec<Array>) -> Result<Self> {
        if dates.is_empty() || dates.len() != weights.len() {
            return Err(Error::InvalidArgument(format!(
                "{} rebalancing dates but {} weight vectors",
                dates.len(),
                weights.len()
            )));
        }
        if !dates.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::InvalidArgument(
                "rebalancing dates must be strictly increasing".into(),
            ));
        }
        let n = weights[0].len();
        if n == 0 || weights.iter().any(|w| w.len() != n) {
            return Err(Error::InvalidArgument(
                "weight vectors must be non-empty and of equal length".into(),
            ));
        }
        Ok(Self {
            dates: dates.to_vec(),
            weights,
        })
    }

    /// The same weights at every date.
    pub fn constant(dates: &[Time], weights: Array) -> Result<Self> {
        Self::from_weights(dates, vec![weights; dates.len()])
    }

    /// Markowitz weights at each date from the deterministic drift and
    /// diffusion.
    pub fn closed_form(
        dates: &[Time],
        drift: &Drift,
        nu: &CholeskyTDependent,
        optimizer: &StrategyOptimizer,
    ) -> Result<Self> {
        check_sizes(drift, nu)?;
        let weights = dates
            .iter()
            .map(|&t| optimizer.closed_form(&drift.at(t), &nu.at(t)))
            .collect::<Result<Vec<_>>>()?;
        debug!(dates = dates.len(), "closed-form baseline strategy built");
        Self::from_weights(dates, weights)
    }

    /// Numerically optimised weights at each date, each search seeded with
    /// the previous date's weights.
    pub fn optimized(
        dates: &[Time],
        drift: &Drift,
        nu: &CholeskyTDependent,
        optimizer: &StrategyOptimizer,
    ) -> Result<Self> {
        check_sizes(drift, nu)?;
        let mut weights: Vec<Array> = Vec::with_capacity(dates.len());
        for &t in dates {
            let w = optimizer.optimize(&drift.at(t), &nu.at(t), weights.last())?;
            weights.push(w);
        }
        debug!(dates = dates.len(), trials = optimizer.n_trials(), "optimised baseline strategy built");
        Self::from_weights(dates, weights)
    }

    /// Weights in force at `t`: those of the last date `≤ t`, or of the
    /// first date before it.
    pub fn weights_at(&self, t: Time) -> &Array {
        let i = self.dates.partition_point(|&d| d <= t);
        &self.weights[i.saturating_sub(1)]
    }

    /// Rebalancing dates.
    pub fn dates(&self) -> &[Time] {
        &self.dates
    }

    /// Weight vectors, one per date.
    pub fn weights(&self) -> &[Array] {
        &self.weights
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.weights[0].len()
    }
}

fn check_sizes(drift: &Drift, nu: &CholeskyTDependent) -> Result<()> {
    if drift.size() != nu.size() {
        return Err(Error::InvalidArgument(format!(
            "drift has {} assets but diffusion has {}",
            drift.size(),
            nu.size()
        )));
    }
    Ok(())
}

//! Run configuration.
//!
//! A [`TvsConfig`] is the serde view of one pricing run: contract terms,
//! grid, constraint, Monte Carlo sizes and the worker identity. Loaded from
//! JSON and validated before anything is simulated.

use crate::optimizer::ConstraintMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tvs_core::{errors::Result, Error, Real, Time, Volatility};
use tvs_methods::TimeGrid;

/// How the rebalancing dates are laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Calendar month ends.
    Monthly,
    /// Every day.
    Daily,
    /// Explicit positive dates in years.
    Dates(Vec<Time>),
}

/// Which weights drive the index between rebalancing dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalancingPolicy {
    /// The static baseline strategy.
    #[default]
    Baseline,
    /// Re-optimised on every path at each rebalancing date from the
    /// simulated local volatilities.
    Dynamic,
}

/// What the engine does when a per-step optimisation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep going with the baseline weights.
    #[default]
    Fallback,
    /// Stop the batch with the error.
    Abort,
}

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TvsConfig {
    /// Target volatility of the index.
    pub target_volatility: Volatility,
    /// Initial index value `I_0`.
    pub initial_index: Real,
    /// Strike of the call on the index.
    pub strike: Real,
    /// Maturity in years.
    pub maturity: Time,
    /// Rebalancing frequency.
    pub frequency: Frequency,
    /// Euler steps per rebalancing interval.
    pub fine_steps: usize,
    /// Feasible set of the weights.
    pub constraint: ConstraintMode,
    /// Paths simulated by this worker.
    pub n_paths: usize,
    /// Rank of this worker.
    pub worker_rank: u64,
    /// Offset added to the rank to form the seed.
    pub run_offset: u64,
    /// Restarts of the strategy optimiser.
    pub optimizer_trials: usize,
    /// Baseline or per-path re-optimised weights.
    pub rebalancing: RebalancingPolicy,
    /// Reaction to optimisation failures.
    pub failure_policy: FailurePolicy,
    /// Blocks of the data-blocking estimator.
    pub n_blocks: usize,
    /// Bound on each raw action of the environment in long/short mode.
    pub action_bound: Real,
    /// When set, terminal values are appended to
    /// `<prefix>_rank<worker_rank>.txt`.
    pub output_prefix: Option<String>,
}

impl Default for TvsConfig {
    fn default() -> Self {
        Self {
            target_volatility: 0.05,
            initial_index: 1.0,
            strike: 1.0,
            maturity: 1.0,
            frequency: Frequency::Monthly,
            fine_steps: 2,
            constraint: ConstraintMode::OnlyLong,
            n_paths: 1_000,
            worker_rank: 0,
            run_offset: 0,
            optimizer_trials: 10,
            rebalancing: RebalancingPolicy::Baseline,
            failure_policy: FailurePolicy::Fallback,
            n_blocks: 10,
            action_bound: 0.2,
            output_prefix: None,
        }
    }
}

impl TvsConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidArgument(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Serialise to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Runtime(e.to_string()))
    }

    /// Reject configurations that cannot be run.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("target volatility", self.target_volatility),
            ("initial index", self.initial_index),
            ("maturity", self.maturity),
            ("action bound", self.action_bound),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidArgument(format!("{name} must be positive, got {v}")));
            }
        }
        if !(self.strike.is_finite() && self.strike >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "strike must be non-negative, got {}",
                self.strike
            )));
        }
        let counts = [
            ("fine steps", self.fine_steps),
            ("path count", self.n_paths),
            ("optimiser trials", self.optimizer_trials),
            ("block count", self.n_blocks),
        ];
        for (name, n) in counts {
            if n == 0 {
                return Err(Error::InvalidArgument(format!("{name} must be positive")));
            }
        }
        self.time_grid()?;
        self.constraint.validate()
    }

    /// Seed of this worker's random streams: `worker_rank + run_offset`.
    pub fn seed(&self) -> u64 {
        self.worker_rank.wrapping_add(self.run_offset)
    }

    /// The rebalancing grid.
    pub fn time_grid(&self) -> Result<TimeGrid> {
        match &self.frequency {
            Frequency::Monthly => TimeGrid::monthly(self.maturity, self.fine_steps),
            Frequency::Daily => TimeGrid::daily(self.maturity, self.fine_steps),
            Frequency::Dates(dates) => TimeGrid::new(dates, self.fine_steps),
        }
    }

    /// Output file of this worker, if output is enabled.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output_prefix
            .as_deref()
            .map(|p| crate::output::worker_file(p, self.worker_rank as usize))
    }
}

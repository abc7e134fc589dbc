//! # tvs-strategy
//!
//! Target-volatility strategies on a local-volatility basket:
//!
//! * [`StrategyOptimizer`] — weights maximising `w·mu / ‖wᵀ nu‖` under an
//!   only-long or long/short [`ConstraintMode`]
//! * [`Strategy`] — static baseline weights per rebalancing date
//! * [`IndexAccumulator`] — the volatility-targeted index along one path
//! * [`TvsEngine`] — Monte Carlo batches and call prices
//! * [`TvsForwardCurve`] — closed-form reference for static strategies
//! * [`TvsEnvironment`] — episodic interface for learning agents

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Index accumulation.
pub mod accumulator;

/// Closed-form forward and call price of the index.
pub mod closed_form;

/// Run configuration.
pub mod config;

/// Monte Carlo engine.
pub mod engine;

/// Reinforcement-learning environment.
pub mod environment;

/// Weight optimisation.
pub mod optimizer;

/// Per-worker output files.
pub mod output;

/// Baseline strategies.
pub mod strategy;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use accumulator::{call_payoff, exposure, IndexAccumulator};
pub use closed_form::{black_call, TvsForwardCurve};
pub use config::{FailurePolicy, Frequency, RebalancingPolicy, TvsConfig};
pub use engine::{BatchReport, EngineSettings, PathOutcome, Restart, TvsEngine};
pub use environment::{EnvPhase, Environment, Transition, TvsEnvironment};
pub use optimizer::{
    objective, only_long_normalization, portfolio_volatility, sign_renormalization,
    ConstraintMode, StrategyOptimizer,
};
pub use output::{read_terminal_values, worker_file, TerminalValueWriter};
pub use strategy::Strategy;

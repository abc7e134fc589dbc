//! # tvs-methods
//!
//! Monte Carlo machinery for the local-volatility basket:
//!
//! * [`TimeGrid`] — rebalancing dates with a fixed number of Euler
//!   sub-steps per interval
//! * [`PathGenerator`] — simulates one [`SimulatedPath`] at a time
//! * [`PathStream`] — forward-only iterator over a batch of paths

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Observation dates and the Euler fine grid.
pub mod time_grid;

/// Path generation.
pub mod monte_carlo;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use monte_carlo::{PathGenerator, PathStream, SimulatedPath};
pub use time_grid::TimeGrid;

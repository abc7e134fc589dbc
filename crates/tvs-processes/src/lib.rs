//! # tvs-processes
//!
//! Stochastic processes driving the basket: the deterministic drift and
//! diffusion builders used by the strategy optimiser, and the multi-asset
//! local-volatility model advanced by the path generator.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cholesky_t_dependent;
pub mod drift;
pub mod local_volatility_model;
pub mod stochastic_process;

pub use cholesky_t_dependent::CholeskyTDependent;
pub use drift::Drift;
pub use local_volatility_model::{simple_return, LocalVolatilityModel};
pub use stochastic_process::StochasticProcess;

//! # tvs
//!
//! Monte Carlo pricing and strategy optimisation for target-volatility
//! strategy (TVS) notes on an equity basket under local volatility.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on this crate rather than the individual
//! `tvs-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tvs::math::{CorrelationStructure, InverseCumulativeNormalRng};
//! use tvs::processes::LocalVolatilityModel;
//! use tvs::strategy::{TvsConfig, TvsEngine};
//! use tvs::termstructures::{
//!     DiscountCurve, EquityForwardCurve, FlatDiscountCurve, ForwardCurve, ForwardVariance,
//!     LocalConstantVol, LocalVolSurface, VarianceCurve,
//! };
//!
//! let d: Arc<dyn DiscountCurve> = Arc::new(FlatDiscountCurve::new(0.01));
//! let forwards: Vec<Arc<dyn ForwardCurve>> = vec![
//!     Arc::new(EquityForwardCurve::new(100.0, d.clone(), &[-0.02], &[1.0]).unwrap()),
//!     Arc::new(EquityForwardCurve::new(50.0, d.clone(), &[-0.01], &[1.0]).unwrap()),
//! ];
//! let local_vols: Vec<Arc<dyn LocalVolSurface>> = vec![
//!     Arc::new(LocalConstantVol::new(0.2).unwrap()),
//!     Arc::new(LocalConstantVol::new(0.3).unwrap()),
//! ];
//! let variances: Vec<Arc<dyn VarianceCurve>> = vec![
//!     Arc::new(ForwardVariance::flat(0.2).unwrap()),
//!     Arc::new(ForwardVariance::flat(0.3).unwrap()),
//! ];
//! let model = LocalVolatilityModel::new(forwards, local_vols, CorrelationStructure::identity(2))
//!     .unwrap();
//!
//! let config = TvsConfig::from_json(r#"{ "maturity": 1.0, "n_paths": 100 }"#).unwrap();
//! let engine = TvsEngine::from_config(&config, Arc::new(model), variances, d).unwrap();
//! let report = engine
//!     .run_batch(InverseCumulativeNormalRng::new(config.seed()), config.n_paths, None, None)
//!     .unwrap();
//! assert_eq!(report.terminal_values.len(), 100);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use tvs_core as core;

/// Mathematical utilities: interpolation, optimisation, RNG, statistics.
pub use tvs_math as math;

/// Discount, forward, variance and local-volatility curves.
pub use tvs_termstructures as termstructures;

/// Drift, diffusion and the local-volatility basket model.
pub use tvs_processes as processes;

/// Time grids and Monte Carlo path generation.
pub use tvs_methods as methods;

/// Strategy optimisation, index accumulation, pricing and the RL
/// environment.
pub use tvs_strategy as strategy;

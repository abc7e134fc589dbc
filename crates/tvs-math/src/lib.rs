//! # tvs-math
//!
//! Mathematical utilities for the TVS engine: vector/matrix aliases over
//! nalgebra, the normal distribution (via statrs), interpolation,
//! piecewise quadrature, Cholesky factorisation, Nelder–Mead optimisation,
//! random number generation and Monte Carlo statistics.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use nalgebra::{DMatrix, DVector};
use tvs_core::Real;

// ── Modules ───────────────────────────────────────────────────────────────────

/// Normal distribution helpers.
pub mod distributions;

/// Piecewise numerical integration.
pub mod integrals;

/// 1D and 2D interpolation schemes.
pub mod interpolations;

/// Cholesky factorisation and correlation handling.
pub mod matrix_utilities;

/// Derivative-free optimisation.
pub mod optimization;

/// Random number generators.
pub mod random_numbers;

/// Statistics accumulators and data blocking.
pub mod statistics;

// ── Linear algebra aliases ───────────────────────────────────────────────────

/// A dynamically-sized vector of reals.
pub type Array = DVector<Real>;

/// A dynamically-sized matrix of reals.
pub type Matrix = DMatrix<Real>;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use distributions::{normal_cdf, normal_cdf_inverse};
pub use integrals::{quad_piecewise, GaussLegendreIntegral, Integrator};
pub use interpolations::{
    BilinearInterpolation, FlatInterpolation, Interpolation1D, Interpolation2D,
    LinearInterpolation, LogLinearInterpolation,
};
pub use matrix_utilities::{cholesky_decomposition, CorrelationStructure};
pub use random_numbers::{InverseCumulativeNormalRng, MersenneTwisterUniformRng, NormalGenerator};
pub use statistics::{
    data_blocking, data_blocking_1d, mean_and_error, mean_and_error_1d, BlockRemainder,
    DataBlocking, Statistics,
};

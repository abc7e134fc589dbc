//! # tvs-termstructures
//!
//! Market curves consumed by the simulation: discount curves, equity
//! forward curves, instantaneous variance curves and local-volatility
//! surfaces. Each concept is a trait object shared as
//! `Arc<dyn Trait>` between paths and workers; the concrete curves here
//! are built from plain pillar data.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `DiscountCurve` — discount factors and short rates.
pub mod discount_curve;

/// `ForwardCurve` — equity forward prices with repo adjustment.
pub mod forward_curve;

/// `VarianceCurve` — instantaneous (forward) variance curves.
pub mod variance_curve;

/// `LocalVolSurface` — local volatility as a function of time and level.
pub mod local_vol;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use discount_curve::{DiscountCurve, FlatDiscountCurve, InterpolatedDiscountCurve};
pub use forward_curve::{EquityForwardCurve, ForwardCurve};
pub use local_vol::{InterpolatedLocalVolSurface, LocalConstantVol, LocalVolSurface};
pub use variance_curve::{integrated_variance, ForwardVariance, VarianceCurve};

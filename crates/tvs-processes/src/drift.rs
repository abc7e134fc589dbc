//! Deterministic drift of the basket.
//!
//! For asset `i` the drift at `t` is `d/dt ln(F_i(t) · D_i(t))`, the carry
//! in excess of the short rate implied by the repo adjustment of the
//! forward curve. It is evaluated by a one-sided forward difference so that
//! at a repo date the rate of the following period is used, matching
//! right-continuous piecewise-constant curves.

use std::sync::Arc;
use tvs_core::{errors::Result, Error, Time};
use tvs_math::Array;
use tvs_termstructures::ForwardCurve;

const BUMP: Time = 1.0e-6;

/// Drift vector `mu(t)` built from the forward curves of the basket.
#[derive(Debug, Clone)]
pub struct Drift {
    forward_curves: Vec<Arc<dyn ForwardCurve>>,
}

impl Drift {
    /// Create the drift of a basket from one forward curve per asset.
    pub fn new(forward_curves: Vec<Arc<dyn ForwardCurve>>) -> Result<Self> {
        if forward_curves.is_empty() {
            return Err(Error::InvalidArgument(
                "drift needs at least one forward curve".into(),
            ));
        }
        Ok(Self { forward_curves })
    }

    /// Number of assets.
    pub fn size(&self) -> usize {
        self.forward_curves.len()
    }

    /// Drift vector at `t`.
    pub fn at(&self, t: Time) -> Array {
        let t = t.max(0.0);
        Array::from_iterator(
            self.forward_curves.len(),
            self.forward_curves.iter().map(|f| {
                let d = f.discounting_curve();
                let now = (f.forward(t) * d.discount(t)).ln();
                let next = (f.forward(t + BUMP) * d.discount(t + BUMP)).ln();
                (next - now) / BUMP
            }),
        )
    }

    /// Drift vectors at each of `times`.
    pub fn evaluate(&self, times: &[Time]) -> Vec<Array> {
        times.iter().map(|&t| self.at(t)).collect()
    }
}

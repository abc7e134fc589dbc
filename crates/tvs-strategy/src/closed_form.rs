//! Closed-form reference prices for a static strategy.
//!
//! With deterministic volatilities the index is lognormal with volatility
//! exactly `σ_target`, and its forward is
//!
//! ```text
//! F_I(T) = I₀ · exp(∫₀ᵀ σ_target · w(t)·mu(t) / ‖w(t)ᵀ nu(t)‖ dt) / D(T)
//! ```
//!
//! so a call on the index has a Black price. The Monte Carlo engine is
//! validated against it.

use crate::{optimizer::objective, strategy::Strategy};
use std::cell::Cell;
use std::sync::Arc;
use tvs_core::{errors::Result, DiscountFactor, Price, Real, Time, Volatility};
use tvs_math::{normal_cdf, quad_piecewise};
use tvs_processes::{CholeskyTDependent, Drift};
use tvs_termstructures::DiscountCurve;

/// Forward curve of the target-volatility index under a static strategy.
#[derive(Debug, Clone)]
pub struct TvsForwardCurve {
    spot: Price,
    target_vol: Volatility,
    strategy: Strategy,
    drift: Drift,
    nu: CholeskyTDependent,
    discounting: Arc<dyn DiscountCurve>,
    breakpoints: Vec<Time>,
}

impl TvsForwardCurve {
    /// Create the curve. Integration splits at the strategy dates and at the
    /// variance-curve breakpoints.
    pub fn new(
        spot: Price,
        target_vol: Volatility,
        strategy: Strategy,
        drift: Drift,
        nu: CholeskyTDependent,
        discounting: Arc<dyn DiscountCurve>,
    ) -> Self {
        let mut breakpoints: Vec<Time> = strategy.dates().to_vec();
        for v in nu.variance_curves() {
            breakpoints.extend_from_slice(v.breakpoints());
        }
        breakpoints.sort_by(|a, b| a.total_cmp(b));
        breakpoints.dedup();
        Self {
            spot,
            target_vol,
            strategy,
            drift,
            nu,
            discounting,
            breakpoints,
        }
    }

    /// Add times at which the drift jumps (e.g. repo dates).
    pub fn with_breakpoints(mut self, extra: &[Time]) -> Self {
        self.breakpoints.extend_from_slice(extra);
        self.breakpoints.sort_by(|a, b| a.total_cmp(b));
        self.breakpoints.dedup();
        self
    }

    /// Instantaneous excess growth `σ_target · f(w(t), mu(t), nu(t))`.
    pub fn excess_growth(&self, t: Time) -> Result<Real> {
        let f = objective(self.strategy.weights_at(t), &self.drift.at(t), &self.nu.at(t))?;
        Ok(self.target_vol * f)
    }

    /// Forward of the index for delivery at `t`.
    pub fn forward(&self, t: Time) -> Result<Price> {
        let failure = Cell::new(None);
        let integral = quad_piecewise(
            |u| match self.excess_growth(u) {
                Ok(g) => g,
                Err(e) => {
                    failure.set(Some(e));
                    0.0
                }
            },
            &self.breakpoints,
            0.0,
            t,
        )?;
        if let Some(e) = failure.take() {
            return Err(e);
        }
        Ok(self.spot * integral.exp() / self.discounting.discount(t))
    }

    /// Black price of a call on the index struck at `strike`, expiring `t`.
    pub fn call_price(&self, strike: Price, t: Time) -> Result<Price> {
        let forward = self.forward(t)?;
        Ok(black_call(forward, strike, self.target_vol, t, self.discounting.discount(t)))
    }
}

/// Black formula for a call: `D · (F N(d₁) − K N(d₂))`.
pub fn black_call(
    forward: Price,
    strike: Price,
    vol: Volatility,
    t: Time,
    discount: DiscountFactor,
) -> Price {
    let std_dev = vol * t.max(0.0).sqrt();
    if std_dev <= 0.0 || strike <= 0.0 {
        return discount * (forward - strike).max(0.0);
    }
    let d1 = ((forward / strike).ln() + 0.5 * std_dev * std_dev) / std_dev;
    let d2 = d1 - std_dev;
    discount * (forward * normal_cdf(d1) - strike * normal_cdf(d2))
}

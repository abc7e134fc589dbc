//! Discount curves.
//!
//! A discount curve provides `D(t)` and the instantaneous short rate
//! `r(t) = −d ln D / dt`. Short rates are right-continuous: at a pillar the
//! rate of the following segment applies, which is what an Euler step
//! starting at that pillar accrues.

use tvs_core::{errors::Result, DiscountFactor, Rate, Real, Time};
use tvs_math::{Interpolation1D, LogLinearInterpolation};

/// A discount curve.
pub trait DiscountCurve: std::fmt::Debug + Send + Sync {
    /// Discount factor `D(t)`, with `D(0) = 1`.
    fn discount(&self, t: Time) -> DiscountFactor;

    /// Instantaneous short rate at `t`.
    ///
    /// Default: one-sided forward difference of `ln D`.
    fn short_rate(&self, t: Time) -> Rate {
        let h = 1.0e-6;
        let t = t.max(0.0);
        (self.discount(t).ln() - self.discount(t + h).ln()) / h
    }

    /// Short rates at each of `times`.
    fn short_rates(&self, times: &[Time]) -> Vec<Rate> {
        times.iter().map(|&t| self.short_rate(t)).collect()
    }
}

// ── Flat ──────────────────────────────────────────────────────────────────────

/// Constant continuously-compounded rate: `D(t) = exp(−r t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatDiscountCurve {
    rate: Rate,
}

impl FlatDiscountCurve {
    /// Create a flat curve at `rate`.
    pub fn new(rate: Rate) -> Self {
        Self { rate }
    }

    /// The constant rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl DiscountCurve for FlatDiscountCurve {
    fn discount(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn short_rate(&self, _t: Time) -> Rate {
        self.rate
    }
}

// ── Interpolated ──────────────────────────────────────────────────────────────

/// A discount curve through `(t_i, D_i)` pillars, log-linear in between.
///
/// Log-linear discounts give piecewise-constant short rates; the first and
/// last segments are extended on either side.
#[derive(Debug, Clone)]
pub struct InterpolatedDiscountCurve {
    times: Vec<Time>,
    discounts: Vec<DiscountFactor>,
    interp: LogLinearInterpolation,
}

impl InterpolatedDiscountCurve {
    /// Build a curve from pillar times and discount factors.
    ///
    /// A pillar at `t = 0` with `D = 1` is prepended when missing.
    pub fn new(times: &[Time], discounts: &[DiscountFactor]) -> Result<Self> {
        tvs_core::ensure!(
            times.len() == discounts.len(),
            "times and discounts must have the same length ({} vs {})",
            times.len(),
            discounts.len()
        );
        tvs_core::ensure!(!times.is_empty(), "need at least one pillar");
        tvs_core::ensure!(
            times.iter().all(|&t| t >= 0.0),
            "pillar times must be non-negative"
        );

        let mut ts: Vec<Real> = Vec::with_capacity(times.len() + 1);
        let mut ds: Vec<Real> = Vec::with_capacity(times.len() + 1);
        if times[0] > 0.0 {
            ts.push(0.0);
            ds.push(1.0);
        } else {
            tvs_core::ensure!(
                (discounts[0] - 1.0).abs() < 1e-12,
                "discount factor at t = 0 must be 1, got {}",
                discounts[0]
            );
        }
        ts.extend_from_slice(times);
        ds.extend_from_slice(discounts);

        let interp = LogLinearInterpolation::new(&ts, &ds)?;
        Ok(Self {
            times: ts,
            discounts: ds,
            interp,
        })
    }

    /// Pillar times, starting at 0.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Pillar discount factors.
    pub fn discounts(&self) -> &[DiscountFactor] {
        &self.discounts
    }
}

impl DiscountCurve for InterpolatedDiscountCurve {
    fn discount(&self, t: Time) -> DiscountFactor {
        if t <= 0.0 {
            return 1.0;
        }
        self.interp.value(t)
    }

    fn short_rate(&self, t: Time) -> Rate {
        -self.interp.log_derivative(t.max(0.0))
    }
}

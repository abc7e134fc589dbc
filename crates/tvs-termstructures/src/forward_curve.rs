//! Equity forward curves.
//!
//! `F(t) = S₀ · exp(−∫₀ᵗ q(u) du) / D(t)` where `q` is a piecewise-constant
//! repo (dividend) rate and `D` the discounting curve of the asset.

use crate::discount_curve::DiscountCurve;
use std::sync::Arc;
use tvs_core::{errors::Result, Price, Rate, Real, Time};
use tvs_math::{FlatInterpolation, Interpolation1D};

/// A forward-price curve for one asset.
pub trait ForwardCurve: std::fmt::Debug + Send + Sync {
    /// Spot price `F(0)`.
    fn spot(&self) -> Price;

    /// Forward price for delivery at `t`.
    fn forward(&self, t: Time) -> Price;

    /// The curve discounting this asset's cash flows.
    fn discounting_curve(&self) -> &Arc<dyn DiscountCurve>;

    /// Forward prices at each of `times`.
    fn forwards(&self, times: &[Time]) -> Vec<Price> {
        times.iter().map(|&t| self.forward(t)).collect()
    }
}

/// Forward curve of an equity with piecewise-constant repo rates.
///
/// `repo_rates[i]` applies on `[repo_dates[i-1], repo_dates[i])` (from 0 for
/// the first rate); the last rate is held beyond the last date.
#[derive(Debug, Clone)]
pub struct EquityForwardCurve {
    spot: Price,
    discounting: Arc<dyn DiscountCurve>,
    repo: FlatInterpolation,
}

impl EquityForwardCurve {
    /// Build the curve from spot, discounting curve and repo schedule.
    pub fn new(
        spot: Price,
        discounting: Arc<dyn DiscountCurve>,
        repo_rates: &[Rate],
        repo_dates: &[Time],
    ) -> Result<Self> {
        tvs_core::ensure!(spot > 0.0, "spot price must be positive, got {spot}");
        tvs_core::ensure!(
            !repo_rates.is_empty() && repo_rates.len() == repo_dates.len(),
            "need one repo date per repo rate ({} rates, {} dates)",
            repo_rates.len(),
            repo_dates.len()
        );
        tvs_core::ensure!(repo_dates[0] > 0.0, "repo dates must be positive");

        let mut nodes: Vec<Real> = Vec::with_capacity(repo_dates.len());
        nodes.push(0.0);
        nodes.extend_from_slice(&repo_dates[..repo_dates.len() - 1]);
        tvs_core::ensure!(
            repo_dates.windows(2).all(|w| w[0] < w[1]),
            "repo dates must be strictly increasing"
        );
        let repo = FlatInterpolation::new(&nodes, repo_rates)?;

        Ok(Self {
            spot,
            discounting,
            repo,
        })
    }

    /// Forward curve with no repo adjustment.
    pub fn without_repo(spot: Price, discounting: Arc<dyn DiscountCurve>) -> Result<Self> {
        Self::new(spot, discounting, &[0.0], &[1.0])
    }

    /// Repo rate in force at `t`.
    pub fn repo_rate(&self, t: Time) -> Rate {
        self.repo.value(t)
    }

    /// Times at which the repo rate may jump.
    pub fn repo_breakpoints(&self) -> &[Time] {
        self.repo.nodes()
    }
}

impl ForwardCurve for EquityForwardCurve {
    fn spot(&self) -> Price {
        self.spot
    }

    fn forward(&self, t: Time) -> Price {
        if t <= 0.0 {
            return self.spot;
        }
        self.spot * (-self.repo.primitive(t)).exp() / self.discounting.discount(t)
    }

    fn discounting_curve(&self) -> &Arc<dyn DiscountCurve> {
        &self.discounting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount_curve::FlatDiscountCurve;
    use approx::assert_abs_diff_eq;

    fn curve() -> EquityForwardCurve {
        EquityForwardCurve::new(
            100.0,
            Arc::new(FlatDiscountCurve::new(0.01)),
            &[0.02, 0.03, 0.04],
            &[0.5, 1.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn forward_accrues_rate_minus_repo() {
        let f = curve();
        assert_eq!(f.forward(0.0), 100.0);
        assert_abs_diff_eq!(f.forward(0.25), 100.0 * (0.25 * (0.01 - 0.02_f64)).exp(), epsilon = 1e-12);
        let repo_int = 0.5 * 0.02 + 0.5 * 0.03 + 0.5 * 0.04;
        assert_abs_diff_eq!(
            f.forward(1.5),
            100.0 * (0.015_f64 - repo_int).exp(),
            epsilon = 1e-12
        );
        // flat beyond the last date
        assert_abs_diff_eq!(f.repo_rate(10.0), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn repo_is_right_continuous() {
        let f = curve();
        assert_eq!(f.repo_rate(0.49), 0.02);
        assert_eq!(f.repo_rate(0.5), 0.03);
        assert_eq!(f.repo_breakpoints(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn invalid_inputs() {
        let d: Arc<dyn DiscountCurve> = Arc::new(FlatDiscountCurve::new(0.0));
        assert!(EquityForwardCurve::new(-1.0, d.clone(), &[0.0], &[1.0]).is_err());
        assert!(EquityForwardCurve::new(1.0, d.clone(), &[0.0, 0.1], &[1.0]).is_err());
        assert!(EquityForwardCurve::new(1.0, d.clone(), &[0.0, 0.1], &[1.0, 0.5]).is_err());
        assert!(EquityForwardCurve::new(1.0, d, &[0.0], &[0.0]).is_err());
    }

    #[test]
    fn no_repo_forward_is_spot_over_discount() {
        let f = EquityForwardCurve::without_repo(50.0, Arc::new(FlatDiscountCurve::new(0.03))).unwrap();
        assert_abs_diff_eq!(f.forward(2.0), 50.0 * (0.06_f64).exp(), epsilon = 1e-12);
        assert_eq!(f.forwards(&[0.0]), vec![50.0]);
    }
}

//! Multi-asset local-volatility model.
//!
//! Each asset follows `dS_i / S_i = (r − q_i) dt + σ_i(t, S_i) dW_i` with
//! `d⟨W_i, W_j⟩ = ρ_ij dt`. The state is the log-moneyness
//! `X_i = ln(S_i / F_i(t))`, which is driftless up to the convexity term:
//!
//! ```text
//! X_i(t+Δt) = X_i(t) − ½ σ_i² Δt + σ_i √Δt (L z)_i
//! S_i(t+Δt) = F_i(t+Δt) · exp(X_i(t+Δt))
//! ```
//!
//! so the simulated forward is matched exactly by construction, whatever
//! the repo schedule.

use crate::stochastic_process::StochasticProcess;
use std::sync::Arc;
use tvs_core::{errors::Result, Error, Price, Real, Time, Volatility};
use tvs_math::{Array, CorrelationStructure, Matrix};
use tvs_termstructures::{ForwardCurve, LocalVolSurface};

/// Correlated local-volatility dynamics of a basket, in log-moneyness.
#[derive(Debug, Clone)]
pub struct LocalVolatilityModel {
    forward_curves: Vec<Arc<dyn ForwardCurve>>,
    local_vols: Vec<Arc<dyn LocalVolSurface>>,
    correlation: CorrelationStructure,
}

impl LocalVolatilityModel {
    /// Build the model from one forward curve and one local-vol surface per
    /// asset, plus the basket correlation.
    ///
    /// # Errors
    /// `Error::InvalidArgument` when the three collaborators disagree on
    /// the number of assets, or the basket is empty.
    pub fn new(
        forward_curves: Vec<Arc<dyn ForwardCurve>>,
        local_vols: Vec<Arc<dyn LocalVolSurface>>,
        correlation: CorrelationStructure,
    ) -> Result<Self> {
        let n = forward_curves.len();
        if n == 0 {
            return Err(Error::InvalidArgument("empty basket".into()));
        }
        if local_vols.len() != n {
            return Err(Error::InvalidArgument(format!(
                "{n} forward curves but {} local volatility surfaces",
                local_vols.len()
            )));
        }
        if correlation.dimension() != n {
            return Err(Error::InvalidArgument(format!(
                "{n} assets but a {}-dimensional correlation factor",
                correlation.dimension()
            )));
        }
        Ok(Self {
            forward_curves,
            local_vols,
            correlation,
        })
    }

    /// The forward curves, one per asset.
    pub fn forward_curves(&self) -> &[Arc<dyn ForwardCurve>] {
        &self.forward_curves
    }

    /// The correlation structure.
    pub fn correlation(&self) -> &CorrelationStructure {
        &self.correlation
    }

    /// Spot prices of the basket.
    pub fn spots(&self) -> Vec<Price> {
        self.forward_curves.iter().map(|f| f.spot()).collect()
    }

    /// Forward prices of the basket at `t`.
    pub fn forwards(&self, t: Time) -> Vec<Price> {
        self.forward_curves.iter().map(|f| f.forward(t)).collect()
    }

    /// Price levels corresponding to log-moneyness `x` at `t`.
    pub fn levels(&self, t: Time, x: &Array) -> Vec<Price> {
        self.forward_curves
            .iter()
            .zip(x.iter())
            .map(|(f, &xi)| f.forward(t) * xi.exp())
            .collect()
    }

    /// Local volatilities at `t` for the state `x`.
    pub fn local_volatilities(&self, t: Time, x: &Array) -> Vec<Volatility> {
        self.levels(t, x)
            .into_iter()
            .zip(&self.local_vols)
            .map(|(s, lv)| lv.local_vol(t, s))
            .collect()
    }

    /// One Euler step from `(t, x)` over `dt` with independent normals `z`.
    ///
    /// Returns the new state and the volatilities used for the step.
    pub fn step(&self, t: Time, dt: Time, x: &Array, z: &Array) -> (Array, Vec<Volatility>) {
        let sigma = self.local_volatilities(t, x);
        let dw = self.correlation.correlate(z);
        let sqrt_dt = dt.sqrt();
        let next = Array::from_iterator(
            x.len(),
            x.iter()
                .zip(&sigma)
                .zip(dw.iter())
                .map(|((&xi, &s), &w)| xi - 0.5 * s * s * dt + s * sqrt_dt * w),
        );
        (next, sigma)
    }
}

impl StochasticProcess for LocalVolatilityModel {
    fn size(&self) -> usize {
        self.forward_curves.len()
    }

    fn initial_values(&self) -> Array {
        Array::zeros(self.size())
    }

    fn drift(&self, t: Time, x: &Array) -> Array {
        let sigma = self.local_volatilities(t, x);
        Array::from_iterator(sigma.len(), sigma.iter().map(|s| -0.5 * s * s))
    }

    fn diffusion(&self, t: Time, x: &Array) -> Matrix {
        self.correlation.diffusion(&self.local_volatilities(t, x))
    }
}

/// Simple return `dS/S` between two log-moneyness states.
pub fn simple_return(
    forward_before: Price,
    forward_after: Price,
    x_before: Real,
    x_after: Real,
) -> Real {
    forward_after / forward_before * (x_after - x_before).exp() - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tvs_termstructures::{
        DiscountCurve, EquityForwardCurve, FlatDiscountCurve, InterpolatedLocalVolSurface,
        LocalConstantVol,
    };

    fn model() -> LocalVolatilityModel {
        let d: Arc<dyn DiscountCurve> = Arc::new(FlatDiscountCurve::new(0.01));
        let f: Vec<Arc<dyn ForwardCurve>> = vec![
            Arc::new(EquityForwardCurve::without_repo(100.0, d.clone()).unwrap()),
            Arc::new(EquityForwardCurve::without_repo(50.0, d).unwrap()),
        ];
        let lv: Vec<Arc<dyn LocalVolSurface>> = vec![
            Arc::new(LocalConstantVol::new(0.2).unwrap()),
            Arc::new(
                InterpolatedLocalVolSurface::new(50.0, &[0.0], &[0.5, 1.5], &[0.1, 0.3]).unwrap(),
            ),
        ];
        let corr = CorrelationStructure::from_row_slice(2, &[1.0, 0.3, 0.3, 1.0]).unwrap();
        LocalVolatilityModel::new(f, lv, corr).unwrap()
    }

    #[test]
    fn step_matches_process_evolve() {
        let m = model();
        let x = Array::from_vec(vec![0.05, -0.1]);
        let z = Array::from_vec(vec![0.7, -1.3]);
        let (next, sigma) = m.step(0.5, 0.01, &x, &z);
        let evolved = m.evolve(0.5, &x, 0.01, &z);
        for i in 0..2 {
            assert_abs_diff_eq!(next[i], evolved[i], epsilon = 1e-14);
        }
        assert_eq!(sigma[0], 0.2);
        // level of the second asset is 50·e^{0.005}·e^{-0.1}
        let moneyness = (0.005_f64 - 0.1).exp();
        assert_abs_diff_eq!(sigma[1], 0.1 + 0.2 * (moneyness - 0.5), epsilon = 1e-12);
    }

    #[test]
    fn levels_follow_forwards() {
        let m = model();
        let x0 = m.initial_values();
        assert_eq!(m.levels(0.0, &x0), m.spots());
        assert_abs_diff_eq!(m.levels(1.0, &x0)[0], 100.0 * 0.01_f64.exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            simple_return(100.0, 101.0, 0.0, 0.0),
            0.01,
            epsilon = 1e-15
        );
    }

    #[test]
    fn mismatched_collaborators_rejected() {
        let m = model();
        let f = m.forward_curves().to_vec();
        let lv: Vec<Arc<dyn LocalVolSurface>> = vec![Arc::new(LocalConstantVol::new(0.2).unwrap())];
        assert!(matches!(
            LocalVolatilityModel::new(f.clone(), lv, CorrelationStructure::identity(2)),
            Err(Error::InvalidArgument(_))
        ));
        let lv: Vec<Arc<dyn LocalVolSurface>> = vec![
            Arc::new(LocalConstantVol::new(0.2).unwrap()),
            Arc::new(LocalConstantVol::new(0.2).unwrap()),
        ];
        assert!(matches!(
            LocalVolatilityModel::new(f, lv, CorrelationStructure::identity(3)),
            Err(Error::InvalidArgument(_))
        ));
    }
}

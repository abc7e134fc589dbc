//! Instantaneous variance curves.
//!
//! A variance curve returns the instantaneous variance `V(t)` of one asset;
//! the Black total variance to `t` is `∫₀ᵗ V`. Curves report the times at
//! which `V` may jump so that integration can split there.

use tvs_core::{errors::Result, Real, Time, Variance, Volatility};
use tvs_math::{quad_piecewise, FlatInterpolation, Interpolation1D};

/// Instantaneous variance of one asset as a function of time.
pub trait VarianceCurve: std::fmt::Debug + Send + Sync {
    /// Instantaneous variance at `t`.
    fn variance(&self, t: Time) -> Variance;

    /// Times at which the curve may be discontinuous.
    fn breakpoints(&self) -> &[Time];
}

/// `∫_{t0}^{t1} V(t) dt`, integrated piecewise between the curve's
/// breakpoints.
pub fn integrated_variance(curve: &dyn VarianceCurve, t0: Time, t1: Time) -> Result<Real> {
    quad_piecewise(|t| curve.variance(t), curve.breakpoints(), t0, t1)
}

/// Piecewise-constant forward variance bootstrapped from spot Black
/// volatilities.
///
/// With total variances `w_i = σ_i² T_i`, the forward variance on
/// `[T_{i-1}, T_i)` is `(w_i − w_{i-1}) / (T_i − T_{i-1})`, held flat after
/// the last maturity.
#[derive(Debug, Clone)]
pub struct ForwardVariance {
    curve: FlatInterpolation,
    breakpoints: Vec<Time>,
}

impl ForwardVariance {
    /// Bootstrap from spot volatilities quoted at increasing `maturities`.
    ///
    /// Fails when total variance decreases (calendar arbitrage).
    pub fn new(maturities: &[Time], spot_vols: &[Volatility]) -> Result<Self> {
        tvs_core::ensure!(
            !maturities.is_empty() && maturities.len() == spot_vols.len(),
            "need one volatility per maturity ({} maturities, {} vols)",
            maturities.len(),
            spot_vols.len()
        );
        tvs_core::ensure!(maturities[0] > 0.0, "maturities must be positive");
        tvs_core::ensure!(
            maturities.windows(2).all(|w| w[0] < w[1]),
            "maturities must be strictly increasing"
        );
        tvs_core::ensure!(
            spot_vols.iter().all(|&v| v >= 0.0 && v.is_finite()),
            "volatilities must be finite and non-negative"
        );

        let mut nodes = Vec::with_capacity(maturities.len());
        let mut fwd = Vec::with_capacity(maturities.len());
        let (mut t_prev, mut w_prev) = (0.0, 0.0);
        for (&t, &vol) in maturities.iter().zip(spot_vols) {
            let w = vol * vol * t;
            tvs_core::ensure!(
                w >= w_prev,
                "total variance decreases before maturity {t}"
            );
            nodes.push(t_prev);
            fwd.push((w - w_prev) / (t - t_prev));
            t_prev = t;
            w_prev = w;
        }
        let curve = FlatInterpolation::new(&nodes, &fwd)?;
        Ok(Self {
            curve,
            breakpoints: maturities.to_vec(),
        })
    }

    /// Constant volatility `vol` at all times.
    pub fn flat(vol: Volatility) -> Result<Self> {
        Self::new(&[1.0], &[vol])
    }

    /// Black total variance `∫₀ᵗ V`, exact for this curve.
    pub fn total_variance(&self, t: Time) -> Variance {
        self.curve.primitive(t.max(0.0))
    }
}

impl VarianceCurve for ForwardVariance {
    fn variance(&self, t: Time) -> Variance {
        self.curve.value(t)
    }

    fn breakpoints(&self) -> &[Time] {
        &self.breakpoints
    }
}

//! Local-volatility surfaces `σ(t, S)`.
//!
//! Surfaces never fail on lookup: outside their grid they extrapolate flat.

use tvs_core::{errors::Result, Price, Real, Time, Volatility};
use tvs_math::{BilinearInterpolation, Interpolation2D};

/// Local volatility of one asset as a function of time and price level.
pub trait LocalVolSurface: std::fmt::Debug + Send + Sync {
    /// Local volatility at time `t` and price level `s`.
    fn local_vol(&self, t: Time, s: Price) -> Volatility;
}

/// Constant local volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalConstantVol {
    vol: Volatility,
}

impl LocalConstantVol {
    /// Create a constant surface.
    pub fn new(vol: Volatility) -> Result<Self> {
        tvs_core::ensure!(
            vol >= 0.0 && vol.is_finite(),
            "volatility must be finite and non-negative, got {vol}"
        );
        Ok(Self { vol })
    }
}

impl LocalVolSurface for LocalConstantVol {
    fn local_vol(&self, _t: Time, _s: Price) -> Volatility {
        self.vol
    }
}

/// Local volatility on a `times × moneyness` grid, moneyness being `S / S₀`.
///
/// Bilinear between grid points, flat outside the grid.
#[derive(Debug, Clone)]
pub struct InterpolatedLocalVolSurface {
    spot: Price,
    surface: BilinearInterpolation,
}

impl InterpolatedLocalVolSurface {
    /// Build from a grid of local vols stored row by row, one row per time:
    /// `vols[i * moneyness.len() + j] = σ(times[i], spot · moneyness[j])`.
    pub fn new(spot: Price, times: &[Time], moneyness: &[Real], vols: &[Volatility]) -> Result<Self> {
        tvs_core::ensure!(spot > 0.0, "spot price must be positive, got {spot}");
        tvs_core::ensure!(
            vols.iter().all(|&v| v >= 0.0),
            "local volatilities must be non-negative"
        );
        // x = moneyness (fast axis), y = time
        let surface = BilinearInterpolation::new(moneyness, times, vols)?;
        Ok(Self { spot, surface })
    }

    /// Reference spot for the moneyness axis.
    pub fn spot(&self) -> Price {
        self.spot
    }
}

impl LocalVolSurface for InterpolatedLocalVolSurface {
    fn local_vol(&self, t: Time, s: Price) -> Volatility {
        self.surface.value(s / self.spot, t)
    }
}

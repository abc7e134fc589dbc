//! Target-volatility index accumulation.
//!
//! At every Euler step the exposure is rescaled so that the portfolio runs
//! at the target volatility:
//!
//! ```text
//! ω = σ_target / ‖wᵀ nu‖
//! I ← I · (1 + ω w·dS/S + (1 − ω s) r dt)
//! ```
//!
//! where `s` is the invested sum (1 for only-long weights).

use crate::optimizer::portfolio_volatility;
use tvs_core::{errors::Result, DiscountFactor, Error, Rate, Real, Time, Volatility};
use tvs_math::{Array, Matrix};

/// Exposure `ω = σ_target / ‖wᵀ nu‖`.
///
/// # Errors
/// `Error::Optimization` when the portfolio volatility is zero or not
/// finite.
pub fn exposure(target_vol: Volatility, w: &Array, nu: &Matrix) -> Result<Real> {
    let vol = portfolio_volatility(w, nu);
    if vol == 0.0 || !vol.is_finite() {
        return Err(Error::Optimization(format!(
            "cannot target volatility with portfolio volatility {vol}"
        )));
    }
    Ok(target_vol / vol)
}

/// Running value of the target-volatility index along one path.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexAccumulator {
    value: Real,
    target_vol: Volatility,
}

impl IndexAccumulator {
    /// Start an index at `initial_value` with the given target volatility.
    pub fn new(initial_value: Real, target_vol: Volatility) -> Result<Self> {
        if !(initial_value.is_finite() && initial_value > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "initial index value must be positive, got {initial_value}"
            )));
        }
        if !(target_vol.is_finite() && target_vol > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "target volatility must be positive, got {target_vol}"
            )));
        }
        Ok(Self {
            value: initial_value,
            target_vol,
        })
    }

    /// Current index value.
    pub fn value(&self) -> Real {
        self.value
    }

    /// Target volatility.
    pub fn target_vol(&self) -> Volatility {
        self.target_vol
    }

    /// Apply one Euler step with weights `w`, invested sum `s`, asset
    /// returns `ds_s`, short rate `r` over `dt`, and diffusion `nu` of the
    /// step. Returns the new value.
    ///
    /// The value is left unchanged on error.
    pub fn step(
        &mut self,
        w: &Array,
        s: Real,
        ds_s: &Array,
        r: Rate,
        dt: Time,
        nu: &Matrix,
    ) -> Result<Real> {
        let omega = exposure(self.target_vol, w, nu)?;
        let growth = 1.0 + omega * w.dot(ds_s) + (1.0 - omega * s) * r * dt;
        let next = self.value * growth;
        if !next.is_finite() {
            return Err(Error::Runtime(format!("index value became {next}")));
        }
        self.value = next;
        Ok(next)
    }

    /// Discounted call payoff `D(T) · max(I − K, 0)`.
    pub fn payoff(&self, strike: Real, discount: DiscountFactor) -> Real {
        call_payoff(self.value, strike, discount)
    }
}

/// `discount · max(index − strike, 0)`.
pub fn call_payoff(index: Real, strike: Real, discount: DiscountFactor) -> Real {
    discount * (index - strike).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn nu(vols: &[Real]) -> Matrix {
        Matrix::from_diagonal(&Array::from_row_slice(vols))
    }

    #[test]
    fn single_step() {
        let mut acc = IndexAccumulator::new(1.0, 0.05).unwrap();
        let w = Array::from_vec(vec![1.0, 0.0]);
        let ret = Array::from_vec(vec![0.02, -0.5]);
        // ω = 0.05 / 0.2 = 0.25
        let v = acc.step(&w, 1.0, &ret, 0.01, 0.5, &nu(&[0.2, 0.3])).unwrap();
        assert_abs_diff_eq!(v, 1.0 + 0.25 * 0.02 + 0.75 * 0.01 * 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(acc.payoff(1.0, 0.9), 0.9 * (v - 1.0), epsilon = 1e-15);
        assert_eq!(acc.payoff(2.0, 0.9), 0.0);
    }

    #[test]
    fn zero_volatility_is_an_error_and_leaves_value() {
        let mut acc = IndexAccumulator::new(1.0, 0.05).unwrap();
        let w = Array::from_vec(vec![1.0, 0.0]);
        let ret = Array::from_vec(vec![0.02, 0.0]);
        assert!(matches!(
            acc.step(&w, 1.0, &ret, 0.0, 0.1, &nu(&[0.0, 0.3])),
            Err(Error::Optimization(_))
        ));
        assert_eq!(acc.value(), 1.0);
    }

    #[test]
    fn invalid_parameters() {
        assert!(IndexAccumulator::new(0.0, 0.05).is_err());
        assert!(IndexAccumulator::new(1.0, 0.0).is_err());
        assert!(IndexAccumulator::new(1.0, Real::NAN).is_err());
    }

    proptest! {
        #[test]
        fn exposure_is_scale_invariant(
            w0 in 0.01f64..1.0, w1 in 0.01f64..1.0,
            v0 in 0.05f64..0.5, v1 in 0.05f64..0.5,
            r0 in -0.05f64..0.05, r1 in -0.05f64..0.05,
            scale in 0.1f64..10.0,
        ) {
            // doubling the target while doubling every volatility leaves
            // the trajectory unchanged
            let w = Array::from_vec(vec![w0, w1]);
            let ret = Array::from_vec(vec![r0, r1]);
            let mut a = IndexAccumulator::new(1.0, 0.05).unwrap();
            let mut b = IndexAccumulator::new(1.0, 0.05 * scale).unwrap();
            for _ in 0..5 {
                let va = a.step(&w, w.sum(), &ret, 0.02, 0.1, &nu(&[v0, v1])).unwrap();
                let vb = b.step(&w, w.sum(), &ret, 0.02, 0.1, &nu(&[v0 * scale, v1 * scale])).unwrap();
                prop_assert!((va - vb).abs() <= 1e-12 * va.abs());
            }
        }
    }
}

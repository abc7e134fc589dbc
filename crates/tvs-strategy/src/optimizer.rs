//! Strategy optimisation at a rebalancing date.
//!
//! Given the drift `mu` and the diffusion matrix `nu` at a date, find the
//! weights `w` maximising the volatility-normalised return
//!
//! ```text
//! f(w) = (w · mu) / ‖wᵀ nu‖
//! ```
//!
//! over the feasible set of the [`ConstraintMode`]. The ratio is not convex,
//! so the optimiser runs several Nelder–Mead searches from seeded random
//! starting points and keeps the best. Each search works on an
//! unconstrained vector that is mapped onto the feasible set, so every
//! evaluated point is admissible.
//!
//! The result is the best point found, not a certified global optimum, and
//! different seeds may return different weights of equal quality.

use nalgebra::{Cholesky, Dyn};
use serde::{Deserialize, Serialize};
use tvs_core::{errors::Result, Error, Real};
use tvs_math::{
    optimization::{EndCriteria, NoConstraint, Simplex},
    Array, Matrix, MersenneTwisterUniformRng,
};

/// Smallest weight an only-long strategy may hold.
pub const ONLY_LONG_FLOOR: Real = 1.0e-7;

/// Smallest squared Cholesky pivot of `nu nuᵀ`, relative to its largest
/// diagonal entry, for the diffusion to count as non-singular.
const PIVOT_TOLERANCE: Real = 1.0e-12;

/// Smallest admissible `‖wᵀ nu‖ / (‖w‖ ‖nu‖)` of an optimised strategy.
const VOLATILITY_FLOOR: Real = 1.0e-8;

/// Feasible set for the weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintMode {
    /// `w_i ≥ 0` (floored at [`ONLY_LONG_FLOOR`]) and `Σ w_i = 1`.
    OnlyLong,
    /// `Σ max(w_i, 0) ≤ long_limit` and `Σ max(−w_i, 0) ≤ short_limit`.
    LongShortLimit {
        /// Budget for long positions.
        long_limit: Real,
        /// Budget for short positions, as a positive number.
        short_limit: Real,
    },
}

impl ConstraintMode {
    /// Check the budgets of a long/short mode.
    pub fn validate(&self) -> Result<()> {
        if let ConstraintMode::LongShortLimit {
            long_limit,
            short_limit,
        } = *self
        {
            if !(long_limit.is_finite() && short_limit.is_finite())
                || long_limit <= 0.0
                || short_limit < 0.0
            {
                return Err(Error::InvalidArgument(format!(
                    "long/short budgets must be finite with long > 0 and short ≥ 0, \
                     got long = {long_limit}, short = {short_limit}"
                )));
            }
        }
        Ok(())
    }

    /// The invested sum `s` entering the cash leg of the index.
    pub fn investment_sum(&self, w: &Array) -> Real {
        match self {
            ConstraintMode::OnlyLong => 1.0,
            ConstraintMode::LongShortLimit { .. } => w.sum(),
        }
    }

    /// Whether `w` lies in the feasible set, up to `tol`.
    pub fn is_feasible(&self, w: &Array, tol: Real) -> bool {
        match *self {
            ConstraintMode::OnlyLong => {
                w.iter().all(|&x| x >= -tol) && (w.sum() - 1.0).abs() <= tol
            }
            ConstraintMode::LongShortLimit {
                long_limit,
                short_limit,
            } => {
                let (long, short) = long_short_sums(w);
                long <= long_limit + tol && short <= short_limit + tol
            }
        }
    }
}

/// Portfolio volatility `‖wᵀ nu‖`.
pub fn portfolio_volatility(w: &Array, nu: &Matrix) -> Real {
    (nu.transpose() * w).norm()
}

/// The optimised ratio `(w · mu) / ‖wᵀ nu‖`.
///
/// # Errors
/// `Error::Optimization` when the portfolio volatility is zero or the
/// ratio is not finite.
pub fn objective(w: &Array, mu: &Array, nu: &Matrix) -> Result<Real> {
    let vol = portfolio_volatility(w, nu);
    let value = w.dot(mu) / vol;
    if vol == 0.0 || !value.is_finite() {
        return Err(Error::Optimization(format!(
            "objective undefined: portfolio volatility {vol}"
        )));
    }
    Ok(value)
}

/// Sums of the long and (absolute) short positions.
pub fn long_short_sums(w: &Array) -> (Real, Real) {
    w.iter().fold((0.0, 0.0), |(l, s), &x| {
        if x > 0.0 {
            (l + x, s)
        } else {
            (l, s - x)
        }
    })
}

/// Map raw weights onto the long/short budget set by scaling the positive
/// and the negative parts separately, each only if it exceeds its budget.
pub fn sign_renormalization(action: &Array, long_limit: Real, short_limit: Real) -> Array {
    let (long, short) = long_short_sums(action);
    let long_scale = if long > long_limit { long_limit / long } else { 1.0 };
    let short_scale = if short > short_limit {
        if short_limit > 0.0 {
            short_limit / short
        } else {
            0.0
        }
    } else {
        1.0
    };
    action.map(|x| if x > 0.0 { x * long_scale } else { x * short_scale })
}

/// Map raw weights onto the only-long simplex: `(|x_i| + floor) / Σ`.
pub fn only_long_normalization(action: &Array) -> Array {
    let w = action.map(|x| x.abs() + ONLY_LONG_FLOOR);
    let total = w.sum();
    w / total
}

/// Random-restart maximiser of [`objective`].
#[derive(Debug, Clone)]
pub struct StrategyOptimizer {
    mode: ConstraintMode,
    n_trials: usize,
    seed: u64,
    end_criteria: EndCriteria,
    simplex_step: Real,
}

impl StrategyOptimizer {
    /// Create an optimiser running `n_trials` restarts seeded by `seed`.
    pub fn new(mode: ConstraintMode, n_trials: usize, seed: u64) -> Result<Self> {
        mode.validate()?;
        if n_trials == 0 {
            return Err(Error::InvalidArgument(
                "optimiser needs at least one trial".into(),
            ));
        }
        Ok(Self {
            mode,
            n_trials,
            seed,
            end_criteria: EndCriteria::new(2_000, 100, 1e-12),
            simplex_step: 0.1,
        })
    }

    /// Replace the stopping rule of each local search.
    pub fn with_end_criteria(mut self, end_criteria: EndCriteria) -> Self {
        self.end_criteria = end_criteria;
        self
    }

    /// The constraint mode.
    pub fn mode(&self) -> ConstraintMode {
        self.mode
    }

    /// Number of restarts.
    pub fn n_trials(&self) -> usize {
        self.n_trials
    }

    /// Seed of the restart generator.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Map an unconstrained vector onto the feasible set.
    pub fn feasible(&self, x: &Array) -> Array {
        match self.mode {
            ConstraintMode::OnlyLong => only_long_normalization(x),
            ConstraintMode::LongShortLimit {
                long_limit,
                short_limit,
            } => sign_renormalization(x, long_limit, short_limit),
        }
    }

    /// Maximise the objective for `(mu, nu)`.
    ///
    /// `guess`, when given, seeds the first restart. Identical inputs give
    /// identical outputs.
    ///
    /// # Errors
    /// `Error::InvalidArgument` for inconsistent dimensions,
    /// `Error::Optimization` for non-finite inputs, a singular diffusion
    /// matrix, or when no candidate has a usable portfolio volatility.
    pub fn optimize(&self, mu: &Array, nu: &Matrix, guess: Option<&Array>) -> Result<Array> {
        let n = check_inputs(mu, nu)?;
        check_non_singular(nu)?;
        if let Some(g) = guess {
            if g.len() != n {
                return Err(Error::InvalidArgument(format!(
                    "guess has {} weights for {n} assets",
                    g.len()
                )));
            }
        }

        let cost = |x: &Array| -> Real {
            objective(&self.feasible(x), mu, nu).map_or(Real::INFINITY, |v| -v)
        };

        let mut rng = MersenneTwisterUniformRng::new(self.seed);
        let simplex = Simplex::new(self.simplex_step);
        let mut best: Option<(Array, Real)> = None;
        let mut consider = |x: Array, value: Real| {
            if value.is_finite() && best.as_ref().map_or(true, |(_, b)| value < *b) {
                best = Some((x, value));
            }
        };

        for trial in 0..self.n_trials {
            let start = match (trial, guess) {
                (0, Some(g)) => g.clone(),
                _ => self.random_start(&mut rng, n),
            };
            consider(start.clone(), cost(&start));
            if let Ok(result) = simplex.minimize(&cost, &NoConstraint, &start, &self.end_criteria)
            {
                consider(result.x, result.value);
            }
        }

        let w = match best {
            Some((x, _)) => self.feasible(&x),
            None => {
                return Err(Error::Optimization(
                    "every candidate has zero portfolio volatility".into(),
                ))
            }
        };
        let relative_vol = portfolio_volatility(&w, nu) / (w.norm() * nu.norm());
        if !(relative_vol >= VOLATILITY_FLOOR) {
            return Err(Error::Optimization(format!(
                "optimised weights have degenerate portfolio volatility \
                 (relative {relative_vol:e})"
            )));
        }
        Ok(w)
    }

    /// Markowitz direction `(nu nuᵀ)⁻¹ mu`.
    ///
    /// Only-long: normalised to sum 1; when the direction is not long-only
    /// the numerical optimiser is used instead, seeded with its positive
    /// part. Long/short: scaled uniformly into the budgets.
    pub fn closed_form(&self, mu: &Array, nu: &Matrix) -> Result<Array> {
        check_inputs(mu, nu)?;
        let direction = check_non_singular(nu)?.solve(mu);
        if !direction.iter().all(|x| x.is_finite()) {
            return Err(Error::Optimization("Markowitz direction is not finite".into()));
        }

        match self.mode {
            ConstraintMode::OnlyLong => {
                let total = direction.sum();
                if total > 0.0 && direction.iter().all(|&x| x >= 0.0) {
                    Ok(only_long_normalization(&(direction / total)))
                } else {
                    let positive = direction.map(|x| x.max(0.0));
                    let guess = (positive.sum() > 0.0).then_some(positive);
                    self.optimize(mu, nu, guess.as_ref())
                }
            }
            ConstraintMode::LongShortLimit {
                long_limit,
                short_limit,
            } => {
                let (long, short) = long_short_sums(&direction);
                let mut scale = Real::INFINITY;
                if long > 0.0 {
                    scale = scale.min(long_limit / long);
                }
                if short > 0.0 {
                    scale = scale.min(short_limit / short);
                }
                if !scale.is_finite() || scale <= 0.0 {
                    return self.optimize(mu, nu, None);
                }
                Ok(direction * scale)
            }
        }
    }

    fn random_start(&self, rng: &mut MersenneTwisterUniformRng, n: usize) -> Array {
        match self.mode {
            ConstraintMode::OnlyLong => Array::from_fn(n, |_, _| rng.next_real()),
            ConstraintMode::LongShortLimit { .. } => {
                Array::from_fn(n, |_, _| rng.next_in(-1.0, 1.0))
            }
        }
    }
}

fn check_inputs(mu: &Array, nu: &Matrix) -> Result<usize> {
    let n = mu.len();
    if n == 0 || nu.nrows() != n || nu.ncols() == 0 {
        return Err(Error::InvalidArgument(format!(
            "drift has {n} components but diffusion is {}x{}",
            nu.nrows(),
            nu.ncols()
        )));
    }
    if !mu.iter().chain(nu.iter()).all(|x| x.is_finite()) {
        return Err(Error::Optimization("non-finite drift or diffusion".into()));
    }
    if nu.norm() == 0.0 {
        return Err(Error::Optimization("diffusion matrix is zero".into()));
    }
    Ok(n)
}

/// Cholesky factor of `nu nuᵀ`, or `Error::Optimization` when the
/// covariance is not positive-definite.
fn check_non_singular(nu: &Matrix) -> Result<Cholesky<Real, Dyn>> {
    let sigma = nu * nu.transpose();
    let threshold = PIVOT_TOLERANCE * sigma.diagonal().max();
    let singular = || Error::Optimization("covariance matrix is singular".into());
    let factor = sigma.cholesky().ok_or_else(singular)?;
    if !factor.l_dirty().diagonal().iter().all(|&d| d * d > threshold) {
        return Err(singular());
    }
    Ok(factor)
}

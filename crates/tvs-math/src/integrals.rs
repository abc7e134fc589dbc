//! Numerical integration of piecewise-smooth curves.
//!
//! Market curves in this workspace (forward variances, repo rates, short
//! rates) are piecewise constant or piecewise smooth with known
//! breakpoints. [`quad_piecewise`] splits the integration range at those
//! breakpoints and integrates every piece with a composite Gauss–Legendre
//! rule, which never evaluates the integrand on a piece boundary.

use tvs_core::{errors::Result, Real};

/// A numerical integrator over a finite interval.
pub trait Integrator {
    /// Integrate `f` on `[a, b]`.
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Real;
}

// Five-point Gauss–Legendre nodes and weights on [-1, 1].
const GL5_X: [Real; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683_1,
    0.0,
    0.538_469_310_105_683_1,
    0.906_179_845_938_664,
];
const GL5_W: [Real; 5] = [
    0.236_926_885_056_189_1,
    0.478_628_670_499_366_5,
    0.568_888_888_888_888_9,
    0.478_628_670_499_366_5,
    0.236_926_885_056_189_1,
];

/// Composite five-point Gauss–Legendre rule.
///
/// Exact for polynomials of degree ≤ 9 on each sub-interval.
#[derive(Debug, Clone, Copy)]
pub struct GaussLegendreIntegral {
    intervals: usize,
}

impl GaussLegendreIntegral {
    /// Create a composite rule using `intervals` equal sub-intervals.
    pub fn new(intervals: usize) -> Self {
        Self {
            intervals: intervals.max(1),
        }
    }
}

impl Default for GaussLegendreIntegral {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Integrator for GaussLegendreIntegral {
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Real {
        if a == b {
            return 0.0;
        }
        let h = (b - a) / self.intervals as Real;
        let mut sum = 0.0;
        for k in 0..self.intervals {
            let lo = a + k as Real * h;
            let mid = lo + 0.5 * h;
            let half = 0.5 * h;
            sum += GL5_X
                .iter()
                .zip(GL5_W.iter())
                .map(|(&x, &w)| w * f(mid + half * x))
                .sum::<Real>()
                * half;
        }
        sum
    }
}

/// Integrate `f` over `[t0, t1]`, splitting the range at every breakpoint
/// strictly inside it.
///
/// Exact for piecewise-constant curves whose discontinuities are listed in
/// `breakpoints`. `t1 < t0` yields the negated integral.
pub fn quad_piecewise<F: Fn(Real) -> Real>(
    f: F,
    breakpoints: &[Real],
    t0: Real,
    t1: Real,
) -> Result<Real> {
    tvs_core::ensure!(
        t0.is_finite() && t1.is_finite(),
        "integration bounds must be finite, got [{t0}, {t1}]"
    );
    if t1 < t0 {
        return quad_piecewise(f, breakpoints, t1, t0).map(|v| -v);
    }
    if t0 == t1 {
        return Ok(0.0);
    }

    let mut knots: Vec<Real> = Vec::with_capacity(breakpoints.len() + 2);
    knots.push(t0);
    knots.extend(breakpoints.iter().copied().filter(|&b| b > t0 && b < t1));
    knots.push(t1);
    knots.sort_by(|a, b| a.total_cmp(b));
    knots.dedup();

    let rule = GaussLegendreIntegral::default();
    Ok(knots
        .windows(2)
        .map(|w| rule.integrate(&f, w[0], w[1]))
        .sum())
}

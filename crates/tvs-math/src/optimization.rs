//! Derivative-free optimisation.
//!
//! Provides the cost-function and constraint traits, end criteria, and a
//! Nelder–Mead simplex minimiser. The strategy optimiser drives it from
//! several starting points and keeps the best feasible vertex.

use crate::Array;
use tvs_core::{errors::Result, Real};

// ── Cost function trait ───────────────────────────────────────────────────────

/// A scalar objective to be minimised.
pub trait CostFunction {
    /// Evaluate the cost at `x`. Non-finite values mark `x` as unusable.
    fn value(&self, x: &Array) -> Real;
}

impl<F: Fn(&Array) -> Real> CostFunction for F {
    fn value(&self, x: &Array) -> Real {
        self(x)
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A constraint on the parameter space.
pub trait Constraint {
    /// Return `true` if `x` satisfies the constraint.
    fn test(&self, x: &Array) -> bool;
}

/// No constraint — all parameter values are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _x: &Array) -> bool {
        true
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Criteria to stop an optimisation.
#[derive(Debug, Clone)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Maximum number of stationary-state iterations.
    pub max_stationary_state_iterations: usize,
    /// Function epsilon — a step improving the best value by less than this
    /// counts as stationary.
    pub function_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria.
    pub fn new(
        max_iterations: usize,
        max_stationary_state_iterations: usize,
        function_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            function_epsilon,
        }
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_stationary_state_iterations: 50,
            function_epsilon: 1e-10,
        }
    }
}

/// The reason an optimisation terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCriteriaType {
    /// Maximum iterations reached.
    MaxIterations,
    /// Maximum stationary-state iterations reached.
    StationaryPoint,
}

/// Result of an optimisation.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter values.
    pub x: Array,
    /// Final function value.
    pub value: Real,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}

// ── Simplex (Nelder–Mead) ─────────────────────────────────────────────────────

/// Nelder–Mead simplex minimiser.
///
/// Vertices failing the constraint, or with a non-finite cost, are treated
/// as `+∞` so the simplex contracts away from them.
#[derive(Debug, Clone, Copy)]
pub struct Simplex {
    lambda: Real,
}

impl Simplex {
    /// Create a new simplex optimiser with initial step size `lambda`.
    pub fn new(lambda: Real) -> Self {
        Self { lambda }
    }

    /// Minimise `cost_fn` subject to `constraint`, starting from `initial_values`.
    pub fn minimize<C: CostFunction, K: Constraint>(
        &self,
        cost_fn: &C,
        constraint: &K,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        let n = initial_values.len();
        tvs_core::ensure!(n > 0, "cannot optimise over an empty parameter vector");
        tvs_core::ensure!(self.lambda > 0.0, "simplex step must be positive");
        let np1 = n + 1;

        let eval = |x: &Array| -> Real {
            if !constraint.test(x) {
                return Real::INFINITY;
            }
            let v = cost_fn.value(x);
            if v.is_finite() {
                v
            } else {
                Real::INFINITY
            }
        };

        let mut vertices: Vec<Array> = Vec::with_capacity(np1);
        vertices.push(initial_values.clone());
        for i in 0..n {
            let mut v = initial_values.clone();
            v[i] += self.lambda;
            if !constraint.test(&v) {
                v[i] = initial_values[i] - self.lambda;
            }
            vertices.push(v);
        }
        let mut values: Vec<Real> = vertices.iter().map(&eval).collect();

        let mut iterations = 0;
        let mut stationary_count = 0;
        let mut prev_best = Real::INFINITY;

        loop {
            // best, worst, second-worst
            let mut order: Vec<usize> = (0..np1).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            let (ilo, ihi, inhi) = (order[0], order[n], order[n.saturating_sub(1)]);

            iterations += 1;
            if values[ilo].is_finite() && (prev_best - values[ilo]).abs() < end_criteria.function_epsilon {
                stationary_count += 1;
                if stationary_count >= end_criteria.max_stationary_state_iterations {
                    return Ok(OptimizationResult {
                        x: vertices[ilo].clone(),
                        value: values[ilo],
                        iterations,
                        end_type: EndCriteriaType::StationaryPoint,
                    });
                }
            } else {
                stationary_count = 0;
            }
            prev_best = values[ilo];

            if iterations >= end_criteria.max_iterations {
                return Ok(OptimizationResult {
                    x: vertices[ilo].clone(),
                    value: values[ilo],
                    iterations,
                    end_type: EndCriteriaType::MaxIterations,
                });
            }

            // centroid of all but the worst
            let mut centroid = Array::zeros(n);
            for (i, v) in vertices.iter().enumerate() {
                if i != ihi {
                    centroid += v;
                }
            }
            centroid /= n as Real;

            let reflected = &centroid * 2.0 - &vertices[ihi];
            let fr = eval(&reflected);

            if fr < values[ilo] {
                let expanded = &reflected * 2.0 - &centroid;
                let fe = eval(&expanded);
                if fe < fr {
                    vertices[ihi] = expanded;
                    values[ihi] = fe;
                } else {
                    vertices[ihi] = reflected;
                    values[ihi] = fr;
                }
            } else if fr < values[inhi] {
                vertices[ihi] = reflected;
                values[ihi] = fr;
            } else {
                let contracted = if fr < values[ihi] {
                    (&centroid + &reflected) / 2.0
                } else {
                    (&centroid + &vertices[ihi]) / 2.0
                };
                let fc = eval(&contracted);
                if fc < values[ihi].min(fr) {
                    vertices[ihi] = contracted;
                    values[ihi] = fc;
                } else {
                    // shrink towards the best vertex
                    let best = vertices[ilo].clone();
                    for i in 0..np1 {
                        if i != ilo {
                            vertices[i] = (&best + &vertices[i]) / 2.0;
                            values[i] = eval(&vertices[i]);
                        }
                    }
                }
            }
        }
    }
}

//! `StochasticProcess` — base trait for multi-dimensional processes.
//!
//! A stochastic process `dX = μ(t,X) dt + σ(t,X) dW` is described by its
//! drift (`μ`), diffusion (`σ`), and an evolve method that advances the
//! state by one Euler step.

use tvs_core::Time;
use tvs_math::{Array, Matrix};

/// A general multi-dimensional stochastic process.
pub trait StochasticProcess: std::fmt::Debug + Send + Sync {
    /// Number of dimensions.
    fn size(&self) -> usize;

    /// Number of independent Brownian motions driving the process.
    fn factors(&self) -> usize {
        self.size()
    }

    /// Initial value(s) of the process.
    fn initial_values(&self) -> Array;

    /// Drift vector `μ(t, x)`.
    fn drift(&self, t: Time, x: &Array) -> Array;

    /// Diffusion matrix `σ(t, x)`, dimensioned `size() × factors()`.
    fn diffusion(&self, t: Time, x: &Array) -> Matrix;

    /// Expectation `E[x(t+Δt) | x(t)]`.
    ///
    /// Default: first-order Euler `x + μ(t,x)·Δt`.
    fn expectation(&self, t: Time, x: &Array, dt: Time) -> Array {
        x + self.drift(t, x) * dt
    }

    /// Standard deviation `σ(t,x) · √Δt`.
    fn std_deviation(&self, t: Time, x: &Array, dt: Time) -> Matrix {
        self.diffusion(t, x) * dt.sqrt()
    }

    /// Advance the state by an Euler step.
    ///
    /// `x(t+Δt) = E[x(t+Δt)|x(t)] + σ·√Δt · dw`
    fn evolve(&self, t: Time, x: &Array, dt: Time, dw: &Array) -> Array {
        self.expectation(t, x, dt) + self.std_deviation(t, x, dt) * dw
    }
}

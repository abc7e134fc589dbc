//! Path generation for the local-volatility basket.
//!
//! A [`PathGenerator`] pairs the model with a [`TimeGrid`] and turns a
//! stream of standard normals into [`SimulatedPath`]s. Batches are consumed
//! through a [`PathStream`], which yields one path at a time so memory stays
//! bounded by a single path.

use crate::time_grid::TimeGrid;
use std::sync::Arc;
use tracing::trace;
use tvs_core::{Price, Time};
use tvs_math::{Array, NormalGenerator};
use tvs_processes::{simple_return, LocalVolatilityModel, StochasticProcess};

// ─── SimulatedPath ────────────────────────────────────────────────────────────

/// One simulated realisation of the basket on the fine grid.
///
/// Step `k` goes from fine point `k` to `k + 1`. For each step the simple
/// returns `dS/S` and the local volatilities used for it are recorded;
/// levels and log-moneyness are stored at every fine point.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPath {
    returns: Vec<Array>,
    vols: Vec<Array>,
    prices: Vec<Array>,
    log_moneyness: Vec<Array>,
}

impl SimulatedPath {
    /// Number of Euler steps.
    pub fn n_steps(&self) -> usize {
        self.returns.len()
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.prices[0].len()
    }

    /// Simple returns over step `k`.
    pub fn returns(&self, k: usize) -> &Array {
        &self.returns[k]
    }

    /// Local volatilities used for step `k`.
    pub fn vols(&self, k: usize) -> &Array {
        &self.vols[k]
    }

    /// Price levels at fine point `k` (`0` is spot).
    pub fn prices(&self, k: usize) -> &Array {
        &self.prices[k]
    }

    /// Log-moneyness `ln(S / F)` at fine point `k`.
    pub fn log_moneyness(&self, k: usize) -> &Array {
        &self.log_moneyness[k]
    }

    /// Price levels at maturity.
    pub fn terminal_prices(&self) -> &Array {
        &self.prices[self.prices.len() - 1]
    }
}

// ─── PathGenerator ────────────────────────────────────────────────────────────

/// Simulates [`SimulatedPath`]s of a [`LocalVolatilityModel`] on a
/// [`TimeGrid`].
///
/// Forward prices on the fine grid are computed once at construction.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    model: Arc<LocalVolatilityModel>,
    grid: TimeGrid,
    forward_levels: Vec<Vec<Price>>,
}

impl PathGenerator {
    /// Create a generator.
    pub fn new(model: Arc<LocalVolatilityModel>, grid: TimeGrid) -> Self {
        let forward_levels = grid.fine_times().iter().map(|&t| model.forwards(t)).collect();
        Self {
            model,
            grid,
            forward_levels,
        }
    }

    /// The model.
    pub fn model(&self) -> &Arc<LocalVolatilityModel> {
        &self.model
    }

    /// The time grid.
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.model.size()
    }

    /// Forward prices at every fine point, indexed `[k][asset]`.
    pub fn forward_levels(&self) -> &[Vec<Price>] {
        &self.forward_levels
    }

    /// Simulate one path, drawing `n_assets` normals per Euler step.
    pub fn next_path(&self, rng: &mut dyn NormalGenerator) -> SimulatedPath {
        let n = self.n_assets();
        let steps = self.grid.n_fine_steps();

        let mut returns = Vec::with_capacity(steps);
        let mut vols = Vec::with_capacity(steps);
        let mut prices = Vec::with_capacity(steps + 1);
        let mut log_moneyness = Vec::with_capacity(steps + 1);

        let mut x = self.model.initial_values();
        prices.push(Array::from_vec(self.forward_levels[0].clone()));
        log_moneyness.push(x.clone());

        let mut z = Array::zeros(n);
        for k in 0..steps {
            let t: Time = self.grid.fine_time(k);
            let dt = self.grid.fine_dt(k);
            rng.fill_normals(z.as_mut_slice());
            let (next, sigma) = self.model.step(t, dt, &x, &z);

            let (before, after) = (&self.forward_levels[k], &self.forward_levels[k + 1]);
            let ds_s = Array::from_iterator(
                n,
                (0..n).map(|i| simple_return(before[i], after[i], x[i], next[i])),
            );
            let s_next = Array::from_iterator(n, (0..n).map(|i| after[i] * next[i].exp()));

            returns.push(ds_s);
            vols.push(Array::from_vec(sigma));
            prices.push(s_next);
            log_moneyness.push(next.clone());
            x = next;
        }
        trace!(steps, terminal = ?prices[steps].as_slice(), "simulated path");

        SimulatedPath {
            returns,
            vols,
            prices,
            log_moneyness,
        }
    }

    /// A stream of `n_paths` paths drawn from `rng`.
    pub fn stream<G: NormalGenerator>(&self, rng: G, n_paths: usize) -> PathStream<'_, G> {
        PathStream::new(self, rng, n_paths)
    }
}

// ─── PathStream ───────────────────────────────────────────────────────────────

/// Forward-only iterator over a batch of independent paths.
///
/// Each path is produced on demand and owned by the caller; nothing is
/// kept once it has been yielded.
#[derive(Debug)]
pub struct PathStream<'a, G> {
    generator: &'a PathGenerator,
    rng: G,
    remaining: usize,
}

impl<'a, G: NormalGenerator> PathStream<'a, G> {
    /// Stream `n_paths` paths from `generator` with the random source `rng`.
    pub fn new(generator: &'a PathGenerator, rng: G, n_paths: usize) -> Self {
        Self {
            generator,
            rng,
            remaining: n_paths,
        }
    }

    /// Paths not yet yielded.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Give back the random source, e.g. to continue its sequence.
    pub fn into_rng(self) -> G {
        self.rng
    }
}

impl<G: NormalGenerator> Iterator for PathStream<'_, G> {
    type Item = SimulatedPath;

    fn next(&mut self) -> Option<SimulatedPath> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.generator.next_path(&mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<G: NormalGenerator> ExactSizeIterator for PathStream<'_, G> {}

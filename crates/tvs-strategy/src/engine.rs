//! Monte Carlo pricing of the call on the target-volatility index.
//!
//! The [`TvsEngine`] consumes simulated paths one at a time. Along each
//! path it picks the weights at every rebalancing date (baseline or
//! re-optimised), runs the [`IndexAccumulator`] over the Euler steps and
//! records the terminal index value. Batch results feed the data-blocking
//! estimator.
//!
//! A run can be continued: a [`Restart`] starts every path from a stored
//! index value at a later rebalancing date, so a one-year run followed by a
//! restart at `t = 1` on a two-year grid prices the two-year note.

use crate::{
    accumulator::{call_payoff, IndexAccumulator},
    config::{FailurePolicy, RebalancingPolicy, TvsConfig},
    optimizer::{objective, StrategyOptimizer},
    output::TerminalValueWriter,
    strategy::Strategy,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tvs_core::{errors::Result, DiscountFactor, Error, Rate, Real, Time, Volatility};
use tvs_math::{
    data_blocking_1d, matrix_utilities::diag_times, Array, BlockRemainder, Matrix,
    NormalGenerator, Statistics,
};
use tvs_methods::{PathGenerator, SimulatedPath, TimeGrid};
use tvs_processes::{CholeskyTDependent, Drift, LocalVolatilityModel};
use tvs_termstructures::{DiscountCurve, VarianceCurve};

/// Contract and policy parameters of the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Target volatility of the index.
    pub target_vol: Volatility,
    /// Default initial index value.
    pub initial_index: Real,
    /// Strike of the call.
    pub strike: Real,
    /// Baseline or re-optimised weights.
    pub rebalancing: RebalancingPolicy,
    /// Reaction to optimisation failures.
    pub failure_policy: FailurePolicy,
}

impl From<&TvsConfig> for EngineSettings {
    fn from(c: &TvsConfig) -> Self {
        Self {
            target_vol: c.target_volatility,
            initial_index: c.initial_index,
            strike: c.strike,
            rebalancing: c.rebalancing,
            failure_policy: c.failure_policy,
        }
    }
}

/// Result of one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathOutcome {
    /// Index value at maturity.
    pub terminal_value: Real,
    /// Rebalancing dates at which the weights were re-optimised.
    pub rebalances: usize,
    /// Re-optimisations whose objective did not beat the baseline.
    pub baseline_not_worse: usize,
    /// Rebalancing dates that fell back to the baseline after a failure.
    pub fallbacks: usize,
}

/// Continuation of an earlier run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Restart<'a> {
    /// Index value of each path at the restart date.
    pub initial_values: &'a [Real],
    /// Interval of the grid the continuation starts with.
    pub start_interval: usize,
}

impl<'a> Restart<'a> {
    /// Restart at rebalancing date `date` of `grid`.
    ///
    /// # Errors
    /// `Error::InvalidArgument` when `date` is not a rebalancing date.
    pub fn at_date(grid: &TimeGrid, initial_values: &'a [Real], date: Time) -> Result<Self> {
        let start_interval = grid.interval_starting_at(date).ok_or_else(|| {
            Error::InvalidArgument(format!("restart date {date} is not a rebalancing date"))
        })?;
        Ok(Self {
            initial_values,
            start_interval,
        })
    }
}

/// Terminal values and counters of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Terminal index value of each path, in simulation order.
    pub terminal_values: Vec<Real>,
    /// Total re-optimisations.
    pub rebalances: usize,
    /// Re-optimisations whose objective did not beat the baseline.
    pub baseline_not_worse: usize,
    /// Fallbacks to the baseline.
    pub fallbacks: usize,
    statistics: Statistics,
    strike: Real,
    discount: DiscountFactor,
}

impl BatchReport {
    fn new(strike: Real, discount: DiscountFactor, capacity: usize) -> Self {
        Self {
            terminal_values: Vec::with_capacity(capacity),
            rebalances: 0,
            baseline_not_worse: 0,
            fallbacks: 0,
            statistics: Statistics::new(),
            strike,
            discount,
        }
    }

    fn record(&mut self, outcome: &PathOutcome) {
        self.terminal_values.push(outcome.terminal_value);
        self.statistics.add(outcome.terminal_value);
        self.rebalances += outcome.rebalances;
        self.baseline_not_worse += outcome.baseline_not_worse;
        self.fallbacks += outcome.fallbacks;
    }

    /// Running statistics of the terminal index values.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Discounted call payoffs `D(T) · max(I_T − K, 0)`.
    pub fn payoffs(&self) -> Vec<Real> {
        self.terminal_values
            .iter()
            .map(|&i| call_payoff(i, self.strike, self.discount))
            .collect()
    }

    /// Call price and its data-blocking error.
    pub fn price(&self, n_blocks: usize, remainder: BlockRemainder) -> Result<(Real, Real)> {
        Ok(data_blocking_1d(&self.payoffs(), n_blocks, remainder)?.estimate(0))
    }

    /// Mean terminal index and its blocking error.
    pub fn mean_index(&self, n_blocks: usize, remainder: BlockRemainder) -> Result<(Real, Real)> {
        Ok(data_blocking_1d(&self.terminal_values, n_blocks, remainder)?.estimate(0))
    }

    /// Mean terminal index and its plain standard error.
    pub fn mean_index_plain(&self) -> Result<(Real, Real)> {
        self.statistics
            .mean()
            .zip(self.statistics.error_estimate())
            .ok_or_else(|| Error::Precondition("cannot estimate from zero observations".into()))
    }
}

/// Simulates the index along paths of a [`PathGenerator`].
#[derive(Debug, Clone)]
pub struct TvsEngine {
    generator: PathGenerator,
    drift: Drift,
    baseline: Strategy,
    optimizer: StrategyOptimizer,
    settings: EngineSettings,
    short_rates: Vec<Rate>,
    discount: DiscountFactor,
}

impl TvsEngine {
    /// Assemble an engine.
    ///
    /// # Errors
    /// `Error::InvalidArgument` when the drift, the baseline strategy and
    /// the model disagree on the number of assets, or the settings are not
    /// positive.
    pub fn new(
        generator: PathGenerator,
        discounting: Arc<dyn DiscountCurve>,
        drift: Drift,
        baseline: Strategy,
        optimizer: StrategyOptimizer,
        settings: EngineSettings,
    ) -> Result<Self> {
        let n = generator.n_assets();
        if drift.size() != n || baseline.n_assets() != n {
            return Err(Error::InvalidArgument(format!(
                "model has {n} assets, drift {} and baseline strategy {}",
                drift.size(),
                baseline.n_assets()
            )));
        }
        if !(settings.target_vol > 0.0 && settings.initial_index > 0.0) {
            return Err(Error::InvalidArgument(
                "target volatility and initial index must be positive".into(),
            ));
        }
        let grid = generator.grid();
        let short_rates = discounting.short_rates(&grid.fine_times()[..grid.n_fine_steps()]);
        let discount = discounting.discount(grid.maturity());
        Ok(Self {
            generator,
            drift,
            baseline,
            optimizer,
            settings,
            short_rates,
            discount,
        })
    }

    /// Build everything from a configuration and the market collaborators.
    /// The baseline is the closed-form strategy on the rebalancing dates.
    pub fn from_config(
        config: &TvsConfig,
        model: Arc<LocalVolatilityModel>,
        variance_curves: Vec<Arc<dyn VarianceCurve>>,
        discounting: Arc<dyn DiscountCurve>,
    ) -> Result<Self> {
        config.validate()?;
        let grid = config.time_grid()?;
        let drift = Drift::new(model.forward_curves().to_vec())?;
        let nu = CholeskyTDependent::new(variance_curves, model.correlation().clone())?;
        let optimizer =
            StrategyOptimizer::new(config.constraint, config.optimizer_trials, config.seed())?;
        let baseline = Strategy::closed_form(grid.rebalancing_dates(), &drift, &nu, &optimizer)?;
        let generator = PathGenerator::new(model, grid);
        Self::new(
            generator,
            discounting,
            drift,
            baseline,
            optimizer,
            EngineSettings::from(config),
        )
    }

    /// The path generator.
    pub fn generator(&self) -> &PathGenerator {
        &self.generator
    }

    /// The baseline strategy.
    pub fn baseline(&self) -> &Strategy {
        &self.baseline
    }

    /// The settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Discount factor to maturity.
    pub fn discount(&self) -> DiscountFactor {
        self.discount
    }

    /// Accumulate the index along `path` starting from `initial_value`.
    pub fn run_path(&self, path: &SimulatedPath, initial_value: Real) -> Result<PathOutcome> {
        self.run_path_from(path, initial_value, 0)
    }

    /// Accumulate the index along `path` from the start of interval
    /// `start_interval`, where it is worth `initial_value`. Earlier steps of
    /// the path are skipped; rates, drift and dates are those of the
    /// remaining intervals.
    pub fn run_path_from(
        &self,
        path: &SimulatedPath,
        initial_value: Real,
        start_interval: usize,
    ) -> Result<PathOutcome> {
        let grid = self.generator.grid();
        if path.n_steps() != grid.n_fine_steps() || path.n_assets() != self.generator.n_assets() {
            return Err(Error::InvalidArgument(format!(
                "path has {} steps over {} assets, grid expects {} over {}",
                path.n_steps(),
                path.n_assets(),
                grid.n_fine_steps(),
                self.generator.n_assets()
            )));
        }
        check_start_interval(grid, start_interval)?;
        let factor = self.generator.model().correlation().factor();
        let mut index = IndexAccumulator::new(initial_value, self.settings.target_vol)?;
        let mut outcome = PathOutcome {
            terminal_value: initial_value,
            rebalances: 0,
            baseline_not_worse: 0,
            fallbacks: 0,
        };

        let dates = grid.dates();
        let mut w = self.baseline.weights_at(dates[start_interval]).clone();
        for k in start_interval * grid.fine_steps()..grid.n_fine_steps() {
            let nu = diffusion(path.vols(k), factor);
            if k % grid.fine_steps() == 0 {
                let date = dates[grid.interval_of(k)];
                let baseline = self.baseline.weights_at(date);
                w = match self.settings.rebalancing {
                    RebalancingPolicy::Baseline => baseline.clone(),
                    RebalancingPolicy::Dynamic => match self.rebalance(date, baseline, &nu) {
                        Ok((dynamic, not_worse)) => {
                            outcome.rebalances += 1;
                            outcome.baseline_not_worse += usize::from(not_worse);
                            dynamic
                        }
                        Err(e) => self.fall_back(e, date, baseline, &mut outcome)?,
                    },
                };
            }
            self.advance(&mut index, &mut w, path, k, &nu, &mut outcome)?;
        }
        outcome.terminal_value = index.value();
        Ok(outcome)
    }

    /// Simulate `n_paths` paths with `rng` and accumulate the index on each.
    ///
    /// With a `restart`, path `p` starts from `restart.initial_values[p]` at
    /// the restart interval; the whole path is still drawn so that the
    /// random stream matches a run from `t = 0`. Each terminal value is
    /// appended to `writer` as soon as its path completes, so an error
    /// leaves every finished path on disk.
    pub fn run_batch<G: NormalGenerator>(
        &self,
        rng: G,
        n_paths: usize,
        restart: Option<Restart<'_>>,
        mut writer: Option<&mut TerminalValueWriter>,
    ) -> Result<BatchReport> {
        let start_interval = restart.map_or(0, |r| r.start_interval);
        if let Some(r) = restart {
            if r.initial_values.len() != n_paths {
                return Err(Error::InvalidArgument(format!(
                    "{} initial index values for {n_paths} paths",
                    r.initial_values.len()
                )));
            }
            check_start_interval(self.generator.grid(), start_interval)?;
        }
        info!(
            n_paths,
            steps = self.generator.grid().n_fine_steps(),
            start_interval,
            assets = self.generator.n_assets(),
            rebalancing = ?self.settings.rebalancing,
            "starting TVS batch"
        );

        let mut report = BatchReport::new(self.settings.strike, self.discount, n_paths);
        for (p, path) in self.generator.stream(rng, n_paths).enumerate() {
            let i0 = restart.map_or(self.settings.initial_index, |r| r.initial_values[p]);
            let outcome = self.run_path_from(&path, i0, start_interval)?;
            if let Some(w) = writer.as_deref_mut() {
                w.write(outcome.terminal_value)?;
            }
            debug!(path = p, terminal = outcome.terminal_value, "path done");
            report.record(&outcome);
        }

        info!(
            n_paths,
            mean_index = ?report.statistics.mean(),
            error = ?report.statistics.error_estimate(),
            rebalances = report.rebalances,
            baseline_not_worse = report.baseline_not_worse,
            fallbacks = report.fallbacks,
            "TVS batch done"
        );
        Ok(report)
    }

    /// Apply Euler step `k` with weights `w`. When the exposure is undefined
    /// for re-optimised weights, the failure policy decides whether the
    /// step is retried with the baseline, which then replaces `w`.
    fn advance(
        &self,
        index: &mut IndexAccumulator,
        w: &mut Array,
        path: &SimulatedPath,
        k: usize,
        nu: &Matrix,
        outcome: &mut PathOutcome,
    ) -> Result<()> {
        let grid = self.generator.grid();
        let mode = self.optimizer.mode();
        let (ds_s, r, dt) = (path.returns(k), self.short_rates[k], grid.fine_dt(k));
        if let Err(e) = index.step(w, mode.investment_sum(w), ds_s, r, dt, nu) {
            let baseline = self.baseline.weights_at(grid.dates()[grid.interval_of(k)]);
            if self.settings.rebalancing == RebalancingPolicy::Baseline || &*w == baseline {
                return Err(e);
            }
            *w = self.fall_back(e, grid.fine_time(k), baseline, outcome)?;
            index.step(w, mode.investment_sum(w), ds_s, r, dt, nu)?;
        }
        Ok(())
    }

    /// Re-optimise at `date` given the simulated diffusion. Returns the new
    /// weights and whether the baseline scores at least as well.
    fn rebalance(&self, date: Real, baseline: &Array, nu: &Matrix) -> Result<(Array, bool)> {
        let mu = self.drift.at(date);
        let dynamic = self.optimizer.optimize(&mu, nu, Some(baseline))?;
        let dynamic_value = objective(&dynamic, &mu, nu)?;
        let not_worse = objective(baseline, &mu, nu).map_or(false, |b| b >= dynamic_value);
        Ok((dynamic, not_worse))
    }

    fn fall_back(
        &self,
        error: Error,
        t: Real,
        baseline: &Array,
        outcome: &mut PathOutcome,
    ) -> Result<Array> {
        match self.settings.failure_policy {
            FailurePolicy::Abort => Err(error),
            FailurePolicy::Fallback => {
                warn!(t, %error, "optimisation failed, using baseline weights");
                outcome.fallbacks += 1;
                Ok(baseline.clone())
            }
        }
    }
}

fn diffusion(vols: &Array, factor: &Matrix) -> Matrix {
    diag_times(vols.as_slice(), factor)
}

fn check_start_interval(grid: &TimeGrid, start_interval: usize) -> Result<()> {
    if start_interval >= grid.intervals() {
        return Err(Error::InvalidArgument(format!(
            "start interval {start_interval} is past the last of {} intervals",
            grid.intervals()
        )));
    }
    Ok(())
}

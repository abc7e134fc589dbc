//! Reinforcement-learning boundary.
//!
//! [`TvsEnvironment`] exposes one simulated path at a time as an episode:
//! the agent chooses weights at each rebalancing date, the index is
//! accumulated over the interval's Euler steps, and the discounted call
//! payoff is paid at maturity. The environment is a plain state machine and
//! knows nothing about any particular learning framework.

use crate::{
    accumulator::IndexAccumulator,
    config::TvsConfig,
    optimizer::{sign_renormalization, ConstraintMode, ONLY_LONG_FLOOR},
};
use std::sync::Arc;
use tracing::debug;
use tvs_core::{errors::Result, DiscountFactor, Error, Rate, Real, Volatility};
use tvs_math::{matrix_utilities::diag_times, Array, InverseCumulativeNormalRng, NormalGenerator};
use tvs_methods::{PathGenerator, SimulatedPath};
use tvs_termstructures::{integrated_variance, DiscountCurve, VarianceCurve};

/// Slack added to the long/short action box.
const ACTION_SLACK: Real = 1.0e-6;

/// Outcome of one [`Environment::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O> {
    /// Observation after the step.
    pub observation: O,
    /// Reward earned by the step.
    pub reward: Real,
    /// Whether the episode has ended.
    pub done: bool,
}

/// An episodic environment.
pub trait Environment {
    /// What the agent sees.
    type Observation;
    /// What the agent does.
    type Action;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Self::Observation>;

    /// Apply `action` to a running episode.
    fn step(&mut self, action: &Self::Action) -> Result<Transition<Self::Observation>>;

    /// Reseed the random source; returns the seed in use.
    fn seed(&mut self, seed: u64) -> u64;
}

/// Lifecycle of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvPhase {
    /// No episode in progress.
    AwaitingReset,
    /// An episode is running.
    Running,
    /// The last episode reached maturity.
    Terminated,
}

/// Target-volatility index environment over a local-volatility basket.
///
/// The observation at date `t_j` is
/// `[(ln(S_i/F_i) + ½ IV_i) / √IV_i …, t_j]` with `IV_i = ∫₀^{t_j} V_i`,
/// where `√IV_i` is taken as 1 at `t_0 = 0`.
#[derive(Debug)]
pub struct TvsEnvironment {
    generator: PathGenerator,
    mode: ConstraintMode,
    target_vol: Volatility,
    initial_index: Real,
    strike: Real,
    discount: DiscountFactor,
    short_rates: Vec<Rate>,
    half_iv: Vec<Array>,
    sqrt_iv: Vec<Array>,
    low: Array,
    high: Array,
    rng: InverseCumulativeNormalRng,
    phase: EnvPhase,
    path: Option<SimulatedPath>,
    index: Option<IndexAccumulator>,
    date_index: usize,
    episodes: usize,
}

impl TvsEnvironment {
    /// Build the environment for `config` on the paths of `generator`.
    /// `variance_curves` normalise the observations.
    pub fn new(
        generator: PathGenerator,
        variance_curves: &[Arc<dyn VarianceCurve>],
        discounting: &dyn DiscountCurve,
        config: &TvsConfig,
    ) -> Result<Self> {
        config.validate()?;
        let n = generator.n_assets();
        if variance_curves.len() != n {
            return Err(Error::InvalidArgument(format!(
                "{n} assets but {} variance curves",
                variance_curves.len()
            )));
        }

        let grid = generator.grid();
        let mut half_iv = Vec::with_capacity(grid.dates().len());
        let mut sqrt_iv = Vec::with_capacity(grid.dates().len());
        for &t in grid.dates() {
            let iv = variance_curves
                .iter()
                .map(|v| integrated_variance(v.as_ref(), 0.0, t))
                .collect::<Result<Vec<_>>>()?;
            half_iv.push(Array::from_iterator(n, iv.iter().map(|v| 0.5 * v)));
            sqrt_iv.push(Array::from_iterator(
                n,
                iv.iter().map(|&v| if t == 0.0 { 1.0 } else { v.sqrt() }),
            ));
        }

        let (low, high) = match config.constraint {
            ConstraintMode::OnlyLong => (
                Array::from_element(n, ONLY_LONG_FLOOR),
                Array::from_element(n, 1.0),
            ),
            ConstraintMode::LongShortLimit { .. } => {
                let b = config.action_bound.abs() + ACTION_SLACK;
                (Array::from_element(n, -b), Array::from_element(n, b))
            }
        };

        let short_rates = discounting.short_rates(&grid.fine_times()[..grid.n_fine_steps()]);
        let discount = discounting.discount(grid.maturity());
        Ok(Self {
            generator,
            mode: config.constraint,
            target_vol: config.target_volatility,
            initial_index: config.initial_index,
            strike: config.strike,
            discount,
            short_rates,
            half_iv,
            sqrt_iv,
            low,
            high,
            rng: InverseCumulativeNormalRng::new(config.seed()),
            phase: EnvPhase::AwaitingReset,
            path: None,
            index: None,
            date_index: 0,
            episodes: 0,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> EnvPhase {
        self.phase
    }

    /// Current index value, if an episode has started.
    pub fn index_value(&self) -> Option<Real> {
        self.index.as_ref().map(IndexAccumulator::value)
    }

    /// Lower and upper bounds of admissible actions.
    pub fn action_bounds(&self) -> (&Array, &Array) {
        (&self.low, &self.high)
    }

    /// Length of an observation: one entry per asset plus time.
    pub fn observation_len(&self) -> usize {
        self.generator.n_assets() + 1
    }

    /// Episodes started so far.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    fn observation(&self, path: &SimulatedPath, j: usize) -> Array {
        let grid = self.generator.grid();
        let n = self.generator.n_assets();
        let lm = path.log_moneyness(j * grid.fine_steps());
        let mut obs = Array::zeros(n + 1);
        for i in 0..n {
            obs[i] = (lm[i] + self.half_iv[j][i]) / self.sqrt_iv[j][i];
        }
        obs[n] = grid.dates()[j];
        obs
    }

    fn weights(&self, action: &Array) -> (Array, Real) {
        match self.mode {
            ConstraintMode::OnlyLong => (action / action.sum(), 1.0),
            ConstraintMode::LongShortLimit {
                long_limit,
                short_limit,
            } => {
                let w = sign_renormalization(action, long_limit, short_limit);
                let s = w.sum();
                (w, s)
            }
        }
    }
}

impl Environment for TvsEnvironment {
    type Observation = Array;
    type Action = Array;

    fn reset(&mut self) -> Result<Array> {
        let path = self.generator.next_path(&mut self.rng);
        let obs = self.observation(&path, 0);
        self.index = Some(IndexAccumulator::new(self.initial_index, self.target_vol)?);
        self.path = Some(path);
        self.date_index = 0;
        self.phase = EnvPhase::Running;
        self.episodes += 1;
        Ok(obs)
    }

    /// # Panics
    /// When `action` has the wrong length or lies outside
    /// [`TvsEnvironment::action_bounds`].
    fn step(&mut self, action: &Array) -> Result<Transition<Array>> {
        tvs_core::ensure!(
            self.phase == EnvPhase::Running,
            "step called in phase {:?}",
            self.phase
        );
        assert!(
            action.len() == self.low.len()
                && action
                    .iter()
                    .zip(self.low.iter().zip(self.high.iter()))
                    .all(|(a, (lo, hi))| (*lo..=*hi).contains(a)),
            "action {:?} outside [{:?}, {:?}]",
            action.as_slice(),
            self.low.as_slice(),
            self.high.as_slice()
        );
        let (Some(path), Some(index)) = (self.path.as_ref(), self.index.as_ref()) else {
            tvs_core::fail!("running episode without a path");
        };

        let (w, s) = self.weights(action);
        let grid = self.generator.grid();
        let factor = self.generator.model().correlation().factor();
        let first = self.date_index * grid.fine_steps();
        let mut next = index.clone();
        for k in first..first + grid.fine_steps() {
            let nu = diag_times(path.vols(k).as_slice(), factor);
            next.step(&w, s, path.returns(k), self.short_rates[k], grid.fine_dt(k), &nu)?;
        }

        let j = self.date_index + 1;
        let observation = self.observation(path, j);
        let done = j == grid.intervals();
        let reward = if done {
            next.payoff(self.strike, self.discount)
        } else {
            0.0
        };
        if done {
            debug!(
                episode = self.episodes,
                terminal = next.value(),
                reward,
                "episode finished"
            );
        }

        self.index = Some(next);
        self.date_index = j;
        if done {
            self.phase = EnvPhase::Terminated;
        }
        Ok(Transition {
            observation,
            reward,
            done,
        })
    }

    fn seed(&mut self, seed: u64) -> u64 {
        self.rng.set_seed(seed);
        seed
    }
}

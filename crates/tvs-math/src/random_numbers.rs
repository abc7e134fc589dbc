//! Random number generators.
//!
//! Simulation code never touches a process-wide generator: every path
//! generator, optimiser and environment owns a [`NormalGenerator`] (or a
//! uniform generator) seeded explicitly, so a run is reproducible from its
//! seed alone.

use rand::Rng;
use rand_mt::Mt19937GenRand64;
use tvs_core::Real;

/// A seedable source of standard-normal deviates.
pub trait NormalGenerator: Send {
    /// Draw the next standard-normal deviate.
    fn next_normal(&mut self) -> Real;

    /// Restart the stream from `seed`.
    fn set_seed(&mut self, seed: u64);

    /// Fill `out` with independent standard-normal deviates.
    fn fill_normals(&mut self, out: &mut [Real]) {
        for v in out.iter_mut() {
            *v = self.next_normal();
        }
    }
}

/// A uniform pseudo-random number generator based on the Mersenne Twister
/// MT19937-64 algorithm.
#[derive(Clone)]
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl std::fmt::Debug for MersenneTwisterUniformRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MersenneTwisterUniformRng").finish_non_exhaustive()
    }
}

impl MersenneTwisterUniformRng {
    /// Create a new generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Restart the stream from `seed`.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = Mt19937GenRand64::new(seed);
    }

    /// Generate the next uniform deviate in `[0, 1)` from 53 random bits.
    pub fn next_real(&mut self) -> Real {
        self.rng.gen::<Real>()
    }

    /// Uniform deviate in `[lo, hi)`.
    pub fn next_in(&mut self, lo: Real, hi: Real) -> Real {
        lo + (hi - lo) * self.next_real()
    }
}

/// An inverse-cumulative normal random number generator.
///
/// Wraps a Mersenne Twister and maps its uniforms through the inverse CDF of
/// the standard normal distribution.
#[derive(Debug, Clone)]
pub struct InverseCumulativeNormalRng {
    inner: MersenneTwisterUniformRng,
}

impl InverseCumulativeNormalRng {
    /// Create a new generator backed by a Mersenne Twister with the given
    /// seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: MersenneTwisterUniformRng::new(seed),
        }
    }
}

impl NormalGenerator for InverseCumulativeNormalRng {
    fn next_normal(&mut self) -> Real {
        // exact 0 would map to -∞
        let u = loop {
            let u = self.inner.next_real();
            if u > 0.0 {
                break u;
            }
        };
        crate::distributions::normal_cdf_inverse(u)
    }

    fn set_seed(&mut self, seed: u64) {
        self.inner.set_seed(seed);
    }
}

//! Seedable RNG wrapper used for conflict tie-breaks.
//!
//! A fixed seed makes a run reproducible: with the same orders issued in the
//! same ticks, the same contenders win.  Production hosts usually leave the
//! seed unset and draw from OS entropy.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Engine-level RNG.
///
/// Used only from the scheduler task, so it needs no synchronisation.
#[derive(Debug, Clone)]
pub struct EngineRng(SmallRng);

impl EngineRng {
    pub fn new(seed: u64) -> Self {
        EngineRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        EngineRng(SmallRng::from_entropy())
    }

    /// `new(seed)` when a seed is given, otherwise `from_entropy()`.
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::new)
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Uniform index in `0..len`.  Returns `None` for an empty range.
    #[inline]
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.0.gen_range(0..len))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}

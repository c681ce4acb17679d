//! Choosing the winner when several agents want the same cell.
//!
//! The tie-break is injected into the [`Scheduler`](crate::Scheduler) so
//! tests can force outcomes.  The production default,
//! [`RandomTieBreak`], draws uniformly from the contenders.  It keeps no
//! memory across ticks: an agent can lose several ticks in a row.

use rc_core::{AgentId, EngineRng};

/// Picks one winner among two or more contenders for a cell.
pub trait TieBreak: Send {
    /// Index into `contenders` of the agent that proceeds.  `contenders`
    /// holds at least two ids in ascending order.  Out-of-range indices are
    /// clamped to the last contender.
    fn pick(&mut self, contenders: &[AgentId]) -> usize;
}

impl<F> TieBreak for F
where
    F: FnMut(&[AgentId]) -> usize + Send,
{
    fn pick(&mut self, contenders: &[AgentId]) -> usize {
        self(contenders)
    }
}

/// Uniform random choice.
#[derive(Debug, Clone)]
pub struct RandomTieBreak {
    rng: EngineRng,
}

impl RandomTieBreak {
    pub fn new(rng: EngineRng) -> Self {
        Self { rng }
    }

    /// Seeded when `seed` is set, otherwise from OS entropy.
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        Self::new(EngineRng::from_seed_opt(seed))
    }
}

impl TieBreak for RandomTieBreak {
    fn pick(&mut self, contenders: &[AgentId]) -> usize {
        self.rng.pick_index(contenders.len()).unwrap_or(0)
    }
}

/// The lowest agent id always wins.
#[derive(Copy, Clone, Debug, Default)]
pub struct LowestIdTieBreak;

impl TieBreak for LowestIdTieBreak {
    fn pick(&mut self, _contenders: &[AgentId]) -> usize {
        0
    }
}

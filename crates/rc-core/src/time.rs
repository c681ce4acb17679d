//! Scheduler time model.
//!
//! Time is a monotonically increasing `Tick` counter.  One tick is one
//! scheduler step in which every active movement may advance at most one
//! cell.  The wall-clock length of a tick is the configured movement speed
//! and is held in [`TickClock`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute scheduler tick counter.  Tick 0 is "before the first step".
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// The tick immediately after `self`.
    #[inline]
    pub fn next(self) -> Tick {
        self.offset(1)
    }

    /// Ticks elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TickClock ─────────────────────────────────────────────────────────────────

/// Tracks the last processed tick and the tick period.
#[derive(Clone, Debug)]
pub struct TickClock {
    /// The most recently completed tick.
    pub current_tick: Tick,
    /// Wall-clock time between ticks.
    pub period: Duration,
}

impl TickClock {
    pub fn new(period: Duration) -> Self {
        Self { current_tick: Tick::ZERO, period }
    }

    /// The tick that the next step will process.
    #[inline]
    pub fn upcoming(&self) -> Tick {
        self.current_tick.next()
    }

    /// Mark `tick` as processed.  Ticks never move backwards.
    #[inline]
    pub fn complete(&mut self, tick: Tick) {
        self.current_tick = self.current_tick.max(tick);
    }

    /// Wall-clock time represented by the completed ticks.
    pub fn elapsed(&self) -> Duration {
        self.period.saturating_mul(self.current_tick.0.min(u32::MAX as u64) as u32)
    }

    /// How many ticks fit in `span` (rounds up, so a span is never cut short).
    pub fn ticks_for(&self, span: Duration) -> u64 {
        let period = self.period.as_millis().max(1);
        span.as_millis().div_ceil(period) as u64
    }
}

impl fmt::Display for TickClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} ms/tick)", self.current_tick, self.period.as_millis())
    }
}

//! Plain data row types written by trace backends.

use std::fmt;

use rc_core::Cell;
use rc_movement::PauseReason;

/// What happened to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    Order,
    Redirect,
    AlreadyThere,
    Step,
    YieldConflict,
    YieldBlocked,
    YieldHost,
    StepFailed,
    Complete,
    Cancel,
}

impl TraceEvent {
    pub fn yielded(reason: PauseReason) -> Self {
        match reason {
            PauseReason::Conflict => TraceEvent::YieldConflict,
            PauseReason::Blocked => TraceEvent::YieldBlocked,
            PauseReason::Host => TraceEvent::YieldHost,
        }
    }

    /// Column value in the `event` field.
    pub fn as_str(self) -> &'static str {
        match self {
            TraceEvent::Order => "order",
            TraceEvent::Redirect => "redirect",
            TraceEvent::AlreadyThere => "already_there",
            TraceEvent::Step => "step",
            TraceEvent::YieldConflict => "yield_conflict",
            TraceEvent::YieldBlocked => "yield_blocked",
            TraceEvent::YieldHost => "yield_host",
            TraceEvent::StepFailed => "step_failed",
            TraceEvent::Complete => "complete",
            TraceEvent::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One agent event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRow {
    pub tick:     u64,
    pub agent_id: u32,
    pub event:    TraceEvent,
    /// Destination for orders, entered cell for steps, resting cell for
    /// cancels.  `None` for yields and completions.
    pub cell:     Option<Cell>,
}

/// Counts for one engine tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:      u64,
    pub advanced:  u64,
    pub yielded:   u64,
    pub completed: u64,
    pub failed:    u64,
    /// Movements still live after the tick.
    pub active:    u64,
}

//! Movement lifecycle states.

/// Why a movement is not advancing.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PauseReason {
    /// Lost a same-cell contention this tick.  Lasts one tick.
    Conflict,
    /// Next cell is held by another agent.  Lasts one tick.
    Blocked,
    /// Host-wide pause.  Lasts until resumed.
    Host,
}

/// Lifecycle of one movement.
///
/// ```text
/// Moving ──▶ Paused(Conflict | Blocked) ──(next tick)──▶ Moving
/// Moving ──pause_all──▶ Paused(Host) ──resume_all──▶ Moving
/// Moving ──▶ Completed | Cancelled
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum MovementState {
    Moving,
    Paused(PauseReason),
    Completed,
    Cancelled,
}

impl MovementState {
    /// `true` while the movement still wants to advance: `Moving`, or a
    /// one-tick pause that clears by itself.
    #[inline]
    pub fn is_moving(self) -> bool {
        matches!(
            self,
            MovementState::Moving
                | MovementState::Paused(PauseReason::Conflict | PauseReason::Blocked)
        )
    }

    /// `true` for any non-terminal state.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, MovementState::Moving | MovementState::Paused(_))
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    #[inline]
    pub fn is_host_paused(self) -> bool {
        self == MovementState::Paused(PauseReason::Host)
    }
}

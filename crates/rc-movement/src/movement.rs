//! One agent's in-progress journey.

use rc_core::{AgentId, Cell, ColorTag, OrderId, Tick};
use rc_spatial::Route;

use crate::{MovementError, MovementResult, MovementState, PauseReason};

/// The engine's record of one agent moving along a route.
///
/// `0 <= cursor < route.len()` always holds.  `route[cursor]` is the cell the
/// agent was last committed to.
#[derive(Clone, Debug, PartialEq)]
pub struct Movement {
    pub agent:         AgentId,
    /// Changes on every redirection.
    pub order:         OrderId,
    pub route:         Route,
    pub cursor:        usize,
    pub state:         MovementState,
    pub color:         ColorTag,
    /// Consecutive ticks spent blocked by another agent's hold.
    pub blocked_ticks: u32,
    /// Tick at which the current route was accepted.
    pub started:       Tick,
}

impl Movement {
    pub fn new(
        agent: AgentId,
        order: OrderId,
        route: Route,
        color: ColorTag,
        state: MovementState,
        started: Tick,
    ) -> Self {
        Self { agent, order, route, cursor: 0, state, color, blocked_ticks: 0, started }
    }

    #[inline]
    pub fn destination(&self) -> Cell {
        self.route.destination()
    }

    #[inline]
    pub fn current_cell(&self) -> Cell {
        self.route[self.cursor]
    }

    /// `route[cursor + 1]`, if the route continues.
    #[inline]
    pub fn next_cell(&self) -> Option<Cell> {
        self.route.get(self.cursor + 1)
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.cursor >= self.route.last_index()
    }

    /// `cursor / (len - 1)`, or 1.0 for a one-cell route.
    pub fn progress(&self) -> f32 {
        let last = self.route.last_index();
        if last == 0 {
            return 1.0;
        }
        self.cursor as f32 / last as f32
    }

    /// Trail opacity for the current progress.
    #[inline]
    pub fn trail_alpha(&self) -> f32 {
        (1.0 - self.progress()).max(0.0)
    }

    /// The cell `steps` ahead of the cursor, clamped to the destination.
    #[inline]
    pub fn lookahead(&self, steps: usize) -> Cell {
        self.route.clamped(self.cursor.saturating_add(steps))
    }

    /// Cells from the cursor to the destination.
    pub fn remaining(&self) -> &[Cell] {
        &self.route.cells()[self.cursor..]
    }

    /// Move the cursor one cell forward and return the entered cell.
    /// Reaching the last index completes the movement.
    pub fn advance(&mut self) -> MovementResult<Cell> {
        if !self.state.is_active() {
            return Err(MovementError::NotActive(self.agent));
        }
        if self.at_end() {
            return Err(MovementError::RouteExhausted(self.agent));
        }
        self.cursor += 1;
        self.blocked_ticks = 0;
        self.state = if self.at_end() { MovementState::Completed } else { MovementState::Moving };
        Ok(self.current_cell())
    }

    /// Replace the route, keeping the record.  A host pause survives the
    /// redirection; any other state restarts as `Moving`.
    pub fn redirect(&mut self, order: OrderId, route: Route, started: Tick) {
        self.order = order;
        self.route = route;
        self.cursor = 0;
        self.blocked_ticks = 0;
        self.started = started;
        if !self.state.is_host_paused() {
            self.state = MovementState::Moving;
        }
    }

    /// Clear a one-tick pause.  Host pauses are untouched.
    #[inline]
    pub fn clear_transient_pause(&mut self) {
        if matches!(self.state, MovementState::Paused(PauseReason::Conflict | PauseReason::Blocked)) {
            self.state = MovementState::Moving;
        }
    }
}

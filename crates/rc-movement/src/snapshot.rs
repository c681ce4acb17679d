//! Read-only copies of movement state for observers outside the scheduler.

use std::collections::BTreeMap;

use rc_core::{AgentId, Cell, OrderId, Tick};
use rc_spatial::Route;

use crate::{Movement, MovementState, MovementStore};

/// What a reader may know about one movement.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementView {
    pub order:  OrderId,
    pub route:  Route,
    pub cursor: usize,
    pub state:  MovementState,
}

impl MovementView {
    /// The cell `steps` ahead of the cursor, clamped to the destination.
    #[inline]
    pub fn lookahead(&self, steps: usize) -> Cell {
        self.route.clamped(self.cursor.saturating_add(steps))
    }

    #[inline]
    pub fn current_cell(&self) -> Cell {
        self.route[self.cursor]
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.cursor >= self.route.last_index()
    }
}

impl From<&Movement> for MovementView {
    fn from(m: &Movement) -> Self {
        Self { order: m.order, route: m.route.clone(), cursor: m.cursor, state: m.state }
    }
}

/// Every live movement as of the end of `tick`.
///
/// Routes are shared, so a snapshot costs one map of small records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovementSnapshot {
    pub tick:    Tick,
    pub entries: BTreeMap<AgentId, MovementView>,
}

impl MovementSnapshot {
    pub fn capture(tick: Tick, store: &MovementStore) -> Self {
        Self { tick, entries: store.iter().map(|m| (m.agent, MovementView::from(m))).collect() }
    }

    #[inline]
    pub fn get(&self, agent: AgentId) -> Option<&MovementView> {
        self.entries.get(&agent)
    }

    #[inline]
    pub fn is_moving(&self, agent: AgentId) -> bool {
        self.get(agent).is_some_and(|v| v.state.is_moving())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

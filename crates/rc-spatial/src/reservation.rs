//! Cell → (agent, tick) reservation table.
//!
//! Reservations are advisory.  The scheduler consults the table during its
//! detection pass and writes it during its commit pass; nothing else touches
//! it.  Every operation is total: absent entries are simply absent.

use rc_core::{AgentId, Cell, Tick};

use crate::CellMap;

/// One claim on a cell.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Reservation {
    pub agent: AgentId,
    /// The claim blocks other agents at ticks strictly before this one.
    pub tick:  Tick,
}

/// At most one live reservation per cell.
#[derive(Default, Debug, Clone)]
pub struct ReservationTable {
    entries: CellMap<Reservation>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or overwrite the entry for `cell`.
    pub fn reserve(&mut self, cell: Cell, agent: AgentId, tick: Tick) {
        self.entries.insert(cell, Reservation { agent, tick });
    }

    /// Remove the entry for `cell`, whoever holds it.
    pub fn release(&mut self, cell: Cell) -> Option<Reservation> {
        self.entries.remove(&cell)
    }

    /// Remove the entry for `cell` only if `agent` holds it.
    pub fn release_owned(&mut self, cell: Cell, agent: AgentId) -> bool {
        match self.entries.get(&cell) {
            Some(r) if r.agent == agent => {
                self.entries.remove(&cell);
                true
            }
            _ => false,
        }
    }

    /// Remove every entry held by `agent`.  Returns how many were removed.
    pub fn release_agent(&mut self, agent: AgentId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, r| r.agent != agent);
        before - self.entries.len()
    }

    /// `true` only if a *different* agent holds `cell` with a tick later
    /// than `at_tick`.  Stale entries do not block.
    pub fn is_reserved(&self, cell: Cell, asking: AgentId, at_tick: Tick) -> bool {
        self.entries
            .get(&cell)
            .is_some_and(|r| r.agent != asking && r.tick > at_tick)
    }

    pub fn holder(&self, cell: Cell) -> Option<Reservation> {
        self.entries.get(&cell).copied()
    }

    /// Cells held by `agent`, in no particular order.
    pub fn cells_held_by(&self, agent: AgentId) -> Vec<Cell> {
        self.entries
            .iter()
            .filter(|(_, r)| r.agent == agent)
            .map(|(&c, _)| c)
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

//! The `MovementStore`: at most one live [`Movement`] per agent.

use std::collections::BTreeMap;

use rc_core::AgentId;

use crate::{Movement, MovementError, MovementResult};

/// Live movements keyed by agent.
///
/// A `BTreeMap` keeps iteration in agent order, so every pass over the store
/// is deterministic for a given seed.
#[derive(Default, Debug, Clone)]
pub struct MovementStore {
    movements: BTreeMap<AgentId, Movement>,
}

impl MovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `movement`, returning the one it replaced.
    pub fn insert(&mut self, movement: Movement) -> Option<Movement> {
        self.movements.insert(movement.agent, movement)
    }

    pub fn remove(&mut self, agent: AgentId) -> Option<Movement> {
        self.movements.remove(&agent)
    }

    #[inline]
    pub fn get(&self, agent: AgentId) -> Option<&Movement> {
        self.movements.get(&agent)
    }

    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> Option<&mut Movement> {
        self.movements.get_mut(&agent)
    }

    /// Like [`get_mut`](Self::get_mut) but an absent agent is an error.
    pub fn require_mut(&mut self, agent: AgentId) -> MovementResult<&mut Movement> {
        self.movements.get_mut(&agent).ok_or(MovementError::UnknownAgent(agent))
    }

    #[inline]
    pub fn contains(&self, agent: AgentId) -> bool {
        self.movements.contains_key(&agent)
    }

    /// `true` if `agent` has a movement that still wants to advance.
    #[inline]
    pub fn is_moving(&self, agent: AgentId) -> bool {
        self.get(agent).is_some_and(|m| m.state.is_moving())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movement> {
        self.movements.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Movement> {
        self.movements.values_mut()
    }

    /// Agent ids in ascending order.
    pub fn agents(&self) -> Vec<AgentId> {
        self.movements.keys().copied().collect()
    }

    /// Movements that are not host-paused and not terminal.
    pub fn moving_count(&self) -> usize {
        self.iter().filter(|m| m.state.is_moving()).count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// Remove and return every movement.
    pub fn drain(&mut self) -> Vec<Movement> {
        std::mem::take(&mut self.movements).into_values().collect()
    }
}

//! The synchronous tick core.
//!
//! # Tick algorithm
//!
//! ```text
//! detect(t):
//!   ① Holds      every live movement stamps its current cell until t+1
//!   ② Clear      one-tick pauses (Conflict, Blocked) revert to Moving
//!   ③ Wants      each Moving movement names route[cursor + 1]
//!                  held by another agent → Paused(Blocked), unless the
//!                  holders chain back to it and every agent on that
//!                  cycle has been blocked max_blocked_ticks (all pass)
//!   ④ Contention per wanted cell, ascending: the tie-break picks one
//!                winner, the rest → Paused(Conflict)
//!
//! commit(plan, failed):
//!   ⑤ Advance    approved steps whose movement is unchanged; release the
//!                cell left (if still owned), hold the cell entered
//!   ⑥ Complete   movements at their destination are torn down
//! ```
//!
//! Detection sees one consistent picture of where every agent stands: no
//! step of tick `t` is visible to any detection of tick `t`.  Neither pass
//! awaits.  The async engine issues position updates between the two.
//!
//! Visual effects are not sent from here.  They accumulate in an outbox that
//! the caller drains with [`Scheduler::take_effects`].

use std::collections::BTreeMap;

use rc_core::{AgentId, Cell, EngineConfig, OrderId, Tick, TickClock};
use rc_effects::{EffectKind, EffectRequest};
use rc_movement::{Movement, MovementSnapshot, MovementState, MovementStore, PauseReason};
use rc_spatial::{CellMap, ReservationTable, Route};
use tracing::{debug, warn};

use crate::tiebreak::TieBreak;

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// What [`Scheduler::order`] did.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OrderOutcome {
    /// A new movement was created.
    Started(OrderId),
    /// The agent's existing movement now follows the new route from cursor 0.
    Redirected(OrderId),
    /// The route was a single cell.  No movement exists for the agent.
    AlreadyThere,
}

impl OrderOutcome {
    /// `true` if the agent now has a movement for this order.
    #[inline]
    pub fn is_accepted(self) -> bool {
        !matches!(self, OrderOutcome::AlreadyThere)
    }

    pub fn order(self) -> Option<OrderId> {
        match self {
            OrderOutcome::Started(o) | OrderOutcome::Redirected(o) => Some(o),
            OrderOutcome::AlreadyThere => None,
        }
    }
}

/// One step approved by the detection pass.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Step {
    pub agent:  AgentId,
    /// Order the step was approved for.
    pub order:  OrderId,
    /// Cursor before the step.
    pub cursor: usize,
    pub from:   Cell,
    pub to:     Cell,
}

/// Result of the detection pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickPlan {
    pub tick:    Tick,
    /// Approved steps in ascending agent order.  No two share a `to` cell.
    pub steps:   Vec<Step>,
    pub yielded: Vec<(AgentId, PauseReason)>,
}

/// Everything that happened in one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick:      Tick,
    /// `(agent, entered cell)` for every committed step.
    pub advanced:  Vec<(AgentId, Cell)>,
    pub yielded:   Vec<(AgentId, PauseReason)>,
    pub completed: Vec<AgentId>,
    /// `(agent, target cell)` for steps whose position update failed.
    pub failed:    Vec<(AgentId, Cell)>,
    /// Live movements after the commit.
    pub active:    usize,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Owns every live movement and the reservation table.
///
/// Nothing else writes either of them.  Readers outside the engine task get
/// [`MovementSnapshot`]s.
pub struct Scheduler {
    config:       EngineConfig,
    clock:        TickClock,
    movements:    MovementStore,
    reservations: ReservationTable,
    tie_break:    Box<dyn TieBreak>,
    next_order:   OrderId,
    host_paused:  bool,
    outbox:       Vec<EffectRequest>,
}

impl Scheduler {
    pub fn new(config: &EngineConfig, tie_break: Box<dyn TieBreak>) -> Self {
        Self {
            clock:        TickClock::new(config.tick_period()),
            config:       config.clone(),
            movements:    MovementStore::new(),
            reservations: ReservationTable::new(),
            tie_break,
            next_order:   OrderId(1),
            host_paused:  false,
            outbox:       Vec::new(),
        }
    }

    // ── Entry points ──────────────────────────────────────────────────────

    /// Start `agent` along `route`, or redirect its current movement.
    ///
    /// A redirection releases every reservation of the old route and asks
    /// for the old visuals to be removed before the new ones are drawn.  A
    /// one-cell route tears down any existing movement instead.
    pub fn order(&mut self, agent: AgentId, route: Route) -> OrderOutcome {
        if route.is_trivial() {
            if let Some(mut m) = self.movements.remove(agent) {
                m.state = MovementState::Cancelled;
                self.teardown(&m);
                debug!(%agent, "order to current cell ended movement");
            }
            return OrderOutcome::AlreadyThere;
        }

        let now = self.clock.current_tick;
        let order = self.next_order;
        self.next_order = order.next();

        let outcome = match self.movements.get_mut(agent) {
            Some(m) => {
                m.redirect(order, route.clone(), now);
                OrderOutcome::Redirected(order)
            }
            None => {
                let state = if self.host_paused {
                    MovementState::Paused(PauseReason::Host)
                } else {
                    MovementState::Moving
                };
                let color = self.config.marker_color.clone();
                self.movements.insert(Movement::new(agent, order, route.clone(), color, state, now));
                OrderOutcome::Started(order)
            }
        };

        let redirected = matches!(outcome, OrderOutcome::Redirected(_));
        if redirected {
            self.reservations.release_agent(agent);
        }
        self.reservations.reserve(route.start(), agent, self.clock.upcoming().next());

        if self.config.draw_trails {
            if redirected {
                self.outbox.push(EffectRequest::delete(agent, EffectKind::Trail));
                self.outbox.push(EffectRequest::delete(agent, EffectKind::Marker));
            }
            let color = &self.config.marker_color;
            self.outbox.push(EffectRequest::create_trail(agent, route.cells().to_vec(), color.clone()));
            self.outbox.push(EffectRequest::create_marker(agent, route.destination(), color.clone()));
        }

        debug!(%agent, %order, len = route.len(), redirected, "order accepted");
        outcome
    }

    /// Host-pause every live movement.  Orders accepted until
    /// [`resume_all`](Self::resume_all) start paused.  Returns how many
    /// movements changed state.
    pub fn pause_all(&mut self) -> usize {
        self.host_paused = true;
        let mut n = 0;
        for m in self.movements.iter_mut() {
            if m.state.is_active() && !m.state.is_host_paused() {
                m.state = MovementState::Paused(PauseReason::Host);
                n += 1;
            }
        }
        n
    }

    /// Clear every host pause.  Returns how many movements resumed.
    pub fn resume_all(&mut self) -> usize {
        self.host_paused = false;
        let mut n = 0;
        for m in self.movements.iter_mut() {
            if m.state.is_host_paused() {
                m.state = MovementState::Moving;
                n += 1;
            }
        }
        n
    }

    /// Cancel and remove the movement of `agent`.  `None` if there was none,
    /// so cancelling twice is harmless.
    pub fn cancel(&mut self, agent: AgentId) -> Option<Movement> {
        let mut m = self.movements.remove(agent)?;
        m.state = MovementState::Cancelled;
        self.teardown(&m);
        debug!(%agent, at = %m.current_cell(), "movement cancelled");
        Some(m)
    }

    /// Cancel every movement, in agent order.
    pub fn cancel_all(&mut self) -> Vec<Movement> {
        self.movements
            .agents()
            .into_iter()
            .filter_map(|agent| self.cancel(agent))
            .collect()
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Decide who moves in the next tick.  Mutates pause states and holds,
    /// never cursors.
    pub fn detect(&mut self) -> TickPlan {
        let tick = self.clock.upcoming();
        let hold_until = tick.next();
        let max_blocked = self.config.max_blocked_ticks;

        let mut intents: BTreeMap<AgentId, Intent> = BTreeMap::new();
        for m in self.movements.iter_mut() {
            self.reservations.reserve(m.current_cell(), m.agent, hold_until);
            m.clear_transient_pause();
            if m.state != MovementState::Moving {
                continue;
            }
            if let Some(next) = m.next_cell() {
                intents.insert(m.agent, Intent { next, stuck: m.blocked_ticks >= max_blocked });
            }
        }

        let mut yielded = Vec::new();
        let mut wants: CellMap<Vec<AgentId>> = CellMap::default();
        for m in self.movements.iter_mut() {
            let Some(&Intent { next, .. }) = intents.get(&m.agent) else { continue };
            if self.reservations.is_reserved(next, m.agent, tick) {
                if !stuck_cycle(&self.reservations, &intents, m.agent, tick) {
                    m.blocked_ticks = m.blocked_ticks.saturating_add(1);
                    m.state = MovementState::Paused(PauseReason::Blocked);
                    yielded.push((m.agent, PauseReason::Blocked));
                    continue;
                }
                debug!(agent = %m.agent, cell = %next, %tick, "blocked in a cycle too long, passing through");
            }
            wants.entry(next).or_default().push(m.agent);
        }

        // Sorted so a seeded tie-break replays identically.
        let mut contested: Vec<(Cell, Vec<AgentId>)> = wants.into_iter().collect();
        contested.sort_unstable_by_key(|(cell, _)| *cell);

        let mut steps = Vec::new();
        for (cell, agents) in contested {
            let winner = match agents.len() {
                1 => agents[0],
                n => {
                    let w = agents[self.tie_break.pick(&agents).min(n - 1)];
                    debug!(%tick, %cell, contenders = n, winner = %w, "contention resolved");
                    w
                }
            };
            for &agent in &agents {
                let Some(m) = self.movements.get_mut(agent) else { continue };
                if agent == winner {
                    steps.push(Step {
                        agent,
                        order:  m.order,
                        cursor: m.cursor,
                        from:   m.current_cell(),
                        to:     cell,
                    });
                } else {
                    m.state = MovementState::Paused(PauseReason::Conflict);
                    yielded.push((agent, PauseReason::Conflict));
                }
            }
        }

        steps.sort_unstable_by_key(|s| s.agent);
        yielded.sort_unstable_by_key(|&(agent, _)| agent);
        TickPlan { tick, steps, yielded }
    }

    /// Apply the steps of `plan`, except those of agents listed in `failed`.
    ///
    /// Steps whose movement was redirected, removed or paused since
    /// detection are dropped.
    pub fn commit(&mut self, plan: TickPlan, failed: &[AgentId]) -> TickReport {
        let TickPlan { tick, steps, yielded } = plan;
        let hold_until = tick.next();
        let mut report = TickReport { tick, yielded, ..TickReport::default() };

        for step in steps {
            if failed.contains(&step.agent) {
                report.failed.push((step.agent, step.to));
                continue;
            }
            let Some(m) = self.movements.get_mut(step.agent) else {
                debug!(agent = %step.agent, %tick, "step dropped: movement gone");
                continue;
            };
            if m.order != step.order || m.cursor != step.cursor || m.state != MovementState::Moving {
                debug!(agent = %step.agent, %tick, "step dropped: movement changed");
                continue;
            }
            let entered = match m.advance() {
                Ok(cell) => cell,
                Err(e) => {
                    warn!(agent = %step.agent, error = %e, "step rejected");
                    continue;
                }
            };

            self.reservations.release_owned(step.from, step.agent);
            self.reservations.reserve(entered, step.agent, hold_until);
            report.advanced.push((step.agent, entered));

            if m.state == MovementState::Completed {
                report.completed.push(step.agent);
            } else if self.config.draw_trails {
                self.outbox.push(EffectRequest::fade_trail(step.agent, m.trail_alpha()));
            }
        }

        for &agent in &report.completed {
            if let Some(m) = self.movements.remove(agent) {
                self.teardown(&m);
                debug!(%agent, %tick, at = %m.destination(), "movement completed");
            }
        }

        self.clock.complete(tick);
        report.active = self.movements.len();
        report
    }

    /// `detect` followed by `commit` with every position update succeeding.
    pub fn run_tick(&mut self) -> TickReport {
        let plan = self.detect();
        self.commit(plan, &[])
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Drain the effect requests emitted since the last call, in order.
    pub fn take_effects(&mut self) -> Vec<EffectRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> MovementSnapshot {
        MovementSnapshot::capture(self.clock.current_tick, &self.movements)
    }

    #[inline]
    pub fn is_moving(&self, agent: AgentId) -> bool {
        self.movements.is_moving(agent)
    }

    /// `true` if some movement still wants to advance.  The engine suspends
    /// its ticker otherwise.
    #[inline]
    pub fn has_moving(&self) -> bool {
        self.movements.iter().any(|m| m.state.is_moving())
    }

    #[inline]
    pub fn is_host_paused(&self) -> bool {
        self.host_paused
    }

    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    #[inline]
    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    #[inline]
    pub fn movement(&self, agent: AgentId) -> Option<&Movement> {
        self.movements.get(agent)
    }

    #[inline]
    pub fn movements(&self) -> &MovementStore {
        &self.movements
    }

    #[inline]
    pub fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn teardown(&mut self, m: &Movement) {
        self.reservations.release_agent(m.agent);
        if self.config.draw_trails {
            self.outbox.push(EffectRequest::ClearAgent { agent: m.agent });
        }
    }
}

/// Where a `Moving` agent means to step this tick.
#[derive(Copy, Clone, Debug)]
struct Intent {
    next:  Cell,
    /// Blocked for at least `max_blocked_ticks` ticks in a row.
    stuck: bool,
}

/// `true` if the live holds ahead of `agent` chain back to it and every
/// agent on that chain is stuck.  Such a cycle steps as a whole; any other
/// blocked agent keeps waiting.
fn stuck_cycle(
    reservations: &ReservationTable,
    intents: &BTreeMap<AgentId, Intent>,
    agent: AgentId,
    tick: Tick,
) -> bool {
    let mut current = agent;
    for _ in 0..intents.len() {
        let Some(intent) = intents.get(&current) else { return false };
        if !intent.stuck {
            return false;
        }
        let holder = match reservations.holder(intent.next) {
            Some(r) if r.tick > tick => r.agent,
            _ => return false,
        };
        if holder == agent {
            return true;
        }
        current = holder;
    }
    false
}

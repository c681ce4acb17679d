//! Observer hooks called by the engine at movement and tick boundaries.

use rc_core::{AgentId, Cell, Tick};
use rc_movement::PauseReason;

use crate::scheduler::{OrderOutcome, TickReport};

/// Callbacks invoked by the engine as movements progress.
///
/// All methods have default no-op implementations, so implementors only
/// override the hooks they care about.
///
/// # Call order within one tick
///
/// ```text
/// on_yield        × yielded agents
/// on_step         × agents that advanced
/// on_step_failed  × agents whose position update failed
/// on_complete     × agents that reached their destination
/// on_tick_end
/// ```
///
/// `on_order` and `on_cancel` fire between ticks, as commands arrive.
pub trait EngineObserver: Send {
    /// A move order was accepted, redirected an existing movement, or found
    /// the agent already at `destination`.
    fn on_order(&mut self, _tick: Tick, _agent: AgentId, _destination: Cell, _outcome: OrderOutcome) {}

    /// `agent` entered `cell`.
    fn on_step(&mut self, _tick: Tick, _agent: AgentId, _cell: Cell) {}

    /// `agent` did not advance this tick.
    fn on_yield(&mut self, _tick: Tick, _agent: AgentId, _reason: PauseReason) {}

    /// The position update for `agent` → `cell` failed; it will be retried.
    fn on_step_failed(&mut self, _tick: Tick, _agent: AgentId, _cell: Cell) {}

    fn on_complete(&mut self, _tick: Tick, _agent: AgentId) {}

    /// The movement of `agent` was cancelled while standing on `at`.
    fn on_cancel(&mut self, _tick: Tick, _agent: AgentId, _at: Cell) {}

    fn on_tick_end(&mut self, _report: &TickReport) {}
}

/// An [`EngineObserver`] that does nothing.
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Replay a tick report through the per-agent hooks, then `on_tick_end`.
pub fn notify_tick<O: EngineObserver + ?Sized>(observer: &mut O, report: &TickReport) {
    for &(agent, reason) in &report.yielded {
        observer.on_yield(report.tick, agent, reason);
    }
    for &(agent, cell) in &report.advanced {
        observer.on_step(report.tick, agent, cell);
    }
    for &(agent, cell) in &report.failed {
        observer.on_step_failed(report.tick, agent, cell);
    }
    for &agent in &report.completed {
        observer.on_complete(report.tick, agent);
    }
    observer.on_tick_end(report);
}

//! `TraceObserver<W>` bridges `EngineObserver` to a `TraceWriter`.

use std::sync::{Arc, Mutex, PoisonError};

use rc_core::{AgentId, Cell, Tick};
use rc_engine::{EngineObserver, OrderOutcome, TickReport};
use rc_movement::PauseReason;
use tracing::warn;

use crate::row::{TickSummaryRow, TraceEvent, TraceRow};
use crate::writer::TraceWriter;
use crate::{OutputError, OutputResult};

/// Shared slot holding the first write error of a [`TraceObserver`].
///
/// The observer is moved into the engine, so errors are read back through
/// this handle once the engine task has finished.
#[derive(Clone, Debug, Default)]
pub struct TraceErrors(Arc<Mutex<Option<OutputError>>>);

impl TraceErrors {
    /// Take the stored error, if any.
    pub fn take(&self) -> Option<OutputError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn store(&self, error: OutputError) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        // Keep only the first error.
        if slot.is_none() {
            warn!(%error, "trace write failed");
            *slot = Some(error);
        }
    }
}

/// An [`EngineObserver`] that writes every agent event and one summary per
/// tick to any [`TraceWriter`].
///
/// Rows are flushed at the end of each tick and when the observer is dropped,
/// which happens when the engine task exits.
pub struct TraceObserver<W: TraceWriter> {
    writer: W,
    errors: TraceErrors,
}

impl<W: TraceWriter> TraceObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, errors: TraceErrors::default() }
    }

    pub fn errors(&self) -> TraceErrors {
        self.errors.clone()
    }

    fn event(&mut self, tick: Tick, agent: AgentId, event: TraceEvent, cell: Option<Cell>) {
        let row = TraceRow { tick: tick.0, agent_id: agent.0, event, cell };
        let result = self.writer.write_event(&row);
        self.check(result);
    }

    fn check(&self, result: OutputResult<()>) {
        if let Err(e) = result {
            self.errors.store(e);
        }
    }
}

impl<W: TraceWriter> EngineObserver for TraceObserver<W> {
    fn on_order(&mut self, tick: Tick, agent: AgentId, destination: Cell, outcome: OrderOutcome) {
        let event = match outcome {
            OrderOutcome::Started(_) => TraceEvent::Order,
            OrderOutcome::Redirected(_) => TraceEvent::Redirect,
            OrderOutcome::AlreadyThere => TraceEvent::AlreadyThere,
        };
        self.event(tick, agent, event, Some(destination));
    }

    fn on_step(&mut self, tick: Tick, agent: AgentId, cell: Cell) {
        self.event(tick, agent, TraceEvent::Step, Some(cell));
    }

    fn on_yield(&mut self, tick: Tick, agent: AgentId, reason: PauseReason) {
        self.event(tick, agent, TraceEvent::yielded(reason), None);
    }

    fn on_step_failed(&mut self, tick: Tick, agent: AgentId, cell: Cell) {
        self.event(tick, agent, TraceEvent::StepFailed, Some(cell));
    }

    fn on_complete(&mut self, tick: Tick, agent: AgentId) {
        self.event(tick, agent, TraceEvent::Complete, None);
    }

    fn on_cancel(&mut self, tick: Tick, agent: AgentId, at: Cell) {
        self.event(tick, agent, TraceEvent::Cancel, Some(at));
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        let row = TickSummaryRow {
            tick:      report.tick.0,
            advanced:  report.advanced.len() as u64,
            yielded:   report.yielded.len() as u64,
            completed: report.completed.len() as u64,
            failed:    report.failed.len() as u64,
            active:    report.active as u64,
        };
        let result = self.writer.write_tick_summary(&row).and_then(|()| self.writer.flush());
        self.check(result);
    }
}

impl<W: TraceWriter> Drop for TraceObserver<W> {
    fn drop(&mut self) {
        let result = self.writer.flush();
        self.check(result);
    }
}

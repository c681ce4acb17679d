//! Host position updates.

use async_trait::async_trait;
use rc_core::{AgentId, Cell};

use crate::SinkError;

/// Moves the host's authoritative agent record.
///
/// Called once per approved step, concurrently for all agents of a tick.
/// A failure leaves the movement where it is; the same step is retried on
/// the next tick.
#[async_trait]
pub trait PositionSink: Send + Sync {
    async fn update_position(&self, agent: AgentId, cell: Cell) -> Result<(), SinkError>;
}

/// Accepts every update and does nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPositionSink;

#[async_trait]
impl PositionSink for NoopPositionSink {
    async fn update_position(&self, _agent: AgentId, _cell: Cell) -> Result<(), SinkError> {
        Ok(())
    }
}

use rc_core::AgentId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MovementError {
    #[error("agent {0} has no movement")]
    UnknownAgent(AgentId),

    #[error("agent {0} is already at the end of its route")]
    RouteExhausted(AgentId),

    #[error("movement of agent {0} is no longer active")]
    NotActive(AgentId),
}

pub type MovementResult<T> = Result<T, MovementError>;

use rc_camera::CameraError;
use rc_core::CoreError;
use rc_effects::EffectError;
use thiserror::Error;

/// Errors from the engine actor and its handle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine task has stopped.
    #[error("engine closed")]
    Closed,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Why a move order was rejected as a whole.
///
/// Per-agent planning failures are not errors; they are reported as
/// [`AgentOrderResult::NoRoute`](crate::AgentOrderResult::NoRoute).
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("movement coordination is disabled")]
    Disabled,

    #[error("move orders are not allowed during combat")]
    CombatLocked,

    #[error("no agents selected")]
    NoAgents,

    #[error("invalid route: {0}")]
    InvalidRoute(&'static str),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A host position update failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("position update failed: {0}")]
pub struct SinkError(pub String);

pub type EngineResult<T> = Result<T, EngineError>;
pub type OrderResult<T> = Result<T, OrderError>;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// The host's drawing backend rejected or failed the call.
    #[error("effect sink failed: {0}")]
    Sink(String),

    /// The queue worker has stopped.
    #[error("effect queue closed")]
    Closed,
}

pub type EffectResult<T> = Result<T, EffectError>;

//! Engine-wide base error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where configuration or parsing can fail underneath them.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `rc-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `rc-core`.
pub type CoreResult<T> = Result<T, CoreError>;

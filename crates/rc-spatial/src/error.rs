use rc_core::Cell;
use thiserror::Error;

/// Reasons a path query produced no route.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: Cell, to: Cell },

    #[error("cell {0} is outside the playable area")]
    OutOfBounds(Cell),

    #[error("route cost {cost} exceeds the maximum distance {max}")]
    ExceedsMaxDistance { cost: u32, max: u32 },

    #[error("path query cancelled")]
    Cancelled,

    /// Failure reported by a host-supplied oracle.
    #[error("path oracle failed: {0}")]
    Backend(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

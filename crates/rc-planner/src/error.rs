use rc_core::Cell;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("cannot plan for an empty agent group")]
    EmptyGroup,

    #[error("no reachable alternative around {destination}")]
    NoCandidates { destination: Cell },

    #[error("planning cancelled")]
    Cancelled,
}

pub type PlannerResult<T> = Result<T, PlannerError>;

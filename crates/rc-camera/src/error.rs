use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The host viewport rejected a pan.
    #[error("viewport pan failed: {0}")]
    Viewport(String),

    /// The controller task has stopped.
    #[error("camera controller closed")]
    Closed,
}

pub type CameraResult<T> = Result<T, CameraError>;

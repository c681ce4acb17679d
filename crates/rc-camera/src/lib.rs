//! `rc-camera`: keeps the viewport trained on the most recently ordered
//! agent.
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`follow`]     | `CameraFollow`, `FollowDecision`: lookahead and suppression |
//! | [`controller`] | `CameraController` task, `CameraHandle`, `ViewportSink`, `PanRequest` |
//! | [`error`]      | `CameraError`, `CameraResult<T>`                          |
//!
//! # Timing
//!
//! | Scene    | Sample every | Lookahead | Pan duration |
//! |----------|--------------|-----------|--------------|
//! | Gridded  | 2000 ms      | 6 cells   | 1000 ms      |
//! | Gridless | 500 ms       | 1 cell    | 500 ms       |
//!
//! All values come from `CameraConfig`; the table shows the defaults.  A
//! manual pan suppresses following for `manual_pan_cooldown_ms` (500 ms).

pub mod controller;
pub mod error;
pub mod follow;

#[cfg(test)]
mod tests;

pub use controller::{CameraController, CameraHandle, PanRequest, ViewportSink};
pub use error::{CameraError, CameraResult};
pub use follow::{CameraFollow, FollowDecision};

//! `rc-movement`: per-agent movement records.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                       |
//! |--------------|----------------------------------------------------------------|
//! | [`state`]    | `MovementState`, `PauseReason`                                 |
//! | [`movement`] | `Movement`: route, cursor, state, colour                       |
//! | [`store`]    | `MovementStore`: at most one movement per agent                |
//! | [`snapshot`] | `MovementSnapshot`, `MovementView`: read-only copies for observers |
//! | [`error`]    | `MovementError`, `MovementResult<T>`                           |
//!
//! # Movement model
//!
//! A movement steps through its route one cell per tick.  The scheduler in
//! `rc-engine` is the only writer: it advances cursors, sets pause states
//! and removes finished movements.  Everyone else reads snapshots.

pub mod error;
pub mod movement;
pub mod snapshot;
pub mod state;
pub mod store;


pub use error::{MovementError, MovementResult};
pub use movement::Movement;
pub use snapshot::{MovementSnapshot, MovementView};
pub use state::{MovementState, PauseReason};
pub use store::MovementStore;

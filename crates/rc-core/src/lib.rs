//! `rc-core`: foundational types for the `rts_controls` movement engine.
//!
//! This crate is a dependency of every other `rc-*` crate.  It has no `rc-*`
//! dependencies and few external ones (`rand`, `thiserror`, `serde`,
//! `serde_json`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `OrderId`                                       |
//! | [`geo`]         | `Cell`, `Point`, `Footprint`, `GridBounds`, `SceneGeometry` |
//! | [`time`]        | `Tick`, `TickClock`                                        |
//! | [`rng`]         | `EngineRng` (tie-break randomness)                         |
//! | [`config`]      | `EngineConfig`, `MovementSpeed`, `PlannerConfig`, `CameraConfig`, `ColorTag` |
//! | [`error`]       | `CoreError`, `CoreResult`                                  |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{CameraConfig, ColorTag, EngineConfig, MovementSpeed, PlannerConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{Cell, Footprint, GridBounds, Point, SceneGeometry};
pub use ids::{AgentId, OrderId};
pub use rng::EngineRng;
pub use time::{Tick, TickClock};

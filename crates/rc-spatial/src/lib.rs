//! `rc-spatial`: who holds which cell, and how to get from one cell to
//! another.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`reservation`] | `ReservationTable`, `Reservation`                         |
//! | [`route`]       | `Route`, `densify`, `minimize_waypoints`, `interpolate_points` |
//! | [`oracle`]      | `PathOracle` trait, `PathOptions`, `PathResult`, `GridOracle`, `query_cancellable` |
//! | [`grid`]        | `GridMap`, `GridMapBuilder`                               |
//! | [`error`]       | `OracleError`, `OracleResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | [`CellMap`] uses `rustc_hash::FxHashMap` instead of SipHash. |

pub mod error;
pub mod grid;
pub mod oracle;
pub mod reservation;
pub mod route;


pub use error::{OracleError, OracleResult};
pub use grid::{GridMap, GridMapBuilder};
pub use oracle::{query_cancellable, GridOracle, PathOptions, PathOracle, PathResult};
pub use reservation::{Reservation, ReservationTable};
pub use route::{dedup_cells, densify, interpolate_points, minimize_waypoints, Route};

/// Hash map keyed by [`rc_core::Cell`], used for per-tick cell indexes.
#[cfg(feature = "fx-hash")]
pub type CellMap<V> = rustc_hash::FxHashMap<rc_core::Cell, V>;

/// Hash map keyed by [`rc_core::Cell`], used for per-tick cell indexes.
#[cfg(not(feature = "fx-hash"))]
pub type CellMap<V> = std::collections::HashMap<rc_core::Cell, V>;

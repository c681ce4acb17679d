//! `rc-planner`: spreads a group move order over distinct nearby cells so
//! agents fan out instead of stacking on one point.
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`planner`] | `Planner`, `Candidate`, `AgentBody`, `centroid`, `assign_destinations` |
//! | [`error`]   | `PlannerError`, `PlannerResult<T>`                            |
//!
//! The planner never mutates engine state.  It only reads the scene bounds
//! and issues path queries.

pub mod error;
pub mod planner;


pub use error::{PlannerError, PlannerResult};
pub use planner::{assign_destinations, centroid, AgentBody, Candidate, Planner};

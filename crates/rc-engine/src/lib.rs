//! `rc-engine`: the movement coordination engine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`scheduler`] | `Scheduler` (sync tick core), `OrderOutcome`, `TickPlan`, `TickReport` |
//! | [`tiebreak`]  | `TieBreak` trait, `RandomTieBreak`, `LowestIdTieBreak`      |
//! | [`sink`]      | `PositionSink` trait, `NoopPositionSink`                    |
//! | [`observer`]  | `EngineObserver` trait, `NoopObserver`                      |
//! | [`builder`]   | `EngineBuilder`                                             |
//! | [`engine`]    | `Engine`, the async actor, `EngineHandle`                   |
//! | [`commander`] | `Commander`: move-order entry point and lifecycle signals   |
//! | [`error`]     | `EngineError`, `OrderError`, `SinkError`                    |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                      |
//! |-----------|-------------------------------------------------------------|
//! | `fx-hash` | FxHash for the reservation table and per-tick contention map. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rc_engine::{Commander, EngineBuilder, OrderContext, OrderTarget};
//!
//! let (engine, _task) = EngineBuilder::new(config.clone(), geometry, positions)
//!     .effects(drawing)
//!     .viewport(canvas)
//!     .build()?
//!     .spawn();
//! let commander = Commander::new(config, bounds, oracle, engine);
//! commander.order(&selected, OrderTarget::Point(click), OrderContext::default()).await?;
//! ```

pub mod builder;
pub mod commander;
pub mod engine;
pub mod error;
pub mod observer;
pub mod scheduler;
pub mod sink;
pub mod tiebreak;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;
pub use commander::{AgentOrderResult, AgentRef, Commander, OrderContext, OrderTarget, Signal};
pub use engine::{Engine, EngineHandle};
pub use error::{EngineError, EngineResult, OrderError, OrderResult, SinkError};
pub use observer::{notify_tick, EngineObserver, NoopObserver};
pub use scheduler::{OrderOutcome, Scheduler, Step, TickPlan, TickReport};
pub use sink::{NoopPositionSink, PositionSink};
pub use tiebreak::{LowestIdTieBreak, RandomTieBreak, TieBreak};

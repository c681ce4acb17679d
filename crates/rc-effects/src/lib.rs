//! `rc-effects`: ordered visual feedback for movements.
//!
//! | Module     | Contents                                                       |
//! |------------|----------------------------------------------------------------|
//! | [`effect`] | `EffectKind`, `EffectKey`, `EffectPayload`, `EffectRequest`, `EffectSink`, `NoopEffectSink` |
//! | [`queue`]  | `EffectQueue` handle and its single worker task                |
//! | [`error`]  | `EffectError`, `EffectResult<T>`                               |
//!
//! Ordering is the whole contract: requests are applied strictly in the order
//! they were submitted, across all agents, one sink call at a time.

pub mod effect;
pub mod error;
pub mod queue;


pub use effect::{EffectKey, EffectKind, EffectPayload, EffectRequest, EffectSink, NoopEffectSink};
pub use error::{EffectError, EffectResult};
pub use queue::EffectQueue;

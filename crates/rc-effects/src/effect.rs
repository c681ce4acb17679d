//! Effect identities, payloads and requests.

use std::fmt;

use async_trait::async_trait;
use rc_core::{AgentId, Cell, ColorTag};

use crate::EffectResult;

/// The two visuals an agent can have.  At most one of each is live.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum EffectKind {
    /// Line along the remaining route.
    Trail,
    /// Destination marker.
    Marker,
}

impl EffectKind {
    pub const ALL: [EffectKind; 2] = [EffectKind::Trail, EffectKind::Marker];
}

/// Sink-facing identity of one visual.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EffectKey {
    pub agent: AgentId,
    pub kind:  EffectKind,
}

impl EffectKey {
    #[inline]
    pub fn new(agent: AgentId, kind: EffectKind) -> Self {
        Self { agent, kind }
    }

    #[inline]
    pub fn trail(agent: AgentId) -> Self {
        Self::new(agent, EffectKind::Trail)
    }

    #[inline]
    pub fn marker(agent: AgentId) -> Self {
        Self::new(agent, EffectKind::Marker)
    }
}

impl fmt::Display for EffectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.agent, self.kind)
    }
}

/// What to draw.
#[derive(Clone, PartialEq, Debug)]
pub enum EffectPayload {
    Trail { points: Vec<Cell>, color: ColorTag, alpha: f32 },
    Marker { at: Cell, color: ColorTag },
    /// Change only the opacity of an existing trail.
    Fade { alpha: f32 },
}

/// One entry of the queue.
#[derive(Clone, PartialEq, Debug)]
pub enum EffectRequest {
    Create { key: EffectKey, payload: EffectPayload },
    Update { key: EffectKey, payload: EffectPayload },
    Delete { key: EffectKey },
    /// Delete both visuals of one agent.
    ClearAgent { agent: AgentId },
    /// Delete every live visual.
    ClearAll,
}

impl EffectRequest {
    pub fn create_trail(agent: AgentId, points: Vec<Cell>, color: ColorTag) -> Self {
        EffectRequest::Create {
            key:     EffectKey::trail(agent),
            payload: EffectPayload::Trail { points, color, alpha: 1.0 },
        }
    }

    pub fn create_marker(agent: AgentId, at: Cell, color: ColorTag) -> Self {
        EffectRequest::Create {
            key:     EffectKey::marker(agent),
            payload: EffectPayload::Marker { at, color },
        }
    }

    pub fn fade_trail(agent: AgentId, alpha: f32) -> Self {
        EffectRequest::Update {
            key:     EffectKey::trail(agent),
            payload: EffectPayload::Fade { alpha: alpha.clamp(0.0, 1.0) },
        }
    }

    pub fn delete(agent: AgentId, kind: EffectKind) -> Self {
        EffectRequest::Delete { key: EffectKey::new(agent, kind) }
    }

    /// The agent this request concerns; `None` for `ClearAll`.
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            EffectRequest::Create { key, .. }
            | EffectRequest::Update { key, .. }
            | EffectRequest::Delete { key } => Some(key.agent),
            EffectRequest::ClearAgent { agent } => Some(*agent),
            EffectRequest::ClearAll => None,
        }
    }
}

// ── EffectSink ────────────────────────────────────────────────────────────────

/// Host drawing backend.
///
/// Every call may suspend for an arbitrary time.  The queue never issues a
/// call before the previous one has returned.
#[async_trait]
pub trait EffectSink: Send + Sync {
    async fn create_effect(&self, key: EffectKey, payload: &EffectPayload) -> EffectResult<()>;
    async fn update_effect(&self, key: EffectKey, payload: &EffectPayload) -> EffectResult<()>;
    async fn delete_effect(&self, key: EffectKey) -> EffectResult<()>;
}

/// Sink that draws nothing.  For hosts without visuals.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopEffectSink;

#[async_trait]
impl EffectSink for NoopEffectSink {
    async fn create_effect(&self, _key: EffectKey, _payload: &EffectPayload) -> EffectResult<()> {
        Ok(())
    }

    async fn update_effect(&self, _key: EffectKey, _payload: &EffectPayload) -> EffectResult<()> {
        Ok(())
    }

    async fn delete_effect(&self, _key: EffectKey) -> EffectResult<()> {
        Ok(())
    }
}

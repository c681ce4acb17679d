//! Host stand-ins that log what a real scene would do.

use async_trait::async_trait;
use rc_camera::{CameraResult, PanRequest, ViewportSink};
use rc_core::{AgentId, Cell};
use rc_effects::{EffectKey, EffectPayload, EffectResult, EffectSink};
use rc_engine::{PositionSink, SinkError};
use tracing::{debug, info};

pub struct LoggingPositions;

#[async_trait]
impl PositionSink for LoggingPositions {
    async fn update_position(&self, agent: AgentId, cell: Cell) -> Result<(), SinkError> {
        debug!(%agent, %cell, "token moved");
        Ok(())
    }
}

pub struct LoggingEffects;

#[async_trait]
impl EffectSink for LoggingEffects {
    async fn create_effect(&self, key: EffectKey, payload: &EffectPayload) -> EffectResult<()> {
        match payload {
            EffectPayload::Trail { points, .. } => debug!(?key, cells = points.len(), "draw trail"),
            EffectPayload::Marker { at, .. } => debug!(?key, %at, "draw marker"),
            EffectPayload::Fade { .. } => {}
        }
        Ok(())
    }

    async fn update_effect(&self, key: EffectKey, payload: &EffectPayload) -> EffectResult<()> {
        if let EffectPayload::Fade { alpha } = payload {
            debug!(?key, alpha, "fade");
        }
        Ok(())
    }

    async fn delete_effect(&self, key: EffectKey) -> EffectResult<()> {
        debug!(?key, "erase");
        Ok(())
    }
}

pub struct LoggingViewport;

#[async_trait]
impl ViewportSink for LoggingViewport {
    async fn pan_to(&self, request: PanRequest) -> CameraResult<()> {
        info!(to = %request.target, duration = ?request.duration, "camera pan");
        Ok(())
    }
}

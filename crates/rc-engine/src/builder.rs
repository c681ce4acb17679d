//! Fluent builder for constructing an [`Engine`].

use std::sync::Arc;

use rc_camera::ViewportSink;
use rc_core::{CoreError, EngineConfig, SceneGeometry};
use rc_effects::EffectSink;

use crate::engine::Engine;
use crate::observer::{EngineObserver, NoopObserver};
use crate::scheduler::Scheduler;
use crate::sink::PositionSink;
use crate::tiebreak::{RandomTieBreak, TieBreak};
use crate::EngineResult;

/// Fluent builder for [`Engine`].
///
/// # Required inputs
///
/// - [`EngineConfig`]: tick period, trails, tie-break seed, …
/// - [`SceneGeometry`]: how cells map onto scene pixels
/// - `Arc<dyn PositionSink>`: where approved steps are written
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                                   |
/// |--------------------|-------------------------------------------|
/// | `.effects(sink)`   | No visual feedback; effect requests dropped |
/// | `.viewport(sink)`  | No camera controller                      |
/// | `.tie_break(t)`    | `RandomTieBreak` seeded from `config.seed` |
/// | `.observer(o)`     | `NoopObserver`                            |
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new(config, geometry, Arc::new(positions))
///     .effects(Arc::new(drawing))
///     .viewport(Arc::new(canvas))
///     .build()?;
/// let (handle, task) = engine.spawn();
/// ```
pub struct EngineBuilder {
    config:    EngineConfig,
    geometry:  SceneGeometry,
    positions: Arc<dyn PositionSink>,
    effects:   Option<Arc<dyn EffectSink>>,
    viewport:  Option<Arc<dyn ViewportSink>>,
    tie_break: Option<Box<dyn TieBreak>>,
    observer:  Option<Box<dyn EngineObserver>>,
}

impl EngineBuilder {
    /// Create a builder with all required inputs.
    pub fn new(config: EngineConfig, geometry: SceneGeometry, positions: Arc<dyn PositionSink>) -> Self {
        Self {
            config,
            geometry,
            positions,
            effects:   None,
            viewport:  None,
            tie_break: None,
            observer:  None,
        }
    }

    /// Drawing backend for trails and markers.  Requests are only emitted
    /// when `config.draw_trails` is set.
    pub fn effects(mut self, sink: Arc<dyn EffectSink>) -> Self {
        self.effects = Some(sink);
        self
    }

    /// Host viewport.  Enables the camera follow controller.
    pub fn viewport(mut self, sink: Arc<dyn ViewportSink>) -> Self {
        self.viewport = Some(sink);
        self
    }

    pub fn tie_break(mut self, tie_break: impl TieBreak + 'static) -> Self {
        self.tie_break = Some(Box::new(tie_break));
        self
    }

    pub fn observer(mut self, observer: impl EngineObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Validate the configuration and return an engine ready to spawn.
    pub fn build(self) -> EngineResult<Engine> {
        self.config.validate()?;
        let size = self.geometry.cell_size();
        if !(size.is_finite() && size > 0.0) {
            return Err(CoreError::Config(format!("cell size must be a positive number, got {size}")).into());
        }

        let seed = self.config.seed;
        let tie_break: Box<dyn TieBreak> = match self.tie_break {
            Some(t) => t,
            None => Box::new(RandomTieBreak::from_seed_opt(seed)),
        };
        let observer: Box<dyn EngineObserver> = match self.observer {
            Some(o) => o,
            None => Box::new(NoopObserver),
        };

        Ok(Engine {
            scheduler: Scheduler::new(&self.config, tie_break),
            config:    self.config,
            geometry:  self.geometry,
            positions: self.positions,
            effects:   self.effects,
            viewport:  self.viewport,
            observer,
        })
    }
}

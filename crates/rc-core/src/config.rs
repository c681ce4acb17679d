//! Engine configuration.
//!
//! Host applications load an [`EngineConfig`] from JSON and hand it to the
//! engine builder.  Every field has a default, so `{}` is a valid config.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, SceneGeometry};

// ── ColorTag ──────────────────────────────────────────────────────────────────

/// Opaque visual hint attached to a movement's trail and marker.
///
/// Usually a `#rrggbb` string; the engine never interprets it.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTag(pub String);

impl ColorTag {
    pub fn new(tag: impl Into<String>) -> Self {
        ColorTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ColorTag {
    fn default() -> Self {
        ColorTag::new("#ff0000")
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── MovementSpeed ─────────────────────────────────────────────────────────────

/// Named tick-period presets.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementSpeed {
    /// 300 ms per step.
    Normal,
    /// 400 ms per step.
    #[default]
    Slow,
    /// 500 ms per step.
    VerySlow,
    /// 600 ms per step.
    ExtremelySlow,
    /// 700 ms per step.
    Glacial,
    /// 800 ms per step.
    ContinentalDrift,
    /// 900 ms per step.
    CautiousAdventurers,
    /// 1000 ms per step.
    TrapsAroundEveryCorner,
}

impl MovementSpeed {
    pub fn tick_period(self) -> Duration {
        let ms = match self {
            MovementSpeed::Normal                 => 300,
            MovementSpeed::Slow                   => 400,
            MovementSpeed::VerySlow               => 500,
            MovementSpeed::ExtremelySlow          => 600,
            MovementSpeed::Glacial                => 700,
            MovementSpeed::ContinentalDrift       => 800,
            MovementSpeed::CautiousAdventurers    => 900,
            MovementSpeed::TrapsAroundEveryCorner => 1000,
        };
        Duration::from_millis(ms)
    }
}

// ── PlannerConfig ─────────────────────────────────────────────────────────────

/// Tuning for the alternative-destination planner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Upper bound on the half-width of the gridded search square.
    pub max_half_width: u32,
    /// Gridless ring radius in pixels, before the footprint spacing is added.
    pub search_radius: f32,
    /// Gridless candidates generated per requested destination.
    pub oversample: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_half_width: 3, search_radius: 50.0, oversample: 2.5 }
    }
}

// ── CameraConfig ──────────────────────────────────────────────────────────────

/// Tuning for the camera follow controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub gridded_interval_ms:   u64,
    pub gridless_interval_ms:  u64,
    pub gridded_lookahead:     usize,
    pub gridless_lookahead:    usize,
    pub gridded_pan_ms:        u64,
    pub gridless_pan_ms:       u64,
    /// How long a manual pan suppresses automatic following.
    pub manual_pan_cooldown_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            gridded_interval_ms:    2_000,
            gridless_interval_ms:   500,
            gridded_lookahead:      6,
            gridless_lookahead:     1,
            gridded_pan_ms:         1_000,
            gridless_pan_ms:        500,
            manual_pan_cooldown_ms: 500,
        }
    }
}

impl CameraConfig {
    pub fn sample_interval(&self, gridless: bool) -> Duration {
        Duration::from_millis(if gridless { self.gridless_interval_ms } else { self.gridded_interval_ms })
    }

    pub fn lookahead(&self, gridless: bool) -> usize {
        if gridless { self.gridless_lookahead } else { self.gridded_lookahead }
    }

    pub fn pan_duration(&self, gridless: bool) -> Duration {
        Duration::from_millis(if gridless { self.gridless_pan_ms } else { self.gridded_pan_ms })
    }

    pub fn manual_pan_cooldown(&self) -> Duration {
        Duration::from_millis(self.manual_pan_cooldown_ms)
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Master switch.  When off, move orders are rejected.
    pub enabled: bool,

    /// Tick period preset.
    pub movement_speed: MovementSpeed,

    /// Request trail and destination-marker effects for each movement.
    pub draw_trails: bool,

    /// Colour of trails and markers.
    pub marker_color: ColorTag,

    /// Follow the primary agent of each order with the camera.
    pub camera_panning: bool,

    /// A global pause cancels all movements instead of pausing them.
    pub cancel_on_pause: bool,

    /// Accept orders issued while the host is in combat.
    pub allow_orders_in_combat: bool,

    /// Route cost cap handed to the path oracle.  `None` = unbounded.
    pub max_path_distance: Option<u32>,

    /// Virtual cell size in pixels on gridless scenes.
    pub gridless_step: f32,

    /// Consecutive reservation-blocked ticks after which a cycle of agents
    /// waiting on each other steps through the holds together.
    pub max_blocked_ticks: u32,

    /// Tie-break RNG seed.  `None` draws from OS entropy.
    pub seed: Option<u64>,

    pub planner: PlannerConfig,

    pub camera: CameraConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled:                true,
            movement_speed:         MovementSpeed::default(),
            draw_trails:            false,
            marker_color:           ColorTag::default(),
            camera_panning:         true,
            cancel_on_pause:        false,
            allow_orders_in_combat: false,
            max_path_distance:      Some(90),
            gridless_step:          50.0,
            max_blocked_ticks:      4,
            seed:                   None,
            planner:                PlannerConfig::default(),
            camera:                 CameraConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Wall-clock time between ticks.
    #[inline]
    pub fn tick_period(&self) -> Duration {
        self.movement_speed.tick_period()
    }

    /// Geometry of a gridless scene stepped at `gridless_step` pixels.
    #[inline]
    pub fn gridless_geometry(&self) -> SceneGeometry {
        SceneGeometry::Gridless { step: self.gridless_step }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.gridless_step.is_finite() && self.gridless_step > 0.0) {
            return Err(CoreError::Config(format!(
                "gridless_step must be a positive number, got {}",
                self.gridless_step
            )));
        }
        if self.max_blocked_ticks == 0 {
            return Err(CoreError::Config("max_blocked_ticks must be at least 1".into()));
        }
        if !(self.planner.oversample.is_finite() && self.planner.oversample >= 1.0) {
            return Err(CoreError::Config(format!(
                "planner.oversample must be >= 1.0, got {}",
                self.planner.oversample
            )));
        }
        if !(self.planner.search_radius.is_finite() && self.planner.search_radius >= 0.0) {
            return Err(CoreError::Config(format!(
                "planner.search_radius must be non-negative, got {}",
                self.planner.search_radius
            )));
        }
        if self.camera.gridded_interval_ms == 0 || self.camera.gridless_interval_ms == 0 {
            return Err(CoreError::Config("camera sampling intervals must be non-zero".into()));
        }
        Ok(())
    }
}

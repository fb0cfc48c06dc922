use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::units::{DEFAULT_PIXELS_PER_METER, WorldScale};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_gravity() -> [f32; 2] {
    [0.0, -9.8]
}
const fn default_iterations() -> usize {
    10
}
const fn default_pixels_per_meter() -> f32 {
    DEFAULT_PIXELS_PER_METER
}
const fn default_true() -> bool {
    true
}
#[allow(clippy::unnecessary_wraps)]
const fn default_timestep() -> Option<f32> {
    Some(1.0 / 30.0)
}

// ---------------------------------------------------------------------------
// PhysicsConfig
// ---------------------------------------------------------------------------

/// Configuration of one physics world.
///
/// Read once when the world is built. The scale in particular must not
/// change for the lifetime of that world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct PhysicsConfig {
    /// Gravity vector [x, y] in m/s^2 (default: [0, -9.8], bevy is y-up).
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 2],

    /// Solver iterations per step (default: 10).
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Pixels per simulation meter (default: 32).
    #[serde(default = "default_pixels_per_meter")]
    pub pixels_per_meter: f32,

    /// Whether resting bodies may fall asleep (default: true).
    #[serde(default = "default_true")]
    pub allow_sleep: bool,

    /// Fixed seconds advanced per frame. `None` steps by the frame delta.
    #[serde(default = "default_timestep")]
    pub timestep: Option<f32>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            iterations: default_iterations(),
            pixels_per_meter: default_pixels_per_meter(),
            allow_sleep: true,
            timestep: default_timestep(),
        }
    }
}

impl PhysicsConfig {
    /// Zero-gravity config, otherwise default.
    #[must_use]
    pub fn zero_gravity() -> Self {
        Self {
            gravity: [0.0, 0.0],
            ..Self::default()
        }
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        WorldScale::new(self.pixels_per_meter)?;
        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.iterations));
        }
        if let Some(dt) = self.timestep
            && (!dt.is_finite() || dt <= 0.0)
        {
            return Err(ConfigError::InvalidTimestep(dt));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "gravity".into(),
                message: format!("must be finite, got {:?}", self.gravity),
            });
        }
        Ok(())
    }

    /// The validated world scale.
    pub fn scale(&self) -> Result<WorldScale, ConfigError> {
        WorldScale::new(self.pixels_per_meter)
    }

    /// Frames per second implied by the fixed timestep, if any.
    pub fn fps(&self) -> Option<f32> {
        self.timestep.map(|dt| 1.0 / dt)
    }

    /// Builder: set a fixed timestep from a frame rate.
    #[must_use]
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.timestep = Some(1.0 / fps);
        self
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

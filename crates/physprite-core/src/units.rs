//! Conversions between simulation space (meters, radians) and presentation
//! space (pixels, degrees).
//!
//! The pixel/meter factor is a [`WorldScale`] fixed when a physics world is
//! created. Every body and joint of that world converts through the same
//! value.

use std::f32::consts::PI;

use bevy::math::Vec2;

use crate::error::ConfigError;

/// Pixels per meter used when no configuration says otherwise.
pub const DEFAULT_PIXELS_PER_METER: f32 = 32.0;

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

/// Radians to degrees.
#[inline]
#[must_use]
pub fn to_degrees(radians: f32) -> f32 {
    radians * (180.0 / PI)
}

/// Degrees to radians.
#[inline]
#[must_use]
pub fn to_radians(degrees: f32) -> f32 {
    degrees * (PI / 180.0)
}

// ---------------------------------------------------------------------------
// WorldScale
// ---------------------------------------------------------------------------

/// Fixed pixel-per-meter factor of one simulation world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldScale {
    pixels_per_meter: f32,
}

impl WorldScale {
    /// Create a scale. Rejects zero, negative and non-finite factors.
    pub fn new(pixels_per_meter: f32) -> Result<Self, ConfigError> {
        if !pixels_per_meter.is_finite() || pixels_per_meter <= 0.0 {
            return Err(ConfigError::InvalidScale(pixels_per_meter));
        }
        Ok(Self { pixels_per_meter })
    }

    /// The raw factor.
    #[must_use]
    pub const fn pixels_per_meter(self) -> f32 {
        self.pixels_per_meter
    }

    /// Simulation length to pixels.
    #[inline]
    #[must_use]
    pub fn to_pixels(self, meters: f32) -> f32 {
        meters * self.pixels_per_meter
    }

    /// Pixel length to simulation meters.
    #[inline]
    #[must_use]
    pub fn to_meters(self, pixels: f32) -> f32 {
        pixels / self.pixels_per_meter
    }

    /// Component-wise [`to_pixels`](Self::to_pixels).
    #[inline]
    #[must_use]
    pub fn vec_to_pixels(self, meters: Vec2) -> Vec2 {
        meters * self.pixels_per_meter
    }

    /// Component-wise [`to_meters`](Self::to_meters).
    #[inline]
    #[must_use]
    pub fn vec_to_meters(self, pixels: Vec2) -> Vec2 {
        pixels / self.pixels_per_meter
    }
}

impl Default for WorldScale {
    fn default() -> Self {
        Self {
            pixels_per_meter: DEFAULT_PIXELS_PER_METER,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

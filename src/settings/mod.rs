//! # Settings
//!
//! Tunable physics parameters and the appearance superset the renderer reads.
//!
//! ## Validation Boundary
//! Values are checked here, never inside the per-frame physics step.
//! [`InertiaSettings::new`] rejects physically invalid values outright, while
//! [`JogSettings::sanitized`] clamps user-edited or loaded values into the
//! ranges the settings panel exposes. Anything that reaches the physics model
//! has already passed one of the two.
//!
//! ## Distribution
//! Live settings travel through a `tokio::sync::watch` channel. The physics
//! model reads the receiver on every step, so edits apply on the next tick.

pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::JogEncoding;

pub use store::SettingsStore;

/// Errors produced when constructing settings from raw values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("Decay rate must lie strictly between 0 and 1, got {0}")]
    InvalidDecayRate(f64),

    #[error("Stop threshold must be positive, got {0}")]
    InvalidMinVelocity(f64),
}

/// Physics parameters read by the rotation model on every step
///
/// Fields are private so that every instance satisfies
/// `0 < decay_rate < 1` and `min_velocity > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaSettings {
    decay_rate: f64,
    min_velocity: f64,
}

impl InertiaSettings {
    pub fn new(decay_rate: f64, min_velocity: f64) -> Result<Self, SettingsError> {
        if !decay_rate.is_finite() || decay_rate <= 0.0 || decay_rate >= 1.0 {
            return Err(SettingsError::InvalidDecayRate(decay_rate));
        }
        if !min_velocity.is_finite() || min_velocity <= 0.0 {
            return Err(SettingsError::InvalidMinVelocity(min_velocity));
        }
        Ok(Self {
            decay_rate,
            min_velocity,
        })
    }

    /// Clamps both values into the ranges exposed by the settings panel
    ///
    /// Non-finite input falls back to the defaults.
    pub fn clamped(decay_rate: f64, min_velocity: f64) -> Self {
        let defaults = Self::default();
        let decay_rate = if decay_rate.is_finite() {
            decay_rate.clamp(DECAY_RATE_RANGE.0, DECAY_RATE_RANGE.1)
        } else {
            defaults.decay_rate
        };
        let min_velocity = if min_velocity.is_finite() {
            min_velocity.clamp(MIN_VELOCITY_RANGE.0, MIN_VELOCITY_RANGE.1)
        } else {
            defaults.min_velocity
        };
        Self {
            decay_rate,
            min_velocity,
        }
    }

    /// Trusts values that already went through [`JogSettings::sanitized`]
    pub(crate) fn from_sanitized(decay_rate: f64, min_velocity: f64) -> Self {
        debug_assert!(decay_rate > 0.0 && decay_rate < 1.0);
        debug_assert!(min_velocity > 0.0);
        Self {
            decay_rate,
            min_velocity,
        }
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    pub fn min_velocity(&self) -> f64 {
        self.min_velocity
    }
}

impl Default for InertiaSettings {
    fn default() -> Self {
        Self {
            decay_rate: 0.95,
            min_velocity: 0.0001,
        }
    }
}

pub const DECAY_RATE_RANGE: (f64, f64) = (0.50, 0.99);
pub const MIN_VELOCITY_RANGE: (f64, f64) = (0.0001, 0.01);
pub const ROTATION_SPEED_RANGE: (f64, f64) = (0.1, 5.0);
pub const ARC_RADIUS_RANGE: (f32, f32) = (50.0, 150.0);
pub const DISK_RADIUS_MIN: f32 = 10.0;
pub const MARKER_WIDTH_RANGE: (f32, f32) = (1.0, 10.0);
pub const MARKER_LENGTH_MIN: f32 = 10.0;

/// RGBA colour, unmultiplied alpha
pub type Rgba = [u8; 4];

/// Complete user-tunable configuration of one jog wheel
///
/// The physics core only reads the two inertia fields; everything else
/// belongs to the renderer and the velocity mapping.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct JogSettings {
    /// Impulse multiplier applied to every jog tick
    pub rotation_speed: f64,
    /// Outer ring colour
    pub arc_color: Rgba,
    pub arc_radius: f32,
    /// Inner disk colour
    pub disk_color: Rgba,
    pub disk_radius: f32,
    /// Position marker colour
    pub marker_color: Rgba,
    pub marker_width: f32,
    pub marker_length: f32,
    /// Velocity multiplier per physics step; closer to 1 spins longer
    pub inertia_decay_rate: f64,
    /// Speed below which the wheel is considered stopped
    pub inertia_min_velocity: f64,
    /// Control Change number the jog wheel sends on
    pub jog_controller: u8,
    /// How the jog wheel encodes relative movement in its data byte
    pub jog_encoding: JogEncoding,
}

impl Default for JogSettings {
    fn default() -> Self {
        Self {
            rotation_speed: 1.0,
            arc_color: [0xff, 0xff, 0xff, 0x88],
            arc_radius: 120.0,
            disk_color: [0xff, 0x00, 0x00, 0x88],
            disk_radius: 40.0,
            marker_color: [0x00, 0xff, 0x00, 0x88],
            marker_width: 4.0,
            marker_length: 30.0,
            inertia_decay_rate: 0.95,
            inertia_min_velocity: 0.0001,
            jog_controller: 1,
            jog_encoding: JogEncoding::default(),
        }
    }
}

impl JogSettings {
    /// Returns a copy with every field clamped into its valid range
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let inertia = InertiaSettings::clamped(self.inertia_decay_rate, self.inertia_min_velocity);

        let rotation_speed = if self.rotation_speed.is_finite() {
            self.rotation_speed
                .clamp(ROTATION_SPEED_RANGE.0, ROTATION_SPEED_RANGE.1)
        } else {
            defaults.rotation_speed
        };
        let arc_radius = clamp_f32(self.arc_radius, ARC_RADIUS_RANGE, defaults.arc_radius);
        let disk_radius = clamp_f32(
            self.disk_radius,
            (DISK_RADIUS_MIN, arc_radius),
            defaults.disk_radius.min(arc_radius),
        );
        let marker_width = clamp_f32(self.marker_width, MARKER_WIDTH_RANGE, defaults.marker_width);
        let marker_length = clamp_f32(
            self.marker_length,
            (MARKER_LENGTH_MIN, arc_radius),
            defaults.marker_length.min(arc_radius),
        );

        Self {
            rotation_speed,
            arc_radius,
            disk_radius,
            marker_width,
            marker_length,
            inertia_decay_rate: inertia.decay_rate(),
            inertia_min_velocity: inertia.min_velocity(),
            jog_controller: self.jog_controller.min(crate::control::DATA_MAX),
            ..self.clone()
        }
    }
}

fn clamp_f32(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inertia_rejects_non_converging_decay() {
        assert_eq!(
            InertiaSettings::new(1.0, 0.001),
            Err(SettingsError::InvalidDecayRate(1.0))
        );
        assert!(InertiaSettings::new(1.5, 0.001).is_err());
        assert!(InertiaSettings::new(0.0, 0.001).is_err());
        assert!(InertiaSettings::new(-0.3, 0.001).is_err());
        assert!(InertiaSettings::new(f64::NAN, 0.001).is_err());
    }

    #[test]
    fn test_inertia_rejects_non_positive_threshold() {
        assert_eq!(
            InertiaSettings::new(0.9, 0.0),
            Err(SettingsError::InvalidMinVelocity(0.0))
        );
        assert!(InertiaSettings::new(0.9, -1.0).is_err());
        assert!(InertiaSettings::new(0.9, f64::INFINITY).is_err());
    }

    #[test]
    fn test_inertia_accepts_valid_values() {
        let inertia = InertiaSettings::new(0.95, 0.0001).unwrap();
        assert_eq!(inertia.decay_rate(), 0.95);
        assert_eq!(inertia.min_velocity(), 0.0001);
    }

    #[test]
    fn test_inertia_clamped() {
        let inertia = InertiaSettings::clamped(1.2, -5.0);
        assert_eq!(inertia.decay_rate(), 0.99);
        assert_eq!(inertia.min_velocity(), 0.0001);

        let inertia = InertiaSettings::clamped(f64::NAN, 0.005);
        assert_eq!(inertia.decay_rate(), 0.95);
        assert_eq!(inertia.min_velocity(), 0.005);
    }

    #[test]
    fn test_sanitized_keeps_defaults() {
        let defaults = JogSettings::default();
        assert_eq!(defaults.sanitized(), defaults);
    }

    #[test]
    fn test_sanitized_clamps_geometry_to_arc() {
        let settings = JogSettings {
            arc_radius: 80.0,
            disk_radius: 200.0,
            marker_length: 500.0,
            marker_width: 0.0,
            rotation_speed: 42.0,
            inertia_decay_rate: 1.0,
            jog_controller: 200,
            ..JogSettings::default()
        }
        .sanitized();

        assert_eq!(settings.arc_radius, 80.0);
        assert_eq!(settings.disk_radius, 80.0);
        assert_eq!(settings.marker_length, 80.0);
        assert_eq!(settings.marker_width, 1.0);
        assert_eq!(settings.rotation_speed, 5.0);
        assert_eq!(settings.inertia_decay_rate, 0.99);
        assert_eq!(settings.jog_controller, 127);
    }
}

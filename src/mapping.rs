//! Translation of control events into velocity impulses
//!
//! Jog controllers disagree on how they report movement, so the encoding is
//! part of the configuration rather than baked into the physics.

use serde::{Deserialize, Serialize};

use crate::control::ControlEvent;
use crate::settings::JogSettings;

/// Radians of velocity added per jog tick at rotation speed 1.0
pub const BASE_STEP: f64 = 0.01;

/// Centre value of an offset-encoded jog byte
pub const NEUTRAL_VALUE: u8 = 64;

/// How a jog controller packs relative movement into its data byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JogEncoding {
    /// `data2 - neutral` ticks; values below neutral turn backwards
    Offset { neutral: u8 },
    /// 7-bit two's complement: 1..=63 forward, 64..=127 backward
    TwosComplement,
}

impl Default for JogEncoding {
    fn default() -> Self {
        JogEncoding::Offset {
            neutral: NEUTRAL_VALUE,
        }
    }
}

impl JogEncoding {
    /// Signed tick count carried by a data byte
    pub fn ticks(&self, value: u8) -> i16 {
        let value = i16::from(value & 0x7F);
        match self {
            JogEncoding::Offset { neutral } => value - i16::from(*neutral),
            JogEncoding::TwosComplement => {
                if value < 64 {
                    value
                } else {
                    value - 128
                }
            }
        }
    }
}

/// Policy turning a control event into an angular velocity impulse
pub trait VelocityMapping {
    /// Returns the impulse for `event`, or `None` if the event is not jog input
    fn impulse(&self, event: &ControlEvent) -> Option<f64>;
}

/// Maps Control Change messages on one controller number to impulses
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeJogMapping {
    controller: u8,
    encoding: JogEncoding,
    step: f64,
}

impl RelativeJogMapping {
    pub fn new(controller: u8, encoding: JogEncoding, rotation_speed: f64) -> Self {
        Self {
            controller,
            encoding,
            step: BASE_STEP * rotation_speed,
        }
    }

    pub fn from_settings(settings: &JogSettings) -> Self {
        Self::new(
            settings.jog_controller,
            settings.jog_encoding,
            settings.rotation_speed,
        )
    }

    pub fn controller(&self) -> u8 {
        self.controller
    }
}

impl Default for RelativeJogMapping {
    fn default() -> Self {
        Self::from_settings(&JogSettings::default())
    }
}

impl VelocityMapping for RelativeJogMapping {
    fn impulse(&self, event: &ControlEvent) -> Option<f64> {
        if !event.is_control_change() || event.data1 != self.controller {
            return None;
        }
        match self.encoding.ticks(event.data2) {
            0 => None,
            ticks => Some(f64::from(ticks) * self.step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{CONTROL_CHANGE, NOTE_ON};

    #[test]
    fn test_offset_encoding() {
        let encoding = JogEncoding::default();
        assert_eq!(encoding.ticks(64), 0);
        assert_eq!(encoding.ticks(65), 1);
        assert_eq!(encoding.ticks(60), -4);
        assert_eq!(encoding.ticks(127), 63);
        assert_eq!(encoding.ticks(0), -64);
    }

    #[test]
    fn test_twos_complement_encoding() {
        let encoding = JogEncoding::TwosComplement;
        assert_eq!(encoding.ticks(0), 0);
        assert_eq!(encoding.ticks(1), 1);
        assert_eq!(encoding.ticks(63), 63);
        assert_eq!(encoding.ticks(64), -64);
        assert_eq!(encoding.ticks(127), -1);
    }

    #[test]
    fn test_mapping_accepts_jog_controller_on_any_channel() {
        let mapping = RelativeJogMapping::new(1, JogEncoding::default(), 2.0);

        let forward = ControlEvent::new(CONTROL_CHANGE, 1, 66);
        let impulse = mapping.impulse(&forward).unwrap();
        assert!((impulse - 2.0 * BASE_STEP * 2.0).abs() < 1e-12);

        let backward = ControlEvent::new(CONTROL_CHANGE | 0x0A, 1, 63);
        assert!(mapping.impulse(&backward).unwrap() < 0.0);
    }

    #[test]
    fn test_mapping_ignores_other_messages() {
        let mapping = RelativeJogMapping::default();
        assert_eq!(mapping.impulse(&ControlEvent::new(CONTROL_CHANGE, 7, 90)), None);
        assert_eq!(mapping.impulse(&ControlEvent::new(NOTE_ON, 1, 90)), None);
        assert_eq!(mapping.impulse(&ControlEvent::new(CONTROL_CHANGE, 1, 64)), None);
    }
}

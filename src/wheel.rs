//! The jog wheel: control events in, continuation signal out
//!
//! `JogWheel::tick` is the frame task handed to the scheduler. It answers
//! `true` while the wheel is moving, and once more after [`JogWheel::mark_dirty`]
//! so a stationary wheel still gets repainted after a settings change.

use std::f64::consts::TAU;

use tracing::trace;

use crate::control::ControlEvent;
use crate::mapping::VelocityMapping;
use crate::physics::{InertiaSource, RotationModel};
use crate::scheduler::FrameTask;

#[derive(Debug)]
pub struct JogWheel<S: InertiaSource, M: VelocityMapping> {
    rotation: RotationModel<S>,
    mapping: M,
    dirty: bool,
}

impl<S: InertiaSource, M: VelocityMapping> JogWheel<S, M> {
    pub fn new(settings: S, mapping: M) -> Self {
        Self {
            rotation: RotationModel::new(settings),
            mapping,
            dirty: false,
        }
    }

    /// Applies the impulse mapped from `event`
    ///
    /// Returns `true` when the event moved the wheel; the caller should then
    /// request a redraw.
    pub fn handle_event(&mut self, event: &ControlEvent) -> bool {
        match self.mapping.impulse(event) {
            Some(impulse) => {
                trace!("Impulse {:.4} from {:?}", impulse, event);
                self.rotation.add_velocity(impulse);
                true
            }
            None => false,
        }
    }

    /// Physics step plus one-shot redraw request
    pub fn tick(&mut self, delta_time: f64) -> bool {
        let moving = self.rotation.update(delta_time);
        let dirty = std::mem::take(&mut self.dirty);
        moving || dirty
    }

    /// Requests a single repaint without motion
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Halts the wheel where it is
    pub fn stop(&mut self) {
        self.rotation.reset();
    }

    pub fn set_mapping(&mut self, mapping: M) {
        self.mapping = mapping;
    }

    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// Angle wrapped into `[0, 2π)` for drawing
    pub fn display_angle(&self) -> f64 {
        self.rotation.angle().rem_euclid(TAU)
    }

    pub fn velocity(&self) -> f64 {
        self.rotation.velocity()
    }

    pub fn rotation(&self) -> &RotationModel<S> {
        &self.rotation
    }
}

impl<S: InertiaSource, M: VelocityMapping> FrameTask for JogWheel<S, M> {
    fn tick(&mut self, delta_time: f64) -> bool {
        JogWheel::tick(self, delta_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{CONTROL_CHANGE, NOTE_ON};
    use crate::mapping::{JogEncoding, RelativeJogMapping, BASE_STEP};
    use crate::settings::InertiaSettings;

    fn wheel() -> JogWheel<InertiaSettings, RelativeJogMapping> {
        JogWheel::new(
            InertiaSettings::default(),
            RelativeJogMapping::new(1, JogEncoding::default(), 1.0),
        )
    }

    #[test]
    fn test_jog_event_adds_velocity() {
        let mut wheel = wheel();
        assert!(wheel.handle_event(&ControlEvent::new(CONTROL_CHANGE, 1, 67)));
        assert!((wheel.velocity() - 3.0 * BASE_STEP).abs() < 1e-12);
    }

    #[test]
    fn test_unrelated_event_changes_nothing() {
        let mut wheel = wheel();
        assert!(!wheel.handle_event(&ControlEvent::new(NOTE_ON, 1, 67)));
        assert_eq!(wheel.velocity(), 0.0);
        assert!(!wheel.tick(1.0 / 60.0));
    }

    #[test]
    fn test_dirty_flag_yields_one_extra_tick() {
        let mut wheel = wheel();
        wheel.mark_dirty();
        assert!(wheel.tick(0.0));
        assert!(!wheel.tick(0.016));
        assert_eq!(wheel.angle(), 0.0);
    }

    #[test]
    fn test_stop_ends_motion_next_tick() {
        let mut wheel = wheel();
        wheel.handle_event(&ControlEvent::new(CONTROL_CHANGE, 1, 127));
        assert!(wheel.tick(1.0 / 60.0));
        wheel.stop();
        assert!(!wheel.tick(1.0 / 60.0));
    }

    #[test]
    fn test_display_angle_wraps() {
        let mut wheel = JogWheel::new(
            InertiaSettings::new(0.5, 0.001).unwrap(),
            RelativeJogMapping::new(1, JogEncoding::default(), 1.0),
        );
        // One step at Δ = 1 s with v = -1 after decay moves -60 rad
        wheel.rotation.add_velocity(-2.0);
        wheel.tick(1.0);
        assert!((wheel.angle() + 60.0).abs() < 1e-9);
        let display = wheel.display_angle();
        assert!((0.0..TAU).contains(&display));
        let turns = (display - wheel.angle()) / TAU;
        assert!((turns - turns.round()).abs() < 1e-9);
    }
}

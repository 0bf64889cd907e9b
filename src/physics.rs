//! Inertial rotation model
//!
//! Integrates angular velocity into angle with geometric decay. Decay is
//! applied once per step whatever the step's duration; only the position
//! update is scaled by `delta_time`. The factor of 60 keeps a given velocity
//! covering the same angle per second at any frame rate.
//!
//! ```text
//!   |v| >= min_velocity ──update──► v *= decay, angle += v·Δ·60  (Moving)
//!   |v| <  min_velocity ──update──► v = 0                       (Stopped)
//! ```

use tokio::sync::watch;

use crate::settings::{InertiaSettings, JogSettings};

/// Position update normalization (nominal ticks per second)
pub const NOMINAL_TICK_RATE: f64 = 60.0;

/// Anything that can supply the current physics parameters
///
/// Read once per [`RotationModel::update`], so a source backed by live
/// configuration takes effect on the next step.
pub trait InertiaSource {
    fn inertia(&self) -> InertiaSettings;
}

impl InertiaSource for InertiaSettings {
    fn inertia(&self) -> InertiaSettings {
        *self
    }
}

/// Live settings; publishers send [`JogSettings::sanitized`] values only
impl InertiaSource for watch::Receiver<JogSettings> {
    fn inertia(&self) -> InertiaSettings {
        let settings = self.borrow();
        InertiaSettings::from_sanitized(settings.inertia_decay_rate, settings.inertia_min_velocity)
    }
}

/// Angle and velocity of one jog wheel
///
/// `angle` is in radians and unbounded; `velocity` is in radians per nominal
/// tick and signed.
#[derive(Debug, Clone)]
pub struct RotationModel<S: InertiaSource = InertiaSettings> {
    angle: f64,
    velocity: f64,
    settings: S,
}

impl<S: InertiaSource> RotationModel<S> {
    pub fn new(settings: S) -> Self {
        Self {
            angle: 0.0,
            velocity: 0.0,
            settings,
        }
    }

    /// Adds an external impulse; callers bound the magnitude
    pub fn add_velocity(&mut self, delta: f64) {
        self.velocity += delta;
    }

    /// Runs one physics step and reports whether the wheel is still moving
    ///
    /// `delta_time` is the elapsed wall time since the previous step in
    /// seconds. A zero `delta_time` decays velocity without moving the angle.
    pub fn update(&mut self, delta_time: f64) -> bool {
        let inertia = self.settings.inertia();

        if self.velocity.abs() < inertia.min_velocity() {
            self.velocity = 0.0;
            return false;
        }

        self.velocity *= inertia.decay_rate();
        self.angle += self.velocity * delta_time * NOMINAL_TICK_RATE;
        true
    }

    /// Stops immediately, keeping the current angle
    pub fn reset(&mut self) {
        self.velocity = 0.0;
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn is_moving(&self) -> bool {
        self.velocity.abs() >= self.settings.inertia().min_velocity()
    }
}

/// Number of [`RotationModel::update`] calls that report motion for an
/// undisturbed wheel starting at `initial_velocity`
///
/// Mathematically `floor(log(min / |v0|) / log(decay)) + 1` for
/// `|v0| >= min`, zero otherwise. Counted by repeating the step's own
/// multiplication so exact boundaries round the same way `update` does.
pub fn steps_to_stop(initial_velocity: f64, inertia: &InertiaSettings) -> u32 {
    let mut speed = initial_velocity.abs();
    let mut steps = 0;
    while speed >= inertia.min_velocity() {
        speed *= inertia.decay_rate();
        steps += 1;
    }
    steps
}

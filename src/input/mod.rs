//! Input subsystem for jog hardware
//!
//! Bridges any number of input devices to a single control-event sink:
//!
//! 1. [`InputHost`] / [`InputDevice`] - what the platform offers
//!    (enumeration, hot-plug notifications, raw byte messages)
//! 2. [`normalizer`] - attaches to every device and turns raw bytes into
//!    [`ControlEvent`]s
//! 3. [`gamepad`] - a host backed by `gilrs`
//!
//! # Architecture
//!
//! ```text
//! Device ─raw bytes─► Normalizer ─ControlEvent─► ControlSink
//!   ▲                     │
//!   └──── hot-plug ───────┘ (attach on connect)
//! ```
//!
//! Device callbacks may run on a host thread. Sinks must therefore be
//! `Send + Sync`; the application funnels events through a channel so that
//! the physics model is only ever touched on the UI thread.

pub mod gamepad;
pub mod normalizer;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::control::ControlEvent;

pub use normalizer::{Configured, InputNormalizer, NormalizerState, Unconfigured};

/// Input errors
///
/// None of these are fatal. They are reported on the log and the affected
/// capability or device is skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// The host has no input-device support at all
    #[error("Input devices unsupported: {0}")]
    Unsupported(String),

    /// A single device could not be accessed
    #[error("Failed to access device {device}: {reason}")]
    DeviceAccess { device: String, reason: String },

    /// The host backend failed to start
    #[error("Initialization error: {0}")]
    InitializationError(String),
}

/// Per-device raw message callback
pub type MessageHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Connect/disconnect notification callback
pub type StateListener = Arc<dyn Fn(PortEvent) + Send + Sync>;

pub type DeviceRef = Arc<dyn InputDevice>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Connected,
    Disconnected,
}

/// Hot-plug notification delivered to a [`StateListener`]
#[derive(Clone)]
pub struct PortEvent {
    pub device: DeviceRef,
    pub kind: PortKind,
    pub state: PortState,
}

impl std::fmt::Debug for PortEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortEvent")
            .field("device", &self.device.id())
            .field("kind", &self.kind)
            .field("state", &self.state)
            .finish()
    }
}

/// A single device delivering raw byte messages
pub trait InputDevice: Send + Sync {
    /// Stable identifier, unique within its host
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Installs (`Some`) or removes (`None`) the message callback
    ///
    /// Installing replaces any previous handler.
    fn set_message_handler(&self, handler: Option<MessageHandler>) -> Result<(), InputError>;
}

/// Platform access to input devices
pub trait InputHost: Send + Sync {
    /// Currently connected input devices
    fn inputs(&self) -> Result<Vec<DeviceRef>, InputError>;

    /// Registers the single connect/disconnect listener, replacing any other
    fn subscribe(&self, listener: StateListener) -> Result<(), InputError>;

    /// Drops the listener registered with [`InputHost::subscribe`], if any
    fn unsubscribe(&self);
}

/// Downstream consumer of normalized events
pub trait ControlSink: Send + Sync {
    fn emit(&self, event: ControlEvent);
}

impl<F> ControlSink for F
where
    F: Fn(ControlEvent) + Send + Sync,
{
    fn emit(&self, event: ControlEvent) {
        self(event)
    }
}

impl ControlSink for mpsc::UnboundedSender<ControlEvent> {
    fn emit(&self, event: ControlEvent) {
        if let Err(e) = self.send(event) {
            warn!("Dropping control event {:?}: {}", event, e);
        }
    }
}

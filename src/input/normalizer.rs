//! Input normalizer with statum typestate
//!
//! ```text
//! Unconfigured ──setup()──► Configured
//!       │                       │
//!       └──── teardown() ◄──────┘
//! ```
//!
//! `attach` and `teardown` exist in both states, so a normalizer whose setup
//! never ran (or whose host has no input support) still cleans up safely.
//! Teardown closes the device registry; a hot-plug callback that was already
//! in flight finds it closed and installs nothing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use super::{
    ControlSink, DeviceRef, InputHost, MessageHandler, PortEvent, PortKind, PortState,
    StateListener,
};
use crate::control::ControlEvent;

/// `None` once torn down
type AttachedDevices = Arc<Mutex<Option<HashMap<String, DeviceRef>>>>;

#[state]
#[derive(Debug, Clone)]
pub enum NormalizerState {
    Unconfigured,
    Configured,
}

#[machine]
pub struct InputNormalizer<S: NormalizerState> {
    host: Arc<dyn InputHost>,
    handler: MessageHandler,
    attached: AttachedDevices,
}

impl<S: NormalizerState> InputNormalizer<S> {
    /// Installs the translating handler on `device`
    ///
    /// Re-attaching a device replaces its handler. Access failures are
    /// logged and leave other devices untouched.
    pub fn attach(&self, device: DeviceRef) {
        attach_device(&self.attached, &self.handler, device);
    }

    /// Ids of all devices currently carrying our handler
    pub fn attached_devices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .attached
            .lock()
            .as_ref()
            .map(|devices| devices.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Removes the hot-plug listener and every installed handler
    pub fn teardown(self) {
        self.host.unsubscribe();

        let devices: Vec<DeviceRef> = self
            .attached
            .lock()
            .take()
            .map(|devices| devices.into_values().collect())
            .unwrap_or_default();
        debug!("Detaching {} input devices", devices.len());
        for device in devices {
            if let Err(e) = device.set_message_handler(None) {
                warn!("Failed to detach {}: {}", device.name(), e);
            }
        }
        info!("Input normalizer torn down");
    }
}

impl InputNormalizer<Unconfigured> {
    pub fn create<K>(host: Arc<dyn InputHost>, sink: K) -> Self
    where
        K: ControlSink + 'static,
    {
        let sink = Arc::new(sink);
        let handler: MessageHandler = Arc::new(move |payload: &[u8]| {
            // Short messages are hardware noise; dropped without logging
            if let Some(event) = ControlEvent::from_bytes(payload) {
                sink.emit(event);
            }
        });

        Self::new(host, handler, Arc::new(Mutex::new(Some(HashMap::new()))))
    }

    /// Attaches to every connected device and follows hot-plug events
    ///
    /// A host without input support is reported once; the normalizer then
    /// stays inert.
    pub fn setup(self) -> InputNormalizer<Configured> {
        let devices = match self.host.inputs() {
            Ok(devices) => devices,
            Err(e) => {
                error!("Input devices unavailable: {}", e);
                return self.transition();
            }
        };

        info!("Found {} input devices", devices.len());
        for device in devices {
            self.attach(device);
        }

        let attached = self.attached.clone();
        let handler = self.handler.clone();
        let listener: StateListener = Arc::new(move |event: PortEvent| {
            if event.kind == PortKind::Input && event.state == PortState::Connected {
                info!("Input connected: {}", event.device.name());
                attach_device(&attached, &handler, event.device);
            } else {
                debug!("Ignoring port event {:?}", event);
            }
        });

        if let Err(e) = self.host.subscribe(listener) {
            warn!("Hot-plug notifications unavailable: {}", e);
        }

        self.transition()
    }
}

/// Installs `handler` unless the registry is already closed
///
/// The registry lock is held across the install so teardown cannot slip in
/// between the check and the insert.
fn attach_device(attached: &AttachedDevices, handler: &MessageHandler, device: DeviceRef) {
    let mut attached = attached.lock();
    let Some(devices) = attached.as_mut() else {
        debug!("Normalizer torn down, not attaching {}", device.name());
        return;
    };
    match device.set_message_handler(Some(handler.clone())) {
        Ok(()) => {
            debug!("Attached {} ({})", device.name(), device.id());
            devices.insert(device.id().to_string(), device);
        }
        Err(e) => warn!("Failed to attach {}: {}", device.name(), e),
    }
}

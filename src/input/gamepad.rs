//! Gamepad input host backed by gilrs
//!
//! Exposes every gamepad as an [`InputDevice`] that speaks MIDI-shaped byte
//! triplets, so a stick can drive the jog wheel exactly like a hardware jog
//! controller would:
//!
//! - axis change  → `[0xB0, cc, value]` with −1.0..1.0 mapped onto 0..127
//! - button press → `[0x90, note, 127]`
//! - button release → `[0x80, note, 0]`
//!
//! The gilrs context lives on a dedicated blocking worker. Handlers and the
//! hot-plug listener are invoked from that worker, never while the registry
//! lock is held.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gilrs::{Axis, Button, Event, EventType, Gilrs};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    DeviceRef, InputDevice, InputError, InputHost, MessageHandler, PortEvent, PortKind, PortState,
    StateListener,
};
use crate::control::{CONTROL_CHANGE, DATA_MAX, NOTE_OFF, NOTE_ON};

/// How long the worker blocks for an event before checking for shutdown
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Default)]
struct GamepadRegistry {
    pads: HashMap<usize, PadSlot>,
    listener: Option<StateListener>,
}

struct PadSlot {
    name: String,
    connected: bool,
    handler: Option<MessageHandler>,
}

/// [`InputHost`] over all gamepads gilrs can see
pub struct GamepadHost {
    registry: Arc<Mutex<GamepadRegistry>>,
    failure: Option<InputError>,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl GamepadHost {
    /// Starts the gilrs worker and waits for the initial gamepad scan
    ///
    /// Never fails: if gilrs cannot run on this platform the host is still
    /// returned and reports the problem from [`InputHost::inputs`].
    pub async fn spawn() -> Self {
        let registry = Arc::new(Mutex::new(GamepadRegistry::default()));
        let shutdown = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();

        let worker_registry = registry.clone();
        let worker_shutdown = shutdown.clone();
        let worker = tokio::task::spawn_blocking(move || {
            let gilrs = match Gilrs::new() {
                Ok(gilrs) => gilrs,
                Err(gilrs::Error::NotImplemented(_)) => {
                    let _ = ready_tx.send(Err(InputError::Unsupported(
                        "gamepads are not supported on this platform".to_string(),
                    )));
                    return;
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(InputError::InitializationError(e.to_string())));
                    return;
                }
            };

            {
                let mut registry = worker_registry.lock();
                for (id, gamepad) in gilrs.gamepads() {
                    info!("Found gamepad [{}] {}", id, gamepad.name());
                    registry.pads.insert(
                        usize::from(id),
                        PadSlot {
                            name: gamepad.name().to_string(),
                            connected: gamepad.is_connected(),
                            handler: None,
                        },
                    );
                }
            }
            let _ = ready_tx.send(Ok(()));

            run_event_loop(gilrs, &worker_registry, &worker_shutdown);
        });

        let failure = match ready_rx.await {
            Ok(Ok(())) => {
                info!("Gamepad host running");
                None
            }
            Ok(Err(e)) => {
                warn!("Gamepad host inactive: {}", e);
                Some(e)
            }
            Err(_) => Some(InputError::InitializationError(
                "gamepad worker exited during startup".to_string(),
            )),
        };

        Self {
            registry,
            failure,
            shutdown,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Stops the worker; handlers stop firing once it returns
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!("Gamepad worker failed: {}", e);
            }
        }
    }

    fn device(&self, index: usize, name: String) -> DeviceRef {
        Arc::new(GamepadDevice {
            index,
            id: device_id(index),
            name,
            registry: self.registry.clone(),
        })
    }
}

impl InputHost for GamepadHost {
    fn inputs(&self) -> Result<Vec<DeviceRef>, InputError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let pads: Vec<(usize, String)> = self
            .registry
            .lock()
            .pads
            .iter()
            .filter(|(_, slot)| slot.connected)
            .map(|(index, slot)| (*index, slot.name.clone()))
            .collect();
        Ok(pads
            .into_iter()
            .map(|(index, name)| self.device(index, name))
            .collect())
    }

    fn subscribe(&self, listener: StateListener) -> Result<(), InputError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        self.registry.lock().listener = Some(listener);
        Ok(())
    }

    fn unsubscribe(&self) {
        self.registry.lock().listener = None;
    }
}

impl Drop for GamepadHost {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// One gamepad as seen through [`GamepadHost`]
pub struct GamepadDevice {
    index: usize,
    id: String,
    name: String,
    registry: Arc<Mutex<GamepadRegistry>>,
}

impl InputDevice for GamepadDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_message_handler(&self, handler: Option<MessageHandler>) -> Result<(), InputError> {
        let mut registry = self.registry.lock();
        match registry.pads.get_mut(&self.index) {
            Some(slot) if slot.connected || handler.is_none() => {
                slot.handler = handler;
                Ok(())
            }
            Some(_) => Err(InputError::DeviceAccess {
                device: self.id.clone(),
                reason: "gamepad is disconnected".to_string(),
            }),
            None => Err(InputError::DeviceAccess {
                device: self.id.clone(),
                reason: "unknown gamepad".to_string(),
            }),
        }
    }
}

fn device_id(index: usize) -> String {
    format!("gamepad-{}", index)
}

fn run_event_loop(
    mut gilrs: Gilrs,
    registry: &Arc<Mutex<GamepadRegistry>>,
    shutdown: &CancellationToken,
) {
    info!("Starting gamepad event loop");
    while !shutdown.is_cancelled() {
        let Some(Event { id, event, .. }) = gilrs.next_event_blocking(Some(POLL_TIMEOUT)) else {
            continue;
        };
        let index = usize::from(id);

        match event {
            EventType::Connected => {
                let name = gilrs.gamepad(id).name().to_string();
                info!("Gamepad connected: [{}] {}", index, name);
                let listener = {
                    let mut registry = registry.lock();
                    let slot = registry.pads.entry(index).or_insert_with(|| PadSlot {
                        name: name.clone(),
                        connected: true,
                        handler: None,
                    });
                    slot.name = name.clone();
                    slot.connected = true;
                    registry.listener.clone()
                };
                notify(listener, registry, index, name, PortState::Connected);
            }
            EventType::Disconnected => {
                warn!("Gamepad disconnected: [{}]", index);
                let (listener, name) = {
                    let mut registry = registry.lock();
                    let name = match registry.pads.get_mut(&index) {
                        Some(slot) => {
                            slot.connected = false;
                            slot.name.clone()
                        }
                        None => String::new(),
                    };
                    (registry.listener.clone(), name)
                };
                notify(listener, registry, index, name, PortState::Disconnected);
            }
            other => {
                let Some(payload) = encode_event(other) else {
                    continue;
                };
                let handler = registry
                    .lock()
                    .pads
                    .get(&index)
                    .and_then(|slot| slot.handler.clone());
                if let Some(handler) = handler {
                    handler(&payload);
                }
            }
        }
    }
    debug!("Gamepad event loop stopped");
}

fn notify(
    listener: Option<StateListener>,
    registry: &Arc<Mutex<GamepadRegistry>>,
    index: usize,
    name: String,
    state: PortState,
) {
    if let Some(listener) = listener {
        let device: DeviceRef = Arc::new(GamepadDevice {
            index,
            id: device_id(index),
            name,
            registry: registry.clone(),
        });
        listener(PortEvent {
            device,
            kind: PortKind::Input,
            state,
        });
    }
}

/// Converts a gilrs event into a byte triplet, if it carries jog-relevant input
fn encode_event(event: EventType) -> Option<[u8; 3]> {
    match event {
        EventType::AxisChanged(axis, value, _) => encode_axis(axis, value),
        EventType::ButtonPressed(button, _) => encode_button(button, true),
        EventType::ButtonReleased(button, _) => encode_button(button, false),
        _ => None,
    }
}

fn encode_axis(axis: Axis, value: f32) -> Option<[u8; 3]> {
    axis_controller(axis).map(|cc| [CONTROL_CHANGE, cc, axis_value(value)])
}

fn encode_button(button: Button, pressed: bool) -> Option<[u8; 3]> {
    button_note(button).map(|note| {
        if pressed {
            [NOTE_ON, note, DATA_MAX]
        } else {
            [NOTE_OFF, note, 0]
        }
    })
}

/// Control Change number per axis; left stick X doubles as the default jog
fn axis_controller(axis: Axis) -> Option<u8> {
    match axis {
        Axis::LeftStickX => Some(1),
        Axis::LeftStickY => Some(2),
        Axis::RightStickX => Some(3),
        Axis::RightStickY => Some(4),
        Axis::LeftZ => Some(5),
        Axis::RightZ => Some(6),
        _ => None,
    }
}

fn button_note(button: Button) -> Option<u8> {
    match button {
        Button::South => Some(36),
        Button::East => Some(37),
        Button::West => Some(38),
        Button::North => Some(39),
        Button::LeftTrigger => Some(40),
        Button::RightTrigger => Some(41),
        Button::DPadLeft => Some(42),
        Button::DPadRight => Some(43),
        Button::DPadUp => Some(44),
        Button::DPadDown => Some(45),
        Button::Start => Some(46),
        Button::Select => Some(47),
        _ => None,
    }
}

/// Maps −1.0..=1.0 onto 0..=127 with 0.0 landing on 64
fn axis_value(value: f32) -> u8 {
    let scaled = ((value.clamp(-1.0, 1.0) + 1.0) * 63.5).round();
    scaled.clamp(0.0, f32::from(DATA_MAX)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlEvent;
    use crate::mapping::{RelativeJogMapping, VelocityMapping};

    #[test]
    fn test_axis_value_range() {
        assert_eq!(axis_value(-1.0), 0);
        assert_eq!(axis_value(0.0), 64);
        assert_eq!(axis_value(1.0), 127);
        assert_eq!(axis_value(5.0), 127);
        assert_eq!(axis_value(-5.0), 0);
        assert!(axis_value(0.25) > 64);
        assert!(axis_value(-0.25) < 64);
    }

    #[test]
    fn test_left_stick_drives_default_jog() {
        let payload = encode_axis(Axis::LeftStickX, 0.5).unwrap();
        let event = ControlEvent::from_bytes(&payload).unwrap();

        let impulse = RelativeJogMapping::default().impulse(&event).unwrap();
        assert!(impulse > 0.0);

        let centred = encode_axis(Axis::LeftStickX, 0.0).unwrap();
        let event = ControlEvent::from_bytes(&centred).unwrap();
        assert_eq!(RelativeJogMapping::default().impulse(&event), None);
    }

    #[test]
    fn test_unmapped_axis_is_skipped() {
        assert_eq!(encode_axis(Axis::Unknown, 1.0), None);
        assert_eq!(encode_axis(Axis::RightStickY, -1.0), Some([CONTROL_CHANGE, 4, 0]));
    }

    #[test]
    fn test_buttons_encode_as_notes() {
        assert_eq!(encode_button(Button::South, true), Some([NOTE_ON, 36, 127]));
        assert_eq!(encode_button(Button::South, false), Some([NOTE_OFF, 36, 0]));
        assert_eq!(encode_button(Button::Mode, true), None);
    }

    #[test]
    fn test_disconnected_pad_rejects_handler() {
        let registry = Arc::new(Mutex::new(GamepadRegistry::default()));
        registry.lock().pads.insert(
            0,
            PadSlot {
                name: "pad".to_string(),
                connected: false,
                handler: None,
            },
        );
        let device = GamepadDevice {
            index: 0,
            id: device_id(0),
            name: "pad".to_string(),
            registry: registry.clone(),
        };

        let handler: MessageHandler = Arc::new(|_payload: &[u8]| {});
        assert!(matches!(
            device.set_message_handler(Some(handler)),
            Err(InputError::DeviceAccess { .. })
        ));
        assert!(device.set_message_handler(None).is_ok());
    }
}

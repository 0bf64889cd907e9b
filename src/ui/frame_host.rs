//! egui bindings for the frame scheduler and the input sink

use tokio::sync::mpsc;
use tracing::warn;

use crate::control::ControlEvent;
use crate::input::ControlSink;
use crate::scheduler::{FrameHost, TickHandle};

/// Frame host backed by egui's repaint requests
///
/// A scheduled tick is delivered by the next `update` call. egui cannot
/// withdraw a repaint request, so cancelling only forgets the handle and the
/// scheduler drops the tick as stale.
pub struct EguiFrameHost {
    ctx: egui::Context,
    next_id: u64,
}

impl EguiFrameHost {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx, next_id: 0 }
    }
}

impl FrameHost for EguiFrameHost {
    fn schedule_tick(&mut self) -> TickHandle {
        self.next_id += 1;
        self.ctx.request_repaint();
        TickHandle::new(self.next_id)
    }

    fn cancel_tick(&mut self, _handle: TickHandle) {}
}

/// Forwards control events to the UI thread and wakes it up
pub struct RepaintSink {
    events: mpsc::Sender<ControlEvent>,
    ctx: egui::Context,
}

impl RepaintSink {
    pub fn new(events: mpsc::Sender<ControlEvent>, ctx: egui::Context) -> Self {
        Self { events, ctx }
    }
}

impl ControlSink for RepaintSink {
    fn emit(&self, event: ControlEvent) {
        match self.events.try_send(event) {
            Ok(()) => self.ctx.request_repaint(),
            Err(e) => warn!("Dropping control event {:?}: {}", event, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let mut host = EguiFrameHost::new(egui::Context::default());
        let first = host.schedule_tick();
        let second = host.schedule_tick();
        assert_ne!(first, second);
    }

    #[test]
    fn test_sink_forwards_to_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = RepaintSink::new(tx, egui::Context::default());

        sink.emit(ControlEvent::new(0xB0, 1, 65));
        // Full channel: dropped with a warning
        sink.emit(ControlEvent::new(0xB0, 1, 66));

        assert_eq!(rx.try_recv().ok(), Some(ControlEvent::new(0xB0, 1, 65)));
        assert!(rx.try_recv().is_err());
    }
}

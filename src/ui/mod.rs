//! # Jog wheel window
//!
//! egui front end tying the pieces together:
//!
//! - input devices feed [`ControlEvent`]s through a [`RepaintSink`]
//! - the UI thread drains them into the [`JogWheel`]
//! - the [`FrameScheduler`] keeps ticking the wheel while it moves
//! - [`wheel_view::paint_wheel`] draws the current angle
//!
//! Settings edited in the side panel are sanitized and published on a watch
//! channel. The physics model reads that channel on every step; the autosave
//! task persists it.

pub mod common;
pub mod frame_host;
pub mod settings_menu;
pub mod wheel_view;

use std::sync::Arc;

use eframe::egui::{self, Button, RichText, Sense};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::control::ControlEvent;
use crate::input::{Configured, InputHost, InputNormalizer};
use crate::mapping::RelativeJogMapping;
use crate::scheduler::FrameScheduler;
use crate::settings::JogSettings;
use crate::wheel::JogWheel;
use common::UiColors;
pub use frame_host::{EguiFrameHost, RepaintSink};
use settings_menu::SettingsMenuData;

/// Capacity of the device-to-UI event channel
pub const EVENT_QUEUE_LEN: usize = 256;

type LiveJogWheel = JogWheel<watch::Receiver<JogSettings>, RelativeJogMapping>;

pub struct JogWheelApp {
    wheel: LiveJogWheel,
    scheduler: FrameScheduler<EguiFrameHost>,
    events: mpsc::Receiver<ControlEvent>,
    settings_tx: watch::Sender<JogSettings>,
    settings_menu_data: SettingsMenuData,
    show_settings: bool,
    normalizer: Option<InputNormalizer<Configured>>,
    shutdown: CancellationToken,
}

impl JogWheelApp {
    /// Builds the app and attaches the input normalizer to `input_host`
    ///
    /// `shutdown` is cancelled when the window closes so background tasks
    /// can finish.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        input_host: Arc<dyn InputHost>,
        settings_tx: watch::Sender<JogSettings>,
        shutdown: CancellationToken,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        let (event_tx, events) = mpsc::channel(EVENT_QUEUE_LEN);
        let sink = RepaintSink::new(event_tx, cc.egui_ctx.clone());
        let normalizer = InputNormalizer::create(input_host, sink).setup();

        let settings = settings_tx.borrow().clone();
        let wheel = JogWheel::new(
            settings_tx.subscribe(),
            RelativeJogMapping::from_settings(&settings),
        );

        let mut scheduler = FrameScheduler::new(EguiFrameHost::new(cc.egui_ctx.clone()));
        // First frame paints the wheel at rest
        scheduler.start();

        Self {
            wheel,
            scheduler,
            events,
            settings_tx,
            settings_menu_data: SettingsMenuData::new(settings),
            show_settings: false,
            normalizer: Some(normalizer),
            shutdown,
        }
    }

    fn drain_events(&mut self) {
        let mut moved = false;
        while let Ok(event) = self.events.try_recv() {
            moved |= self.wheel.handle_event(&event);
        }
        if moved {
            self.scheduler.request_redraw();
        }
    }

    fn run_pending_tick(&mut self, ctx: &egui::Context) {
        if let Some(handle) = self.scheduler.pending() {
            let now_ms = ctx.input(|i| i.time) * 1000.0;
            self.scheduler.on_tick(handle, now_ms, &mut self.wheel);
        }
    }

    fn apply_settings(&mut self) {
        let settings = self.settings_menu_data.draft().sanitized();
        debug!("Applying settings {:?}", settings);

        self.wheel
            .set_mapping(RelativeJogMapping::from_settings(&settings));
        self.settings_menu_data.set_draft(settings.clone());
        self.settings_tx.send_replace(settings);

        self.wheel.mark_dirty();
        self.scheduler.request_redraw();
    }

    fn render_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel")
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let width = ui.available_width() / 4.0;
                    let settings_label = if self.show_settings {
                        "Hide settings"
                    } else {
                        "Settings"
                    };
                    if ui
                        .add(Button::new(settings_label).min_size(egui::vec2(width, 20.0)))
                        .clicked()
                    {
                        self.show_settings = !self.show_settings;
                    }
                    if ui
                        .add(Button::new("Stop").min_size(egui::vec2(width, 20.0)))
                        .clicked()
                    {
                        self.wheel.stop();
                        self.wheel.mark_dirty();
                        self.scheduler.request_redraw();
                    }

                    let (text, color) = if self.wheel.rotation().is_moving() {
                        ("moving", UiColors::ACTIVE)
                    } else {
                        ("stopped", UiColors::INACTIVE)
                    };
                    ui.label(RichText::new(text).color(color));
                    ui.label(format!(
                        "{:.1}°",
                        self.wheel.display_angle().to_degrees()
                    ));
                });
            });
    }
}

impl eframe::App for JogWheelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.run_pending_tick(ctx);

        self.render_top_panel(ctx);

        if self.show_settings {
            let mut changed = false;
            egui::SidePanel::left("settings_panel")
                .resizable(false)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        changed = self.settings_menu_data.render(ui);
                    });
                });
            if changed {
                self.apply_settings();
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(UiColors::CANVAS_BG))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), Sense::hover());
                wheel_view::paint_wheel(
                    &painter,
                    response.rect,
                    self.wheel.display_angle(),
                    self.settings_menu_data.draft(),
                );
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Window closing");
        self.scheduler.stop();
        if let Some(normalizer) = self.normalizer.take() {
            normalizer.teardown();
        }
        self.shutdown.cancel();
    }
}

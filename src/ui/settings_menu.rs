use eframe::egui::{ComboBox, DragValue, Slider, Ui};

use super::common::section_frame;
use crate::mapping::{JogEncoding, NEUTRAL_VALUE};
use crate::settings::{
    JogSettings, ARC_RADIUS_RANGE, DECAY_RATE_RANGE, DISK_RADIUS_MIN, MARKER_LENGTH_MIN,
    MARKER_WIDTH_RANGE, MIN_VELOCITY_RANGE, ROTATION_SPEED_RANGE,
};

/// Editable copy of the jog settings shown in the side panel
pub struct SettingsMenuData {
    draft: JogSettings,
}

impl SettingsMenuData {
    pub fn new(settings: JogSettings) -> Self {
        Self { draft: settings }
    }

    pub fn draft(&self) -> &JogSettings {
        &self.draft
    }

    /// Replaces the draft, e.g. with the sanitized version of itself
    pub fn set_draft(&mut self, settings: JogSettings) {
        self.draft = settings;
    }

    /// Renders the panel; returns `true` if any value was edited this frame
    pub fn render(&mut self, ui: &mut Ui) -> bool {
        let mut changed = false;
        ui.vertical(|ui| {
            ui.heading("Settings");
            changed |= self.render_motion_section(ui);
            ui.add_space(5.0);
            changed |= self.render_appearance_section(ui);
            ui.add_space(5.0);
            changed |= self.render_input_section(ui);
        });
        changed
    }

    fn render_motion_section(&mut self, ui: &mut Ui) -> bool {
        let mut changed = false;
        section_frame().show(ui, |ui| {
            ui.heading("Motion");
            changed |= ui
                .add(
                    Slider::new(
                        &mut self.draft.rotation_speed,
                        ROTATION_SPEED_RANGE.0..=ROTATION_SPEED_RANGE.1,
                    )
                    .text("Rotation speed"),
                )
                .changed();
            changed |= ui
                .add(
                    Slider::new(
                        &mut self.draft.inertia_decay_rate,
                        DECAY_RATE_RANGE.0..=DECAY_RATE_RANGE.1,
                    )
                    .text("Decay rate"),
                )
                .changed();
            changed |= ui
                .add(
                    Slider::new(
                        &mut self.draft.inertia_min_velocity,
                        MIN_VELOCITY_RANGE.0..=MIN_VELOCITY_RANGE.1,
                    )
                    .logarithmic(true)
                    .text("Stop threshold"),
                )
                .changed();
        });
        changed
    }

    fn render_appearance_section(&mut self, ui: &mut Ui) -> bool {
        let mut changed = false;
        section_frame().show(ui, |ui| {
            ui.heading("Appearance");
            let arc_radius = self.draft.arc_radius;

            ui.horizontal(|ui| {
                ui.label("Arc");
                changed |= ui
                    .color_edit_button_srgba_unmultiplied(&mut self.draft.arc_color)
                    .changed();
                changed |= ui
                    .add(
                        Slider::new(
                            &mut self.draft.arc_radius,
                            ARC_RADIUS_RANGE.0..=ARC_RADIUS_RANGE.1,
                        )
                        .text("radius"),
                    )
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Disk");
                changed |= ui
                    .color_edit_button_srgba_unmultiplied(&mut self.draft.disk_color)
                    .changed();
                changed |= ui
                    .add(
                        Slider::new(&mut self.draft.disk_radius, DISK_RADIUS_MIN..=arc_radius)
                            .text("radius"),
                    )
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Marker");
                changed |= ui
                    .color_edit_button_srgba_unmultiplied(&mut self.draft.marker_color)
                    .changed();
                changed |= ui
                    .add(
                        Slider::new(
                            &mut self.draft.marker_width,
                            MARKER_WIDTH_RANGE.0..=MARKER_WIDTH_RANGE.1,
                        )
                        .text("width"),
                    )
                    .changed();
            });
            changed |= ui
                .add(
                    Slider::new(&mut self.draft.marker_length, MARKER_LENGTH_MIN..=arc_radius)
                        .text("Marker length"),
                )
                .changed();
        });
        changed
    }

    fn render_input_section(&mut self, ui: &mut Ui) -> bool {
        let mut changed = false;
        section_frame().show(ui, |ui| {
            ui.heading("Jog input");
            ui.horizontal(|ui| {
                ui.label("Controller (CC):");
                changed |= ui
                    .add(DragValue::new(&mut self.draft.jog_controller).range(0..=127))
                    .changed();
            });

            let offset = JogEncoding::Offset {
                neutral: NEUTRAL_VALUE,
            };
            ComboBox::from_id_salt("jog_encoding")
                .selected_text(encoding_label(&self.draft.jog_encoding))
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut self.draft.jog_encoding, offset, encoding_label(&offset))
                        .changed();
                    changed |= ui
                        .selectable_value(
                            &mut self.draft.jog_encoding,
                            JogEncoding::TwosComplement,
                            encoding_label(&JogEncoding::TwosComplement),
                        )
                        .changed();
                });

            if let JogEncoding::Offset { neutral } = &mut self.draft.jog_encoding {
                ui.horizontal(|ui| {
                    ui.label("Neutral value:");
                    changed |= ui.add(DragValue::new(neutral).range(0..=127)).changed();
                });
            }
        });
        changed
    }
}

fn encoding_label(encoding: &JogEncoding) -> &'static str {
    match encoding {
        JogEncoding::Offset { .. } => "Offset from neutral",
        JogEncoding::TwosComplement => "Two's complement",
    }
}

//! Wheel rendering
//!
//! A pure function of the display angle and the appearance settings: a
//! filled inner disk, the outer ring, and a marker that starts at twelve
//! o'clock and turns clockwise with the angle.

use egui::{Painter, Pos2, Rect, Stroke, Vec2};

use super::common::to_color32;
use crate::settings::JogSettings;

/// Stroke width of the outer ring
const ARC_LINE_WIDTH: f32 = 6.0;

/// Gap between the ring and the outer end of the marker
const MARKER_INSET: f32 = 10.0;

pub fn paint_wheel(painter: &Painter, rect: Rect, angle: f64, settings: &JogSettings) {
    let center = rect.center();
    let scale = fit_scale(rect, settings.arc_radius);

    painter.circle_filled(
        center,
        settings.disk_radius * scale,
        to_color32(settings.disk_color),
    );
    painter.circle_stroke(
        center,
        settings.arc_radius * scale,
        Stroke::new(ARC_LINE_WIDTH * scale, to_color32(settings.arc_color)),
    );

    let [start, end] = marker_segment(center, angle as f32, settings, scale);
    painter.line_segment(
        [start, end],
        Stroke::new(settings.marker_width * scale, to_color32(settings.marker_color)),
    );
}

/// Shrinks the drawing when the ring would not fit into `rect`
fn fit_scale(rect: Rect, arc_radius: f32) -> f32 {
    let available = rect.width().min(rect.height()) / 2.0 - ARC_LINE_WIDTH;
    if available <= 0.0 {
        return 0.0;
    }
    (available / arc_radius).min(1.0)
}

/// Marker endpoints, outer end first
fn marker_segment(center: Pos2, angle: f32, settings: &JogSettings, scale: f32) -> [Pos2; 2] {
    let outer = (settings.arc_radius - MARKER_INSET).max(0.0);
    let inner = (outer - settings.marker_length).max(0.0);
    // Screen y grows downwards, so (sin, -cos) turns clockwise from the top
    let direction = Vec2::new(angle.sin(), -angle.cos());
    [
        center + direction * outer * scale,
        center + direction * inner * scale,
    ]
}

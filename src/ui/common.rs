//! Shared styling for the jog wheel window

use egui::{Color32, Frame, Stroke};

use crate::settings::Rgba;

/// Dark palette used by every panel
pub struct UiColors;

impl UiColors {
    /// Window background (RGB: 20, 20, 20)
    pub const CANVAS_BG: Color32 = Color32::from_rgb(20, 20, 20);

    /// Panel sections (RGB: 30, 30, 30)
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);

    /// Section borders (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Moving indicator (RGB: 50, 200, 20)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Stopped indicator (RGB: 200, 50, 20)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
}

/// Bordered frame around one settings section
pub fn section_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .fill(UiColors::MAIN_BG)
        .inner_margin(8.0)
        .outer_margin(2.0)
}

pub fn to_color32(rgba: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

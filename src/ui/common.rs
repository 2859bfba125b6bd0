//! Shared styling for the connect panel.

use eframe::egui::{Color32, Frame, Stroke};

/// Dark theme palette.
pub struct UiColors;

impl UiColors {
    /// Primary background color for main content areas (RGB: 30, 30, 30)
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);

    /// Border color for component separation (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Idle/ready status indicator color (RGB: 50, 200, 20) - Green
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Error status indicator and error text color (RGB: 200, 50, 20) - Red
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
}

/// Creates a frame with the panel's margins and border.
pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(8)
        .outer_margin(2)
}

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::session::Feedback;

// ---------------------------------------------------------------------------
// Colour helpers
// ---------------------------------------------------------------------------

/// Convert an HSL triple (hue in degrees) to an egui colour.
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Series colours for the plots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SeriesColors {
    pub spectrum: Color32,
    pub anchors: Color32,
    pub continuum: Color32,
    pub normalized: Color32,
    /// Unity line on the normalized panel.
    pub reference: Color32,
}

impl Default for SeriesColors {
    fn default() -> Self {
        Self {
            spectrum: Color32::LIGHT_BLUE,
            anchors: hsl(0.0, 0.85, 0.55),
            continuum: hsl(15.0, 0.75, 0.6),
            normalized: hsl(140.0, 0.6, 0.55),
            reference: Color32::GRAY,
        }
    }
}

/// Status bar colour for a feedback message.
pub fn feedback_color(feedback: &Feedback) -> Color32 {
    match feedback {
        Feedback::Info(_) => Color32::GRAY,
        Feedback::Warning(_) => hsl(40.0, 0.9, 0.55),
        Feedback::Error(_) => Color32::RED,
    }
}

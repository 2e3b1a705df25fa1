use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Indicator;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// starting at `offset` degrees.
pub fn generate_palette(n: usize, offset: f32) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = offset + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.70, 0.50);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Series colours
// ---------------------------------------------------------------------------

/// Colour of the main company's series.
pub const PRIMARY: Color32 = Color32::from_rgb(31, 119, 180);

/// Fixed colour per indicator so a keyword keeps its colour across charts.
pub fn indicator_color(indicator: Indicator) -> Color32 {
    let palette = generate_palette(Indicator::COUNT, 210.0);
    let slot = Indicator::ALL
        .iter()
        .position(|&i| i == indicator)
        .unwrap_or(0);
    palette[slot]
}

/// Colours for `n` comparison companies, distinct from [`PRIMARY`].
pub fn comparison_colors(n: usize) -> Vec<Color32> {
    generate_palette(n.max(1), 30.0)
}

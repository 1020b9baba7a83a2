//! Colors used by the renderer.

use crate::coords::ColorRgba;

/// Pair of colors for the reference grid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxesColor {
    /// Axes and every tenth grid line.
    pub main: ColorRgba,
    pub secondary: ColorRgba,
}

/// Full set of colors the renderer draws with.
///
/// Replaced as a whole through `WorldRenderer::set_styling`.
#[derive(Debug, Clone, PartialEq)]
pub struct StylePreset {
    pub background: ColorRgba,
    pub static_body: ColorRgba,
    pub sleeping_body: ColorRgba,
    pub anchor: ColorRgba,
    pub contact_point: ColorRgba,
    pub contact_normal: ColorRgba,
    pub joint: ColorRgba,
    pub axes: AxesColor,
}

impl Default for StylePreset {
    fn default() -> Self {
        Self {
            background: ColorRgba::white(),
            static_body: ColorRgba::new(0.4, 0.4, 0.4, 1.0),
            sleeping_body: ColorRgba::new(0.0, 0.0, 0.0, 0.25),
            anchor: ColorRgba::new(0.01, 0.34, 1.0, 1.0),
            contact_point: ColorRgba::new(1.0, 0.0, 0.0, 1.0),
            contact_normal: ColorRgba::new(0.96, 0.68, 0.26, 1.0),
            joint: ColorRgba::new(0.96, 0.68, 0.26, 1.0),
            axes: AxesColor {
                main: ColorRgba::new(0.2, 0.6, 1.0, 1.0),
                secondary: ColorRgba::new(0.8, 0.9, 1.0, 1.0),
            },
        }
    }
}

const PALETTE_HEX: [&str; 16] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#469990",
    "#9a6324", "#800000", "#808000", "#000075", "#bfef45", "#dcbeff", "#aaffc3", "#ffd8b1",
];

/// Colors assigned to simulation islands, indexed modulo length.
pub fn island_palette() -> Vec<ColorRgba> {
    PALETTE_HEX
        .iter()
        .filter_map(|hex| ColorRgba::from_hex(hex))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_parses_every_entry() {
        assert_eq!(island_palette().len(), PALETTE_HEX.len());
    }

    #[test]
    fn default_background_is_white() {
        assert_eq!(StylePreset::default().background, ColorRgba::white());
    }
}

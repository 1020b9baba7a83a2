use glam::Vec2;

use crate::style::StylePreset;

use super::{
    GeometryData, GeometryError, LineBuilder, VertexLayout, CONTACT_NORMAL, PIVOT_RADIUS,
};

/// Reference grid centred on the world origin.
///
/// Ring 0 holds the two axes. Ring `u` adds horizontal and vertical lines at
/// `±u·unit`; every tenth ring uses the main axis color.
pub fn create_grid(
    expansion: f32,
    unit: f32,
    preset: &StylePreset,
) -> Result<GeometryData, GeometryError> {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    let main = preset.axes.main;
    let x = expansion;

    builder.colored_segment(Vec2::new(-x, 0.0), Vec2::new(x, 0.0), main);
    builder.colored_segment(Vec2::new(0.0, -x), Vec2::new(0.0, x), main);

    let rings = if unit > 0.0 && expansion.is_finite() {
        (expansion / unit).floor() as usize
    } else {
        0
    };

    for u in 1..=rings {
        let e = u as f32 * unit;
        let color = if u % 10 == 0 { main } else { preset.axes.secondary };

        builder.colored_segment(Vec2::new(-x, e), Vec2::new(x, e), color);
        builder.colored_segment(Vec2::new(-x, -e), Vec2::new(x, -e), color);
        builder.colored_segment(Vec2::new(e, -x), Vec2::new(e, x), color);
        builder.colored_segment(Vec2::new(-e, -x), Vec2::new(-e, x), color);
    }

    builder.finish()
}

/// Contact marker: the normal along +Y plus a small tick cross at the point.
pub fn create_contact_point(preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    let point = preset.contact_point;

    builder.colored_segment(Vec2::ZERO, Vec2::new(0.0, CONTACT_NORMAL), preset.contact_normal);
    builder.colored_segment(Vec2::new(-PIVOT_RADIUS, 0.0), Vec2::new(PIVOT_RADIUS, 0.0), point);
    builder.colored_segment(Vec2::ZERO, Vec2::new(0.0, PIVOT_RADIUS * 1.5), point);

    finish_marker(builder)
}

/// Anchor marker: a small X in the anchor color.
pub fn create_pivot(preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    let r = PIVOT_RADIUS * std::f32::consts::FRAC_1_SQRT_2;

    builder.colored_segment(Vec2::new(-r, -r), Vec2::new(r, r), preset.anchor);
    builder.colored_segment(Vec2::new(r, -r), Vec2::new(-r, r), preset.anchor);

    finish_marker(builder)
}

fn finish_marker(builder: LineBuilder) -> GeometryData {
    match builder.finish() {
        Ok(data) => data,
        Err(e) => unreachable!("marker overflowed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ColorRgba;
    use crate::geometry::{GRID_EXPANSION, GRID_UNIT};

    #[test]
    fn default_grid_fits_in_16_bit_indices() {
        let data = create_grid(GRID_EXPANSION, GRID_UNIT, &StylePreset::default()).unwrap();
        assert!(data.is_well_formed());
        assert_eq!(data.vertex_count(), 4 + 256 * 8);
    }

    #[test]
    fn every_tenth_grid_ring_uses_main_color() {
        let preset = StylePreset::default();
        let data = create_grid(20.0, 1.0, &preset).unwrap();

        // Ring u starts at vertex 4 + (u - 1) * 8.
        let ring_color = |u: usize| data.color(4 + (u - 1) * 8).unwrap();
        assert_eq!(data.color(0), Some(preset.axes.main));
        assert_eq!(ring_color(1), preset.axes.secondary);
        assert_eq!(ring_color(10), preset.axes.main);
        assert_eq!(ring_color(11), preset.axes.secondary);
        assert_eq!(ring_color(20), preset.axes.main);
        assert_eq!(data.position(4 + 9 * 8), Some(Vec2::new(-20.0, 10.0)));
    }

    #[test]
    fn non_positive_grid_unit_keeps_only_axes() {
        let data = create_grid(10.0, 0.0, &StylePreset::default()).unwrap();
        assert_eq!(data.vertex_count(), 4);
    }

    #[test]
    fn contact_marker_colors_normal_and_point() {
        let preset = StylePreset {
            contact_normal: ColorRgba::new(0.0, 1.0, 0.0, 1.0),
            ..StylePreset::default()
        };
        let data = create_contact_point(&preset);
        assert!(data.is_well_formed());
        assert_eq!(data.vertex_count(), 6);
        assert_eq!(data.color(1), Some(preset.contact_normal));
        assert_eq!(data.position(1), Some(Vec2::new(0.0, CONTACT_NORMAL)));
        assert_eq!(data.color(5), Some(preset.contact_point));
    }

    #[test]
    fn pivot_is_an_x_in_anchor_color() {
        let preset = StylePreset::default();
        let data = create_pivot(&preset);
        assert_eq!(data.vertex_count(), 4);
        assert!((0..4).all(|i| data.color(i) == Some(preset.anchor)));
        assert!((0..4).all(|i| (data.position(i).unwrap().length() - PIVOT_RADIUS).abs() < 1e-6));
    }
}

use std::f32::consts::{FRAC_1_SQRT_2, TAU};

use glam::{Mat3, Vec2};

use crate::style::StylePreset;
use crate::world::{JointKind, TravelLimits};

use super::{
    GeometryData, GeometryError, LineBuilder, VertexLayout, CIRCLE_SEGMENTS, JOINT_LENGTH,
    JOINT_RADIUS, JOINT_TICK, SPRING_HOOPS, SPRING_WEIGHT,
};

/// Geometry for a joint in its local frame.
///
/// `pivot_a` is only used by kinds whose geometry is baked into body A's
/// frame (prismatic and wheel). Returns `Ok(None)` for unsupported kinds.
pub fn create_joint(
    kind: &JointKind,
    pivot_a: Vec2,
    preset: &StylePreset,
) -> Result<Option<GeometryData>, GeometryError> {
    let data = match kind {
        JointKind::Revolute => create_revolute_joint(preset),
        JointKind::Weld => create_weld_joint(preset),
        JointKind::Motor => create_motor_joint(preset),
        JointKind::Spring => create_spring(preset),
        JointKind::Distance { distance } => create_distance_joint(*distance, preset),
        JointKind::Prismatic(limits) | JointKind::Wheel(limits) => {
            create_travel_joint(limits, pivot_a, preset)?
        }
        JointKind::Mouse { .. } => create_mouse_joint(preset),
        JointKind::Unsupported { .. } => return Ok(None),
    };
    Ok(Some(data))
}

pub fn create_revolute_joint(preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    append_ring(&mut builder, preset);
    finish_joint(builder)
}

/// Ring with an X through it.
pub fn create_weld_joint(preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    append_ring(&mut builder, preset);

    let r = FRAC_1_SQRT_2 * JOINT_RADIUS;
    builder.colored_segment(Vec2::new(-r, -r), Vec2::new(r, r), preset.joint);
    builder.colored_segment(Vec2::new(r, -r), Vec2::new(-r, r), preset.joint);

    finish_joint(builder)
}

/// Ring with two hooks suggesting counter-clockwise drive.
pub fn create_motor_joint(preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    append_ring(&mut builder, preset);

    let r = JOINT_RADIUS;
    let c = preset.joint;
    builder.colored_segment(Vec2::new(0.0, r), Vec2::new(0.5 * r, 1.5 * r), c);
    builder.colored_segment(Vec2::new(0.0, r), Vec2::new(0.5 * r, 0.5 * r), c);
    builder.colored_segment(Vec2::new(0.0, -r), Vec2::new(-0.5 * r, -1.5 * r), c);
    builder.colored_segment(Vec2::new(0.0, -r), Vec2::new(-0.5 * r, -0.5 * r), c);

    finish_joint(builder)
}

/// Zig-zag polyline over unit length along +Y.
///
/// Placement scales +Y to the current anchor distance, so the spring
/// stretches with the bodies.
pub fn create_spring(preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    let dv = 1.0 / SPRING_HOOPS as f32;
    let mut du = SPRING_WEIGHT;
    let mut u = 0.0;

    for i in 0..=SPRING_HOOPS {
        builder.colored(Vec2::new(u, i as f32 * dv), preset.joint);
        if i < SPRING_HOOPS {
            builder.segment(i, i + 1);
        }

        // Half steps at both ends keep the endpoints on the axis.
        u += if i == 0 || i == SPRING_HOOPS - 1 { 0.5 * du } else { du };
        du = -du;
    }

    finish_joint(builder)
}

/// End ticks at 0 and `distance` along +Y, joined by a line.
pub fn create_distance_joint(distance: f32, preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    let t = 0.5 * JOINT_TICK;
    let c = preset.joint;

    builder.colored_segment(Vec2::new(-t, 0.0), Vec2::new(t, 0.0), c);
    builder.colored_segment(Vec2::new(-t, distance), Vec2::new(t, distance), c);
    builder.colored_segment(Vec2::ZERO, Vec2::new(0.0, distance), c);

    finish_joint(builder)
}

/// Travel range of a prismatic or wheel joint, in body A's local frame.
///
/// The range runs along the normalized `local_axis` from `pivot_a`. A tick
/// marks `min` only when a non-zero minimum is configured and `max` only when
/// it is finite; an unlimited maximum is drawn `JOINT_LENGTH` long.
pub fn create_travel_joint(
    limits: &TravelLimits,
    pivot_a: Vec2,
    preset: &StylePreset,
) -> Result<GeometryData, GeometryError> {
    let Some(y) = limits.local_axis.try_normalize() else {
        return Err(GeometryError::DegenerateAxis(limits.local_axis));
    };
    let x = y.perp();
    let frame = Mat3::from_cols(x.extend(0.0), y.extend(0.0), pivot_a.extend(1.0));

    let min = limits.min.unwrap_or(0.0);
    let max = if limits.max.is_finite() { limits.max } else { JOINT_LENGTH };
    let t = 0.5 * JOINT_TICK;
    let c = preset.joint;

    let mut builder = LineBuilder::new(VertexLayout::Colored);
    let tick = |b: &mut LineBuilder, at: f32| {
        b.colored_segment(
            frame.transform_point2(Vec2::new(-t, at)),
            frame.transform_point2(Vec2::new(t, at)),
            c,
        );
    };

    if limits.min.is_some_and(|m| m != 0.0) {
        tick(&mut builder, min);
    }
    if limits.max.is_finite() {
        tick(&mut builder, max);
    }

    builder.colored_segment(
        frame.transform_point2(Vec2::new(0.0, min)),
        frame.transform_point2(Vec2::new(0.0, max)),
        c,
    );

    Ok(finish_joint(builder))
}

/// Unit segment along +Y, stretched from anchor to cursor at placement.
pub fn create_mouse_joint(preset: &StylePreset) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Colored);
    builder.colored_segment(Vec2::ZERO, Vec2::Y, preset.joint);
    finish_joint(builder)
}

fn append_ring(builder: &mut LineBuilder, preset: &StylePreset) {
    let dphi = TAU / CIRCLE_SEGMENTS as f32;
    for j in 0..CIRCLE_SEGMENTS {
        let phi = j as f32 * dphi;
        builder.colored(Vec2::new(phi.cos(), phi.sin()) * JOINT_RADIUS, preset.joint);
        builder.segment(j, (j + 1) % CIRCLE_SEGMENTS);
    }
}

fn finish_joint(builder: LineBuilder) -> GeometryData {
    match builder.finish() {
        Ok(data) => data,
        Err(e) => unreachable!("joint geometry overflowed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PointerCursor;

    fn preset() -> StylePreset {
        StylePreset::default()
    }

    fn positions(data: &GeometryData) -> Vec<Vec2> {
        (0..data.vertex_count()).map(|i| data.position(i).unwrap()).collect()
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    // ── rings ──────────────────────────────────────────────────────────────

    #[test]
    fn ring_joints_are_well_formed_and_joint_colored() {
        let p = preset();
        for data in [create_revolute_joint(&p), create_weld_joint(&p), create_motor_joint(&p)] {
            assert!(data.is_well_formed());
            assert!((0..data.vertex_count()).all(|i| data.color(i) == Some(p.joint)));
        }
        assert_eq!(create_revolute_joint(&p).vertex_count(), CIRCLE_SEGMENTS);
        assert_eq!(create_weld_joint(&p).vertex_count(), CIRCLE_SEGMENTS + 4);
        assert_eq!(create_motor_joint(&p).vertex_count(), CIRCLE_SEGMENTS + 8);
    }

    // ── spring ─────────────────────────────────────────────────────────────

    #[test]
    fn spring_zig_zags_over_unit_length() {
        let data = create_spring(&preset());
        assert!(data.is_well_formed());
        assert_eq!(data.vertex_count(), SPRING_HOOPS + 1);
        assert_eq!(data.index_count(), 2 * SPRING_HOOPS);

        let pts = positions(&data);
        assert_eq!(pts[0], Vec2::ZERO);
        assert!(approx(pts[1], Vec2::new(0.5 * SPRING_WEIGHT, 1.0 / 12.0)));
        assert!(approx(pts[2], Vec2::new(-0.5 * SPRING_WEIGHT, 2.0 / 12.0)));
        assert!(approx(pts[SPRING_HOOPS], Vec2::new(0.0, 1.0)));
    }

    // ── distance ───────────────────────────────────────────────────────────

    #[test]
    fn distance_joint_ticks_both_ends() {
        let data = create_distance_joint(4.0, &preset());
        let pts = positions(&data);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[2], Vec2::new(-0.5 * JOINT_TICK, 4.0));
        assert_eq!(pts[5], Vec2::new(0.0, 4.0));
    }

    // ── travel ─────────────────────────────────────────────────────────────

    #[test]
    fn unlimited_travel_draws_default_length_without_ticks() {
        let limits = TravelLimits {
            local_axis: Vec2::new(0.0, 2.0),
            min: None,
            max: f32::INFINITY,
        };
        let data = create_travel_joint(&limits, Vec2::ZERO, &preset()).unwrap();
        let pts = positions(&data);
        assert_eq!(pts.len(), 2);
        assert!(approx(pts[0], Vec2::ZERO));
        assert!(approx(pts[1], Vec2::new(0.0, JOINT_LENGTH)));
    }

    #[test]
    fn limited_travel_ticks_min_and_max_along_axis() {
        let limits = TravelLimits {
            local_axis: Vec2::X,
            min: Some(-1.0),
            max: 2.0,
        };
        let pivot = Vec2::new(0.5, 0.5);
        let data = create_travel_joint(&limits, pivot, &preset()).unwrap();
        let pts = positions(&data);
        assert_eq!(pts.len(), 6);
        // Axis +X; the tick direction is its perpendicular.
        assert!(approx(pts[0], pivot + Vec2::new(-1.0, -0.5 * JOINT_TICK)));
        assert!(approx(pts[3], pivot + Vec2::new(2.0, 0.5 * JOINT_TICK)));
        assert!(approx(pts[4], pivot + Vec2::new(-1.0, 0.0)));
        assert!(approx(pts[5], pivot + Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn zero_minimum_draws_no_min_tick() {
        let limits = TravelLimits {
            local_axis: Vec2::Y,
            min: Some(0.0),
            max: 1.0,
        };
        let data = create_travel_joint(&limits, Vec2::ZERO, &preset()).unwrap();
        assert_eq!(data.vertex_count(), 4);
    }

    #[test]
    fn degenerate_axis_is_an_error() {
        let limits = TravelLimits {
            local_axis: Vec2::ZERO,
            ..TravelLimits::default()
        };
        let kind = JointKind::Wheel(limits);
        assert_eq!(
            create_joint(&kind, Vec2::ZERO, &preset()),
            Err(GeometryError::DegenerateAxis(Vec2::ZERO))
        );
    }

    // ── dispatch ───────────────────────────────────────────────────────────

    #[test]
    fn dispatch_covers_every_supported_kind() {
        let p = preset();
        let kinds = [
            JointKind::Revolute,
            JointKind::Weld,
            JointKind::Motor,
            JointKind::Spring,
            JointKind::Distance { distance: 1.0 },
            JointKind::Prismatic(TravelLimits::default()),
            JointKind::Wheel(TravelLimits::default()),
            JointKind::Mouse { cursor: PointerCursor::default() },
        ];
        for kind in &kinds {
            let data = create_joint(kind, Vec2::ZERO, &p).unwrap().unwrap();
            assert!(data.is_well_formed(), "{} joint is malformed", kind.name());
        }

        let other = JointKind::Unsupported { kind: "rope".into() };
        assert_eq!(create_joint(&other, Vec2::ZERO, &p), Ok(None));
    }
}

use std::f32::consts::TAU;

use glam::Vec2;

use crate::world::Shape;

use super::{GeometryData, GeometryError, LineBuilder, VertexLayout, CIRCLE_SEGMENTS, CROSS_SIZE};

/// Circle outline with a radius line to the centre and an origin cross.
pub fn create_circle(radius: f32) -> GeometryData {
    create_ellipse(radius, radius)
}

/// Axis-aligned ellipse outline with semi-axes `a` (x) and `b` (y).
pub fn create_ellipse(a: f32, b: f32) -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Plain);
    let dphi = TAU / CIRCLE_SEGMENTS as f32;

    for j in 0..CIRCLE_SEGMENTS {
        let phi = j as f32 * dphi;
        builder.plain(Vec2::new(phi.cos() * a, phi.sin() * b));
        builder.segment(j, (j + 1) % CIRCLE_SEGMENTS);
    }

    let centre = builder.plain(Vec2::ZERO);
    builder.segment(0, centre);

    append_cross(&mut builder);
    finish_small(builder)
}

/// One independent segment per edge of a closed polygon.
pub fn create_polygon(vertices: &[Vec2]) -> Result<GeometryData, GeometryError> {
    let mut builder = LineBuilder::new(VertexLayout::Plain);
    for (i, &v0) in vertices.iter().enumerate() {
        let v1 = vertices[(i + 1) % vertices.len()];
        builder.plain_segment(v0, v1);
    }
    append_cross(&mut builder);
    builder.finish()
}

/// Three independent segments per triangle.
pub fn create_mesh(triangles: &[[Vec2; 3]]) -> Result<GeometryData, GeometryError> {
    let mut builder = LineBuilder::new(VertexLayout::Plain);
    for [p0, p1, p2] in triangles.iter().copied() {
        builder.plain_segment(p0, p1);
        builder.plain_segment(p1, p2);
        builder.plain_segment(p2, p0);
    }
    append_cross(&mut builder);
    builder.finish()
}

/// Origin cross on its own, used for bodies without a collider.
pub fn create_cross() -> GeometryData {
    let mut builder = LineBuilder::new(VertexLayout::Plain);
    append_cross(&mut builder);
    finish_small(builder)
}

/// Outline for a collider shape; `Ok(None)` for shapes with no outline.
pub fn create_shape(shape: &Shape) -> Result<Option<GeometryData>, GeometryError> {
    let data = match shape {
        Shape::Circle { radius } => create_circle(*radius),
        Shape::Ellipse { a, b } => create_ellipse(*a, *b),
        Shape::Polygon { vertices } => create_polygon(vertices)?,
        Shape::Mesh { triangles } => create_mesh(triangles)?,
        Shape::Unsupported { .. } => return Ok(None),
    };
    Ok(Some(data))
}

fn append_cross(builder: &mut LineBuilder) {
    let h = 0.5 * CROSS_SIZE;
    builder.plain_segment(Vec2::new(-h, 0.0), Vec2::new(h, 0.0));
    builder.plain_segment(Vec2::new(0.0, -h), Vec2::new(0.0, h));
}

// Fixed-size outlines stay far below the 16-bit index limit.
fn finish_small(builder: LineBuilder) -> GeometryData {
    match builder.finish() {
        Ok(data) => data,
        Err(e) => unreachable!("fixed-size outline overflowed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Topology;

    fn cross_tail(data: &GeometryData) -> Vec<Vec2> {
        let n = data.vertex_count();
        (n - 4..n).map(|i| data.position(i).unwrap()).collect()
    }

    fn assert_ends_with_cross(data: &GeometryData) {
        let n = data.vertex_count();
        let h = 0.5 * CROSS_SIZE;
        assert_eq!(
            cross_tail(data),
            vec![
                Vec2::new(-h, 0.0),
                Vec2::new(h, 0.0),
                Vec2::new(0.0, -h),
                Vec2::new(0.0, h)
            ]
        );
        let tail = &data.indices[data.indices.len() - 4..];
        assert_eq!(tail, &[(n - 4) as u16, (n - 3) as u16, (n - 2) as u16, (n - 1) as u16]);
    }

    // ── circles ────────────────────────────────────────────────────────────

    #[test]
    fn circle_is_well_formed_and_ends_with_cross() {
        let data = create_circle(1.5);
        assert!(data.is_well_formed());
        assert_eq!(data.layout, VertexLayout::Plain);
        assert_eq!(data.topology, Topology::Lines);
        // 64 samples, centre, 4 cross vertices.
        assert_eq!(data.vertex_count(), CIRCLE_SEGMENTS + 1 + 4);
        // 64 loop segments, radius line, 2 cross segments.
        assert_eq!(data.index_count(), 2 * (CIRCLE_SEGMENTS + 1 + 2));
        assert_ends_with_cross(&data);
    }

    #[test]
    fn circle_loop_closes_and_samples_lie_on_radius() {
        let data = create_circle(2.0);
        let last = 2 * (CIRCLE_SEGMENTS - 1);
        assert_eq!(&data.indices[last..last + 2], &[63, 0]);
        for i in 0..CIRCLE_SEGMENTS {
            let p = data.position(i).unwrap();
            assert!((p.length() - 2.0).abs() < 1e-5);
        }
        // Radius line from the first sample to the centre.
        assert_eq!(&data.indices[128..130], &[0, 64]);
        assert_eq!(data.position(64), Some(Vec2::ZERO));
    }

    #[test]
    fn ellipse_uses_semi_axes() {
        let data = create_ellipse(3.0, 1.0);
        assert!(data.is_well_formed());
        assert_eq!(data.position(0), Some(Vec2::new(3.0, 0.0)));
        let quarter = data.position(CIRCLE_SEGMENTS / 4).unwrap();
        assert!((quarter - Vec2::new(0.0, 1.0)).length() < 1e-5);
        assert_ends_with_cross(&data);
    }

    // ── polygons and meshes ────────────────────────────────────────────────

    #[test]
    fn polygon_emits_one_segment_per_edge() {
        let square = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let data = create_polygon(&square).unwrap();
        assert!(data.is_well_formed());
        assert_eq!(data.vertex_count(), 2 * 4 + 4);
        // Closing edge goes from the last vertex back to the first.
        assert_eq!(data.position(6), Some(square[3]));
        assert_eq!(data.position(7), Some(square[0]));
        assert_ends_with_cross(&data);
    }

    #[test]
    fn mesh_emits_three_segments_per_triangle() {
        let tris = [
            [Vec2::ZERO, Vec2::X, Vec2::Y],
            [Vec2::X, Vec2::ONE, Vec2::Y],
        ];
        let data = create_mesh(&tris).unwrap();
        assert!(data.is_well_formed());
        assert_eq!(data.vertex_count(), 2 * 6 + 4);
        assert_eq!(data.index_count(), 2 * 6 + 4);
        assert_ends_with_cross(&data);
    }

    #[test]
    fn oversized_mesh_is_rejected() {
        let tris = vec![[Vec2::ZERO, Vec2::X, Vec2::Y]; 11_000];
        assert!(matches!(create_mesh(&tris), Err(GeometryError::TooManyVertices(_))));
    }

    // ── dispatch ───────────────────────────────────────────────────────────

    #[test]
    fn cross_alone_has_four_vertices() {
        let data = create_cross();
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn unsupported_shape_has_no_geometry() {
        let shape = Shape::Unsupported { kind: "capsule".into() };
        assert_eq!(create_shape(&shape), Ok(None));
    }

    #[test]
    fn create_shape_dispatches_on_kind() {
        let circle = create_shape(&Shape::Circle { radius: 1.0 }).unwrap().unwrap();
        assert_eq!(circle, create_circle(1.0));
    }
}

use glam::Vec2;

/// Collider geometry in body-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned ellipse with semi-axes `a` (x) and `b` (y).
    Ellipse { a: f32, b: f32 },
    /// Convex polygon, either winding.
    Polygon { vertices: Vec<Vec2> },
    /// Triangle soup.
    Mesh { triangles: Vec<[Vec2; 3]> },
    /// A shape kind this crate does not know how to draw or test.
    Unsupported { kind: String },
}

impl Shape {
    pub fn kind(&self) -> &str {
        match self {
            Shape::Circle { .. } => "circle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Polygon { .. } => "polygon",
            Shape::Mesh { .. } => "mesh",
            Shape::Unsupported { kind } => kind,
        }
    }

    /// Point test in body-local coordinates. Boundary points count as inside.
    pub fn contains(&self, p: Vec2) -> bool {
        match self {
            Shape::Circle { radius } => p.length_squared() <= radius * radius,
            Shape::Ellipse { a, b } => {
                if *a <= 0.0 || *b <= 0.0 {
                    return false;
                }
                (p.x / a).powi(2) + (p.y / b).powi(2) <= 1.0
            }
            Shape::Polygon { vertices } => convex_contains(vertices, p),
            Shape::Mesh { triangles } => triangles.iter().any(|t| convex_contains(t, p)),
            Shape::Unsupported { .. } => false,
        }
    }
}

fn convex_contains(vertices: &[Vec2], p: Vec2) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut sign = 0.0f32;
    for (i, &v0) in vertices.iter().enumerate() {
        let v1 = vertices[(i + 1) % vertices.len()];
        let side = (v1 - v0).perp_dot(p - v0);
        if side == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = side.signum();
        } else if side.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(clockwise: bool) -> Shape {
        let mut vertices = vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ];
        if clockwise {
            vertices.reverse();
        }
        Shape::Polygon { vertices }
    }

    #[test]
    fn circle_contains_interior_and_boundary() {
        let circle = Shape::Circle { radius: 1.0 };
        assert!(circle.contains(Vec2::new(0.3, -0.2)));
        assert!(circle.contains(Vec2::new(1.0, 0.0)));
        assert!(!circle.contains(Vec2::new(0.8, 0.8)));
    }

    #[test]
    fn ellipse_uses_both_semi_axes() {
        let ellipse = Shape::Ellipse { a: 2.0, b: 0.5 };
        assert!(ellipse.contains(Vec2::new(1.5, 0.0)));
        assert!(!ellipse.contains(Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn polygon_test_ignores_winding() {
        for clockwise in [false, true] {
            let square = unit_square(clockwise);
            assert!(square.contains(Vec2::ZERO));
            assert!(!square.contains(Vec2::new(0.6, 0.0)));
        }
    }

    #[test]
    fn mesh_contains_points_in_any_triangle() {
        let mesh = Shape::Mesh {
            triangles: vec![
                [Vec2::ZERO, Vec2::X, Vec2::Y],
                [Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(2.0, 1.0)],
            ],
        };
        assert!(mesh.contains(Vec2::new(0.2, 0.2)));
        assert!(mesh.contains(Vec2::new(2.2, 0.2)));
        assert!(!mesh.contains(Vec2::new(1.5, 0.2)));
    }

    #[test]
    fn unsupported_shapes_contain_nothing() {
        let shape = Shape::Unsupported { kind: "capsule".into() };
        assert!(!shape.contains(Vec2::ZERO));
        assert_eq!(shape.kind(), "capsule");
    }
}

use glam::{Mat3, Vec2};

use crate::world::{Body, Joint, JointKind, World};

/// Per-frame placement buffer reused across draws.
///
/// Placement functions write the frame for the next draw here instead of
/// allocating: the local origin, the two axes, the resulting transform and
/// any pivot markers that go with it.
#[derive(Debug, Clone)]
pub struct Scratch {
    pub origin: Vec2,
    pub x_axis: Vec2,
    pub y_axis: Vec2,
    pub transform: Mat3,

    /// World positions of pivot markers for the current joint.
    pub pivots: Vec<Vec2>,
    /// Draw the pivots before the joint itself.
    pub pivots_first: bool,
}

impl Default for Scratch {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            x_axis: Vec2::X,
            y_axis: Vec2::Y,
            transform: Mat3::IDENTITY,
            pivots: Vec::new(),
            pivots_first: false,
        }
    }
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure translation to `origin`.
    pub fn translate(&mut self, origin: Vec2) -> Mat3 {
        self.set_axes(origin, Vec2::X, Vec2::Y)
    }

    /// Frame at `origin` whose local +Y maps onto `up` (length preserved) and
    /// whose local +X is the unit perpendicular of `up` (a quarter turn
    /// counter-clockwise), matching the travel joint outlines.
    pub fn frame(&mut self, origin: Vec2, up: Vec2) -> Mat3 {
        let right = match up.try_normalize() {
            Some(n) => n.perp(),
            None => Vec2::X,
        };
        self.set_axes(origin, right, up)
    }

    /// Uses an existing transform as the frame.
    pub fn transform(&mut self, m: Mat3) -> Mat3 {
        self.set_axes(
            m.z_axis.truncate(),
            m.x_axis.truncate(),
            m.y_axis.truncate(),
        )
    }

    fn set_axes(&mut self, origin: Vec2, x_axis: Vec2, y_axis: Vec2) -> Mat3 {
        self.origin = origin;
        self.x_axis = x_axis;
        self.y_axis = y_axis;
        self.transform = Mat3::from_cols(x_axis.extend(0.0), y_axis.extend(0.0), origin.extend(1.0));
        self.transform
    }
}

/// World position of a joint's B anchor.
///
/// Joints without a second body (or whose body B is gone) anchor to the world,
/// so `pivot_b` is already in world space.
fn anchor_b(world: &dyn World, joint: &dyn Joint) -> Vec2 {
    match joint.body_b().and_then(|id| world.body(id)) {
        Some(b) => b.to_global_point(joint.pivot_b()),
        None => joint.pivot_b(),
    }
}

/// Places a joint for drawing.
///
/// Fills `scratch` with the joint's frame and pivot markers. Returns `false`
/// when the joint cannot be placed (unsupported kind or body A missing).
pub fn place_joint(scratch: &mut Scratch, world: &dyn World, joint: &dyn Joint) -> bool {
    scratch.pivots.clear();
    scratch.pivots_first = false;

    let Some(a) = world.body(joint.body_a()) else { return false };
    let anchor_a = a.to_global_point(joint.pivot_a());

    match joint.kind() {
        JointKind::Revolute => {
            scratch.translate(anchor_a);
            scratch.pivots.push(anchor_a);
        }
        JointKind::Weld => {
            scratch.translate(anchor_a);
        }
        JointKind::Motor => {
            scratch.translate(a.position());
        }
        JointKind::Spring => {
            let anchor_b = anchor_b(world, joint);
            scratch.frame(anchor_a, anchor_b - anchor_a);
            scratch.pivots.extend([anchor_a, anchor_b]);
        }
        JointKind::Distance { .. } => {
            let anchor_b = anchor_b(world, joint);
            scratch.frame(anchor_a, (anchor_b - anchor_a).normalize_or(Vec2::Y));
            scratch.pivots.extend([anchor_a, anchor_b]);
        }
        JointKind::Prismatic(_) => {
            scratch.transform(a.transform());
            scratch.pivots.push(anchor_b(world, joint));
        }
        JointKind::Wheel(_) => {
            scratch.transform(a.transform());
        }
        JointKind::Mouse { cursor } => {
            let cursor = cursor.get();
            scratch.frame(anchor_a, cursor - anchor_a);
            scratch.pivots.extend([cursor, anchor_a]);
            scratch.pivots_first = true;
        }
        JointKind::Unsupported { .. } => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BodyDesc, JointDesc, PointerCursor, SandboxWorld};

    fn world_with_two_bodies() -> (SandboxWorld, crate::world::BodyId, crate::world::BodyId) {
        let mut world = SandboxWorld::new();
        let a = world.create_body(BodyDesc {
            position: Vec2::new(1.0, 0.0),
            ..Default::default()
        });
        let b = world.create_body(BodyDesc {
            position: Vec2::new(1.0, 4.0),
            ..Default::default()
        });
        (world, a, b)
    }

    #[test]
    fn frame_maps_unit_y_onto_up() {
        let mut scratch = Scratch::new();
        let m = scratch.frame(Vec2::new(2.0, 3.0), Vec2::new(0.0, 5.0));
        assert_eq!(m.transform_point2(Vec2::Y), Vec2::new(2.0, 8.0));
        assert_eq!(m.transform_point2(Vec2::X), Vec2::new(1.0, 3.0));

        // Zero-length up keeps a usable x axis.
        let m = scratch.frame(Vec2::ZERO, Vec2::ZERO);
        assert_eq!(m.transform_point2(Vec2::X), Vec2::X);
    }

    #[test]
    fn spring_stretches_between_anchors() {
        let (mut world, a, b) = world_with_two_bodies();
        let id = world
            .add_joint(JointDesc::new(crate::world::JointKind::Spring, a, Some(b)))
            .unwrap();

        let mut scratch = Scratch::new();
        let joint = world.joint(id).unwrap();
        assert!(place_joint(&mut scratch, &world, joint));

        let top = scratch.transform.transform_point2(Vec2::Y);
        assert!((top - Vec2::new(1.0, 4.0)).length() < 1e-5);
        assert_eq!(scratch.x_axis, Vec2::NEG_X);
        assert_eq!(scratch.pivots, vec![Vec2::new(1.0, 0.0), Vec2::new(1.0, 4.0)]);
        assert!(!scratch.pivots_first);
    }

    #[test]
    fn distance_frame_is_normalized() {
        let (mut world, a, b) = world_with_two_bodies();
        let id = world
            .add_joint(JointDesc::new(
                crate::world::JointKind::Distance { distance: 4.0 },
                a,
                Some(b),
            ))
            .unwrap();

        let mut scratch = Scratch::new();
        assert!(place_joint(&mut scratch, &world, world.joint(id).unwrap()));
        assert!((scratch.y_axis.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mouse_joint_draws_pivots_first_and_follows_cursor() {
        let (mut world, a, _) = world_with_two_bodies();
        let cursor = PointerCursor::new(Vec2::new(1.0, 2.0));
        let id = world
            .add_joint(JointDesc::new(
                crate::world::JointKind::Mouse {
                    cursor: cursor.clone(),
                },
                a,
                None,
            ))
            .unwrap();

        let mut scratch = Scratch::new();
        assert!(place_joint(&mut scratch, &world, world.joint(id).unwrap()));
        assert!(scratch.pivots_first);
        assert_eq!(scratch.pivots[0], Vec2::new(1.0, 2.0));

        cursor.set(Vec2::new(1.0, 3.0));
        assert!(place_joint(&mut scratch, &world, world.joint(id).unwrap()));
        let end = scratch.transform.transform_point2(Vec2::Y);
        assert!((end - Vec2::new(1.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn unsupported_joint_is_not_placed() {
        let (mut world, a, b) = world_with_two_bodies();
        let id = world
            .add_joint(JointDesc::new(
                crate::world::JointKind::Unsupported { kind: "rope".into() },
                a,
                Some(b),
            ))
            .unwrap();

        let mut scratch = Scratch::new();
        assert!(!place_joint(&mut scratch, &world, world.joint(id).unwrap()));
    }
}

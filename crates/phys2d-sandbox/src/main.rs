//! Interactive window around `phys2d-render`.
//!
//! Drag bodies with the left button, pan with the right button and zoom with
//! the wheel. Keys 1-4 toggle axes, bodies, joints and contacts; 0 restores
//! the default layers.

mod clock;
mod runtime;

use std::f32::consts::FRAC_PI_6;

use glam::Vec2;
use winit::dpi::LogicalSize;

use phys2d_render::device::GpuInit;
use phys2d_render::logging::{init_logging, LoggingConfig};
use phys2d_render::scene::RenderMask;
use phys2d_render::view::{CameraOptions, PickingOptions};
use phys2d_render::world::{
    BodyDesc, BodyId, JointDesc, JointKind, SandboxWorld, Shape, TravelLimits, World,
};

use crate::runtime::Runtime;

/// Window and simulation settings.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub title: String,
    pub size: LogicalSize<f64>,
    pub gpu: GpuInit,
    pub camera: CameraOptions,
    pub picking: PickingOptions,
    /// Layers shown at startup.
    pub mask: RenderMask,
    /// Fixed simulation step, in seconds.
    pub time_step: f32,
    pub max_steps: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            title: "phys2d sandbox".to_string(),
            size: LogicalSize::new(1280.0, 720.0),
            gpu: GpuInit::default(),
            camera: CameraOptions::default(),
            picking: PickingOptions::default(),
            mask: RenderMask::ALL,
            time_step: 1.0 / 60.0,
            max_steps: 4,
        }
    }
}

fn main() {
    init_logging(LoggingConfig::default());

    let world = demo_world();
    if let Err(e) = Runtime::run(SandboxConfig::default(), world) {
        log::error!("sandbox terminated: {e:#}");
        std::process::exit(1);
    }
}

// ── demo scene ─────────────────────────────────────────────────────────────

fn body(world: &mut SandboxWorld, position: Vec2, shape: Shape) -> BodyId {
    let id = world.create_body(BodyDesc {
        position,
        ..Default::default()
    });
    world.attach_collider(id, shape);
    id
}

fn rect(half: Vec2) -> Shape {
    Shape::Polygon {
        vertices: vec![
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ],
    }
}

/// One body per drawable shape and one joint per drawable kind.
fn demo_world() -> SandboxWorld {
    let mut world = SandboxWorld::new();

    let ground = world.create_body(BodyDesc {
        position: Vec2::new(0.0, -8.0),
        is_static: true,
        ..Default::default()
    });
    world.attach_collider(ground, rect(Vec2::new(14.0, 0.5)));

    // Shapes on islands 0..3 so each gets its own palette color.
    let islands = [
        (Vec2::new(-10.0, 4.0), Shape::Circle { radius: 1.0 }),
        (Vec2::new(-6.0, 4.0), Shape::Ellipse { a: 1.6, b: 0.8 }),
        (Vec2::new(-2.0, 4.0), rect(Vec2::new(1.0, 0.6))),
        (
            Vec2::new(2.0, 4.0),
            Shape::Mesh {
                triangles: vec![
                    [Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0), Vec2::new(0.0, 1.0)],
                    [Vec2::new(1.0, -1.0), Vec2::new(2.0, 1.0), Vec2::new(0.0, 1.0)],
                ],
            },
        ),
    ];
    for (island, (position, shape)) in islands.into_iter().enumerate() {
        let id = body(&mut world, position, shape);
        world.set_island(id, Some(island as i32));
    }

    // Overlapping circles produce a contact pair on the first step.
    let left = body(&mut world, Vec2::new(7.0, 4.0), Shape::Circle { radius: 1.0 });
    let right = body(&mut world, Vec2::new(8.6, 4.0), Shape::Circle { radius: 1.0 });
    world.set_sleeping(right, true);

    let hinge_a = body(&mut world, Vec2::new(-10.0, -2.0), Shape::Circle { radius: 0.7 });
    let hinge_b = body(&mut world, Vec2::new(-8.0, -2.0), rect(Vec2::splat(0.5)));
    world.add_joint(
        JointDesc::new(JointKind::Revolute, hinge_a, Some(hinge_b))
            .with_pivots(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0)),
    );

    let weld_b = body(&mut world, Vec2::new(-5.5, -2.0), Shape::Circle { radius: 0.5 });
    world.add_joint(JointDesc::new(JointKind::Weld, hinge_b, Some(weld_b)));

    let spring_a = body(&mut world, Vec2::new(-3.0, -1.0), Shape::Circle { radius: 0.6 });
    let spring_b = body(&mut world, Vec2::new(-1.0, -4.0), Shape::Circle { radius: 0.6 });
    world.add_joint(JointDesc::new(JointKind::Spring, spring_a, Some(spring_b)));

    let rope_a = body(&mut world, Vec2::new(1.0, -1.0), rect(Vec2::splat(0.4)));
    let rope_b = body(&mut world, Vec2::new(3.0, -3.5), rect(Vec2::splat(0.4)));
    world.add_joint(JointDesc::new(
        JointKind::Distance { distance: 3.2 },
        rope_a,
        Some(rope_b),
    ));

    let rail = world.create_body(BodyDesc {
        position: Vec2::new(6.0, -2.0),
        angle: FRAC_PI_6,
        ..Default::default()
    });
    world.attach_collider(rail, rect(Vec2::new(0.6, 0.3)));
    let slider = body(&mut world, Vec2::new(8.0, -1.0), Shape::Circle { radius: 0.5 });
    world.add_joint(JointDesc::new(
        JointKind::Prismatic(TravelLimits {
            local_axis: Vec2::X,
            min: Some(-1.0),
            max: 3.0,
        }),
        rail,
        Some(slider),
    ));

    let axle = body(&mut world, Vec2::new(10.0, -5.0), rect(Vec2::new(1.0, 0.3)));
    let wheel = body(&mut world, Vec2::new(10.0, -6.2), Shape::Circle { radius: 0.8 });
    world.add_joint(JointDesc::new(
        JointKind::Wheel(TravelLimits {
            local_axis: Vec2::NEG_Y,
            ..Default::default()
        }),
        axle,
        Some(wheel),
    ));

    world.add_joint(JointDesc::new(JointKind::Motor, left, Some(right)));

    log::info!(
        "demo scene: {} bodies, {} joints",
        world.bodies().count(),
        world.joints().count()
    );
    world
}

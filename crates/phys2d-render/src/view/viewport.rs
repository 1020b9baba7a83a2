use glam::Vec2;

use crate::coords::SurfaceSize;
use crate::input::{InputEvent, InputState};
use crate::world::World;

use super::{CameraControl, CameraOptions, PickingControl, PickingOptions, Projection};

/// Visible width of a fresh viewport, in world units.
pub const DEFAULT_WIDTH: f32 = 30.0;

/// Owns the projection and routes input to the attached controls.
#[derive(Debug)]
pub struct Viewport {
    projection: Projection,
    input: InputState,
    camera: Option<CameraControl>,
    picking: Option<PickingControl>,
}

impl Viewport {
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            projection: Projection::new(surface, DEFAULT_WIDTH, Vec2::ZERO),
            input: InputState::default(),
            camera: None,
            picking: None,
        }
    }

    /// Attaches a pan/zoom control, replacing any previous one.
    pub fn add_camera_control(&mut self, options: CameraOptions) -> &mut CameraControl {
        let camera = CameraControl::new(options);
        camera.attach(&mut self.projection);
        self.camera.insert(camera)
    }

    /// Attaches a body-dragging control, replacing any previous one.
    ///
    /// A replaced control keeps its grasp; call [`Viewport::destroy`] first to
    /// release it.
    pub fn add_picking_control(&mut self, options: PickingOptions) -> &mut PickingControl {
        self.picking.insert(PickingControl::new(options))
    }

    pub fn camera(&self) -> Option<&CameraControl> {
        self.camera.as_ref()
    }

    pub fn picking(&self) -> Option<&PickingControl> {
        self.picking.as_ref()
    }

    /// Feeds one event to the controls. Returns `true` when any of them used it.
    pub fn handle_input(&mut self, event: &InputEvent, world: &mut dyn World) -> bool {
        self.input.apply_event(event);

        let mut handled = false;
        if let Some(picking) = self.picking.as_mut() {
            handled |= picking.handle_input(event, &self.input, &self.projection, world);
        }
        if let Some(camera) = self.camera.as_mut() {
            handled |= camera.handle_input(event, &self.input, &mut self.projection);
        }
        handled
    }

    pub fn resize(&mut self, surface: SurfaceSize) {
        self.projection.resize(surface);
    }

    pub fn update(&mut self) {
        self.projection.update();
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_mut(&mut self) -> &mut Projection {
        &mut self.projection
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// World position under the pointer, if the pointer is over the surface.
    pub fn cursor(&self) -> Option<Vec2> {
        self.input.pointer_pos.map(|p| self.projection.unproject(p))
    }

    /// Releases any active grasp and drops the controls. Idempotent.
    pub fn destroy(&mut self, world: &mut dyn World) {
        if let Some(mut picking) = self.picking.take() {
            picking.release(world);
        }
        self.camera = None;
    }
}

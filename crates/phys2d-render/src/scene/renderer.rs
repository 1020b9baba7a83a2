use std::sync::mpsc::{self, Receiver};

use glam::Mat3;

use crate::coords::ColorRgba;
use crate::device::{GeometryHandle, GraphicsDevice, ProgramHandle, ShaderError};
use crate::geometry::{
    create_contact_point, create_cross, create_grid, create_joint, create_pivot, create_shape,
    GeometryData, GRID_EXPANSION, GRID_UNIT,
};
use crate::style::{island_palette, StylePreset};
use crate::view::Viewport;
use crate::world::{Body, BodyId, JointId, PairId, SubscriptionId, World, WorldEvent};

use super::scratch::{place_joint, Scratch};
use super::shaders::{ShaderSet, ALBEDO, PROJ_MAT, WORLD_MAT};
use super::tables::{ContactIndex, GeometryTable};
use super::{to_mat4, RenderMask};

#[derive(Debug, Copy, Clone)]
struct Programs {
    shape: ProgramHandle,
    joint: ProgramHandle,
}

/// Geometry shared by every entity of one kind; rebuilt on restyle.
#[derive(Debug, Copy, Clone)]
struct SharedGeometry {
    grid: Option<GeometryHandle>,
    contact: GeometryHandle,
    pivot: GeometryHandle,
}

impl SharedGeometry {
    fn build(device: &mut impl GraphicsDevice, preset: &StylePreset) -> Self {
        let grid = match create_grid(GRID_EXPANSION, GRID_UNIT, preset) {
            Ok(data) => Some(device.create_geometry(&data)),
            Err(e) => {
                log::warn!("reference grid skipped: {e}");
                None
            }
        };

        Self {
            grid,
            contact: device.create_geometry(&create_contact_point(preset)),
            pivot: device.create_geometry(&create_pivot(preset)),
        }
    }

    fn release(self, device: &mut impl GraphicsDevice) {
        if let Some(grid) = self.grid {
            device.destroy_geometry(grid);
        }
        device.destroy_geometry(self.contact);
        device.destroy_geometry(self.pivot);
    }
}

struct Subscription {
    id: SubscriptionId,
    events: Receiver<WorldEvent>,
}

/// Keeps device geometry in step with a [`World`] and draws it.
///
/// The renderer subscribes to the world on construction. Events queue up in
/// the subscription and are applied by [`WorldRenderer::sync`], which
/// [`WorldRenderer::render`] calls before drawing.
pub struct WorldRenderer<D: GraphicsDevice> {
    device: D,
    programs: Option<Programs>,
    shared: Option<SharedGeometry>,
    subscription: Option<Subscription>,

    preset: StylePreset,
    palette: Vec<ColorRgba>,

    bodies: GeometryTable<BodyId>,
    joints: GeometryTable<JointId>,
    contacts: ContactIndex,

    scratch: Scratch,
    joints_stale: bool,
}

impl<D: GraphicsDevice> WorldRenderer<D> {
    /// Creates a renderer with the bundled shaders.
    pub fn new(device: D, world: &mut dyn World) -> Result<Self, ShaderError> {
        Self::with_shaders(device, world, ShaderSet::default())
    }

    /// Creates a renderer with host-supplied programs.
    ///
    /// Fails when either program does not compile or link; nothing stays
    /// allocated on the device in that case.
    pub fn with_shaders(
        mut device: D,
        world: &mut dyn World,
        shaders: ShaderSet,
    ) -> Result<Self, ShaderError> {
        let shape = device.create_program(&shaders.shape.vertex, &shaders.shape.fragment)?;
        let joint = match device.create_program(&shaders.joint.vertex, &shaders.joint.fragment) {
            Ok(joint) => joint,
            Err(e) => {
                device.destroy_program(shape);
                return Err(e);
            }
        };

        let preset = StylePreset::default();
        device.set_clear_color(preset.background);
        let shared = SharedGeometry::build(&mut device, &preset);

        let (sink, events) = mpsc::channel();
        let id = world.subscribe(sink);
        log::debug!("renderer subscribed to world as {id}");

        let mut renderer = Self {
            device,
            programs: Some(Programs { shape, joint }),
            shared: Some(shared),
            subscription: Some(Subscription { id, events }),
            preset,
            palette: island_palette(),
            bodies: GeometryTable::new(),
            joints: GeometryTable::new(),
            contacts: ContactIndex::new(),
            scratch: Scratch::new(),
            joints_stale: false,
        };
        renderer.register_existing(world);
        Ok(renderer)
    }

    // ── synchronization ────────────────────────────────────────────────────

    /// Applies every queued world event.
    pub fn sync(&mut self, world: &dyn World) {
        let Some(subscription) = self.subscription.as_ref() else { return };
        let pending: Vec<WorldEvent> = subscription.events.try_iter().collect();
        for event in &pending {
            self.handle_event(world, event);
        }

        if self.joints_stale {
            self.rebuild_joints(world);
        }
    }

    /// Applies one world event.
    ///
    /// Events about entities the world no longer holds are skipped.
    pub fn handle_event(&mut self, world: &dyn World, event: &WorldEvent) {
        if self.programs.is_none() {
            return;
        }

        match event {
            WorldEvent::BodyCreated(body) | WorldEvent::ColliderAttached { body, .. } => {
                self.register_body(world, *body);
            }
            WorldEvent::BodyDestroyed(body) | WorldEvent::ColliderDetached { body, .. } => {
                if self.bodies.remove(&mut self.device, *body) {
                    log::debug!("released geometry of {body}");
                }
            }
            WorldEvent::JointAdded(joint) => {
                if !self.joints.contains(*joint) {
                    self.register_joint(world, *joint);
                }
            }
            WorldEvent::JointRemoved(joint) => {
                if self.joints.remove(&mut self.device, *joint) {
                    log::debug!("released geometry of {joint}");
                }
            }
            WorldEvent::CollisionStarted {
                collider_a,
                collider_b,
                contacts,
            } => {
                if !contacts.is_empty() {
                    self.contacts
                        .insert(PairId::new(*collider_a, *collider_b), contacts.clone());
                }
            }
            WorldEvent::CollisionEnded {
                collider_a,
                collider_b,
            } => {
                self.contacts.remove(PairId::new(*collider_a, *collider_b));
            }
        }
    }

    fn register_existing(&mut self, world: &dyn World) {
        let bodies: Vec<BodyId> = world.bodies().map(|b| b.id()).collect();
        for body in bodies {
            self.register_body(world, body);
        }

        let joints: Vec<JointId> = world.joints().map(|j| j.id()).collect();
        for joint in joints {
            self.register_joint(world, joint);
        }
    }

    fn register_body(&mut self, world: &dyn World, id: BodyId) {
        let Some(body) = world.body(id) else { return };

        let data = match body.collider() {
            None => create_cross(),
            Some(collider) => match create_shape(&collider.shape) {
                Ok(Some(data)) => data,
                Ok(None) => {
                    log::warn!(
                        "{id}: unsupported shape `{}`, body is not drawn",
                        collider.shape.kind()
                    );
                    self.bodies.remove(&mut self.device, id);
                    return;
                }
                Err(e) => {
                    log::warn!("{id}: {} geometry failed: {e}", collider.shape.kind());
                    self.bodies.remove(&mut self.device, id);
                    return;
                }
            },
        };

        let geometry = self.device.create_geometry(&data);
        self.bodies.insert(&mut self.device, id, geometry);
        log::debug!("registered geometry for {id}");
    }

    fn register_joint(&mut self, world: &dyn World, id: JointId) {
        let Some(joint) = world.joint(id) else { return };
        let kind = joint.kind();

        let data: GeometryData = match create_joint(kind, joint.pivot_a(), &self.preset) {
            Ok(Some(data)) => data,
            Ok(None) => {
                log::warn!("{id}: unsupported joint kind `{}`, not drawn", kind.name());
                return;
            }
            Err(e) => {
                log::warn!("{id}: {} joint geometry failed: {e}", kind.name());
                return;
            }
        };

        let geometry = self.device.create_geometry(&data);
        self.joints.insert(&mut self.device, id, geometry);
        log::debug!("registered geometry for {id} ({})", kind.name());
    }

    fn rebuild_joints(&mut self, world: &dyn World) {
        self.joints_stale = false;
        let cached: Vec<JointId> = self.joints.keys().collect();
        for id in cached {
            self.joints.remove(&mut self.device, id);
            self.register_joint(world, id);
        }
    }

    // ── drawing ────────────────────────────────────────────────────────────

    /// Synchronizes with the world, then draws the layers selected by `mask`.
    pub fn render(&mut self, world: &dyn World, viewport: &Viewport, mask: RenderMask) {
        self.sync(world);

        let Some(programs) = self.programs else { return };
        let Some(shared) = self.shared else { return };
        if mask.is_empty() {
            return;
        }

        let proj = to_mat4(viewport.projection().matrix());
        self.device.set_uniform(programs.shape, PROJ_MAT, proj.into());
        self.device.set_uniform(programs.joint, PROJ_MAT, proj.into());

        if mask.contains(RenderMask::AXES) {
            if let Some(grid) = shared.grid {
                self.device.use_program(programs.joint);
                self.draw_at(programs.joint, Mat3::IDENTITY, grid);
            }
        }

        if mask.contains(RenderMask::BODY) {
            self.draw_bodies(world, programs.shape);
        }

        if mask.intersects(RenderMask::JOINT) {
            self.draw_joints(world, programs.joint, shared.pivot, mask);
        }

        if mask.contains(RenderMask::CONTACT) {
            self.draw_contacts(programs.joint, shared.contact);
        }
    }

    fn draw_bodies(&mut self, world: &dyn World, program: ProgramHandle) {
        self.device.use_program(program);

        for body in world.bodies() {
            let Some(geometry) = self.bodies.get(body.id()) else { continue };
            let color = self.body_color(body);
            self.device.set_uniform(program, ALBEDO, color.into());
            self.draw_at(program, body.transform(), geometry);
        }
    }

    fn draw_joints(
        &mut self,
        world: &dyn World,
        program: ProgramHandle,
        pivot: GeometryHandle,
        mask: RenderMask,
    ) {
        self.device.use_program(program);

        for joint in world.joints() {
            let Some(geometry) = self.joints.get(joint.id()) else { continue };
            let Some(bit) = RenderMask::for_joint(joint.kind()) else { continue };
            if !mask.contains(bit) {
                continue;
            }
            if !place_joint(&mut self.scratch, world, joint) {
                continue;
            }

            let transform = self.scratch.transform;
            if self.scratch.pivots_first {
                self.draw_pivots(program, pivot);
                self.draw_at(program, transform, geometry);
            } else {
                self.draw_at(program, transform, geometry);
                self.draw_pivots(program, pivot);
            }
        }
    }

    fn draw_pivots(&mut self, program: ProgramHandle, pivot: GeometryHandle) {
        for i in 0..self.scratch.pivots.len() {
            let at = self.scratch.pivots[i];
            let transform = self.scratch.translate(at);
            self.draw_at(program, transform, pivot);
        }
    }

    fn draw_contacts(&mut self, program: ProgramHandle, marker: GeometryHandle) {
        if self.contacts.is_empty() {
            return;
        }
        let Self {
            device,
            contacts,
            scratch,
            ..
        } = self;
        device.use_program(program);

        for (_, shared) in contacts.iter() {
            for contact in shared.points().iter() {
                let transform = scratch.frame(contact.point, contact.normal);
                draw_with(device, program, transform, marker);
            }
        }
    }

    fn draw_at(&mut self, program: ProgramHandle, transform: Mat3, geometry: GeometryHandle) {
        draw_with(&mut self.device, program, transform, geometry);
    }

    fn body_color(&self, body: &dyn Body) -> ColorRgba {
        if body.is_static() {
            return self.preset.static_body;
        }
        if body.is_sleeping() {
            return self.preset.sleeping_body;
        }

        let island = body.island_id().unwrap_or(0).max(0) as usize;
        match island.checked_rem(self.palette.len()) {
            Some(i) => self.palette[i],
            None => self.preset.static_body,
        }
    }

    // ── styling & lifecycle ────────────────────────────────────────────────

    /// Replaces the color preset.
    ///
    /// Shared markers are rebuilt immediately; joint geometry is rebuilt at the
    /// next sync.
    pub fn set_styling(&mut self, preset: StylePreset) {
        self.preset = preset;
        self.device.set_clear_color(self.preset.background);

        if let Some(old) = self.shared.take() {
            old.release(&mut self.device);
            self.shared = Some(SharedGeometry::build(&mut self.device, &self.preset));
            self.joints_stale = !self.joints.is_empty();
        }
    }

    pub fn preset(&self) -> &StylePreset {
        &self.preset
    }

    /// Clears the target to the preset background.
    pub fn clear(&mut self) {
        self.device.set_clear_color(self.preset.background);
        self.device.clear();
    }

    /// Forgets every body, joint and contact. Programs and shared markers stay.
    pub fn reset(&mut self) {
        self.bodies.clear(&mut self.device);
        self.joints.clear(&mut self.device);
        self.contacts.clear();
        self.joints_stale = false;
    }

    /// Unsubscribes from `world` and releases every device resource.
    ///
    /// Safe to call more than once; the renderer draws nothing afterwards.
    pub fn destroy(&mut self, world: &mut dyn World) {
        if let Some(subscription) = self.subscription.take() {
            world.unsubscribe(subscription.id);
            log::debug!("renderer unsubscribed ({})", subscription.id);
        }
        self.release_resources();
    }

    fn release_resources(&mut self) {
        self.reset();
        if let Some(shared) = self.shared.take() {
            shared.release(&mut self.device);
        }
        if let Some(programs) = self.programs.take() {
            self.device.destroy_program(programs.shape);
            self.device.destroy_program(programs.joint);
        }
    }

    // ── introspection ──────────────────────────────────────────────────────

    pub fn body_geometry(&self, id: BodyId) -> Option<GeometryHandle> {
        self.bodies.get(id)
    }

    pub fn joint_geometry(&self, id: JointId) -> Option<GeometryHandle> {
        self.joints.get(id)
    }

    /// Collider pairs currently in contact, ascending.
    pub fn contact_pairs(&self) -> Vec<PairId> {
        self.contacts.pairs()
    }

    /// Bodies, joints and contact pairs currently cached.
    pub fn cached_entities(&self) -> usize {
        self.bodies.len() + self.joints.len() + self.contacts.len()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

fn draw_with<D: GraphicsDevice>(
    device: &mut D,
    program: ProgramHandle,
    transform: Mat3,
    geometry: GeometryHandle,
) {
    device.set_uniform(program, WORLD_MAT, to_mat4(transform).into());
    device.draw(geometry);
}

impl<D: GraphicsDevice> Drop for WorldRenderer<D> {
    fn drop(&mut self) {
        // The world is not reachable here; dropping the receiver ends the
        // subscription on the world's next send.
        self.release_resources();
    }
}

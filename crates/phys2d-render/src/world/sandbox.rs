use std::collections::HashMap;
use std::sync::mpsc::Sender;

use glam::{Mat3, Vec2};

use super::{
    Body, BodyId, Collider, ColliderId, ContactPoint, Joint, JointId, JointKind, PairId,
    PointerConstraintDef, SharedContacts, Shape, SubscriptionId, World, WorldEvent,
};

/// Parameters for [`SandboxWorld::create_body`].
#[derive(Debug, Clone, Default)]
pub struct BodyDesc {
    pub position: Vec2,
    pub angle: f32,
    pub is_static: bool,
    pub island: Option<i32>,
}

/// Parameters for [`SandboxWorld::add_joint`].
#[derive(Debug, Clone)]
pub struct JointDesc {
    pub kind: JointKind,
    pub body_a: BodyId,
    pub body_b: Option<BodyId>,
    pub pivot_a: Vec2,
    pub pivot_b: Vec2,
}

impl JointDesc {
    pub fn new(kind: JointKind, body_a: BodyId, body_b: Option<BodyId>) -> Self {
        Self {
            kind,
            body_a,
            body_b,
            pivot_a: Vec2::ZERO,
            pivot_b: Vec2::ZERO,
        }
    }

    pub fn with_pivots(mut self, pivot_a: Vec2, pivot_b: Vec2) -> Self {
        self.pivot_a = pivot_a;
        self.pivot_b = pivot_b;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SandboxBody {
    id: BodyId,
    position: Vec2,
    angle: f32,
    is_static: bool,
    sleeping: bool,
    island: Option<i32>,
    collider: Option<Collider>,
}

impl Body for SandboxBody {
    fn id(&self) -> BodyId {
        self.id
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    fn island_id(&self) -> Option<i32> {
        self.island
    }

    fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    fn transform(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(Vec2::ONE, self.angle, self.position)
    }

    fn position(&self) -> Vec2 {
        self.position
    }
}

#[derive(Debug, Copy, Clone)]
struct PointerDrive {
    stiffness: f32,
    max_force: f32,
}

#[derive(Debug, Clone)]
pub struct SandboxJoint {
    id: JointId,
    kind: JointKind,
    body_a: BodyId,
    body_b: Option<BodyId>,
    pivot_a: Vec2,
    pivot_b: Vec2,
    drive: Option<PointerDrive>,
}

impl Joint for SandboxJoint {
    fn id(&self) -> JointId {
        self.id
    }

    fn kind(&self) -> &JointKind {
        &self.kind
    }

    fn body_a(&self) -> BodyId {
        self.body_a
    }

    fn body_b(&self) -> Option<BodyId> {
        self.body_b
    }

    fn pivot_a(&self) -> Vec2 {
        self.pivot_a
    }

    fn pivot_b(&self) -> Vec2 {
        self.pivot_b
    }
}

#[derive(Debug)]
struct ActivePair {
    contacts: SharedContacts,
    /// Maintained by `step`; manually started pairs are left alone.
    tracked: bool,
}

/// In-memory [`World`] with kinematic pointer dragging and circle contacts.
///
/// There is no dynamics solver: bodies only move through [`SandboxWorld::set_pose`]
/// or pointer constraints. It exists to drive the renderer and controls.
#[derive(Debug, Default)]
pub struct SandboxWorld {
    bodies: Vec<SandboxBody>,
    joints: Vec<SandboxJoint>,
    pairs: HashMap<PairId, ActivePair>,
    subscribers: Vec<(SubscriptionId, Sender<WorldEvent>)>,

    next_body: u32,
    next_joint: u32,
    next_collider: u32,
    next_subscription: u32,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ── bodies ─────────────────────────────────────────────────────────────

    pub fn create_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;

        self.bodies.push(SandboxBody {
            id,
            position: desc.position,
            angle: desc.angle,
            is_static: desc.is_static,
            sleeping: false,
            island: desc.island,
            collider: None,
        });
        self.emit(WorldEvent::BodyCreated(id));
        id
    }

    /// Removes a body together with its joints and contacts.
    pub fn destroy_body(&mut self, id: BodyId) {
        if self.body_index(id).is_none() {
            return;
        }

        let attached: Vec<JointId> = self
            .joints
            .iter()
            .filter(|j| j.body_a == id || j.body_b == Some(id))
            .map(|j| j.id)
            .collect();
        for joint in attached {
            self.remove_joint(joint);
        }

        self.detach_collider(id);

        if let Some(index) = self.body_index(id) {
            self.bodies.remove(index);
        }
        self.emit(WorldEvent::BodyDestroyed(id));
    }

    /// Attaches `shape` to `body`, replacing any existing collider.
    pub fn attach_collider(&mut self, body: BodyId, shape: Shape) -> Option<ColliderId> {
        self.body_index(body)?;
        self.detach_collider(body);

        let collider = ColliderId(self.next_collider);
        self.next_collider += 1;

        let index = self.body_index(body)?;
        self.bodies[index].collider = Some(Collider { id: collider, shape });
        self.emit(WorldEvent::ColliderAttached { body, collider });
        Some(collider)
    }

    pub fn detach_collider(&mut self, body: BodyId) {
        let Some(index) = self.body_index(body) else { return };
        let Some(collider) = self.bodies[index].collider.take() else { return };

        let touching: Vec<PairId> = self
            .pairs
            .keys()
            .copied()
            .filter(|pair| {
                let (a, b) = pair.colliders();
                a == collider.id || b == collider.id
            })
            .collect();
        for pair in touching {
            let (a, b) = pair.colliders();
            self.end_collision(a, b);
        }

        self.emit(WorldEvent::ColliderDetached {
            body,
            collider: collider.id,
        });
    }

    pub fn set_pose(&mut self, body: BodyId, position: Vec2, angle: f32) {
        if let Some(b) = self.body_mut(body) {
            b.position = position;
            b.angle = angle;
        }
    }

    pub fn set_sleeping(&mut self, body: BodyId, sleeping: bool) {
        if let Some(b) = self.body_mut(body) {
            b.sleeping = sleeping;
        }
    }

    pub fn set_island(&mut self, body: BodyId, island: Option<i32>) {
        if let Some(b) = self.body_mut(body) {
            b.island = island;
        }
    }

    // ── joints ─────────────────────────────────────────────────────────────

    /// Adds a joint; returns `None` when a referenced body does not exist.
    pub fn add_joint(&mut self, desc: JointDesc) -> Option<JointId> {
        self.insert_joint(desc, None)
    }

    fn insert_joint(&mut self, desc: JointDesc, drive: Option<PointerDrive>) -> Option<JointId> {
        self.body_index(desc.body_a)?;
        if let Some(b) = desc.body_b {
            self.body_index(b)?;
        }

        let id = JointId(self.next_joint);
        self.next_joint += 1;

        self.joints.push(SandboxJoint {
            id,
            kind: desc.kind,
            body_a: desc.body_a,
            body_b: desc.body_b,
            pivot_a: desc.pivot_a,
            pivot_b: desc.pivot_b,
            drive,
        });
        self.emit(WorldEvent::JointAdded(id));
        Some(id)
    }

    // ── contacts ───────────────────────────────────────────────────────────

    /// Starts (or refreshes) a contact between two colliders.
    pub fn begin_collision(
        &mut self,
        a: ColliderId,
        b: ColliderId,
        points: Vec<ContactPoint>,
    ) -> SharedContacts {
        self.start_pair(a, b, points, false)
    }

    pub fn end_collision(&mut self, a: ColliderId, b: ColliderId) {
        if self.pairs.remove(&PairId::new(a, b)).is_some() {
            self.emit(WorldEvent::CollisionEnded {
                collider_a: a,
                collider_b: b,
            });
        }
    }

    fn start_pair(
        &mut self,
        a: ColliderId,
        b: ColliderId,
        points: Vec<ContactPoint>,
        tracked: bool,
    ) -> SharedContacts {
        let pair = PairId::new(a, b);
        if let Some(active) = self.pairs.get(&pair) {
            active.contacts.replace(points);
            return active.contacts.clone();
        }

        let contacts = SharedContacts::new(points);
        self.pairs.insert(
            pair,
            ActivePair {
                contacts: contacts.clone(),
                tracked,
            },
        );
        self.emit(WorldEvent::CollisionStarted {
            collider_a: a,
            collider_b: b,
            contacts: contacts.clone(),
        });
        contacts
    }

    // ── stepping ───────────────────────────────────────────────────────────

    /// Advances pointer constraints and refreshes circle contacts.
    pub fn step(&mut self, dt: f32) {
        self.drive_pointers(dt);
        self.refresh_contacts();
    }

    fn drive_pointers(&mut self, dt: f32) {
        let pulls: Vec<(BodyId, Vec2)> = self
            .joints
            .iter()
            .filter_map(|joint| {
                let drive = joint.drive?;
                let JointKind::Mouse { cursor } = &joint.kind else { return None };
                let body = self.body_ref(joint.body_a)?;
                if body.is_static {
                    return None;
                }

                let anchor = body.to_global_point(joint.pivot_a);
                let mut delta = (cursor.get() - anchor) * drive.stiffness.clamp(0.0, 1.0);
                let limit = drive.max_force.max(0.0) * dt * dt;
                if delta.length() > limit {
                    delta = delta.normalize_or_zero() * limit;
                }
                Some((joint.body_a, delta))
            })
            .collect();

        for (id, delta) in pulls {
            if let Some(body) = self.body_mut(id) {
                body.position += delta;
                body.sleeping = false;
            }
        }
    }

    fn refresh_contacts(&mut self) {
        let circles: Vec<(ColliderId, Vec2, f32, bool)> = self
            .bodies
            .iter()
            .filter_map(|b| {
                let collider = b.collider.as_ref()?;
                let Shape::Circle { radius } = collider.shape else { return None };
                Some((collider.id, b.position, radius, b.is_static))
            })
            .collect();

        let mut touching = Vec::new();
        for (i, &(ca, pa, ra, sa)) in circles.iter().enumerate() {
            for &(cb, pb, rb, sb) in &circles[i + 1..] {
                if sa && sb {
                    continue;
                }
                let offset = pb - pa;
                if offset.length() >= ra + rb {
                    continue;
                }
                let normal = offset.try_normalize().unwrap_or(Vec2::Y);
                touching.push((
                    ca,
                    cb,
                    ContactPoint {
                        point: pa + normal * ra,
                        normal,
                    },
                ));
            }
        }

        let mut current = Vec::with_capacity(touching.len());
        for (a, b, contact) in touching {
            current.push(PairId::new(a, b));
            self.start_pair(a, b, vec![contact], true);
        }

        let separated: Vec<PairId> = self
            .pairs
            .iter()
            .filter(|(pair, active)| active.tracked && !current.contains(pair))
            .map(|(pair, _)| *pair)
            .collect();
        for pair in separated {
            let (a, b) = pair.colliders();
            self.end_collision(a, b);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn emit(&mut self, event: WorldEvent) {
        self.subscribers.retain(|(_, sink)| sink.send(event.clone()).is_ok());
    }

    fn body_index(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id == id)
    }

    fn body_ref(&self, id: BodyId) -> Option<&SandboxBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut SandboxBody> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }
}

impl World for SandboxWorld {
    fn bodies(&self) -> Box<dyn Iterator<Item = &dyn Body> + '_> {
        Box::new(self.bodies.iter().map(|b| b as &dyn Body))
    }

    fn body(&self, id: BodyId) -> Option<&dyn Body> {
        self.body_ref(id).map(|b| b as &dyn Body)
    }

    fn joints(&self) -> Box<dyn Iterator<Item = &dyn Joint> + '_> {
        Box::new(self.joints.iter().map(|j| j as &dyn Joint))
    }

    fn joint(&self, id: JointId) -> Option<&dyn Joint> {
        self.joints
            .iter()
            .find(|j| j.id == id)
            .map(|j| j as &dyn Joint)
    }

    fn subscribe(&mut self, sink: Sender<WorldEvent>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, sink));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub, _)| *sub != id);
    }

    fn add_pointer_constraint(&mut self, def: PointerConstraintDef) -> JointId {
        let drive = PointerDrive {
            stiffness: def.stiffness,
            max_force: def.max_force,
        };
        let desc = JointDesc::new(JointKind::Mouse { cursor: def.cursor }, def.body, None)
            .with_pivots(def.anchor, Vec2::ZERO);

        match self.insert_joint(desc, Some(drive)) {
            Some(id) => id,
            None => {
                // Unknown body: hand out an id that refers to nothing.
                log::warn!("pointer constraint requested for missing {}", def.body);
                let id = JointId(self.next_joint);
                self.next_joint += 1;
                id
            }
        }
    }

    fn remove_joint(&mut self, id: JointId) {
        let Some(index) = self.joints.iter().position(|j| j.id == id) else { return };
        self.joints.remove(index);
        self.emit(WorldEvent::JointRemoved(id));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::world::PointerCursor;

    fn drain(rx: &mpsc::Receiver<WorldEvent>) -> Vec<WorldEvent> {
        rx.try_iter().collect()
    }

    // ── events ─────────────────────────────────────────────────────────────

    #[test]
    fn body_lifecycle_emits_events_in_order() {
        let mut world = SandboxWorld::new();
        let (tx, rx) = mpsc::channel();
        world.subscribe(tx);

        let body = world.create_body(BodyDesc::default());
        let collider = world
            .attach_collider(body, Shape::Circle { radius: 1.0 })
            .unwrap();
        world.destroy_body(body);

        let events = drain(&rx);
        assert!(matches!(events[0], WorldEvent::BodyCreated(id) if id == body));
        assert!(matches!(
            events[1],
            WorldEvent::ColliderAttached { body: b, collider: c } if b == body && c == collider
        ));
        assert!(matches!(events[2], WorldEvent::ColliderDetached { .. }));
        assert!(matches!(events[3], WorldEvent::BodyDestroyed(id) if id == body));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn destroying_a_body_removes_its_joints_first() {
        let mut world = SandboxWorld::new();
        let a = world.create_body(BodyDesc::default());
        let b = world.create_body(BodyDesc::default());
        let joint = world
            .add_joint(JointDesc::new(JointKind::Weld, a, Some(b)))
            .unwrap();

        let (tx, rx) = mpsc::channel();
        world.subscribe(tx);
        world.destroy_body(b);

        let events = drain(&rx);
        assert!(matches!(events[0], WorldEvent::JointRemoved(id) if id == joint));
        assert!(world.joint(joint).is_none());
    }

    #[test]
    fn unsubscribe_and_dropped_receivers_stop_delivery() {
        let mut world = SandboxWorld::new();
        let (tx, rx) = mpsc::channel();
        let sub = world.subscribe(tx);
        let (dropped_tx, dropped_rx) = mpsc::channel();
        world.subscribe(dropped_tx);
        drop(dropped_rx);

        world.create_body(BodyDesc::default());
        assert_eq!(world.subscriber_count(), 1);

        world.unsubscribe(sub);
        world.create_body(BodyDesc::default());
        assert_eq!(drain(&rx).len(), 1);
        assert_eq!(world.subscriber_count(), 0);
    }

    #[test]
    fn joints_require_existing_bodies() {
        let mut world = SandboxWorld::new();
        let a = world.create_body(BodyDesc::default());
        assert!(world
            .add_joint(JointDesc::new(JointKind::Revolute, a, Some(BodyId(99))))
            .is_none());
    }

    // ── stepping ───────────────────────────────────────────────────────────

    #[test]
    fn pointer_constraint_pulls_body_towards_cursor() {
        let mut world = SandboxWorld::new();
        let body = world.create_body(BodyDesc::default());
        let cursor = PointerCursor::new(Vec2::new(1.0, 0.0));
        world.add_pointer_constraint(PointerConstraintDef {
            body,
            anchor: Vec2::ZERO,
            stiffness: 1.0,
            max_force: 1.0e4,
            cursor: cursor.clone(),
        });

        world.step(1.0 / 60.0);
        let p = world.body(body).unwrap().position();
        assert!((p - Vec2::new(1.0, 0.0)).length() < 1e-5);

        cursor.set(Vec2::new(1.0, 2.0));
        world.step(1.0 / 60.0);
        let p = world.body(body).unwrap().position();
        assert!((p - Vec2::new(1.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn static_bodies_ignore_pointer_constraints() {
        let mut world = SandboxWorld::new();
        let body = world.create_body(BodyDesc {
            is_static: true,
            ..Default::default()
        });
        world.add_pointer_constraint(PointerConstraintDef {
            body,
            anchor: Vec2::ZERO,
            stiffness: 1.0,
            max_force: 1.0e4,
            cursor: PointerCursor::new(Vec2::new(5.0, 5.0)),
        });
        world.step(0.1);
        assert_eq!(world.body(body).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn overlapping_circles_start_and_end_collisions() {
        let mut world = SandboxWorld::new();
        let a = world.create_body(BodyDesc::default());
        let b = world.create_body(BodyDesc {
            position: Vec2::new(1.5, 0.0),
            ..Default::default()
        });
        world.attach_collider(a, Shape::Circle { radius: 1.0 });
        world.attach_collider(b, Shape::Circle { radius: 1.0 });

        let (tx, rx) = mpsc::channel();
        world.subscribe(tx);

        world.step(0.016);
        let events = drain(&rx);
        let WorldEvent::CollisionStarted { contacts, .. } = &events[0] else {
            panic!("expected a collision start, got {events:?}");
        };
        assert_eq!(contacts.points()[0].normal, Vec2::X);
        assert_eq!(contacts.points()[0].point, Vec2::new(1.0, 0.0));

        // Still touching: no new events, the shared list is refreshed in place.
        world.set_pose(b, Vec2::new(1.0, 0.0), 0.0);
        world.step(0.016);
        assert!(drain(&rx).is_empty());
        assert_eq!(contacts.points()[0].point, Vec2::new(1.0, 0.0));

        world.set_pose(b, Vec2::new(5.0, 0.0), 0.0);
        world.step(0.016);
        assert!(matches!(drain(&rx)[..], [WorldEvent::CollisionEnded { .. }]));
    }

    #[test]
    fn manual_collisions_survive_stepping() {
        let mut world = SandboxWorld::new();
        let contacts = world.begin_collision(
            ColliderId(3),
            ColliderId(7),
            vec![ContactPoint { point: Vec2::ZERO, normal: Vec2::Y }],
        );
        world.step(0.016);
        assert_eq!(contacts.len(), 1);
        assert_eq!(world.pairs.len(), 1);
    }
}

//! Simulation boundary.
//!
//! The renderer never owns simulation state. It reads bodies and joints through
//! the [`World`], [`Body`] and [`Joint`] traits and learns about structural
//! changes from [`WorldEvent`]s delivered over a channel registered with
//! [`World::subscribe`].
//!
//! [`SandboxWorld`] is a small in-memory implementation used by the sandbox
//! binary and by tests.

mod joint;
mod sandbox;
mod shape;

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use glam::{Mat3, Vec2};

pub use joint::{JointKind, TravelLimits};
pub use sandbox::{BodyDesc, JointDesc, SandboxBody, SandboxJoint, SandboxWorld};
pub use shape::Shape;

// ── identities ────────────────────────────────────────────────────────────

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identity of a simulated body.
    BodyId,
    "body"
);
entity_id!(
    /// Identity of a joint (including pointer constraints).
    JointId,
    "joint"
);
entity_id!(
    /// Identity of a collider attached to a body.
    ColliderId,
    "collider"
);
entity_id!(
    /// Handle returned by [`World::subscribe`].
    SubscriptionId,
    "subscription"
);

/// Unordered pair of colliders; `PairId::new(a, b) == PairId::new(b, a)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(u64);

impl PairId {
    pub fn new(a: ColliderId, b: ColliderId) -> Self {
        let (lo, hi) = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
        Self((u64::from(lo) << 32) | u64::from(hi))
    }

    pub fn colliders(self) -> (ColliderId, ColliderId) {
        (ColliderId((self.0 >> 32) as u32), ColliderId(self.0 as u32))
    }
}

// ── shared state ──────────────────────────────────────────────────────────

/// World-space pointer position shared between a picking control and the
/// pointer constraint it created. The constraint reads it live.
#[derive(Debug, Clone, Default)]
pub struct PointerCursor(Rc<Cell<Vec2>>);

impl PointerCursor {
    pub fn new(at: Vec2) -> Self {
        Self(Rc::new(Cell::new(at)))
    }

    #[inline]
    pub fn get(&self) -> Vec2 {
        self.0.get()
    }

    #[inline]
    pub fn set(&self, at: Vec2) {
        self.0.set(at);
    }

    /// True when both handles observe the same cursor.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A single contact reported by the solver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContactPoint {
    pub point: Vec2,
    /// Unit normal pointing from the first collider towards the second.
    pub normal: Vec2,
}

/// Contact list for one collider pair.
///
/// The simulation keeps updating the list in place while the pair stays in
/// contact; holders see the current points on every read.
#[derive(Debug, Clone, Default)]
pub struct SharedContacts(Rc<RefCell<Vec<ContactPoint>>>);

impl SharedContacts {
    pub fn new(points: Vec<ContactPoint>) -> Self {
        Self(Rc::new(RefCell::new(points)))
    }

    pub fn points(&self) -> Ref<'_, [ContactPoint]> {
        Ref::map(self.0.borrow(), Vec::as_slice)
    }

    pub fn replace(&self, points: Vec<ContactPoint>) {
        *self.0.borrow_mut() = points;
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

// ── entity views ──────────────────────────────────────────────────────────

/// Collision shape attached to a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub id: ColliderId,
    pub shape: Shape,
}

impl Collider {
    /// Collider point test in body-local coordinates.
    #[inline]
    pub fn test_point(&self, local: Vec2) -> bool {
        self.shape.contains(local)
    }
}

/// Read-only view of a simulated body.
pub trait Body {
    fn id(&self) -> BodyId;
    fn is_static(&self) -> bool;
    fn is_sleeping(&self) -> bool;
    /// Island the body belongs to; `None` (or negative) when unassigned.
    fn island_id(&self) -> Option<i32>;
    fn collider(&self) -> Option<&Collider>;
    /// Local-to-world affine transform.
    fn transform(&self) -> Mat3;

    fn position(&self) -> Vec2 {
        self.transform().z_axis.truncate()
    }

    fn to_global_point(&self, local: Vec2) -> Vec2 {
        self.transform().transform_point2(local)
    }

    fn to_local_point(&self, global: Vec2) -> Vec2 {
        self.transform().inverse().transform_point2(global)
    }
}

/// Read-only view of a joint.
pub trait Joint {
    fn id(&self) -> JointId;
    fn kind(&self) -> &JointKind;
    fn body_a(&self) -> BodyId;
    fn body_b(&self) -> Option<BodyId>;
    /// Anchor on body A, in A's local space.
    fn pivot_a(&self) -> Vec2;
    /// Anchor on body B, in B's local space.
    fn pivot_b(&self) -> Vec2;
}

// ── events ────────────────────────────────────────────────────────────────

/// Structural change notifications emitted by a [`World`].
#[derive(Debug, Clone)]
pub enum WorldEvent {
    BodyCreated(BodyId),
    BodyDestroyed(BodyId),
    ColliderAttached { body: BodyId, collider: ColliderId },
    ColliderDetached { body: BodyId, collider: ColliderId },
    JointAdded(JointId),
    JointRemoved(JointId),
    CollisionStarted {
        collider_a: ColliderId,
        collider_b: ColliderId,
        contacts: SharedContacts,
    },
    CollisionEnded {
        collider_a: ColliderId,
        collider_b: ColliderId,
    },
}

/// Parameters of a pointer-driven constraint pulling `body` towards `cursor`.
#[derive(Debug, Clone)]
pub struct PointerConstraintDef {
    pub body: BodyId,
    /// Grasp point in the body's local space.
    pub anchor: Vec2,
    pub stiffness: f32,
    pub max_force: f32,
    pub cursor: PointerCursor,
}

/// Simulation as seen by the renderer and the controls.
pub trait World {
    /// All bodies, in the simulation's own order.
    fn bodies(&self) -> Box<dyn Iterator<Item = &dyn Body> + '_>;
    fn body(&self, id: BodyId) -> Option<&dyn Body>;

    fn joints(&self) -> Box<dyn Iterator<Item = &dyn Joint> + '_>;
    fn joint(&self, id: JointId) -> Option<&dyn Joint>;

    /// Registers an event sink. Events are sent until [`World::unsubscribe`]
    /// is called or the receiving end is dropped.
    fn subscribe(&mut self, sink: Sender<WorldEvent>) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);

    fn add_pointer_constraint(&mut self, def: PointerConstraintDef) -> JointId;
    /// Removes a joint; unknown ids are ignored.
    fn remove_joint(&mut self, id: JointId);
}

use glam::Vec2;

use crate::input::{InputEvent, InputState, MouseButton, MouseButtonState, TouchPhase};
use crate::world::{BodyId, JointId, PointerConstraintDef, PointerCursor, World};

use super::Projection;

/// Configuration for [`PickingControl`].
#[derive(Debug, Clone, PartialEq)]
pub struct PickingOptions {
    pub stiffness: f32,
    pub max_force: f32,
}

impl Default for PickingOptions {
    fn default() -> Self {
        Self {
            stiffness: 1.0,
            max_force: 1.0e4,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Grasp {
    body: BodyId,
    joint: JointId,
    /// Touch driving the grasp; `None` for the mouse.
    touch: Option<u64>,
}

/// Drags bodies with the pointer through the world's pointer constraint.
///
/// At most one body is held at a time. The constraint shares this control's
/// [`PointerCursor`], so pointer moves reach the simulation without touching
/// the world.
#[derive(Debug)]
pub struct PickingControl {
    options: PickingOptions,
    cursor: PointerCursor,
    grasp: Option<Grasp>,
}

impl PickingControl {
    pub fn new(options: PickingOptions) -> Self {
        Self {
            options,
            cursor: PointerCursor::default(),
            grasp: None,
        }
    }

    pub fn options(&self) -> &PickingOptions {
        &self.options
    }

    /// World-space cursor read by the active constraint.
    pub fn cursor(&self) -> &PointerCursor {
        &self.cursor
    }

    pub fn grasped_body(&self) -> Option<BodyId> {
        self.grasp.map(|g| g.body)
    }

    pub fn grasp_joint(&self) -> Option<JointId> {
        self.grasp.map(|g| g.joint)
    }

    /// Reacts to `event`; `input` must already include it.
    pub fn handle_input(
        &mut self,
        event: &InputEvent,
        input: &InputState,
        projection: &Projection,
        world: &mut dyn World,
    ) -> bool {
        match event {
            InputEvent::PointerButton(ev) if ev.button == MouseButton::Left => {
                let pos = Vec2::new(ev.x, ev.y);
                match ev.state {
                    MouseButtonState::Pressed => self.try_grasp(pos, None, projection, world),
                    MouseButtonState::Released => {
                        if self.grasp.is_some_and(|g| g.touch.is_none()) {
                            self.release(world);
                            return true;
                        }
                        false
                    }
                }
            }

            InputEvent::PointerMoved(ev) => {
                if !self.grasp.is_some_and(|g| g.touch.is_none()) {
                    return false;
                }
                self.cursor.set(projection.unproject(Vec2::new(ev.x, ev.y)));
                true
            }

            InputEvent::Touch(touch) => {
                let pos = Vec2::new(touch.x, touch.y);
                let owns = self.grasp.is_some_and(|g| g.touch == Some(touch.id));

                match touch.phase {
                    TouchPhase::Started if input.touch_count() == 1 => {
                        self.try_grasp(pos, Some(touch.id), projection, world)
                    }
                    TouchPhase::Started => {
                        // A second finger turns the gesture into a pinch.
                        if self.grasp.is_some_and(|g| g.touch.is_some()) {
                            self.release(world);
                        }
                        false
                    }
                    TouchPhase::Moved if owns => {
                        self.cursor.set(projection.unproject(pos));
                        true
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled if owns => {
                        self.release(world);
                        true
                    }
                    _ => false,
                }
            }

            InputEvent::Focused(false) => {
                self.release(world);
                false
            }

            _ => false,
        }
    }

    /// Removes the active constraint, if any.
    pub fn release(&mut self, world: &mut dyn World) {
        if let Some(grasp) = self.grasp.take() {
            world.remove_joint(grasp.joint);
            log::debug!("released {} ({})", grasp.body, grasp.joint);
        }
    }

    fn try_grasp(
        &mut self,
        screen: Vec2,
        touch: Option<u64>,
        projection: &Projection,
        world: &mut dyn World,
    ) -> bool {
        if self.grasp.is_some() {
            return false;
        }

        let point = projection.unproject(screen);
        let Some((body, anchor)) = pick_body(&*world, point) else { return false };

        self.cursor.set(point);
        let joint = world.add_pointer_constraint(PointerConstraintDef {
            body,
            anchor,
            stiffness: self.options.stiffness,
            max_force: self.options.max_force,
            cursor: self.cursor.clone(),
        });
        self.grasp = Some(Grasp { body, joint, touch });
        log::debug!("grasped {body} with {joint}");
        true
    }
}

/// First dynamic body, in world order, whose collider contains `point`.
///
/// Returns the body and the point in the body's local space.
pub fn pick_body(world: &dyn World, point: Vec2) -> Option<(BodyId, Vec2)> {
    world.bodies().find_map(|body| {
        if body.is_static() {
            return None;
        }
        let collider = body.collider()?;
        let local = body.to_local_point(point);
        collider.test_point(local).then(|| (body.id(), local))
    })
}

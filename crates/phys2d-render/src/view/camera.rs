use glam::Vec2;

use crate::input::{InputEvent, InputState, MouseButton, MouseButtonState, TouchPhase};

use super::Projection;

/// Configuration for [`CameraControl`].
#[derive(Debug, Clone, PartialEq)]
pub struct CameraOptions {
    /// Initial camera centre.
    pub origin: Vec2,
    /// Initial visible width in world units.
    pub width: f32,
    pub min_width: f32,
    pub max_width: f32,
    /// Width change per wheel notch.
    pub zoom_step: f32,
    pub pan_button: MouseButton,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            width: 30.0,
            min_width: 2.0,
            max_width: 120.0,
            zoom_step: 5.0,
            pan_button: MouseButton::Right,
        }
    }
}

/// Gesture the camera is tracking.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraState {
    Idle,
    /// World point held under the pointer.
    Panning { anchor: Vec2 },
    /// World point held under the two-finger midpoint.
    Pinching {
        anchor: Vec2,
        reference_distance: f32,
        reference_width: f32,
    },
}

/// Pan and zoom control over a [`Projection`].
///
/// Panning keeps the world point grabbed at press time under the pointer.
/// Pinching does the same for the midpoint of two touches and scales the
/// width by the change in finger distance. The wheel zooms by a fixed step.
#[derive(Debug, Clone)]
pub struct CameraControl {
    options: CameraOptions,
    state: CameraState,
}

impl CameraControl {
    pub fn new(options: CameraOptions) -> Self {
        Self {
            options,
            state: CameraState::Idle,
        }
    }

    pub fn options(&self) -> &CameraOptions {
        &self.options
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Applies the configured initial width and origin.
    pub fn attach(&self, projection: &mut Projection) {
        projection.set_width(self.clamp_width(self.options.width));
        projection.set_origin(self.options.origin);
    }

    /// Reacts to `event`; `input` must already include it.
    ///
    /// Returns `true` when the event changed the camera.
    pub fn handle_input(
        &mut self,
        event: &InputEvent,
        input: &InputState,
        projection: &mut Projection,
    ) -> bool {
        match event {
            InputEvent::PointerButton(ev) if ev.button == self.options.pan_button => {
                let pos = Vec2::new(ev.x, ev.y);
                match (ev.state, self.state) {
                    (MouseButtonState::Pressed, CameraState::Idle) => {
                        self.state = CameraState::Panning {
                            anchor: projection.unproject(pos),
                        };
                        true
                    }
                    (MouseButtonState::Released, CameraState::Panning { .. }) => {
                        self.state = CameraState::Idle;
                        true
                    }
                    _ => false,
                }
            }

            InputEvent::PointerMoved(ev) => {
                let CameraState::Panning { anchor } = self.state else { return false };
                projection.anchor(anchor, Vec2::new(ev.x, ev.y));
                true
            }

            InputEvent::MouseWheel { delta, .. } => {
                let dy = delta.y();
                if dy == 0.0 || !dy.is_finite() {
                    return false;
                }
                let width = projection.width() - dy.signum() * self.options.zoom_step;
                projection.set_width(self.clamp_width(width));
                true
            }

            InputEvent::Touch(touch) => match touch.phase {
                TouchPhase::Started => {
                    if input.touch_count() != 2 || self.state != CameraState::Idle {
                        return false;
                    }
                    let Some((a, b)) = input.touch_pair() else { return false };
                    self.state = CameraState::Pinching {
                        anchor: projection.unproject((a + b) * 0.5),
                        reference_distance: a.distance(b),
                        reference_width: projection.width(),
                    };
                    true
                }
                TouchPhase::Moved => {
                    let CameraState::Pinching {
                        anchor,
                        reference_distance,
                        reference_width,
                    } = self.state
                    else {
                        return false;
                    };
                    let Some((a, b)) = input.touch_pair() else { return false };

                    let distance = a.distance(b);
                    if distance > f32::EPSILON && reference_distance > f32::EPSILON {
                        let width = reference_width * reference_distance / distance;
                        projection.set_width(self.clamp_width(width));
                    }
                    projection.anchor(anchor, (a + b) * 0.5);
                    true
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    if !matches!(self.state, CameraState::Pinching { .. }) {
                        return false;
                    }
                    self.state = CameraState::Idle;
                    true
                }
            },

            InputEvent::Focused(false) => {
                self.state = CameraState::Idle;
                false
            }

            _ => false,
        }
    }

    fn clamp_width(&self, width: f32) -> f32 {
        let lo = self.options.min_width.min(self.options.max_width);
        width.clamp(lo, self.options.max_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::SurfaceSize;
    use crate::input::{
        Modifiers, MouseWheelDelta, PointerButtonEvent, PointerMoveEvent, TouchEvent,
    };

    struct Rig {
        camera: CameraControl,
        input: InputState,
        projection: Projection,
    }

    impl Rig {
        fn new() -> Self {
            let camera = CameraControl::new(CameraOptions::default());
            let mut projection = Projection::new(SurfaceSize::new(800.0, 600.0), 10.0, Vec2::ONE);
            camera.attach(&mut projection);
            Self {
                camera,
                input: InputState::default(),
                projection,
            }
        }

        fn send(&mut self, ev: InputEvent) -> bool {
            self.input.apply_event(&ev);
            self.camera.handle_input(&ev, &self.input, &mut self.projection)
        }

        fn button(&mut self, button: MouseButton, state: MouseButtonState, at: Vec2) -> bool {
            self.send(InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x: at.x,
                y: at.y,
                modifiers: Modifiers::default(),
            }))
        }

        fn move_to(&mut self, at: Vec2) -> bool {
            self.send(InputEvent::PointerMoved(PointerMoveEvent { x: at.x, y: at.y }))
        }

        fn wheel(&mut self, y: f32) -> bool {
            self.send(InputEvent::MouseWheel {
                delta: MouseWheelDelta::Line { x: 0.0, y },
                modifiers: Modifiers::default(),
            })
        }

        fn touch(&mut self, id: u64, phase: TouchPhase, at: Vec2) -> bool {
            self.send(InputEvent::Touch(TouchEvent {
                id,
                phase,
                x: at.x,
                y: at.y,
            }))
        }
    }

    // ── configuration ──────────────────────────────────────────────────────

    #[test]
    fn attach_applies_initial_width_and_origin() {
        let rig = Rig::new();
        assert_eq!(rig.projection.width(), 30.0);
        assert_eq!(rig.projection.origin(), Vec2::ZERO);
    }

    // ── panning ────────────────────────────────────────────────────────────

    #[test]
    fn pan_keeps_the_grabbed_point_under_the_pointer() {
        let mut rig = Rig::new();
        let press = Vec2::new(300.0, 200.0);
        let grabbed = rig.projection.unproject(press);

        assert!(rig.button(MouseButton::Right, MouseButtonState::Pressed, press));
        for at in [Vec2::new(350.0, 260.0), Vec2::new(10.0, 590.0)] {
            assert!(rig.move_to(at));
            assert!((rig.projection.unproject(at) - grabbed).length() < 1e-4);
        }

        assert!(rig.button(MouseButton::Right, MouseButtonState::Released, Vec2::ZERO));
        assert_eq!(rig.camera.state(), CameraState::Idle);
        assert!(!rig.move_to(Vec2::new(500.0, 500.0)));
    }

    #[test]
    fn other_buttons_do_not_pan() {
        let mut rig = Rig::new();
        assert!(!rig.button(MouseButton::Left, MouseButtonState::Pressed, Vec2::ZERO));
        assert_eq!(rig.camera.state(), CameraState::Idle);
    }

    // ── zoom ───────────────────────────────────────────────────────────────

    #[test]
    fn wheel_steps_and_clamps_the_width() {
        let mut rig = Rig::new();
        assert!(rig.wheel(1.0));
        assert_eq!(rig.projection.width(), 25.0);
        assert!(rig.wheel(-3.0));
        assert_eq!(rig.projection.width(), 30.0);

        for _ in 0..50 {
            rig.wheel(1.0);
        }
        assert_eq!(rig.projection.width(), 2.0);
        for _ in 0..50 {
            rig.wheel(-1.0);
        }
        assert_eq!(rig.projection.width(), 120.0);
        assert!(!rig.wheel(0.0));
    }

    // ── pinching ───────────────────────────────────────────────────────────

    #[test]
    fn pinch_scales_width_around_the_midpoint() {
        let mut rig = Rig::new();
        assert!(!rig.touch(1, TouchPhase::Started, Vec2::new(300.0, 300.0)));
        assert!(rig.touch(2, TouchPhase::Started, Vec2::new(500.0, 300.0)));
        let grabbed = rig.projection.unproject(Vec2::new(400.0, 300.0));

        // Fingers twice as far apart: half the width.
        rig.touch(1, TouchPhase::Moved, Vec2::new(200.0, 300.0));
        assert!(rig.touch(2, TouchPhase::Moved, Vec2::new(600.0, 300.0)));
        assert!((rig.projection.width() - 15.0).abs() < 1e-4);
        assert!((rig.projection.unproject(Vec2::new(400.0, 300.0)) - grabbed).length() < 1e-4);

        assert!(rig.touch(2, TouchPhase::Ended, Vec2::new(600.0, 300.0)));
        assert_eq!(rig.camera.state(), CameraState::Idle);
    }
}

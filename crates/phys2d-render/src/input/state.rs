use std::collections::{BTreeMap, HashSet};

use glam::Vec2;

use super::types::{
    InputEvent, Modifiers, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent,
    TouchEvent, TouchPhase,
};

/// Current input state for a single window.
///
/// Holds "is down" information, the pointer position and active touches.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,

    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<Vec2>,

    pub buttons_down: HashSet<MouseButton>,

    /// Active touches by id, in logical pixels.
    pub touches: BTreeMap<u64, Vec2>,
}

impl InputState {
    /// Applies an event to the current state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoids stuck buttons when focus changes mid-press.
                    self.buttons_down.clear();
                    self.touches.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some(Vec2::new(*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.pointer_pos = Some(Vec2::new(*x, *y));
                self.modifiers = *modifiers;

                match state {
                    MouseButtonState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }

            InputEvent::MouseWheel { modifiers, .. } => {
                self.modifiers = *modifiers;
            }

            InputEvent::Touch(TouchEvent { id, phase, x, y }) => match phase {
                TouchPhase::Started | TouchPhase::Moved => {
                    self.touches.insert(*id, Vec2::new(*x, *y));
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.touches.remove(id);
                }
            },
        }
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Positions of the two lowest-id touches, when at least two are active.
    pub fn touch_pair(&self) -> Option<(Vec2, Vec2)> {
        let mut it = self.touches.values().copied();
        Some((it.next()?, it.next()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: u64, phase: TouchPhase, x: f32, y: f32) -> InputEvent {
        InputEvent::Touch(TouchEvent { id, phase, x, y })
    }

    #[test]
    fn tracks_buttons_and_pointer() {
        let mut state = InputState::default();
        state.apply_event(&InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
            x: 4.0,
            y: 5.0,
            modifiers: Modifiers::default(),
        }));
        assert!(state.button_down(MouseButton::Left));
        assert_eq!(state.pointer_pos, Some(Vec2::new(4.0, 5.0)));

        state.apply_event(&InputEvent::Focused(false));
        assert!(!state.button_down(MouseButton::Left));
    }

    #[test]
    fn touches_follow_their_phases() {
        let mut state = InputState::default();
        state.apply_event(&touch(2, TouchPhase::Started, 10.0, 0.0));
        state.apply_event(&touch(1, TouchPhase::Started, 0.0, 0.0));
        assert_eq!(state.touch_pair(), Some((Vec2::ZERO, Vec2::new(10.0, 0.0))));

        state.apply_event(&touch(2, TouchPhase::Moved, 20.0, 0.0));
        assert_eq!(state.touches[&2], Vec2::new(20.0, 0.0));

        state.apply_event(&touch(1, TouchPhase::Cancelled, 0.0, 0.0));
        assert_eq!(state.touch_count(), 1);
        assert_eq!(state.touch_pair(), None);
    }
}

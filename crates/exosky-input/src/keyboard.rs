//! Keyboard handling: key-down edges resolved into viewer actions.

use crate::bindings::{KeyBindings, ViewerAction};
use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::PhysicalKey;

/// A key event stripped down to what the viewer needs. Lets tests drive
/// [`KeyboardState`] without constructing winit's platform-specific events.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    pub key: PhysicalKey,
    pub state: ElementState,
    pub repeat: bool,
}

/// Tracks held keys and queues one action per fresh key press.
#[derive(Debug, Default)]
pub struct KeyboardState {
    bindings: KeyBindings,
    held: HashSet<PhysicalKey>,
    actions: Vec<ViewerAction>,
}

impl KeyboardState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
            actions: Vec::new(),
        }
    }

    pub fn process_event(&mut self, event: &KeyEvent) {
        self.process_raw(RawKeyEvent {
            key: event.physical_key,
            state: event.state,
            repeat: event.repeat,
        });
    }

    pub fn process_raw(&mut self, event: RawKeyEvent) {
        match event.state {
            ElementState::Pressed => {
                // Some platforms do not flag repeats; the held set catches those.
                let fresh = self.held.insert(event.key);
                if !fresh || event.repeat {
                    return;
                }
                if let Some(action) = self.bindings.action_for(event.key) {
                    tracing::debug!(?action, "Key action");
                    self.actions.push(action);
                }
            }
            ElementState::Released => {
                self.held.remove(&event.key);
            }
        }
    }

    /// Forget held keys, e.g. when focus is lost and releases will not arrive.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    #[must_use]
    pub fn is_held(&self, key: PhysicalKey) -> bool {
        self.held.contains(&key)
    }

    /// Take queued actions, oldest first.
    pub fn drain_actions(&mut self) -> Vec<ViewerAction> {
        std::mem::take(&mut self.actions)
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    fn key(code: KeyCode, state: ElementState, repeat: bool) -> RawKeyEvent {
        RawKeyEvent {
            key: PhysicalKey::Code(code),
            state,
            repeat,
        }
    }

    #[test]
    fn test_press_queues_bound_action() {
        let mut kb = KeyboardState::default();
        kb.process_raw(key(KeyCode::Space, ElementState::Pressed, false));
        assert_eq!(kb.drain_actions(), vec![ViewerAction::ToggleRotation]);
        assert!(kb.drain_actions().is_empty());
    }

    #[test]
    fn test_unbound_key_is_held_but_silent() {
        let mut kb = KeyboardState::default();
        kb.process_raw(key(KeyCode::KeyZ, ElementState::Pressed, false));
        assert!(kb.is_held(PhysicalKey::Code(KeyCode::KeyZ)));
        assert!(kb.drain_actions().is_empty());
    }

    #[test]
    fn test_held_key_fires_once() {
        let mut kb = KeyboardState::default();
        kb.process_raw(key(KeyCode::KeyG, ElementState::Pressed, false));
        kb.process_raw(key(KeyCode::KeyG, ElementState::Pressed, true));
        kb.process_raw(key(KeyCode::KeyG, ElementState::Pressed, false));
        assert_eq!(kb.drain_actions(), vec![ViewerAction::ToggleGrid]);

        kb.process_raw(key(KeyCode::KeyG, ElementState::Released, false));
        kb.process_raw(key(KeyCode::KeyG, ElementState::Pressed, false));
        assert_eq!(kb.drain_actions(), vec![ViewerAction::ToggleGrid]);
    }

    #[test]
    fn test_release_all_allows_fresh_press() {
        let mut kb = KeyboardState::default();
        kb.process_raw(key(KeyCode::KeyP, ElementState::Pressed, false));
        kb.release_all();
        kb.process_raw(key(KeyCode::KeyP, ElementState::Pressed, false));
        assert_eq!(
            kb.drain_actions(),
            vec![ViewerAction::ExportChart, ViewerAction::ExportChart]
        );
    }

    #[test]
    fn test_actions_keep_press_order() {
        let mut kb = KeyboardState::default();
        kb.process_raw(key(KeyCode::KeyV, ElementState::Pressed, false));
        kb.process_raw(key(KeyCode::Space, ElementState::Pressed, false));
        assert_eq!(
            kb.drain_actions(),
            vec![ViewerAction::ToggleView, ViewerAction::ToggleRotation]
        );
    }
}

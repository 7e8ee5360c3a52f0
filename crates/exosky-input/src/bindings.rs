//! Viewer actions and the keys bound to them.

use std::collections::HashMap;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Commands the viewer accepts from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    /// The play/pause control for auto-rotation.
    ToggleRotation,
    ToggleGrid,
    /// Switch between the ground and orbit views.
    ToggleView,
    ExportChart,
    /// Leave the star view and return to planet selection.
    Back,
    Quit,
}

/// Key-to-action map. Each key triggers at most one action.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    keys: HashMap<PhysicalKey, ViewerAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(KeyCode::Space, ViewerAction::ToggleRotation);
        bindings.bind(KeyCode::KeyG, ViewerAction::ToggleGrid);
        bindings.bind(KeyCode::KeyV, ViewerAction::ToggleView);
        bindings.bind(KeyCode::KeyP, ViewerAction::ExportChart);
        bindings.bind(KeyCode::Backspace, ViewerAction::Back);
        bindings.bind(KeyCode::Escape, ViewerAction::Quit);
        bindings
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Bind `code` to `action`, replacing any earlier binding of that key.
    pub fn bind(&mut self, code: KeyCode, action: ViewerAction) {
        self.keys.insert(PhysicalKey::Code(code), action);
    }

    pub fn action_for(&self, key: PhysicalKey) -> Option<ViewerAction> {
        self.keys.get(&key).copied()
    }

    /// Keys bound to `action`, for help text.
    pub fn keys_for(&self, action: ViewerAction) -> Vec<PhysicalKey> {
        self.keys
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| *k)
            .collect()
    }
}

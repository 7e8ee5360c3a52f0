//! Pointer and keyboard input for the star viewer.
//!
//! Winit events are folded into frame-coherent state: [`PointerState`] turns
//! button and motion events into drag gestures and wheel steps, and
//! [`KeyboardState`] resolves key presses into [`ViewerAction`]s through
//! [`KeyBindings`].

pub mod bindings;
pub mod keyboard;
pub mod mouse;

pub use bindings::{KeyBindings, ViewerAction};
pub use keyboard::{KeyboardState, RawKeyEvent};
pub use mouse::{PointerState, PointerGesture};

//! Pointer tracking for orbiting, zooming and hover picking.
//!
//! Events arrive from winit between frames. [`PointerState`] folds them into
//! per-frame deltas and a queue of [`PointerGesture`]s so the viewer sees
//! each press, release and wheel step exactly once.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixel-delta scroll events are divided by this to approximate line steps.
const PIXELS_PER_LINE: f32 = 40.0;

/// Discrete pointer transitions the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerGesture {
    /// The primary button went down inside the window.
    DragStart,
    /// The primary button was released, or the cursor left mid-drag.
    DragEnd,
    /// One wheel event, in lines. Positive scrolls away from the user.
    Wheel(f32),
}

/// Pointer state accumulated between frames.
#[derive(Debug, Default)]
pub struct PointerState {
    position: Option<Vec2>,
    drag_delta: Vec2,
    dragging: bool,
    moved_this_frame: bool,
    gestures: Vec<PointerGesture>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let next = Vec2::new(x as f32, y as f32);
        if self.dragging
            && let Some(previous) = self.position
        {
            self.drag_delta += next - previous;
        }
        self.position = Some(next);
        self.moved_this_frame = true;
    }

    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed if !self.dragging => {
                self.dragging = true;
                self.gestures.push(PointerGesture::DragStart);
            }
            ElementState::Released if self.dragging => self.end_drag(),
            _ => {}
        }
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
        };
        if lines != 0.0 {
            self.gestures.push(PointerGesture::Wheel(lines));
        }
    }

    pub fn on_cursor_left(&mut self) {
        self.position = None;
        if self.dragging {
            tracing::debug!("Cursor left the window during a drag");
            self.end_drag();
        }
    }

    /// Window lost focus: a release may never arrive.
    pub fn on_focus_lost(&mut self) {
        if self.dragging {
            self.end_drag();
        }
    }

    fn end_drag(&mut self) {
        self.dragging = false;
        self.gestures.push(PointerGesture::DragEnd);
    }

    /// Take the gestures recorded since the last call, oldest first.
    pub fn drain_gestures(&mut self) -> Vec<PointerGesture> {
        std::mem::take(&mut self.gestures)
    }

    /// Cursor travel while dragging since the last call.
    pub fn take_drag_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.drag_delta)
    }

    /// Whether the cursor moved since the last [`clear_transients`](Self::clear_transients).
    #[must_use]
    pub fn moved(&self) -> bool {
        self.moved_this_frame
    }

    #[must_use]
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Call once per frame after the viewer has consumed this frame's input.
    pub fn clear_transients(&mut self) {
        self.moved_this_frame = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_press_and_release_produce_drag_pair() {
        let mut pointer = PointerState::new();
        pointer.on_button(MouseButton::Left, ElementState::Pressed);
        pointer.on_button(MouseButton::Left, ElementState::Released);
        assert_eq!(
            pointer.drain_gestures(),
            vec![PointerGesture::DragStart, PointerGesture::DragEnd]
        );
        assert!(pointer.drain_gestures().is_empty());
    }

    #[test]
    fn test_other_buttons_ignored() {
        let mut pointer = PointerState::new();
        pointer.on_button(MouseButton::Right, ElementState::Pressed);
        pointer.on_button(MouseButton::Middle, ElementState::Released);
        assert!(pointer.drain_gestures().is_empty());
        assert!(!pointer.is_dragging());
    }

    #[test]
    fn test_stray_release_without_press_is_ignored() {
        let mut pointer = PointerState::new();
        pointer.on_button(MouseButton::Left, ElementState::Released);
        assert!(pointer.drain_gestures().is_empty());
    }

    #[test]
    fn test_drag_delta_only_accumulates_while_dragging() {
        let mut pointer = PointerState::new();
        pointer.on_cursor_moved(10.0, 10.0);
        pointer.on_cursor_moved(20.0, 10.0);
        assert_eq!(pointer.take_drag_delta(), Vec2::ZERO);

        pointer.on_button(MouseButton::Left, ElementState::Pressed);
        pointer.on_cursor_moved(25.0, 4.0);
        pointer.on_cursor_moved(30.0, 0.0);
        assert_eq!(pointer.take_drag_delta(), Vec2::new(10.0, -10.0));
        assert_eq!(pointer.take_drag_delta(), Vec2::ZERO);
    }

    #[test]
    fn test_cursor_leaving_ends_drag() {
        let mut pointer = PointerState::new();
        pointer.on_cursor_moved(5.0, 5.0);
        pointer.on_button(MouseButton::Left, ElementState::Pressed);
        pointer.on_cursor_left();
        assert!(!pointer.is_dragging());
        assert_eq!(pointer.position(), None);
        assert_eq!(
            pointer.drain_gestures(),
            vec![PointerGesture::DragStart, PointerGesture::DragEnd]
        );
    }

    #[test]
    fn test_focus_loss_ends_drag_once() {
        let mut pointer = PointerState::new();
        pointer.on_button(MouseButton::Left, ElementState::Pressed);
        pointer.on_focus_lost();
        pointer.on_button(MouseButton::Left, ElementState::Released);
        assert_eq!(
            pointer.drain_gestures(),
            vec![PointerGesture::DragStart, PointerGesture::DragEnd]
        );
    }

    #[test]
    fn test_scroll_units() {
        let mut pointer = PointerState::new();
        pointer.on_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        pointer.on_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -80.0)));
        pointer.on_scroll(MouseScrollDelta::LineDelta(0.0, 0.0));
        assert_eq!(
            pointer.drain_gestures(),
            vec![PointerGesture::Wheel(2.0), PointerGesture::Wheel(-2.0)]
        );
    }

    #[test]
    fn test_moved_flag_clears_per_frame() {
        let mut pointer = PointerState::new();
        pointer.on_cursor_moved(1.0, 2.0);
        assert!(pointer.moved());
        pointer.clear_transients();
        assert!(!pointer.moved());
        assert_eq!(pointer.position(), Some(Vec2::new(1.0, 2.0)));
    }
}

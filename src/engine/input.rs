// Input state tracking for the mouse
// Abstracts winit events into a queryable per-frame snapshot

use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pixels of smooth (touchpad) scroll that count as one wheel line.
const PIXELS_PER_LINE: f32 = 100.0;

pub struct InputState {
    // Mouse
    pub mouse_position: (f32, f32),
    left_held: bool,

    // Cursor travel while the left button is held, accumulated this frame
    pub drag_delta: (f32, f32),

    // Scroll: accumulated vertical scroll lines this frame, reset in end_frame()
    pub scroll_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            mouse_position: (0.0, 0.0),
            left_held: false,
            drag_delta: (0.0, 0.0),
            scroll_delta: 0.0,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the app's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.set_left_button(*state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.scroll(y);
            }
            _ => {}
        }
    }

    pub fn set_left_button(&mut self, pressed: bool) {
        self.left_held = pressed;
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        if self.left_held {
            self.drag_delta.0 += x - self.mouse_position.0;
            self.drag_delta.1 += y - self.mouse_position.1;
        }
        self.mouse_position = (x, y);
    }

    pub fn scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Call once per frame after update() and render() have consumed input.
    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.scroll_delta = 0.0;
        self.drag_delta = (0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_without_button_is_not_a_drag() {
        let mut input = InputState::new();
        input.cursor_moved(10.0, 10.0);
        input.cursor_moved(30.0, 5.0);
        assert_eq!(input.drag_delta, (0.0, 0.0));
        assert_eq!(input.mouse_position, (30.0, 5.0));
    }

    #[test]
    fn drag_accumulates_from_press_position() {
        let mut input = InputState::new();
        input.cursor_moved(100.0, 100.0);
        input.set_left_button(true);
        input.cursor_moved(110.0, 95.0);
        input.cursor_moved(125.0, 90.0);
        assert_eq!(input.drag_delta, (25.0, -10.0));

        input.set_left_button(false);
        input.cursor_moved(200.0, 200.0);
        assert_eq!(input.drag_delta, (25.0, -10.0));
    }

    #[test]
    fn end_frame_resets_accumulators() {
        let mut input = InputState::new();
        input.set_left_button(true);
        input.cursor_moved(5.0, 5.0);
        input.scroll(1.0);
        input.scroll(2.0);
        assert_eq!(input.scroll_delta, 3.0);

        input.end_frame();
        assert_eq!(input.scroll_delta, 0.0);
        assert_eq!(input.drag_delta, (0.0, 0.0));

        // Button is still held across frames.
        input.cursor_moved(8.0, 9.0);
        assert_eq!(input.drag_delta, (3.0, 4.0));
    }
}

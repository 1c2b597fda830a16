// Orbit camera around the scene origin.
//
// Camera model:
//   - The eye sits `zoom` units back along the view axis, looking at the origin
//   - `rot_x` tilts the scene toward/away from the viewer (clamped to ±90°)
//   - `rot_y` spins the scene around the vertical axis
//   - Left-drag rotates, mouse wheel zooms

use glam::{Mat4, Vec3};
use super::input::InputState;

pub struct OrbitCamera {
    /// Tilt in degrees. Private: always clamped to [-max_tilt, max_tilt]. Use rot_x() to read.
    rot_x: f32,

    /// Spin in degrees around +Y. Unbounded.
    pub rot_y: f32,

    /// Eye distance from the origin.
    /// Private: always clamped to [min_zoom, max_zoom]. Use zoom() to read.
    zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,

    pub max_tilt: f32,

    /// Degrees of rotation per pixel of mouse drag
    pub drag_sensitivity: f32,

    /// Distance change per scroll line
    pub zoom_step: f32,

    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            rot_x: 45.0,
            rot_y: 45.0,
            zoom: 15.0,
            min_zoom: 5.0,
            max_zoom: 40.0,
            max_tilt: 90.0,
            drag_sensitivity: 0.2,
            zoom_step: 1.0,
            fov: 45.0,
            near: 0.1,
            far: 50.0,
        }
    }

    /// Apply this frame's drag and scroll. Call once per frame before rendering.
    pub fn update(&mut self, input: &InputState) {
        let (dx, dy) = input.drag_delta;
        self.drag(dx, dy);
        self.scroll(input.scroll_delta);
    }

    /// Rotate by a mouse drag of (dx, dy) pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.rot_y += dx * self.drag_sensitivity;
        self.rot_x = (self.rot_x + dy * self.drag_sensitivity).clamp(-self.max_tilt, self.max_tilt);
    }

    /// Positive lines (wheel up) move the eye closer.
    pub fn scroll(&mut self, lines: f32) {
        self.zoom = (self.zoom - lines * self.zoom_step).clamp(self.min_zoom, self.max_zoom);
    }

    pub fn rot_x(&self) -> f32 { self.rot_x }
    pub fn zoom(&self) -> f32 { self.zoom }

    /// Push the scene back by `zoom`, then tilt, then spin.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.zoom))
            * Mat4::from_rotation_x(self.rot_x.to_radians())
            * Mat4::from_rotation_y(self.rot_y.to_radians())
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

// ECS components and resources for the scene

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use super::texture::BlockTexture;

/// Pose of an entity in world space
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }
}

/// Which pipeline draws a voxel. Layers are drawn in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawLayer {
    /// Drawn first, ignores and never writes depth (ground shadow).
    Backdrop,
    Opaque,
    /// Alpha-blended, tested against but not written to depth (bee wings).
    Translucent,
}

/// A box drawn with the shared unit cube.
#[derive(Component, Debug, Clone, Copy)]
pub struct Voxel {
    /// Full size along each local axis.
    pub extent: Vec3,
    /// Used when the face has no loaded texture; alpha always applies.
    pub tint: [f32; 4],
    /// Texture for the +Y face.
    pub top: Option<BlockTexture>,
    /// Texture for the other five faces.
    pub sides: Option<BlockTexture>,
    /// How many times the texture repeats across a face.
    pub texture_repeat: f32,
    pub lit: bool,
    pub layer: DrawLayer,
}

impl Voxel {
    /// Opaque, lit cube with one texture on every face.
    pub fn block(size: f32, texture: Option<BlockTexture>, tint: [f32; 3]) -> Self {
        Self {
            extent: Vec3::splat(size),
            tint: [tint[0], tint[1], tint[2], 1.0],
            top: texture,
            sides: texture,
            texture_repeat: 1.0,
            lit: true,
            layer: DrawLayer::Opaque,
        }
    }

    pub fn model_matrix(&self, transform: &Transform) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.extent, transform.rotation, transform.position)
    }
}

/// Piece of the bee model, placed relative to the bee pose every frame.
#[derive(Component, Debug, Clone, Copy)]
pub struct BeePart {
    /// Offset in the bee's local frame (before yaw/pitch).
    pub offset: Vec3,
}

/// Runtime toggles flipped from the keyboard.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SceneSettings {
    pub show_bee: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self { show_bee: true }
    }
}

/// Simulation ticks owed for the current frame, set by the main loop.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SimulationTicks(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_matrix_scales_then_rotates_then_translates() {
        let voxel = Voxel::block(2.0, None, [1.0, 0.0, 0.0]);
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        };
        let corner = voxel.model_matrix(&transform).transform_point3(Vec3::new(0.5, 0.0, 0.0));
        // +X half-extent (1.0 after scaling) rotated onto -Z, then moved.
        assert!((corner - Vec3::new(1.0, 2.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn draw_layers_order_backdrop_first() {
        let mut layers = [DrawLayer::Translucent, DrawLayer::Backdrop, DrawLayer::Opaque];
        layers.sort();
        assert_eq!(layers, [DrawLayer::Backdrop, DrawLayer::Opaque, DrawLayer::Translucent]);
    }
}

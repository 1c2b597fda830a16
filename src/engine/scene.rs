// Voxel models: the tulip on its soil block, and the bee that circles it.
// Tulip blocks are static entities; bee parts carry a BeePart offset and are
// moved by follow_flight() every frame.

use bevy_ecs::prelude::*;
use glam::Vec3;
use super::components::*;
use super::texture::BlockTexture;

/// Edge length of one tulip block.
pub const BLOCK: f32 = 0.5;
/// Edge length of one bee body block.
pub const BEE_BLOCK: f32 = 0.3;

const RED: [f32; 3] = [1.0, 0.0, 0.0];
const BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 0.7, 0.0];
const BROWN: [f32; 3] = [0.47, 0.3, 0.17];
const SHADOW: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const WING: [f32; 4] = [1.0, 1.0, 1.0, 0.5];

/// Height of the flower head's lower petal row.
pub fn flower_center_y() -> f32 {
    BLOCK * 4.5
}

/// Spawn the soil block, stem, petals, flower centre and ground shadow.
/// Returns the number of entities spawned.
pub fn spawn_tulip(world: &mut World) -> usize {
    let s = BLOCK;
    let mut count = 0;
    let mut spawn = |world: &mut World, position: Vec3, voxel: Voxel| {
        world.spawn((Transform::from_position(position), voxel));
        count += 1;
    };

    // Flat dark square on the ground; sits inside the soil block and is
    // painted before it without a depth test.
    spawn(world, Vec3::new(0.0, 0.05, 0.0), Voxel {
        extent: Vec3::new(3.0, 0.001, 3.0),
        tint: SHADOW,
        top: None,
        sides: None,
        texture_repeat: 1.0,
        lit: false,
        layer: DrawLayer::Backdrop,
    });

    // Soil: grass on top, dirt on the sides, texture tiled 4x per face.
    spawn(world, Vec3::new(0.0, -s * 0.5, 0.0), Voxel {
        top: Some(BlockTexture::GrassTop),
        sides: Some(BlockTexture::Dirt),
        texture_repeat: 4.0,
        ..Voxel::block(2.0, None, BROWN)
    });

    let stem = [
        (0.0, s * 0.5, 0.0), (0.0, s * 1.5, 0.0), (0.0, s * 2.5, 0.0), (0.0, s * 3.5, 0.0),
        (-s, s * 1.5, 0.0), (s, s * 1.5, 0.0), (0.0, s * 2.5, -s), (0.0, s * 2.5, s),
    ];
    for (x, y, z) in stem {
        spawn(world, Vec3::new(x, y, z), Voxel::block(s, Some(BlockTexture::OakLeaves), GREEN));
    }

    let fy = flower_center_y();
    let petals = [
        (0.0, fy, 0.0), (s, fy, 0.0), (-s, fy, 0.0), (0.0, fy, s), (0.0, fy, -s),
        (s, fy + s, 0.0), (-s, fy + s, 0.0), (0.0, fy + s, s), (0.0, fy + s, -s),
    ];
    for (x, y, z) in petals {
        spawn(world, Vec3::new(x, y, z), Voxel::block(s, Some(BlockTexture::RedWool), RED));
    }

    let centre = [
        (s * 0.5, fy + s * 0.5, 0.0), (-s * 0.5, fy + s * 0.5, 0.0),
        (0.0, fy + s * 0.5, s * 0.5), (0.0, fy + s * 0.5, -s * 0.5),
    ];
    for (x, y, z) in centre {
        spawn(world, Vec3::new(x, y, z), Voxel::block(s * 0.5, None, BLACK));
    }

    count
}

/// Spawn the bee: three body blocks along local +X and a wing on each side.
/// Parts start at the origin; follow_flight() places them.
pub fn spawn_bee(world: &mut World) -> usize {
    let s = BEE_BLOCK;
    let mut count = 0;

    for i in 0..3 {
        world.spawn((
            Transform::default(),
            Voxel::block(s, Some(BlockTexture::BeeBody), BLACK),
            BeePart { offset: Vec3::new(s * i as f32, 0.0, 0.0) },
        ));
        count += 1;
    }

    for side in [-1.0, 1.0] {
        world.spawn((
            Transform::default(),
            Voxel {
                extent: Vec3::splat(s * 1.5),
                tint: WING,
                top: Some(BlockTexture::BeeWings),
                sides: Some(BlockTexture::BeeWings),
                texture_repeat: 1.0,
                lit: false,
                layer: DrawLayer::Translucent,
            },
            BeePart { offset: Vec3::new(s, s * 0.5, side * s * 0.8) },
        ));
        count += 1;
    }

    count
}

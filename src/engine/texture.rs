// Block textures packed into a single 2D texture array.
//
// Every image is resized (nearest) to TEXTURE_SIZE x TEXTURE_SIZE and stored in
// its own array layer. A texture that is missing or fails to decode simply has
// no layer; voxels using it fall back to their solid tint colour.

use std::path::Path;

use anyhow::Context;
use image::{imageops::FilterType, RgbaImage};

/// Side length of every layer, in texels.
pub const TEXTURE_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTexture {
    GrassTop,
    Dirt,
    OakLeaves,
    RedWool,
    BeeBody,
    BeeWings,
}

impl BlockTexture {
    pub const ALL: [BlockTexture; 6] = [
        BlockTexture::GrassTop,
        BlockTexture::Dirt,
        BlockTexture::OakLeaves,
        BlockTexture::RedWool,
        BlockTexture::BeeBody,
        BlockTexture::BeeWings,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            BlockTexture::GrassTop => "grass_top.png",
            BlockTexture::Dirt => "dirt.png",
            BlockTexture::OakLeaves => "oak-leaves.png",
            BlockTexture::RedWool => "red-wool.png",
            BlockTexture::BeeBody => "bee_body.png",
            BlockTexture::BeeWings => "bee_wings.png",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// CPU ATLAS
// ============================================================================

pub struct TextureAtlas {
    layers: Vec<RgbaImage>,
    layer_of: [Option<u32>; BlockTexture::ALL.len()],
}

impl TextureAtlas {
    /// Load every block texture found in `dir`. Never fails: problems are logged.
    pub fn load(dir: &Path) -> Self {
        let mut images = Vec::new();
        for texture in BlockTexture::ALL {
            let path = dir.join(texture.file_name());
            if !path.exists() {
                log::warn!("texture {} not found, using solid colour", path.display());
                continue;
            }
            match load_image(&path) {
                Ok(img) => images.push((texture, img)),
                Err(e) => log::warn!("{e:#}, using solid colour"),
            }
        }

        let atlas = Self::from_images(images);
        log::info!(
            "loaded {}/{} block textures from {}",
            atlas.layer_count_loaded(),
            BlockTexture::ALL.len(),
            dir.display(),
        );
        atlas
    }

    pub fn from_images(images: impl IntoIterator<Item = (BlockTexture, RgbaImage)>) -> Self {
        let mut layers = Vec::new();
        let mut layer_of = [None; BlockTexture::ALL.len()];

        for (texture, img) in images {
            let img = if img.dimensions() == (TEXTURE_SIZE, TEXTURE_SIZE) {
                img
            } else {
                image::imageops::resize(&img, TEXTURE_SIZE, TEXTURE_SIZE, FilterType::Nearest)
            };

            match layer_of[texture.index()] {
                // Same texture twice: the later image wins.
                Some(layer) => layers[layer as usize] = img,
                None => {
                    layer_of[texture.index()] = Some(layers.len() as u32);
                    layers.push(img);
                }
            }
        }

        Self { layers, layer_of }
    }

    /// Array layer holding `texture`, if it was loaded.
    pub fn layer(&self, texture: BlockTexture) -> Option<u32> {
        self.layer_of[texture.index()]
    }

    /// Shader-side layer index: -1 means "untextured, use the tint".
    pub fn shader_layer(&self, texture: Option<BlockTexture>) -> i32 {
        texture
            .and_then(|t| self.layer(t))
            .map_or(-1, |layer| layer as i32)
    }

    pub fn layer_count_loaded(&self) -> usize { self.layers.len() }

    /// Layers as uploaded. A white placeholder stands in when nothing loaded,
    /// since a texture array must have at least one layer.
    fn upload_layers(&self) -> Vec<RgbaImage> {
        if self.layers.is_empty() {
            vec![RgbaImage::from_pixel(TEXTURE_SIZE, TEXTURE_SIZE, image::Rgba([255, 255, 255, 255]))]
        } else {
            self.layers.clone()
        }
    }

    /// Create the GPU texture array, its view and a repeating nearest sampler.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> GpuTextureArray {
        let layers = self.upload_layers();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Block Texture Array"),
            size: wgpu::Extent3d {
                width: TEXTURE_SIZE,
                height: TEXTURE_SIZE,
                depth_or_array_layers: layers.len() as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, img) in layers.iter().enumerate() {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: 0, y: 0, z: layer as u32 },
                    aspect: wgpu::TextureAspect::All,
                },
                img.as_raw(),
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * TEXTURE_SIZE),
                    rows_per_image: Some(TEXTURE_SIZE),
                },
                wgpu::Extent3d {
                    width: TEXTURE_SIZE,
                    height: TEXTURE_SIZE,
                    depth_or_array_layers: 1,
                },
            );
        }

        // Explicit D2Array: a single-layer texture would otherwise default to a D2 view.
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Block Texture Array View"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Block Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        GpuTextureArray { _texture: texture, view, sampler }
    }
}

fn load_image(path: &Path) -> anyhow::Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode texture {}", path.display()))?;
    Ok(img.to_rgba8())
}

// ============================================================================
// GPU ARRAY
// ============================================================================

pub struct GpuTextureArray {
    // Kept alive for the view.
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba(rgba))
    }

    #[test]
    fn layers_follow_load_order() {
        let atlas = TextureAtlas::from_images([
            (BlockTexture::RedWool, solid(16, 16, [255, 0, 0, 255])),
            (BlockTexture::Dirt, solid(16, 16, [120, 80, 40, 255])),
        ]);
        assert_eq!(atlas.layer(BlockTexture::RedWool), Some(0));
        assert_eq!(atlas.layer(BlockTexture::Dirt), Some(1));
        assert_eq!(atlas.layer(BlockTexture::GrassTop), None);
        assert_eq!(atlas.layer_count_loaded(), 2);
    }

    #[test]
    fn missing_texture_maps_to_untextured_layer() {
        let atlas = TextureAtlas::from_images([(BlockTexture::OakLeaves, solid(16, 16, [0, 160, 0, 255]))]);
        assert_eq!(atlas.shader_layer(Some(BlockTexture::OakLeaves)), 0);
        assert_eq!(atlas.shader_layer(Some(BlockTexture::BeeBody)), -1);
        assert_eq!(atlas.shader_layer(None), -1);
    }

    #[test]
    fn images_are_resized_to_layer_size() {
        let atlas = TextureAtlas::from_images([(BlockTexture::BeeWings, solid(64, 32, [255, 255, 255, 128]))]);
        let layers = atlas.upload_layers();
        assert_eq!(layers[0].dimensions(), (TEXTURE_SIZE, TEXTURE_SIZE));
        assert_eq!(layers[0].get_pixel(3, 7).0, [255, 255, 255, 128]);
    }

    #[test]
    fn duplicate_texture_replaces_its_layer() {
        let atlas = TextureAtlas::from_images([
            (BlockTexture::Dirt, solid(16, 16, [1, 1, 1, 255])),
            (BlockTexture::Dirt, solid(16, 16, [2, 2, 2, 255])),
        ]);
        let layers = atlas.upload_layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].get_pixel(0, 0).0, [2, 2, 2, 255]);
    }

    #[test]
    fn empty_atlas_uploads_white_placeholder() {
        let atlas = TextureAtlas::load(Path::new("definitely/not/an/asset/dir"));
        assert_eq!(atlas.layer_count_loaded(), 0);
        let layers = atlas.upload_layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn every_texture_has_a_distinct_file() {
        let mut names: Vec<_> = BlockTexture::ALL.iter().map(|t| t.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), BlockTexture::ALL.len());
    }
}

// Voxel tulip with an orbiting bee, drawn with INSTANCED rendering.
// One unit cube in the vertex buffer, one instance per voxel, one draw call per draw layer.

mod engine;

use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use bevy_ecs::prelude::*;
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use engine::camera::OrbitCamera;
use engine::debug_overlay::{BeeStats, DebugOverlay, DebugStats};
use engine::flight::FlightController;
use engine::input::InputState;
use engine::mesh::{unit_cube, GpuVertex};
use engine::texture::{GpuTextureArray, TextureAtlas};
use engine::tick::FixedTicker;
use engine::{BeePart, DrawLayer, SceneSettings, SimulationTicks, Transform, Voxel};

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;

const SKY: wgpu::Color = wgpu::Color { r: 0.53, g: 0.81, b: 0.98, a: 1.0 };
const LIGHT_POSITION: [f32; 4] = [5.0, 10.0, 5.0, 1.0];
const LIGHT_AMBIENT: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_INSTANCE_CAPACITY: usize = 64;

/// Overrides the directory block textures are loaded from.
const ASSET_DIR_ENV: &str = "TULIP_ASSET_DIR";

// ============================================================================
// INSTANCE DATA (per-voxel)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
    /// Texture array layer for the top face and for the other faces; -1 = untextured.
    layers: [i32; 2],
    texture_repeat: f32,
    lit: u32,
}

impl InstanceData {
    fn new(transform: &Transform, voxel: &Voxel, atlas: &TextureAtlas) -> Self {
        Self {
            model: voxel.model_matrix(transform).to_cols_array_2d(),
            tint: voxel.tint,
            layers: [atlas.shader_layer(voxel.top), atlas.shader_layer(voxel.sides)],
            texture_repeat: voxel.texture_repeat,
            lit: voxel.lit as u32,
        }
    }

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        // Locations 0-3 belong to GpuVertex.
        const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
            4 => Float32x4, 5 => Float32x4, 6 => Float32x4, 7 => Float32x4,
            8 => Float32x4, 9 => Sint32x2, 10 => Float32, 11 => Uint32
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,  // One per instance, not per vertex
            attributes: &ATTRIBUTES,
        }
    }
}

/// Collect drawable voxels from the ECS, grouped by draw layer in draw order.
/// Returns the instances and the instance range of each non-empty layer.
fn collect_instances(
    world: &mut World,
    atlas: &TextureAtlas,
) -> (Vec<InstanceData>, Vec<(DrawLayer, Range<u32>)>) {
    let show_bee = world.resource::<SceneSettings>().show_bee;

    let mut tagged = Vec::new();
    let mut query = world.query::<(&Transform, &Voxel, Has<BeePart>)>();
    for (transform, voxel, is_bee) in query.iter(world) {
        if is_bee && !show_bee {
            continue;
        }
        tagged.push((voxel.layer, InstanceData::new(transform, voxel, atlas)));
    }

    // Stable: voxels keep spawn order within a layer.
    tagged.sort_by_key(|(layer, _)| *layer);

    let mut batches: Vec<(DrawLayer, Range<u32>)> = Vec::new();
    for (i, (layer, _)) in tagged.iter().enumerate() {
        let i = i as u32;
        match batches.last_mut() {
            Some((last, range)) if *last == *layer => range.end = i + 1,
            _ => batches.push((*layer, i..i + 1)),
        }
    }

    (tagged.into_iter().map(|(_, data)| data).collect(), batches)
}

// ============================================================================
// UNIFORM DATA
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light_position: [f32; 4],
    light_ambient: [f32; 4],
}

// ============================================================================
// FRAME TIMING
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FrameSummary {
    fps: u32,
    avg_ms: f32,
    min_ms: f32,
    max_ms: f32,
}

/// Aggregates frame times over one-second windows.
struct FrameTimer {
    window: Duration,
    elapsed: Duration,
    frames: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
}

impl FrameTimer {
    fn new() -> Self {
        Self {
            window: Duration::from_secs(1),
            elapsed: Duration::ZERO,
            frames: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
        }
    }

    /// Record one frame. Returns a summary each time a full window has elapsed.
    fn record(&mut self, frame: Duration) -> Option<FrameSummary> {
        let ms = frame.as_secs_f32() * 1000.0;
        self.elapsed += frame;
        self.frames += 1;
        self.sum_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);

        if self.elapsed < self.window {
            return None;
        }

        let summary = FrameSummary {
            fps: self.frames,
            avg_ms: self.sum_ms / self.frames as f32,
            min_ms: self.min_ms,
            max_ms: self.max_ms,
        };
        *self = Self { window: self.window, ..Self::new() };
        Some(summary)
    }
}

// ============================================================================
// PIPELINES
// ============================================================================

struct LayerPipelines {
    backdrop: wgpu::RenderPipeline,
    opaque: wgpu::RenderPipeline,
    translucent: wgpu::RenderPipeline,
}

impl LayerPipelines {
    fn get(&self, layer: DrawLayer) -> &wgpu::RenderPipeline {
        match layer {
            DrawLayer::Backdrop => &self.backdrop,
            DrawLayer::Opaque => &self.opaque,
            DrawLayer::Translucent => &self.translucent,
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    layer: DrawLayer,
) -> wgpu::RenderPipeline {
    let (label, blend, depth_write_enabled, depth_compare) = match layer {
        DrawLayer::Backdrop => ("Backdrop Pipeline", wgpu::BlendState::REPLACE, false, wgpu::CompareFunction::Always),
        DrawLayer::Opaque => ("Opaque Pipeline", wgpu::BlendState::REPLACE, true, wgpu::CompareFunction::Less),
        DrawLayer::Translucent => ("Translucent Pipeline", wgpu::BlendState::ALPHA_BLENDING, false, wgpu::CompareFunction::Less),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[GpuVertex::desc(), InstanceData::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ============================================================================
// SCENE SETUP
// ============================================================================

fn build_world() -> World {
    let mut world = World::new();
    world.insert_resource(FlightController::default());
    world.insert_resource(SceneSettings::default());
    world.insert_resource(SimulationTicks::default());

    let tulip = engine::scene::spawn_tulip(&mut world);
    let bee = engine::scene::spawn_bee(&mut world);
    log::info!("spawned {} voxels (tulip {}, bee {})", tulip + bee, tulip, bee);

    world
}

fn asset_dir() -> PathBuf {
    std::env::var_os(ASSET_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"))
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    pipelines: LayerPipelines,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    atlas: TextureAtlas,
    _textures: GpuTextureArray,

    // ECS World + per-frame simulation
    world: World,
    schedule: Schedule,
    ticker: FixedTicker,
    last_update: Instant,

    camera: OrbitCamera,
    input: InputState,

    overlay: DebugOverlay,
    frame_timer: FrameTimer,
    last_summary: FrameSummary,
    draw_calls: u32,
    voxel_count: usize,
}

impl State {
    async fn new(window: Arc<Window>, asset_dir: &std::path::Path) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("no GPU adapter compatible with the window surface"))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("window surface reports no supported formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Voxel Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_voxel.wgsl").into()),
        });

        let atlas = TextureAtlas::load(asset_dir);
        let textures = atlas.upload(&device, &queue);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("scene_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&textures.sampler),
                },
            ],
            label: Some("scene_bind_group"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Voxel Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = LayerPipelines {
            backdrop: create_pipeline(&device, &pipeline_layout, &shader, config.format, DrawLayer::Backdrop),
            opaque: create_pipeline(&device, &pipeline_layout, &shader, config.format, DrawLayer::Opaque),
            translucent: create_pipeline(&device, &pipeline_layout, &shader, config.format, DrawLayer::Translucent),
        };

        let cube = unit_cube();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: cube.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: cube.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_buffer = create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);
        let depth_view = create_depth_view(&device, &config);
        let overlay = DebugOverlay::new(&window, &device, config.format);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            pipelines,
            vertex_buffer,
            index_buffer,
            num_indices: cube.index_count() as u32,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            uniform_buffer,
            bind_group,
            depth_view,
            atlas,
            _textures: textures,
            world: build_world(),
            schedule: engine::systems::simulation_schedule(),
            ticker: FixedTicker::new(),
            last_update: Instant::now(),
            camera: OrbitCamera::new(),
            input: InputState::new(),
            overlay,
            frame_timer: FrameTimer::new(),
            last_summary: FrameSummary::default(),
            draw_calls: 0,
            voxel_count: 0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    /// Returns false when the app should exit.
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Escape => return false,
            KeyCode::F3 => self.overlay.toggle(),
            KeyCode::KeyB => {
                let mut settings = self.world.resource_mut::<SceneSettings>();
                settings.show_bee = !settings.show_bee;
                log::info!("bee {}", if settings.show_bee { "shown" } else { "hidden" });
            }
            _ => {}
        }
        true
    }

    fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now - self.last_update;
        self.last_update = now;

        self.camera.update(&self.input);
        self.input.end_frame();

        let ticks = self.ticker.accumulate(elapsed);
        self.world.resource_mut::<SimulationTicks>().0 = ticks;
        self.schedule.run(&mut self.world);

        if let Some(summary) = self.frame_timer.record(elapsed) {
            let flight = self.world.resource::<FlightController>();
            log::info!(
                "FPS: {} | Voxels: {} | Draw calls: {} | Bee: {} at {:.1}°",
                summary.fps,
                self.voxel_count,
                self.draw_calls,
                flight.phase().label(),
                flight.angle(),
            );
            self.last_summary = summary;
        }
    }

    fn debug_stats(&self) -> DebugStats {
        let settings = self.world.resource::<SceneSettings>();
        let flight = self.world.resource::<FlightController>();
        DebugStats {
            fps: self.last_summary.fps,
            frame_time_avg_ms: self.last_summary.avg_ms,
            frame_time_min_ms: self.last_summary.min_ms,
            frame_time_max_ms: self.last_summary.max_ms,
            voxel_count: self.voxel_count,
            draw_calls: self.draw_calls,
            resolution: (self.size.width, self.size.height),
            camera_rotation: (self.camera.rot_x(), self.camera.rot_y),
            camera_zoom: self.camera.zoom(),
            bee: BeeStats::from_controller(flight, settings.show_bee),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data from ECS BEFORE creating render pass
        let (instances, batches) = collect_instances(&mut self.world, &self.atlas);
        self.voxel_count = instances.len();

        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
        }
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let aspect = self.config.width as f32 / self.config.height as f32;
        let uniforms = Uniforms {
            view_proj: self.camera.view_projection(aspect).to_cols_array_2d(),
            light_position: LIGHT_POSITION,
            light_ambient: LIGHT_AMBIENT,
        };
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            // One draw call per draw layer
            for (layer, range) in &batches {
                render_pass.set_pipeline(self.pipelines.get(*layer));
                render_pass.draw_indexed(0..self.num_indices, 0, range.clone());
            }
        }
        self.draw_calls = batches.len() as u32;

        let stats = self.overlay.visible.then(|| self.debug_stats());
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats.as_ref(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("Tulip & Bee")
        .with_inner_size(winit::dpi::LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), &asset_dir()))?;
    log::info!("drag with the left mouse button to orbit, scroll to zoom, F3 stats, B toggles the bee");

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.overlay.handle_window_event(&window, event);
                state.input.process_event(event);

                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(key),
                                repeat: false,
                                ..
                            },
                        ..
                    } => {
                        if !state.handle_key(*key) {
                            control_flow.exit();
                        }
                    }
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GPU out of memory, exiting");
                                control_flow.exit();
                            }
                            Err(e) => log::error!("surface error: {:?}", e),
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_atlas() -> TextureAtlas {
        TextureAtlas::from_images(std::iter::empty())
    }

    #[test]
    fn instances_are_batched_by_layer() {
        let mut world = build_world();
        let (instances, batches) = collect_instances(&mut world, &empty_atlas());

        assert_eq!(instances.len(), 28);
        assert_eq!(
            batches,
            vec![
                (DrawLayer::Backdrop, 0..1),
                (DrawLayer::Opaque, 1..26),
                (DrawLayer::Translucent, 26..28),
            ]
        );
    }

    #[test]
    fn hidden_bee_is_not_drawn() {
        let mut world = build_world();
        world.resource_mut::<SceneSettings>().show_bee = false;
        let (instances, batches) = collect_instances(&mut world, &empty_atlas());

        assert_eq!(instances.len(), 23);
        assert_eq!(batches.last().map(|(layer, _)| *layer), Some(DrawLayer::Opaque));
    }

    #[test]
    fn untextured_instances_use_tint() {
        let mut world = build_world();
        let (instances, _) = collect_instances(&mut world, &empty_atlas());
        assert!(instances.iter().all(|i| i.layers == [-1, -1]));
    }

    #[test]
    fn instance_layout_matches_shader_stride() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 96);
        assert_eq!(std::mem::size_of::<Uniforms>(), 96);
    }

    #[test]
    fn frame_timer_reports_once_per_second() {
        let mut timer = FrameTimer::new();
        for _ in 0..49 {
            assert_eq!(timer.record(Duration::from_millis(20)), None);
        }
        let summary = timer.record(Duration::from_millis(20)).unwrap();
        assert_eq!(summary.fps, 50);
        assert!((summary.avg_ms - 20.0).abs() < 1e-3);
        assert!((summary.min_ms - 20.0).abs() < 1e-3);
        assert!((summary.max_ms - 20.0).abs() < 1e-3);

        assert_eq!(timer.record(Duration::from_millis(20)), None);
    }
}

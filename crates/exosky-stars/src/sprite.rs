//! Star sprite pipeline: every star is one instanced, camera-facing quad sized
//! in screen pixels, masked to a disc and tinted by the shared glow texture.
//!
//! Stars are blended additively with no depth test, so overlapping glows add
//! up and draw order does not matter.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};
use wgpu::util::DeviceExt;

use crate::buffers::RenderBuffers;
use crate::color::DeviceRgb;
use crate::texture::StarTexture;

/// Color written over a hovered star, in device range.
pub const HIGHLIGHT_COLOR: DeviceRgb = DeviceRgb([140.0, 220.0, 255.0]);

/// Per-frame sprite uniforms. Layout matches `SceneUniforms` in the shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// Render target size in physical pixels.
    pub viewport: [f32; 2],
    /// Multiplier from star size to the shader's point scale.
    pub size_scale: f32,
    pub min_point_px: f32,
    pub fog_color: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
    pub max_point_px: f32,
    pub _padding: [f32; 2],
}

/// Sprite sizing and fog parameters that change rarely.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteSettings {
    pub size_scale: f32,
    pub min_point_px: f32,
    pub max_point_px: f32,
    pub fog_color: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            size_scale: 1000.0,
            min_point_px: 1.5,
            max_point_px: 48.0,
            fog_color: [0.0; 3],
            fog_near: 20_000.0,
            fog_far: 600_000.0,
        }
    }
}

impl SceneUniforms {
    pub fn new(view: Mat4, proj: Mat4, viewport: Vec2, settings: &SpriteSettings) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            viewport: [viewport.x.max(1.0), viewport.y.max(1.0)],
            size_scale: settings.size_scale,
            min_point_px: settings.min_point_px,
            fog_color: settings.fog_color,
            fog_near: settings.fog_near,
            // Keep the fog ramp well-defined when near == far.
            fog_far: settings.fog_far.max(settings.fog_near + 1e-3),
            max_point_px: settings.max_point_px.max(settings.min_point_px),
            _padding: [0.0; 2],
        }
    }
}

/// WGSL source for the star sprite pipeline.
pub const STAR_SHADER_SOURCE: &str = r#"
struct SceneUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    viewport: vec2<f32>,
    size_scale: f32,
    min_point_px: f32,
    fog_color: vec3<f32>,
    fog_near: f32,
    fog_far: f32,
    max_point_px: f32,
    _padding: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
    @location(2) fog: f32,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

@group(1) @binding(0)
var glow_texture: texture_2d<f32>;
@group(1) @binding(1)
var glow_sampler: sampler;

@vertex
fn vs_star(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) scale: f32,
) -> VertexOutput {
    var out: VertexOutput;
    let corner = vec2<f32>(
        f32(vertex_index & 1u) * 2.0 - 1.0,
        f32((vertex_index >> 1u) & 1u) * 2.0 - 1.0,
    );
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    out.color = color;

    let view_pos = scene.view * vec4<f32>(position, 1.0);
    if (view_pos.z >= 0.0) {
        // Behind the camera: emit a degenerate quad outside the clip volume.
        out.clip_position = vec4<f32>(2.0, 2.0, 2.0, 1.0);
        out.fog = 1.0;
        return out;
    }

    let depth = -view_pos.z;
    let point_size = clamp(
        scale * scene.size_scale * (300.0 / depth),
        scene.min_point_px,
        scene.max_point_px,
    );

    let clip = scene.proj * view_pos;
    let offset = corner * point_size / scene.viewport * clip.w;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.zw);
    out.fog = clamp((depth - scene.fog_near) / (scene.fog_far - scene.fog_near), 0.0, 1.0);
    return out;
}

@fragment
fn fs_star(in: VertexOutput) -> @location(0) vec4<f32> {
    let glow = textureSample(glow_texture, glow_sampler, in.uv);
    if (length(in.uv - vec2<f32>(0.5, 0.5)) > 0.475) {
        discard;
    }
    let lit = vec4<f32>(in.color / 255.0, 1.0) * glow;
    let rgb = mix(lit.rgb, scene.fog_color * glow.a, in.fog);
    return vec4<f32>(rgb, lit.a);
}
"#;

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }],
};

const COLOR_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 1,
    }],
};

const SIZE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 4,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32,
        offset: 0,
        shader_location: 2,
    }],
};

/// One uploaded star cloud: three instance buffers mirroring [`RenderBuffers`].
pub struct StarCloud {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    sizes: wgpu::Buffer,
    source: Arc<RenderBuffers>,
    highlighted: Option<usize>,
}

impl StarCloud {
    /// Upload `buffers`. Returns `None` for an empty cloud, which has nothing
    /// to draw.
    pub fn new(device: &wgpu::Device, label: &str, buffers: Arc<RenderBuffers>) -> Option<Self> {
        if buffers.is_empty() {
            return None;
        }
        let create = |suffix: &str, data: &[f32]| {
            let name = format!("{label}-{suffix}");
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(name.as_str()),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            })
        };
        Some(Self {
            positions: create("positions", &buffers.positions),
            colors: create("colors", &buffers.colors),
            sizes: create("sizes", &buffers.sizes),
            source: buffers,
            highlighted: None,
        })
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The CPU-side buffers this cloud was uploaded from.
    pub fn source(&self) -> &Arc<RenderBuffers> {
        &self.source
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Recolor the star at `index` with [`HIGHLIGHT_COLOR`], restoring the
    /// previously highlighted one. Out-of-range indices clear the highlight.
    pub fn highlight(&mut self, queue: &wgpu::Queue, index: Option<usize>) {
        let index = index.filter(|&i| i < self.len());
        if index == self.highlighted {
            return;
        }
        if let Some(previous) = self.highlighted
            && let Some(original) = self.source.color(previous)
        {
            self.write_color(queue, previous, original);
        }
        if let Some(current) = index {
            self.write_color(queue, current, HIGHLIGHT_COLOR);
        }
        self.highlighted = index;
    }

    fn write_color(&self, queue: &wgpu::Queue, index: usize, color: DeviceRgb) {
        let offset = (index * 3 * std::mem::size_of::<f32>()) as wgpu::BufferAddress;
        queue.write_buffer(&self.colors, offset, bytemuck::cast_slice(&color.0));
    }
}

/// Pipeline and shared resources for drawing [`StarCloud`]s.
pub struct StarRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    glow_bind_group: wgpu::BindGroup,
}

impl StarRenderer {
    /// Build the pipeline for `target_format` and upload `glow` once.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        glow: &StarTexture,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star-shader"),
            source: wgpu::ShaderSource::Wgsl(STAR_SHADER_SOURCE.into()),
        });

        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("star-scene-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<SceneUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let glow_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("star-glow-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("star-pipeline-layout"),
            bind_group_layouts: &[&scene_bgl, &glow_bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_star"),
                buffers: &[POSITION_LAYOUT, COLOR_LAYOUT, SIZE_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_star"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent::OVER,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let uniforms = SceneUniforms::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Vec2::ONE,
            &SpriteSettings::default(),
        );
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("star-scene-uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("star-scene-bg"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let (glow_view, glow_sampler) = upload_glow(device, queue, glow);
        let glow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("star-glow-bg"),
            layout: &glow_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&glow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&glow_sampler),
                },
            ],
        });

        log::info!("Star sprite renderer initialized ({target_format:?})");

        Self {
            pipeline,
            uniform_buffer,
            scene_bind_group,
            glow_bind_group,
        }
    }

    /// Upload this frame's camera, viewport and fog.
    pub fn update(&self, queue: &wgpu::Queue, uniforms: &SceneUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Draw `cloud` as one instanced strip of four vertices per star.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, cloud: &'a StarCloud) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        pass.set_bind_group(1, &self.glow_bind_group, &[]);
        pass.set_vertex_buffer(0, cloud.positions.slice(..));
        pass.set_vertex_buffer(1, cloud.colors.slice(..));
        pass.set_vertex_buffer(2, cloud.sizes.slice(..));
        pass.draw(0..4, 0..cloud.len() as u32);
    }
}

fn upload_glow(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    glow: &StarTexture,
) -> (wgpu::TextureView, wgpu::Sampler) {
    let size = wgpu::Extent3d {
        width: glow.size(),
        height: glow.size(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("star-glow-texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        glow.as_bytes(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(glow.size() * 4),
            rows_per_image: None,
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("star-glow-sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    });
    (view, sampler)
}

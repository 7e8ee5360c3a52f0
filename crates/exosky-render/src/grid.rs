//! Ground reference grid drawn as a line list on a horizontal plane.

use bytemuck::{Pod, Zeroable};
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

/// Grid vertex: position and RGBA color.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl GridVertex {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GridVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 12,
                shader_location: 1,
            },
        ],
    };
}

/// Shape and placement of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    /// Half the side length of the square grid.
    pub half_extent: f32,
    /// Number of cells along each side.
    pub divisions: u32,
    /// Height of the grid plane.
    pub y: f32,
    pub line_color: [f32; 4],
    pub axis_color: [f32; 4],
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            half_extent: 1000.0,
            divisions: 2000,
            y: -1.0,
            line_color: [0.27, 0.27, 0.27, 0.6],
            axis_color: [0.53, 0.53, 0.53, 0.8],
        }
    }
}

impl GridSpec {
    /// Line-list vertices: `divisions + 1` lines along each axis, with the
    /// two center lines in the axis color.
    pub fn vertices(&self) -> Vec<GridVertex> {
        let divisions = self.divisions.max(1);
        let step = self.half_extent * 2.0 / divisions as f32;
        let center = divisions / 2;
        let mut out = Vec::with_capacity((divisions as usize + 1) * 4);

        for i in 0..=divisions {
            let offset = -self.half_extent + i as f32 * step;
            let color = if divisions % 2 == 0 && i == center {
                self.axis_color
            } else {
                self.line_color
            };
            let e = self.half_extent;
            out.push(GridVertex { position: [-e, self.y, offset], color });
            out.push(GridVertex { position: [e, self.y, offset], color });
            out.push(GridVertex { position: [offset, self.y, -e], color });
            out.push(GridVertex { position: [offset, self.y, e], color });
        }
        out
    }
}

/// WGSL source for the grid lines.
pub const GRID_SHADER_SOURCE: &str = r#"
@group(0) @binding(0)
var<uniform> view_proj: mat4x4<f32>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_grid(@location(0) position: vec3<f32>, @location(1) color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = view_proj * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_grid(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Draws a [`GridSpec`]; rebuilds its vertex buffer when the spec changes.
pub struct GridRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    spec: GridSpec,
}

impl GridRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, spec: GridSpec) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid-shader"),
            source: wgpu::ShaderSource::Wgsl(GRID_SHADER_SOURCE.into()),
        });

        let camera_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grid-camera-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid-pipeline-layout"),
            bind_group_layouts: &[&camera_bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_grid"),
                buffers: &[GridVertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_grid"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid-camera"),
            contents: bytemuck::cast_slice(&glam::Mat4::IDENTITY.to_cols_array()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grid-camera-bg"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let (vertex_buffer, vertex_count) = upload_vertices(device, &spec);

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            vertex_buffer,
            vertex_count,
            spec,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Replace the grid geometry if `spec` differs from the current one.
    pub fn set_spec(&mut self, device: &wgpu::Device, spec: GridSpec) {
        if spec == self.spec {
            return;
        }
        let (buffer, count) = upload_vertices(device, &spec);
        self.vertex_buffer = buffer;
        self.vertex_count = count;
        self.spec = spec;
        log::debug!("Grid rebuilt at y = {} ({} lines)", spec.y, count / 2);
    }

    pub fn update(&self, queue: &wgpu::Queue, view_proj: glam::Mat4) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&view_proj.to_cols_array()),
        );
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}

fn upload_vertices(device: &wgpu::Device, spec: &GridSpec) -> (wgpu::Buffer, u32) {
    let vertices = spec.vertices();
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("grid-vertices"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    (buffer, vertices.len() as u32)
}

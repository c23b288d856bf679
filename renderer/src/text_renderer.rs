use tracing::instrument;
use wgpu::util::DeviceExt;

use crate::{
    BakedFont, Color,
    color_model::ColorModelTable,
    pods::{AsBytes, Matrix3, TextUniforms, ToPod, Vertex},
};

/// `color * mask + destination * (1 - mask)`, the mask being the fragment output.
const SUBPIXEL_BLEND_COMPONENT: wgpu::BlendComponent = wgpu::BlendComponent {
    src_factor: wgpu::BlendFactor::Constant,
    dst_factor: wgpu::BlendFactor::OneMinusSrc,
    operation: wgpu::BlendOperation::Add,
};

const SUBPIXEL_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: SUBPIXEL_BLEND_COMPONENT,
    alpha: SUBPIXEL_BLEND_COMPONENT,
};

const UNIFORMS_BINDING: u32 = 0;
const ATLAS_BINDING: u32 = 1;
const SAMPLER_BINDING: u32 = 2;

/// The context a string is drawn in.
pub struct DrawContext<'a> {
    pub device: &'a wgpu::Device,
    pub pass: wgpu::RenderPass<'a>,
    /// Size of the render target in pixels.
    pub target_size: (u32, u32),
}

/// The GPU resources of one `draw_string` invocation.
#[derive(Debug)]
pub struct TextBatch {
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    blend_color: Color,
}

#[derive(Debug)]
pub struct TextRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl TextRenderer {
    /// Creates the pipeline for render targets of `target_format`.
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("shader/subpixel_text.wgsl"));
        let bind_group_layout = create_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Subpixel Text Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Subpixel Text Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(SUBPIXEL_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            // The two triangles of a glyph quad have opposite windings.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler: create_atlas_sampler(device),
        }
    }

    /// Draws `text` with its first pen position at `(x, y)` in target pixels.
    #[instrument(skip(self, context, font))]
    pub fn draw_string(
        &self,
        context: &mut DrawContext,
        font: &BakedFont,
        text: &str,
        x: f32,
        y: f32,
        color: Color,
    ) {
        let target_size = context.target_size;
        let Some(batch) = self.prepare(context.device, font, text, (x, y), color, target_size) else {
            return;
        };
        self.render(&mut context.pass, &batch);
    }

    /// Builds the vertex buffer and the bindings for `text`.
    ///
    /// Returns `None` for an empty batch.
    pub fn prepare(
        &self,
        device: &wgpu::Device,
        font: &BakedFont,
        text: &str,
        (x, y): (f32, f32),
        color: Color,
        (target_width, target_height): (u32, u32),
    ) -> Option<TextBatch> {
        let vertices = font.batch(text, x, y);
        if vertices.is_empty() {
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Subpixel Text Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniforms = TextUniforms {
            pixel_to_normal: Matrix3::pixel_to_normal(target_width, target_height),
            table: ColorModelTable::for_color(color).to_pod(),
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Subpixel Text Uniform Buffer"),
            contents: uniforms.as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Subpixel Text Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: UNIFORMS_BINDING,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: ATLAS_BINDING,
                    resource: wgpu::BindingResource::TextureView(font.view()),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        Some(TextBatch {
            bind_group,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            blend_color: color,
        })
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass, batch: &TextBatch) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &batch.bind_group, &[]);
        pass.set_vertex_buffer(0, batch.vertex_buffer.slice(..));
        pass.set_blend_constant(batch.blend_color.into());
        pass.draw(0..batch.vertex_count, 0..1);
    }
}

fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entry = |binding: u32, ty: wgpu::BindingType| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty,
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Subpixel Text Bind Group Layout"),
        entries: &[
            entry(
                UNIFORMS_BINDING,
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(TextUniforms::size()),
                },
            ),
            entry(
                ATLAS_BINDING,
                wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2Array,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
            ),
            entry(
                SAMPLER_BINDING,
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            ),
        ],
    })
}

/// Atlas texels map 1:1 to target pixels, coverage samples must not be interpolated.
fn create_atlas_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Glyph Atlas Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

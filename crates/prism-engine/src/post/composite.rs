use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::depth::{ClipPlanes, ClipPlanesUniform};
use super::target::RenderTarget;

const PASSTHROUGH_WGSL: &str = concat!(
    include_str!("shaders/fullscreen.wgsl"),
    include_str!("shaders/passthrough.wgsl"),
);

const LINEAR_DEPTH_WGSL: &str = concat!(
    include_str!("shaders/fullscreen.wgsl"),
    include_str!("shaders/linear_depth.wgsl"),
);

/// What the composite stage reads from the pass's private target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum CompositeSource {
    /// Color attachment, point-sampled, alpha forced to 1.
    Color,
    /// Depth attachment, remapped to linear grayscale.
    LinearDepth(ClipPlanes),
}

impl CompositeSource {
    fn label(self) -> &'static str {
        match self {
            Self::Color => "prism composite color",
            Self::LinearDepth(_) => "prism composite linear depth",
        }
    }

    fn shader_source(self) -> &'static str {
        match self {
            Self::Color => PASSTHROUGH_WGSL,
            Self::LinearDepth(_) => LINEAR_DEPTH_WGSL,
        }
    }

    fn layout_entries(self) -> [wgpu::BindGroupLayoutEntry; 2] {
        match self {
            Self::Color => [
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
            Self::LinearDepth(_) => [
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ClipPlanesUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        }
    }
}

/// Where a composite draw lands and whether it clears first.
pub(crate) struct CompositeOutput<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub clear: bool,
}

/// Fullscreen draw that turns a pass's private target into its output image.
///
/// Pipelines are built lazily per output format; the bind group is rebuilt
/// whenever the input target reallocates.
pub(crate) struct Composite {
    source: CompositeSource,
    shader: wgpu::ShaderModule,
    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    uniforms: Option<wgpu::Buffer>,
    bind_group: Option<(u32, wgpu::BindGroup)>,
}

impl Composite {
    pub fn new(device: &wgpu::Device, source: CompositeSource) -> Self {
        let label = source.label();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.shader_source().into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &source.layout_entries(),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let uniforms = match source {
            CompositeSource::Color => None,
            CompositeSource::LinearDepth(planes) => Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("prism clip planes ubo"),
                    contents: bytemuck::bytes_of(&ClipPlanesUniform::from(planes)),
                    usage: wgpu::BufferUsages::UNIFORM,
                },
            )),
        };

        Self {
            source,
            shader,
            layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            uniforms,
            bind_group: None,
        }
    }

    /// Records the fullscreen draw reading `input` into `output`.
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        input: &RenderTarget,
        output: CompositeOutput<'_>,
    ) {
        self.ensure_pipeline(device, output.format);
        self.ensure_bind_group(device, input);

        let Some(pipeline) = self.pipelines.get(&output.format) else { return };
        let Some((_, bind_group)) = self.bind_group.as_ref() else { return };

        let load = if output.clear {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.source.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipelines.contains_key(&format) {
            return;
        }

        log::debug!("building {} pipeline for {format:?}", self.source.label());

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.source.label()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert(format, pipeline);
    }

    fn ensure_bind_group(&mut self, device: &wgpu::Device, input: &RenderTarget) {
        if matches!(&self.bind_group, Some((allocations, _)) if *allocations == input.allocations()) {
            return;
        }

        let entries = match (self.source, input.depth_view(), self.uniforms.as_ref()) {
            (CompositeSource::Color, _, _) => [
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(input.sampler()),
                },
            ],
            (CompositeSource::LinearDepth(_), Some(depth), Some(ubo)) => [
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(depth),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ubo.as_entire_binding(),
                },
            ],
            (CompositeSource::LinearDepth(_), _, _) => {
                log::error!("linear depth composite needs a target with a depth attachment");
                return;
            }
        };

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.source.label()),
            layout: &self.layout,
            entries: &entries,
        });

        self.bind_group = Some((input.allocations(), bind_group));
    }

    pub fn dispose(self) {
        if let Some(ubo) = self.uniforms {
            ubo.destroy();
        }
    }
}

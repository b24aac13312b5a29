use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::post::{depth_stencil_state, RenderTarget};
use crate::render::RenderCtx;

use super::geometry::Vertex;
use super::{Mesh, PerspectiveCamera, Scene};

type PipelineKey = (wgpu::TextureFormat, Option<wgpu::TextureFormat>);

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MeshUniform {
    mvp: [[f32; 4]; 4],
    color: [f32; 4],
}

struct GpuMesh {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    index_count: u32,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws a [`Scene`] into a [`RenderTarget`].
///
/// Pipelines are cached per (color, depth) format pair so targets of
/// different shapes can share one renderer. Mesh buffers are uploaded once;
/// geometry is treated as immutable after it is added to the scene.
#[derive(Default)]
pub struct SceneRenderer {
    shader: Option<wgpu::ShaderModule>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    meshes: Vec<GpuMesh>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears `target` to the scene background and draws every mesh.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        camera: &PerspectiveCamera,
        target: &RenderTarget,
    ) {
        let spec = target.spec();
        let key = (spec.format, target.has_depth().then_some(crate::post::DEPTH_FORMAT));

        self.ensure_layouts(ctx.device);
        self.ensure_pipeline(ctx.device, key, target);
        self.ensure_meshes(ctx.device, scene.meshes());

        let view_proj = camera.view_projection();
        for (gpu, mesh) in self.meshes.iter().zip(scene.meshes()) {
            let uniform = MeshUniform {
                mvp: (view_proj * mesh.transform).to_cols_array_2d(),
                color: mesh.color.to_array(),
            };
            ctx.queue.write_buffer(&gpu.ubo, 0, bytemuck::bytes_of(&uniform));
        }

        let Some(pipeline) = self.pipelines.get(&key) else { return };

        let depth_stencil_attachment =
            target
                .depth_view()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        for gpu in &self.meshes {
            rpass.set_bind_group(0, &gpu.bind_group, &[]);
            rpass.set_vertex_buffer(0, gpu.vbo.slice(..));
            rpass.set_index_buffer(gpu.ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..gpu.index_count, 0, 0..1);
        }
    }

    fn ensure_layouts(&mut self, device: &wgpu::Device) {
        if self.pipeline_layout.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism mesh bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<MeshUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism mesh pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        self.shader = Some(shader);
        self.bind_group_layout = Some(bind_group_layout);
        self.pipeline_layout = Some(pipeline_layout);
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, key: PipelineKey, target: &RenderTarget) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let (Some(shader), Some(layout)) = (self.shader.as_ref(), self.pipeline_layout.as_ref())
        else {
            return;
        };

        log::debug!("building mesh pipeline for {:?} / {:?}", key.0, key.1);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("prism mesh pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.0,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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
            depth_stencil: depth_stencil_state(&target.spec()),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert(key, pipeline);
    }

    fn ensure_meshes(&mut self, device: &wgpu::Device, meshes: &[Mesh]) {
        if self.meshes.len() >= meshes.len() {
            self.meshes.truncate(meshes.len());
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        for mesh in &meshes[self.meshes.len()..] {
            let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism mesh vbo"),
                contents: bytemuck::cast_slice(&mesh.geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism mesh ibo"),
                contents: bytemuck::cast_slice(&mesh.geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let ubo = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("prism mesh ubo"),
                size: std::mem::size_of::<MeshUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("prism mesh bind group"),
                layout: bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            });

            self.meshes.push(GpuMesh {
                vbo,
                ibo,
                index_count: mesh.geometry.indices.len() as u32,
                ubo,
                bind_group,
            });
        }

        log::debug!("scene renderer holds {} meshes", self.meshes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_uniform_is_std140_sized() {
        assert_eq!(std::mem::size_of::<MeshUniform>(), 80);
    }
}

//! The fixed mesh pipeline and the per-frame draw loop.
//!
//! One pipeline renders everything: opaque, lit, textured triangles with
//! depth testing. Per-draw shader data flows through the uniform ring —
//! for every entity the renderer pushes an [`ObjectUniforms`] block for
//! the vertex stage and a [`SceneUniforms`] block for the fragment stage,
//! then binds both at their dynamic offsets before the indexed draw.
//!
//! The two uniform structs here are byte-for-byte contracts with
//! `shaders/mesh.wgsl`; the layout tests at the bottom pin them down.

use std::sync::Arc;

use bytemuck::Zeroable;
use log::info;

use crate::error::Error;
use crate::gpu::GpuContext;
use crate::light::{Light, MAX_LIGHTS};
use crate::mesh::Vertex3d;
use crate::ring::{RING_GRANULARITY, UniformRing};
use crate::scene::Scene;
use crate::texture::Texture;

/// Vertex-stage uniforms, one block per draw.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub world: [[f32; 4]; 4],
    pub world_inverse_transpose: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

/// Fragment-stage uniforms, one block per draw.
///
/// Mostly material and lighting state; `lights` is always the full array,
/// with `light_count` saying how many entries are live.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub tint: [f32; 4],
    pub uv_scale: [f32; 2],
    pub uv_offset: [f32; 2],
    pub camera_position: [f32; 3],
    pub time: f32,
    pub ambient: [f32; 3],
    pub roughness: f32,
    pub light_count: u32,
    pub _padding: [u32; 3],
    pub lights: [Light; MAX_LIGHTS],
}

const OBJECT_UNIFORMS_SIZE: u64 = std::mem::size_of::<ObjectUniforms>() as u64;
const SCENE_UNIFORMS_SIZE: u64 = std::mem::size_of::<SceneUniforms>() as u64;

fn ring_slot(size: u64) -> u64 {
    size.div_ceil(RING_GRANULARITY) * RING_GRANULARITY
}

/// Renders a [`Scene`] through the one fixed pipeline.
pub struct Renderer {
    pipeline: Arc<wgpu::RenderPipeline>,
    material_layout: wgpu::BindGroupLayout,
    object_bind_group: wgpu::BindGroup,
    scene_bind_group: wgpu::BindGroup,
    ring: UniformRing,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    default_texture: Texture,
    draw_count: u32,
}

impl Renderer {
    /// Creates the pipeline, bind group layouts, depth buffer, and the
    /// uniform ring.
    ///
    /// `entity_budget` declares the most entities one frame will draw; the
    /// ring is sized to hold two such frames, and construction fails with
    /// [`Error::RingCapacity`] if that cannot be satisfied.
    pub fn new(gpu: &GpuContext, entity_budget: u32) -> Result<Self, Error> {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        // Every draw binds the same two ring slices at fresh dynamic
        // offsets, so the buffer bind groups are created once up front.
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(OBJECT_UNIFORMS_SIZE),
                },
                count: None,
            }],
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(SCENE_UNIFORMS_SIZE),
                },
                count: None,
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
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
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&object_layout, &scene_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Two ring slots per entity: one vertex block, one fragment block.
        let frame_bytes =
            entity_budget as u64 * (ring_slot(OBJECT_UNIFORMS_SIZE) + ring_slot(SCENE_UNIFORMS_SIZE));
        let ring = UniformRing::new(gpu, frame_bytes * 2, frame_bytes)?;
        info!(
            "uniform ring: {} KiB for an entity budget of {}",
            ring.capacity() / 1024,
            entity_budget
        );

        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Uniforms Bind Group"),
            layout: &object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: ring.buffer(),
                    offset: 0,
                    size: wgpu::BufferSize::new(OBJECT_UNIFORMS_SIZE),
                }),
            }],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Uniforms Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: ring.buffer(),
                    offset: 0,
                    size: wgpu::BufferSize::new(SCENE_UNIFORMS_SIZE),
                }),
            }],
        });

        let default_texture = Texture::solid(gpu, [255, 255, 255, 255], "Default White Texture");

        let (depth_texture, depth_view) = Self::create_depth_texture(gpu);

        Ok(Self {
            pipeline: Arc::new(pipeline),
            material_layout,
            object_bind_group,
            scene_bind_group,
            ring,
            depth_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            default_texture,
            draw_count: 0,
        })
    }

    /// The shared pipeline handle new materials are created with.
    pub fn pipeline(&self) -> Arc<wgpu::RenderPipeline> {
        Arc::clone(&self.pipeline)
    }

    /// Current ring write offset, shown by the debug overlay.
    pub fn ring_offset(&self) -> u64 {
        self.ring.offset()
    }

    pub fn ring_capacity(&self) -> u64 {
        self.ring.capacity()
    }

    /// Number of draws issued by the last [`render`](Self::render) call.
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    fn create_depth_texture(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            let (texture, view) = Self::create_depth_texture(gpu);
            self.depth_texture = texture;
            self.depth_view = view;
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Clears the target and draws every entity in the scene.
    ///
    /// Needs `&mut Scene` because reading world matrices and material bind
    /// groups refreshes their lazy caches.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &mut Scene,
        time: f32,
    ) {
        self.ensure_depth_size(gpu);
        self.draw_count = 0;

        let bg = scene.background_color;
        let camera_state = scene.active_camera_mut().map(|camera| {
            (
                camera.view_matrix(),
                camera.projection_matrix(),
                camera.transform.translation(),
            )
        });

        // Lights go into every scene block as the full fixed-size array.
        let mut lights = [Light::zeroed(); MAX_LIGHTS];
        let light_count = scene.lights().len().min(MAX_LIGHTS);
        lights[..light_count].copy_from_slice(&scene.lights()[..light_count]);
        let ambient = scene.ambient_color.to_array();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: bg.r as f64,
                        g: bg.g as f64,
                        b: bg.b as f64,
                        a: bg.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some((view, projection, camera_position)) = camera_state else {
            return;
        };

        pass.set_pipeline(&self.pipeline);

        for i in 0..scene.entities().len() {
            let (mesh_id, material_id) = {
                let entity = &scene.entities()[i];
                (entity.mesh, entity.material)
            };

            let (world, world_inverse_transpose) = {
                let transform = &mut scene.entities_mut()[i].transform;
                (transform.world_matrix(), transform.world_inverse_transpose())
            };

            let object = ObjectUniforms {
                world: world.to_cols_array_2d(),
                world_inverse_transpose: world_inverse_transpose.to_cols_array_2d(),
                view: view.to_cols_array_2d(),
                projection: projection.to_cols_array_2d(),
            };
            let object_offset = self.ring.push(&gpu.queue, bytemuck::bytes_of(&object));

            let material = scene.material_mut(material_id);
            let tint = material.tint();
            let scene_block = SceneUniforms {
                tint: [tint.r, tint.g, tint.b, tint.a],
                uv_scale: material.uv_scale().to_array(),
                uv_offset: material.uv_offset().to_array(),
                camera_position: camera_position.to_array(),
                time,
                ambient,
                roughness: material.roughness(),
                light_count: light_count as u32,
                _padding: [0; 3],
                lights,
            };
            let scene_offset = self.ring.push(&gpu.queue, bytemuck::bytes_of(&scene_block));

            pass.set_bind_group(0, &self.object_bind_group, &[object_offset]);
            pass.set_bind_group(1, &self.scene_bind_group, &[scene_offset]);

            let material = scene.material_mut(material_id);
            let material_bind_group =
                material.bind_group(gpu, &self.material_layout, &self.default_texture);
            pass.set_bind_group(2, material_bind_group, &[]);

            let mesh = scene.mesh(mesh_id);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
            self.draw_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_uniforms_are_four_matrices() {
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 256);
    }

    #[test]
    fn scene_uniforms_match_the_shader_layout() {
        // These offsets mirror the SceneUniforms struct in mesh.wgsl; if
        // one moves, the other must move with it.
        assert_eq!(std::mem::offset_of!(SceneUniforms, uv_scale), 16);
        assert_eq!(std::mem::offset_of!(SceneUniforms, uv_offset), 24);
        assert_eq!(std::mem::offset_of!(SceneUniforms, camera_position), 32);
        assert_eq!(std::mem::offset_of!(SceneUniforms, time), 44);
        assert_eq!(std::mem::offset_of!(SceneUniforms, ambient), 48);
        assert_eq!(std::mem::offset_of!(SceneUniforms, roughness), 60);
        assert_eq!(std::mem::offset_of!(SceneUniforms, light_count), 64);
        assert_eq!(std::mem::offset_of!(SceneUniforms, lights), 80);
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 592);
    }

    #[test]
    fn ring_slots_cover_both_blocks() {
        assert_eq!(ring_slot(OBJECT_UNIFORMS_SIZE), 256);
        assert_eq!(ring_slot(SCENE_UNIFORMS_SIZE), 768);
    }
}

//! Surface appearance shared between entities.
//!
//! A [`Material`] bundles the per-surface shader inputs: a color tint,
//! roughness, UV tiling, and slot-indexed texture and sampler maps. It also
//! holds a shared handle to the fixed render pipeline, so materials carry
//! everything a draw needs besides the mesh itself.
//!
//! The wgpu bind group derived from the slot maps is cached and only
//! rebuilt after a texture or sampler mutation.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec2;

use crate::gpu::GpuContext;
use crate::overlay::Color;
use crate::texture::Texture;

/// Texture slot the fixed shader samples for surface color.
pub const SLOT_ALBEDO: u32 = 0;

/// Per-surface shading parameters plus the pipeline they feed.
pub struct Material {
    tint: Color,
    roughness: f32,
    uv_scale: Vec2,
    uv_offset: Vec2,
    pipeline: Arc<wgpu::RenderPipeline>,
    textures: BTreeMap<u32, Arc<Texture>>,
    samplers: BTreeMap<u32, Arc<wgpu::Sampler>>,
    // None doubles as the dirty flag: cleared on slot mutation, rebuilt on
    // the next bind_group() read.
    bind_group: Option<wgpu::BindGroup>,
}

impl Material {
    pub const DEFAULT_ROUGHNESS: f32 = 0.5;

    /// Creates a material with the given tint and default parameters.
    ///
    /// The pipeline handle is shared, not owned: any number of materials
    /// reference the one fixed pipeline.
    pub fn new(pipeline: Arc<wgpu::RenderPipeline>, tint: Color) -> Self {
        Self {
            tint,
            roughness: Self::DEFAULT_ROUGHNESS,
            uv_scale: Vec2::ONE,
            uv_offset: Vec2::ZERO,
            pipeline,
            textures: BTreeMap::new(),
            samplers: BTreeMap::new(),
            bind_group: None,
        }
    }

    pub fn tint(&self) -> Color {
        self.tint
    }

    pub fn set_tint(&mut self, tint: Color) {
        self.tint = tint;
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn set_roughness(&mut self, roughness: f32) {
        self.roughness = roughness;
    }

    pub fn uv_scale(&self) -> Vec2 {
        self.uv_scale
    }

    pub fn set_uv_scale(&mut self, uv_scale: Vec2) {
        self.uv_scale = uv_scale;
    }

    pub fn uv_offset(&self) -> Vec2 {
        self.uv_offset
    }

    pub fn set_uv_offset(&mut self, uv_offset: Vec2) {
        self.uv_offset = uv_offset;
    }

    pub fn pipeline(&self) -> &Arc<wgpu::RenderPipeline> {
        &self.pipeline
    }

    /// Assigns a texture to a shader slot, invalidating the cached bind
    /// group.
    pub fn add_texture(&mut self, slot: u32, texture: Arc<Texture>) {
        self.textures.insert(slot, texture);
        self.bind_group = None;
    }

    /// Assigns a sampler to a shader slot, invalidating the cached bind
    /// group.
    pub fn add_sampler(&mut self, slot: u32, sampler: Arc<wgpu::Sampler>) {
        self.samplers.insert(slot, sampler);
        self.bind_group = None;
    }

    pub fn texture(&self, slot: u32) -> Option<&Arc<Texture>> {
        self.textures.get(&slot)
    }

    /// The bind group for the material's textures, rebuilt only if a slot
    /// changed since the last call.
    ///
    /// `fallback` fills the albedo slot for untextured materials; an
    /// explicit sampler in the slot map wins over the texture's own.
    pub fn bind_group(
        &mut self,
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        fallback: &Texture,
    ) -> &wgpu::BindGroup {
        if self.bind_group.is_none() {
            let texture = self
                .textures
                .get(&SLOT_ALBEDO)
                .map(Arc::as_ref)
                .unwrap_or(fallback);
            let sampler = self
                .samplers
                .get(&SLOT_ALBEDO)
                .map(Arc::as_ref)
                .unwrap_or(&texture.sampler);

            self.bind_group = Some(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Material Bind Group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            }));
        }

        self.bind_group.as_ref().unwrap()
    }
}

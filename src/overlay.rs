//! Immediate-mode 2D debug overlay, drawn over the finished 3D frame.
//!
//! Rectangles and text are batched into one shared vertex buffer each frame
//! and rendered in a single pass that loads (never clears) the color
//! target. Text comes from a fontdue-rasterized glyph atlas; if no font
//! file is available the overlay degrades to rectangles only.

use std::collections::HashMap;
use std::path::Path;

use fontdue::{Font, FontSettings};
use log::warn;

use crate::error::Error;
use crate::gpu::GpuContext;

/// An RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const PANEL_BG: Color = Color::rgba(0.05, 0.05, 0.08, 0.85);
    pub const PANEL_BORDER: Color = Color::rgba(0.4, 0.4, 0.5, 0.9);
}

/// Vertex for overlay rectangles and glyph quads.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex2d {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl Vertex2d {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct OverlayUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const MAX_VERTICES: usize = 16384;

/// Placement of one pre-rasterized glyph in the atlas.
#[derive(Clone, Copy, Debug)]
struct GlyphInfo {
    /// Normalized atlas rectangle: x, y, width, height.
    uv: [f32; 4],
    width: u32,
    height: u32,
    offset_x: f32,
    offset_y: f32,
    advance: f32,
}

/// A single-channel glyph atlas for the printable ASCII range.
struct FontAtlas {
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl FontAtlas {
    fn new(gpu: &GpuContext, font_data: &[u8], size: f32) -> Result<Self, Error> {
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(|reason| {
            Error::LoadFont {
                path: "<bytes>".into(),
                reason: reason.into(),
            }
        })?;

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = (32u8..=126u8)
            .map(|c| {
                let c = c as char;
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();

        // Row packing; grow the atlas until everything fits.
        let padding = 1u32;
        let mut atlas_width = 256u32;
        let mut atlas_height = 256u32;
        loop {
            let mut x = padding;
            let mut y = padding;
            let mut row_height = 0u32;
            let mut fits = true;

            for (_, metrics, _) in &rasterized {
                let glyph_w = metrics.width as u32;
                let glyph_h = metrics.height as u32;
                if x + glyph_w + padding > atlas_width {
                    x = padding;
                    y += row_height + padding;
                    row_height = 0;
                }
                if y + glyph_h + padding > atlas_height {
                    fits = false;
                    break;
                }
                x += glyph_w + padding;
                row_height = row_height.max(glyph_h);
            }

            if fits {
                break;
            }
            if atlas_width <= atlas_height {
                atlas_width *= 2;
            } else {
                atlas_height *= 2;
            }
        }

        let mut atlas_data = vec![0u8; (atlas_width * atlas_height) as usize];
        let mut glyphs = HashMap::new();

        let mut x = padding;
        let mut y = padding;
        let mut row_height = 0u32;
        for (c, metrics, bitmap) in &rasterized {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;
            if x + glyph_w + padding > atlas_width {
                x = padding;
                y += row_height + padding;
                row_height = 0;
            }

            for gy in 0..glyph_h {
                for gx in 0..glyph_w {
                    let src = (gy * glyph_w + gx) as usize;
                    let dst = ((y + gy) * atlas_width + (x + gx)) as usize;
                    atlas_data[dst] = bitmap[src];
                }
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / atlas_width as f32,
                        y as f32 / atlas_height as f32,
                        glyph_w as f32 / atlas_width as f32,
                        glyph_h as f32 / atlas_height as f32,
                    ],
                    width: glyph_w,
                    height: glyph_h,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );

            x += glyph_w + padding;
            row_height = row_height.max(glyph_h);
        }

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Font Atlas"),
            size: wgpu::Extent3d {
                width: atlas_width,
                height: atlas_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas_width),
                rows_per_image: Some(atlas_height),
            },
            wgpu::Extent3d {
                width: atlas_width,
                height: atlas_height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Font Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        Ok(Self {
            view,
            sampler,
            glyphs,
            size,
            line_height,
        })
    }
}

/// Batched 2D drawing over the rendered frame.
pub struct Overlay {
    colored_pipeline: wgpu::RenderPipeline,
    textured_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    font: Option<(FontAtlas, wgpu::BindGroup)>,

    colored_vertices: Vec<Vertex2d>,
    text_vertices: Vec<Vertex2d>,
    visible: bool,
}

impl Overlay {
    pub const FONT_SIZE: f32 = 14.0;

    /// Builds the overlay pipelines; `font_path` optionally points at a
    /// TTF/OTF file for the text atlas. Missing or unreadable fonts are not
    /// fatal: the overlay keeps working without text.
    pub fn new(gpu: &GpuContext, font_path: Option<&Path>) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Uniforms"),
            size: std::mem::size_of::<OverlayUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Texture Layout"),
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

        let colored_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Colored Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Textured Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let blend_state = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let colored_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Colored Pipeline"),
            layout: Some(&colored_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex2d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_colored"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let textured_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Textured Pipeline"),
            layout: Some(&textured_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex2d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_textured"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let font = font_path.and_then(|path| match Self::load_font(gpu, &texture_layout, path) {
            Ok(font) => Some(font),
            Err(err) => {
                warn!("overlay font unavailable, text disabled: {err}");
                None
            }
        });
        if font.is_none() {
            warn!("debug overlay running without a font; only rectangles will be drawn");
        }

        Self {
            colored_pipeline,
            textured_pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            font,
            colored_vertices: Vec::with_capacity(1024),
            text_vertices: Vec::with_capacity(4096),
            visible: true,
        }
    }

    fn load_font(
        gpu: &GpuContext,
        texture_layout: &wgpu::BindGroupLayout,
        path: &Path,
    ) -> Result<(FontAtlas, wgpu::BindGroup), Error> {
        let data = std::fs::read(path).map_err(|e| Error::LoadFont {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let atlas = FontAtlas::new(gpu, &data, Self::FONT_SIZE)?;

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Font Bind Group"),
            layout: texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                },
            ],
        });

        Ok((atlas, bind_group))
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Vertical distance between text lines, in pixels.
    pub fn line_height(&self) -> f32 {
        self.font
            .as_ref()
            .map(|(atlas, _)| atlas.line_height)
            .unwrap_or(Self::FONT_SIZE * 1.2)
    }

    /// Pixel width of `text` when drawn with the loaded font.
    pub fn measure(&self, text: &str) -> f32 {
        match &self.font {
            Some((atlas, _)) => text
                .chars()
                .map(|c| {
                    atlas
                        .glyphs
                        .get(&c)
                        .map(|g| g.advance)
                        .unwrap_or(atlas.size * 0.5)
                })
                .sum(),
            None => text.len() as f32 * Self::FONT_SIZE * 0.5,
        }
    }

    /// Drops all batched geometry for the new frame.
    pub fn clear(&mut self) {
        self.colored_vertices.clear();
        self.text_vertices.clear();
    }

    fn vertices_left(&self) -> usize {
        MAX_VERTICES - self.colored_vertices.len() - self.text_vertices.len()
    }

    /// Queues a filled rectangle in pixel coordinates, origin top-left.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if self.vertices_left() < 6 {
            return;
        }
        let c = [color.r, color.g, color.b, color.a];
        let uv = [0.0, 0.0];
        self.colored_vertices.extend_from_slice(&[
            Vertex2d { position: [x, y], uv, color: c },
            Vertex2d { position: [x + w, y], uv, color: c },
            Vertex2d { position: [x, y + h], uv, color: c },
            Vertex2d { position: [x + w, y], uv, color: c },
            Vertex2d { position: [x + w, y + h], uv, color: c },
            Vertex2d { position: [x, y + h], uv, color: c },
        ]);
    }

    /// Queues a line of text; silently does nothing if no font is loaded.
    pub fn text(&mut self, x: f32, y: f32, text: &str, color: Color) {
        let Some((atlas, _)) = &self.font else {
            return;
        };

        let c = [color.r, color.g, color.b, color.a];
        let mut cursor_x = x;
        let baseline_y = y + atlas.size;
        let mut quads = Vec::new();

        for ch in text.chars() {
            let Some(glyph) = atlas.glyphs.get(&ch) else {
                cursor_x += atlas.size * 0.5;
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                let gx = cursor_x + glyph.offset_x;
                // fontdue's ymin measures from the baseline up to the glyph
                // bottom, so the quad top is baseline - ymin - height.
                let gy = baseline_y - glyph.offset_y - glyph.height as f32;
                let gw = glyph.width as f32;
                let gh = glyph.height as f32;

                let u0 = glyph.uv[0];
                let v0 = glyph.uv[1];
                let u1 = u0 + glyph.uv[2];
                let v1 = v0 + glyph.uv[3];

                quads.extend_from_slice(&[
                    Vertex2d { position: [gx, gy], uv: [u0, v0], color: c },
                    Vertex2d { position: [gx + gw, gy], uv: [u1, v0], color: c },
                    Vertex2d { position: [gx, gy + gh], uv: [u0, v1], color: c },
                    Vertex2d { position: [gx + gw, gy], uv: [u1, v0], color: c },
                    Vertex2d { position: [gx + gw, gy + gh], uv: [u1, v1], color: c },
                    Vertex2d { position: [gx, gy + gh], uv: [u0, v1], color: c },
                ]);
            }

            cursor_x += glyph.advance;
        }

        if quads.len() <= self.vertices_left() {
            self.text_vertices.extend_from_slice(&quads);
        }
    }

    /// Queues a bordered panel of text lines anchored at `(x, y)`.
    pub fn panel(&mut self, x: f32, y: f32, lines: &[String]) {
        let padding = 8.0;
        let line_height = self.line_height();
        let width = lines
            .iter()
            .map(|line| self.measure(line))
            .fold(0.0f32, f32::max)
            + padding * 2.0;
        let height = lines.len() as f32 * line_height + padding * 2.0;

        self.rect(x - 1.0, y - 1.0, width + 2.0, height + 2.0, Color::PANEL_BORDER);
        self.rect(x, y, width, height, Color::PANEL_BG);
        for (i, line) in lines.iter().enumerate() {
            self.text(
                x + padding,
                y + padding + i as f32 * line_height,
                line,
                Color::WHITE,
            );
        }
    }

    /// Draws the batched geometry in its own pass over the existing frame
    /// contents.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        if !self.visible || (self.colored_vertices.is_empty() && self.text_vertices.is_empty()) {
            return;
        }

        let uniforms = OverlayUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        if !self.colored_vertices.is_empty() {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.colored_vertices),
            );
        }
        let text_offset = self.colored_vertices.len();
        if !self.text_vertices.is_empty() {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                (text_offset * std::mem::size_of::<Vertex2d>()) as u64,
                bytemuck::cast_slice(&self.text_vertices),
            );
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if !self.colored_vertices.is_empty() {
            pass.set_pipeline(&self.colored_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..self.colored_vertices.len() as u32, 0..1);
        }

        if !self.text_vertices.is_empty() {
            if let Some((_, font_bind_group)) = &self.font {
                pass.set_pipeline(&self.textured_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_bind_group(1, font_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.draw(text_offset as u32..(text_offset + self.text_vertices.len()) as u32, 0..1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex2d>(), 32);
        assert_eq!(Vertex2d::LAYOUT.attributes[1].offset, 8);
        assert_eq!(Vertex2d::LAYOUT.attributes[2].offset, 16);
    }

    #[test]
    fn colors_default_to_opaque() {
        let c = Color::rgb(0.2, 0.4, 0.6);
        assert_eq!(c.a, 1.0);
        assert_eq!(Color::TRANSPARENT.a, 0.0);
    }
}

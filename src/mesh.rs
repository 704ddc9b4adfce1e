//! Vertex format, GPU meshes, and built-in primitives.
//!
//! [`Vertex3d`] carries position, normal, tangent, and UV — everything the
//! fixed lighting shader consumes. [`Mesh`] owns the uploaded vertex and
//! index buffers along with a display name and the counts the overlay
//! reports. Geometry generation is separated from upload so the primitive
//! generators stay testable without a GPU.
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | tangent   | Float32x3 | 24     | 2               |
//! | uv        | Float32x2 | 36     | 3               |

use crate::gpu::GpuContext;

/// A vertex for 3D mesh rendering.
///
/// `#[repr(C)]` with a 44-byte stride; see the module docs for the exact
/// attribute layout, exposed as [`Vertex3d::LAYOUT`].
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// The 3D position of this vertex in model space.
    pub position: [f32; 3],
    /// The surface normal vector (should be normalized for correct lighting).
    pub normal: [f32; 3],
    /// The surface tangent, pointing along increasing U.
    pub tangent: [f32; 3],
    /// Texture coordinates, typically in the range [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout descriptor for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // tangent
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 36,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], tangent: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tangent,
            uv,
        }
    }
}

/// Raw geometry before GPU upload.
///
/// The primitive generators produce this; [`Mesh::from_geometry`] uploads
/// it. Kept separate so geometry can be inspected and tested directly.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// A unit cube centered at the origin, 24 vertices (4 per face) so
    /// every face gets flat normals and its own UVs. Tangents point along
    /// each face's U axis.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Back face (Z-)
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [-1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [-1.0,  0.0,  0.0], [0.0, 1.0]),
            // Top face (Y+)
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Bottom face (Y-)
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Right face (X+)
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            // Left face (X-)
            Vertex3d::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
        ];

        // Counter-clockwise seen from outside the cube.
        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0,  2,  1,  0,  3,  2,  // front
            4,  6,  5,  4,  7,  6,  // back
            8,  10, 9,  8,  11, 10, // top
            12, 14, 13, 12, 15, 14, // bottom
            16, 18, 17, 16, 19, 18, // right
            20, 22, 21, 20, 23, 22, // left
        ];

        Self { vertices, indices }
    }

    /// A UV sphere of radius 0.5 with latitude/longitude subdivision.
    /// Tangents follow the direction of increasing longitude.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let position = [x * 0.5, y * 0.5, z * 0.5];
                let normal = [x, y, z];
                // d/dtheta of the ring circle, unit length by construction.
                let tangent = [-theta.sin(), 0.0, theta.cos()];
                let uv = [seg as f32 / segments as f32, ring as f32 / rings as f32];

                vertices.push(Vertex3d::new(position, normal, tangent, uv));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self { vertices, indices }
    }

    /// A flat square plane of the given size on the XZ axis, normals up.
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        let vertices = vec![
            Vertex3d::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0]),
            Vertex3d::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0]),
            Vertex3d::new([-half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0]),
        ];

        let indices = vec![0, 1, 2, 2, 3, 0];

        Self { vertices, indices }
    }
}

/// GPU-resident mesh geometry with vertex and index buffers.
///
/// Immutable after creation; entities reference meshes through the scene
/// arena rather than owning them, so one upload serves any number of
/// entities.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
    name: String,
}

impl Mesh {
    /// Uploads raw geometry to GPU buffers under a display name.
    pub fn from_geometry(gpu: &GpuContext, name: impl Into<String>, geometry: &Geometry) -> Self {
        use wgpu::util::DeviceExt;

        let name = name.into();

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{name} Vertex Buffer")),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{name} Index Buffer")),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            vertex_count: geometry.vertices.len() as u32,
            index_count: geometry.indices.len() as u32,
            name,
        }
    }

    /// Creates a unit cube centered at the origin.
    pub fn cube(gpu: &GpuContext) -> Self {
        Self::from_geometry(gpu, "Cube", &Geometry::cube())
    }

    /// Creates a UV sphere with the given tessellation.
    pub fn sphere(gpu: &GpuContext, segments: u32, rings: u32) -> Self {
        Self::from_geometry(gpu, "Sphere", &Geometry::sphere(segments, rings))
    }

    /// Creates a flat `size` × `size` ground plane.
    pub fn plane(gpu: &GpuContext, size: f32) -> Self {
        Self::from_geometry(gpu, "Plane", &Geometry::plane(size))
    }

    /// Human-readable name, shown by the debug overlay.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn assert_normals_and_tangents_unit_and_orthogonal(geometry: &Geometry) {
        for v in &geometry.vertices {
            let n = Vec3::from_array(v.normal);
            let t = Vec3::from_array(v.tangent);
            assert!((n.length() - 1.0).abs() < 0.001);
            assert!((t.length() - 1.0).abs() < 0.001);
            assert!(n.dot(t).abs() < 0.001);
        }
    }

    #[test]
    fn vertex_stride_is_44_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 44);
        assert_eq!(std::mem::offset_of!(Vertex3d, tangent), 24);
        assert_eq!(std::mem::offset_of!(Vertex3d, uv), 36);
    }

    #[test]
    fn cube_has_four_vertices_per_face() {
        let cube = Geometry::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert_normals_and_tangents_unit_and_orthogonal(&cube);
    }

    #[test]
    fn cube_spans_unit_extents() {
        let cube = Geometry::cube();
        for v in &cube.vertices {
            for c in v.position {
                assert!((c.abs() - 0.5).abs() < 0.001);
            }
        }
    }

    #[test]
    fn sphere_vertex_count_matches_tessellation() {
        let sphere = Geometry::sphere(16, 8);
        assert_eq!(sphere.vertices.len(), 17 * 9);
        assert_eq!(sphere.indices.len(), (16 * 8 * 6) as usize);
        assert_normals_and_tangents_unit_and_orthogonal(&sphere);
    }

    #[test]
    fn sphere_positions_sit_on_the_half_unit_shell() {
        let sphere = Geometry::sphere(12, 6);
        for v in &sphere.vertices {
            let r = Vec3::from_array(v.position).length();
            assert!((r - 0.5).abs() < 0.001);
        }
    }

    #[test]
    fn plane_lies_flat_at_requested_size() {
        let plane = Geometry::plane(10.0);
        assert_eq!(plane.vertices.len(), 4);
        for v in &plane.vertices {
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
            assert!(v.position[0].abs() <= 5.0);
            assert!(v.position[2].abs() <= 5.0);
        }
        assert_normals_and_tangents_unit_and_orthogonal(&plane);
    }
}

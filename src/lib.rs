//! # Glint
//!
//! **A small real-time 3D renderer with a closure-driven frame loop.**
//!
//! Build a scene of meshes, materials, lights, and cameras during setup,
//! then animate it from a per-frame closure. Per-draw shader data flows
//! through a ring allocator over one uniform buffer, world matrices are
//! cached lazily on each transform, and a toggleable 2D overlay reports
//! frame statistics.
//!
//! ## Quick Start
//!
//! ```no_run
//! use glint::*;
//!
//! fn main() -> Result<(), Error> {
//!     run(|ctx| {
//!         let cube = ctx.mesh_cube();
//!         let material = ctx.material(Color::rgb(1.0, 0.4, 0.2));
//!         let entity = ctx.scene.add_entity(Entity::new(cube, material));
//!
//!         ctx.scene.add_light(Light::directional(Vec3::NEG_Y, 1.0, Vec3::ONE));
//!         let aspect = ctx.aspect();
//!         ctx.scene.add_camera(Camera::new(Vec3::new(0.0, 0.0, -5.0), aspect));
//!
//!         move |frame| {
//!             frame.scene.entities_mut()[entity]
//!                 .transform
//!                 .rotate(Vec3::new(0.0, frame.dt, 0.0));
//!         }
//!     })
//! }
//! ```

mod app;
mod camera;
mod error;
mod gpu;
mod input;
mod light;
mod material;
mod mesh;
mod overlay;
mod renderer;
mod ring;
mod scene;
mod texture;
mod transform;

pub use app::{AppConfig, Frame, SetupContext, run, run_with_config};
pub use camera::{Camera, Projection};
pub use error::Error;
pub use gpu::GpuContext;
pub use input::Input;
pub use light::{
    LIGHT_TYPE_DIRECTIONAL, LIGHT_TYPE_POINT, LIGHT_TYPE_SPOT, Light, MAX_LIGHTS,
};
pub use material::{Material, SLOT_ALBEDO};
pub use mesh::{Geometry, Mesh, Vertex3d};
pub use overlay::{Color, Overlay};
pub use renderer::Renderer;
pub use ring::{RING_GRANULARITY, RingCursor, UniformRing};
pub use scene::{Entity, MaterialId, MeshId, Scene, TextureId};
pub use texture::Texture;
pub use transform::Transform;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

//! Scene arenas, entities, and type-safe resource handles.
//!
//! GPU resources are expensive and shared; entities are cheap and owned.
//! The [`Scene`] keeps meshes, materials, and textures in arenas, and
//! entities reference them through the id newtypes so two entities can
//! draw the same mesh with the same material without duplicating either.
//! Mutating a material through its id is therefore observed by every
//! entity that references it.
//!
//! Cameras live in their own list; exactly one is active per frame, and
//! inactive cameras keep their pose untouched.

use std::sync::Arc;

use glam::Vec3;
use log::warn;

use crate::camera::Camera;
use crate::light::{Light, MAX_LIGHTS};
use crate::material::Material;
use crate::mesh::Mesh;
use crate::overlay::Color;
use crate::texture::Texture;
use crate::transform::Transform;

/// Type-safe index of a mesh in the scene arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Type-safe index of a material in the scene arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// Type-safe index of a texture in the scene arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Something drawable: a pose plus references into the scene arenas.
///
/// The entity exclusively owns its [`Transform`]; the mesh and material
/// are shared through their ids.
pub struct Entity {
    pub transform: Transform,
    pub mesh: MeshId,
    pub material: MaterialId,
}

impl Entity {
    pub fn new(mesh: MeshId, material: MaterialId) -> Self {
        Self {
            transform: Transform::new(),
            mesh,
            material,
        }
    }
}

/// Everything the renderer draws in one frame.
pub struct Scene {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    textures: Vec<Arc<Texture>>,
    entities: Vec<Entity>,
    lights: Vec<Light>,
    cameras: Vec<Camera>,
    active_camera: usize,
    /// Clear color for the frame.
    pub background_color: Color,
    /// Flat ambient term added to every lit surface.
    pub ambient_color: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            entities: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            active_camera: 0,
            background_color: Color::rgb(0.1, 0.1, 0.15),
            ambient_color: Vec3::splat(0.05),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn material_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0]
    }

    pub fn add_texture(&mut self, texture: Arc<Texture>) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    pub fn texture(&self, id: TextureId) -> &Arc<Texture> {
        &self.textures[id.0]
    }

    /// Adds an entity and returns its index in the entity list.
    pub fn add_entity(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Adds a light, up to [`MAX_LIGHTS`]; extra lights are dropped with a
    /// warning since the shader-side array cannot hold them.
    pub fn add_light(&mut self, light: Light) {
        if self.lights.len() >= MAX_LIGHTS {
            warn!("light limit of {MAX_LIGHTS} reached, ignoring additional light");
            return;
        }
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Adds a camera and returns its index. The first camera added becomes
    /// the active one.
    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    pub fn cameras_mut(&mut self) -> &mut [Camera] {
        &mut self.cameras
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    /// Index of the camera the renderer draws from, clamped to the camera
    /// list so a stale index degrades instead of panicking.
    pub fn active_camera_index(&self) -> usize {
        self.active_camera.min(self.cameras.len().saturating_sub(1))
    }

    pub fn set_active_camera(&mut self, index: usize) {
        self.active_camera = index;
    }

    pub fn active_camera(&self) -> Option<&Camera> {
        self.cameras.get(self.active_camera_index())
    }

    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        let index = self.active_camera_index();
        self.cameras.get_mut(index)
    }

    /// Sum of world-matrix recomputations across all entity transforms,
    /// reported by the debug overlay.
    pub fn transform_recompute_total(&self) -> u32 {
        self.entities
            .iter()
            .map(|e| e.transform.recompute_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn entities_share_resources_by_id() {
        let mut scene = Scene::new();
        let mesh = MeshId(0);
        let material = MaterialId(0);

        let a = scene.add_entity(Entity::new(mesh, material));
        let b = scene.add_entity(Entity::new(mesh, material));

        assert_eq!(scene.entities()[a].mesh, scene.entities()[b].mesh);
        assert_eq!(scene.entities()[a].material, scene.entities()[b].material);
    }

    #[test]
    fn entity_transforms_are_independent() {
        let mut scene = Scene::new();
        scene.add_entity(Entity::new(MeshId(0), MaterialId(0)));
        scene.add_entity(Entity::new(MeshId(0), MaterialId(0)));

        scene.entities_mut()[0]
            .transform
            .set_translation(Vec3::new(3.0, 0.0, 0.0));

        assert_eq!(
            scene.entities()[1].transform.translation(),
            Vec3::ZERO
        );
    }

    #[test]
    fn lights_are_capped_at_the_shader_limit() {
        let mut scene = Scene::new();
        for i in 0..MAX_LIGHTS + 3 {
            scene.add_light(Light::point(
                Vec3::new(i as f32, 0.0, 0.0),
                1.0,
                Vec3::ONE,
                Light::DEFAULT_RANGE,
            ));
        }
        assert_eq!(scene.lights().len(), MAX_LIGHTS);
    }

    #[test]
    fn shared_light_mutation_is_visible_to_readers() {
        let mut scene = Scene::new();
        scene.add_light(Light::directional(Vec3::NEG_Y, 1.0, Vec3::ONE));
        scene.lights_mut()[0].intensity = 2.5;
        assert_eq!(scene.lights()[0].intensity, 2.5);
    }

    #[test]
    fn active_camera_index_clamps_out_of_range() {
        let mut scene = Scene::new();
        assert!(scene.active_camera().is_none());

        scene.add_camera(Camera::new(Vec3::ZERO, 1.0));
        scene.add_camera(Camera::new(Vec3::X, 1.0));

        scene.set_active_camera(17);
        assert_eq!(scene.active_camera_index(), 1);
        assert!(scene.active_camera().is_some());
    }
}

pub mod material;
pub mod populate;
pub mod shape;

use crate::assets::{EnvironmentMap, TextureImage};
use crate::params::Color;
use glam::{EulerRot, Mat4, Quat, Vec3};
use material::{MaterialHandle, MaterialLibrary};
use shape::ShapeKind;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Position, Euler rotation (radians, XYZ order) and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        compose_transform_matrix(self.position, self.rotation, self.scale)
    }
}

/// A draggable shape.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub shape: ShapeKind,
    pub transform: Transform,
    original_scale: f32,
    pub material: MaterialHandle,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Scale captured at registration; the multiplier base for `scaleBase`.
    pub fn original_scale(&self) -> f32 {
        self.original_scale
    }

    pub fn apply_scale_base(&mut self, scale_base: f32) {
        self.transform.scale = self.original_scale * scale_base;
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }
}

/// Everything needed to register a shape.
#[derive(Debug, Clone, Copy)]
pub struct ShapeSpawn {
    pub shape: ShapeKind,
    pub transform: Transform,
    pub material: MaterialHandle,
}

/// One line of 3D text. All text meshes point at the same shared material.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMesh {
    pub line: String,
    pub position: Vec3,
    pub width: f32,
    pub material: MaterialHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0x222222),
            intensity: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenePhase {
    /// The font has not arrived; no entities exist yet.
    #[default]
    AssetsPending,
    Populated,
}

/// Owns the shapes, text meshes and every material instance in the scene.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    phase: ScenePhase,
    entities: Vec<Entity>,
    text_meshes: Vec<TextMesh>,
    materials: MaterialLibrary,
    text_material: Option<MaterialHandle>,
    ambient_light: AmbientLight,
    environment: Option<EnvironmentMap>,
    matcaps: HashMap<u8, TextureImage>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn mark_populated(&mut self) {
        self.phase = ScenePhase::Populated;
    }

    /// Add a shape. Its current scale becomes the immutable original scale.
    pub fn register(&mut self, spawn: ShapeSpawn) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(Entity {
            id,
            shape: spawn.shape,
            transform: spawn.transform,
            original_scale: spawn.transform.scale,
            material: spawn.material,
        });
        id
    }

    /// Registered shapes in registration order.
    pub fn all(&self) -> &[Entity] {
        &self.entities
    }

    pub fn all_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn add_text(&mut self, mesh: TextMesh) {
        self.text_meshes.push(mesh);
    }

    pub fn text_meshes(&self) -> &[TextMesh] {
        &self.text_meshes
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    pub fn text_material(&self) -> Option<MaterialHandle> {
        self.text_material
    }

    /// Point every text mesh at `handle` and release the instance it replaces.
    pub fn replace_text_material(&mut self, handle: MaterialHandle) -> Option<MaterialHandle> {
        for mesh in &mut self.text_meshes {
            mesh.material = handle;
        }
        let previous = self.text_material.replace(handle);
        if let Some(old) = previous.filter(|old| *old != handle) {
            self.materials.release(old);
        }
        previous
    }

    pub fn ambient_light(&self) -> AmbientLight {
        self.ambient_light
    }

    pub fn set_ambient_light(&mut self, light: AmbientLight) {
        self.ambient_light = light;
    }

    pub fn environment(&self) -> Option<&EnvironmentMap> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: EnvironmentMap) {
        self.environment = Some(environment);
    }

    pub fn set_matcap(&mut self, index: u8, texture: TextureImage) {
        self.matcaps.insert(index, texture);
    }

    pub fn matcap(&self, index: u8) -> Option<&TextureImage> {
        self.matcaps.get(&index)
    }
}

/// World matrix for a uniform-scale entity with XYZ Euler rotation.
pub fn compose_transform_matrix(position: Vec3, rotation: Vec3, scale: f32) -> Mat4 {
    let rotation = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
    Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, position)
}

#[cfg(test)]
mod tests {
    use super::material::{Material, MatcapMaterial};
    use super::*;

    fn matcap(scene: &mut SceneRegistry, index: u8) -> MaterialHandle {
        scene
            .materials_mut()
            .insert(Material::Matcap(MatcapMaterial { matcap: index }))
    }

    #[test]
    fn register_captures_original_scale_in_order() {
        let mut scene = SceneRegistry::new();
        let material = matcap(&mut scene, 1);
        let ids: Vec<EntityId> = [0.2, 0.5, 0.9]
            .into_iter()
            .map(|scale| {
                scene.register(ShapeSpawn {
                    shape: ShapeKind::Box,
                    transform: Transform {
                        scale,
                        ..Transform::default()
                    },
                    material,
                })
            })
            .collect();
        let scales: Vec<f32> = scene.all().iter().map(Entity::original_scale).collect();
        assert_eq!(scales, vec![0.2, 0.5, 0.9]);
        assert_eq!(
            scene.all().iter().map(Entity::id).collect::<Vec<_>>(),
            ids
        );

        let entity = scene.get_mut(ids[1]).unwrap();
        entity.apply_scale_base(2.0);
        assert_eq!(entity.transform.scale, 1.0);
        assert_eq!(entity.original_scale(), 0.5);
    }

    #[test]
    fn empty_registry_is_pending() {
        let scene = SceneRegistry::new();
        assert_eq!(scene.phase(), ScenePhase::AssetsPending);
        assert!(scene.is_empty());
        assert!(scene.text_material().is_none());
    }

    #[test]
    fn replacing_text_material_releases_the_old_instance() {
        let mut scene = SceneRegistry::new();
        let first = matcap(&mut scene, 1);
        scene.replace_text_material(first);
        for line in ["a", "b"] {
            scene.add_text(TextMesh {
                line: line.to_string(),
                position: Vec3::ZERO,
                width: 1.0,
                material: first,
            });
        }
        let second = matcap(&mut scene, 3);
        assert_eq!(scene.replace_text_material(second), Some(first));
        assert!(!scene.materials().contains(first));
        assert!(scene.text_meshes().iter().all(|mesh| mesh.material == second));
    }

    #[test]
    fn transform_matrix_places_origin_at_position() {
        let matrix = compose_transform_matrix(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.3, 1.2, -0.4),
            0.5,
        );
        let origin = matrix.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        let unit = matrix.transform_vector3(Vec3::X);
        assert!((unit.length() - 0.5).abs() < 1e-6);
    }
}

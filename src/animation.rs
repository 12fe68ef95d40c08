use crate::scene::{EntityId, SceneRegistry};
use glam::Vec3;
use std::collections::HashSet;

/// Per-tick drift amplitude in world units.
pub const DRIFT_AMPLITUDE: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    pub speed_x: f32,
    pub speed_y: f32,
    pub speed_z: f32,
    pub rotation_speed: f32,
}

impl AnimationParams {
    /// Positional increment for the entity at registration index `index`.
    pub fn drift(&self, elapsed: f32, index: usize) -> Vec3 {
        let i = index as f32;
        Vec3::new(
            (elapsed * self.speed_x + i).sin(),
            (elapsed * self.speed_y + i * 0.7).cos(),
            (elapsed * self.speed_z + i * 0.5).sin(),
        ) * DRIFT_AMPLITUDE
    }
}

/// Accumulating float-and-spin motion for every registered shape.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    faulted: HashSet<EntityId>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance all shapes one tick. The `held` entity belongs to the drag
    /// controller and is left untouched. Returns how many entities moved.
    pub fn advance(
        &mut self,
        scene: &mut SceneRegistry,
        params: &AnimationParams,
        elapsed: f32,
        held: Option<EntityId>,
    ) -> usize {
        let mut moved = 0;
        for (index, entity) in scene.all_mut().iter_mut().enumerate() {
            if Some(entity.id()) == held {
                continue;
            }
            let position = entity.transform.position + params.drift(elapsed, index);
            let rotation = entity.transform.rotation
                + Vec3::new(params.rotation_speed, params.rotation_speed, 0.0);
            if !position.is_finite() || !rotation.is_finite() {
                if self.faulted.insert(entity.id()) {
                    log::warn!(
                        "Entity {} produced a non-finite transform; skipping it",
                        entity.id().raw()
                    );
                }
                continue;
            }
            entity.transform.position = position;
            entity.transform.rotation = rotation;
            moved += 1;
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::material::{Material, MatcapMaterial};
    use crate::scene::shape::ShapeKind;
    use crate::scene::{ShapeSpawn, Transform};

    const PARAMS: AnimationParams = AnimationParams {
        speed_x: 0.4,
        speed_y: 0.3,
        speed_z: 0.35,
        rotation_speed: 0.003,
    };

    fn scene_with(count: usize) -> SceneRegistry {
        let mut scene = SceneRegistry::new();
        let material = scene
            .materials_mut()
            .insert(Material::Matcap(MatcapMaterial { matcap: 1 }));
        for _ in 0..count {
            scene.register(ShapeSpawn {
                shape: ShapeKind::Sphere,
                transform: Transform::default(),
                material,
            });
        }
        scene
    }

    #[test]
    fn drift_matches_formula() {
        let mut scene = scene_with(3);
        let mut driver = AnimationDriver::new();
        assert_eq!(driver.advance(&mut scene, &PARAMS, 2.0, None), 3);

        let entity = &scene.all()[2];
        let expected = Vec3::new(
            (2.0_f32 * 0.4 + 2.0).sin(),
            (2.0_f32 * 0.3 + 1.4).cos(),
            (2.0_f32 * 0.35 + 1.0).sin(),
        ) * DRIFT_AMPLITUDE;
        assert!(entity.transform.position.abs_diff_eq(expected, 1e-6));
        assert!(entity
            .transform
            .rotation
            .abs_diff_eq(Vec3::new(0.003, 0.003, 0.0), 1e-7));
    }

    #[test]
    fn drift_accumulates() {
        let mut scene = scene_with(1);
        let mut driver = AnimationDriver::new();
        driver.advance(&mut scene, &PARAMS, 0.0, None);
        driver.advance(&mut scene, &PARAMS, 0.0, None);
        let step = PARAMS.drift(0.0, 0);
        assert!(scene.all()[0].transform.position.abs_diff_eq(step * 2.0, 1e-6));
        assert!((scene.all()[0].transform.rotation.x - 0.006).abs() < 1e-7);
    }

    #[test]
    fn held_entity_is_skipped() {
        let mut scene = scene_with(2);
        let held = scene.all()[1].id();
        let mut driver = AnimationDriver::new();
        assert_eq!(driver.advance(&mut scene, &PARAMS, 1.0, Some(held)), 1);
        assert_eq!(scene.all()[1].transform, Transform::default());
        assert_ne!(scene.all()[0].transform, Transform::default());
    }

    #[test]
    fn empty_scene_is_a_no_op() {
        let mut scene = SceneRegistry::new();
        assert_eq!(AnimationDriver::new().advance(&mut scene, &PARAMS, 5.0, None), 0);
    }

    #[test]
    fn non_finite_entities_are_isolated() {
        let mut scene = scene_with(2);
        scene.all_mut()[0].transform.position.x = f32::NAN;
        let mut driver = AnimationDriver::new();
        assert_eq!(driver.advance(&mut scene, &PARAMS, 1.0, None), 1);
        assert_eq!(driver.advance(&mut scene, &PARAMS, 2.0, None), 1);
        assert_eq!(driver.faulted.len(), 1);
    }
}

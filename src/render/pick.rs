//! CPU ray picking against shape pick volumes.
//!
//! Rays come from the camera through a pointer position. Each shape is tested
//! against its local pick volume (sphere or oriented box) placed by the
//! entity's current transform; the nearest positive hit wins. Text meshes are
//! never pickable.

use crate::scene::shape::PickVolume;
use crate::scene::{Entity, EntityId, SceneRegistry};
use glam::{Mat4, Vec3};

// ========================================================================
// Ray / Plane
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Returns `None` for a zero or non-finite direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        origin.is_finite().then_some(Self { origin, direction })
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Point where the ray meets `plane`, or `None` when it runs parallel
    /// (and off the plane) or the plane lies behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        self.distance_to_plane(plane).map(|t| self.at(t))
    }

    pub fn distance_to_plane(&self, plane: &Plane) -> Option<f32> {
        let denominator = plane.normal.dot(self.direction);
        if denominator.abs() < 1e-8 {
            // Parallel: only a hit if the origin already lies on the plane.
            return (plane.distance_to_point(self.origin).abs() < 1e-6).then_some(0.0);
        }
        let t = -(self.origin.dot(plane.normal) + plane.constant) / denominator;
        (t >= 0.0).then_some(t)
    }
}

/// Plane `normal · p + constant = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn from_normal_and_coplanar_point(normal: Vec3, point: Vec3) -> Option<Self> {
        let normal = normal.try_normalize()?;
        Some(Self {
            normal,
            constant: -point.dot(normal),
        })
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

// ========================================================================
// Volume tests
// ========================================================================

/// Distance along a unit `direction` to the first sphere hit in front of
/// the origin (or the exit point when starting inside).
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let near = -b - sqrt_d;
    let t = if near >= 0.0 { near } else { -b + sqrt_d };
    (t >= 0.0).then_some(t)
}

/// Slab test against an axis-aligned box. Returns the entry distance (or
/// exit distance when the origin is inside).
pub fn ray_aabb(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv_d = 1.0 / d;
        let mut t1 = (min[axis] - o) * inv_d;
        let mut t2 = (max[axis] - o) * inv_d;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }
    Some(if t_min > 0.0 { t_min } else { t_max })
}

/// Ray against a box of `half_extents` placed by `world`. The distance is
/// measured in world units along the original ray.
pub fn ray_obb(ray: &Ray, world: &Mat4, half_extents: Vec3) -> Option<f32> {
    let inverse = world.inverse();
    if !inverse.is_finite() {
        return None;
    }
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction).try_normalize()?;
    let t_local = ray_aabb(origin, direction, -half_extents, half_extents)?;
    let hit = world.transform_point3(origin + direction * t_local);
    Some((hit - ray.origin).length())
}

// ========================================================================
// Scene picking
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f32,
    pub point: Vec3,
}

pub fn ray_entity(ray: &Ray, entity: &Entity) -> Option<f32> {
    let transform = &entity.transform;
    let scale = transform.scale.abs();
    if scale < 1e-4 || !transform.position.is_finite() {
        return None;
    }
    match entity.shape.pick_volume() {
        PickVolume::Sphere { radius } => ray_sphere(ray, transform.position, radius * scale),
        PickVolume::Box { half_extents } => ray_obb(ray, &entity.world_matrix(), half_extents),
    }
}

/// Nearest shape hit by `ray`. Ties keep the earlier-registered shape.
pub fn pick_nearest(ray: &Ray, scene: &SceneRegistry) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;
    for entity in scene.all() {
        let Some(distance) = ray_entity(ray, entity) else {
            continue;
        };
        if distance <= 0.0 || !distance.is_finite() {
            continue;
        }
        if best.map_or(true, |hit| distance < hit.distance) {
            best = Some(PickHit {
                entity: entity.id(),
                distance,
                point: ray.at(distance),
            });
        }
    }
    best
}

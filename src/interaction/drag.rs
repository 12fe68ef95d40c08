use crate::render::pick::pick_nearest;
use crate::render::{OrbitControls, PerspectiveCamera, Plane};
use crate::scene::{EntityId, SceneRegistry};
use glam::{Vec2, Vec3};

/// An entity held under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub entity: EntityId,
    /// Fixed at pick time: faces the camera and passes through the entity.
    pub plane: Plane,
    /// Grab point minus entity position at pick time.
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerDownOutcome {
    Picked { entity: EntityId, distance: f32 },
    Missed,
    /// A drag is already active; the press is ignored.
    Busy,
}

/// Picks shapes on press and moves them across a camera-facing plane.
///
/// While dragging, orbit input is disabled and the held entity's position
/// is written only from here.
#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn held(&self) -> Option<EntityId> {
        self.session.map(|session| session.entity)
    }

    pub fn pointer_down(
        &mut self,
        ndc: Vec2,
        camera: &PerspectiveCamera,
        scene: &SceneRegistry,
        orbit: &mut OrbitControls,
    ) -> PointerDownOutcome {
        if self.session.is_some() {
            return PointerDownOutcome::Busy;
        }
        let Some(ray) = camera.ray_from_ndc(ndc) else {
            return PointerDownOutcome::Missed;
        };
        let Some(hit) = pick_nearest(&ray, scene) else {
            return PointerDownOutcome::Missed;
        };
        let Some(entity) = scene.get(hit.entity) else {
            return PointerDownOutcome::Missed;
        };
        let position = entity.transform.position;
        let Some(plane) =
            Plane::from_normal_and_coplanar_point(camera.world_view_direction(), position)
        else {
            return PointerDownOutcome::Missed;
        };
        let Some(grab) = ray.intersect_plane(&plane) else {
            log::debug!(
                "Pick on entity {} missed its drag plane; ignoring",
                hit.entity.raw()
            );
            return PointerDownOutcome::Missed;
        };

        self.session = Some(DragSession {
            entity: hit.entity,
            plane,
            offset: grab - position,
        });
        orbit.enabled = false;
        orbit.end_rotate();
        log::debug!(
            "Picked entity {} at distance {:.3}",
            hit.entity.raw(),
            hit.distance
        );
        PointerDownOutcome::Picked {
            entity: hit.entity,
            distance: hit.distance,
        }
    }

    /// Move the held entity under the pointer. Returns its new position, or
    /// `None` when idle or the ray does not reach the drag plane.
    pub fn pointer_move(
        &mut self,
        ndc: Vec2,
        camera: &PerspectiveCamera,
        scene: &mut SceneRegistry,
    ) -> Option<Vec3> {
        let session = self.session?;
        let point = camera.ray_from_ndc(ndc)?.intersect_plane(&session.plane)?;
        let entity = scene.get_mut(session.entity)?;
        entity.transform.position = point - session.offset;
        Some(entity.transform.position)
    }

    /// Release the held entity where it is and give orbit input back.
    pub fn pointer_up(&mut self, orbit: &mut OrbitControls) -> Option<EntityId> {
        let session = self.session.take()?;
        orbit.enabled = true;
        log::debug!("Released entity {}", session.entity.raw());
        Some(session.entity)
    }

    /// End a drag because pointer capture was lost.
    pub fn cancel(&mut self, orbit: &mut OrbitControls) -> Option<EntityId> {
        let released = self.pointer_up(orbit);
        if let Some(entity) = released {
            log::debug!("Drag of entity {} cancelled", entity.raw());
        }
        released
    }
}

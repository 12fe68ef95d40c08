use super::pick::Ray;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::f32::consts::PI;

const DEFAULT_UP: Vec3 = Vec3::Y;
/// Remaining damped motion below this many radians is dropped.
const SETTLE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(3.0, 3.0, 7.0),
            target: Vec3::ZERO,
            up: DEFAULT_UP,
            fov_y_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            self.aspect.max(0.0001),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Unit vector the camera looks along.
    pub fn world_view_direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// World ray from the eye through normalized device coordinates
    /// (`x` right, `y` up, both in `[-1, 1]`).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let inverse = self.view_projection().inverse();
        let far = inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        if far.w.abs() < f32::EPSILON {
            return None;
        }
        Ray::new(self.position, far.truncate() / far.w - self.position)
    }
}

/// Spherical orbit around a target with optional damping.
///
/// Rotation and zoom requests accumulate into pending deltas that
/// `update` applies to the camera once per frame.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    rotate_anchor: Option<Vec2>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enabled: true,
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.5,
            max_distance: 50.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            rotate_anchor: None,
        }
    }
}

impl OrbitControls {
    pub fn new(camera: &PerspectiveCamera) -> Self {
        Self {
            target: camera.target,
            ..Self::default()
        }
    }

    fn is_settled(&self) -> bool {
        self.pending_theta == 0.0 && self.pending_phi == 0.0 && self.pending_scale == 1.0
    }

    pub fn is_rotating(&self) -> bool {
        self.rotate_anchor.is_some()
    }

    pub fn begin_rotate(&mut self, client: Vec2) {
        if self.enabled {
            self.rotate_anchor = Some(client);
        }
    }

    /// Drag the orbit; a full viewport height of motion is one turn.
    pub fn rotate_to(&mut self, client: Vec2, viewport_height: f32) {
        if !self.enabled || viewport_height <= 0.0 {
            return;
        }
        let Some(anchor) = self.rotate_anchor else {
            return;
        };
        self.rotate_anchor = Some(client);
        let delta = (client - anchor) * (2.0 * PI * self.rotate_speed / viewport_height);
        self.pending_theta -= delta.x;
        self.pending_phi -= delta.y;
    }

    pub fn end_rotate(&mut self) {
        self.rotate_anchor = None;
    }

    /// Wheel zoom. Positive `scroll` moves towards the target.
    pub fn zoom(&mut self, scroll: f32) {
        if !self.enabled || !scroll.is_finite() {
            return;
        }
        self.pending_scale *= 0.95_f32.powf(self.zoom_speed * scroll);
    }

    /// Apply pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.is_settled() && camera.target == self.target {
            return false;
        }
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return false;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.pending_theta * step;
        phi = (phi + self.pending_phi * step).clamp(1e-6, PI - 1e-6);
        let radius = (radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.pending_theta *= 1.0 - self.damping_factor;
            self.pending_phi *= 1.0 - self.damping_factor;
            if self.pending_theta.abs() < SETTLE_EPSILON {
                self.pending_theta = 0.0;
            }
            if self.pending_phi.abs() < SETTLE_EPSILON {
                self.pending_phi = 0.0;
            }
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        self.pending_scale = 1.0;

        let position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
        let moved = !position.abs_diff_eq(camera.position, 1e-6) || camera.target != self.target;
        camera.position = position;
        camera.target = self.target;
        moved
    }
}

//! Window-independent viewer state: scene, controls, camera and pointer
//! routing, plus the per-frame loop. The winit handler forwards events here.

use crate::animation::AnimationDriver;
use crate::assets::{AssetEvent, AssetLoader};
use crate::config::AppConfig;
use crate::interaction::{DragController, PointerDownOutcome, PointerState};
use crate::params::{ControlId, ParamValue, ParamValues, ParameterStore};
use crate::propagation;
use crate::render::{OrbitControls, PerspectiveCamera, RenderPipeline};
use crate::scene::material::TextMaterialKind;
use crate::scene::populate::populate_scene;
use crate::scene::SceneRegistry;
use crate::ui::PanelStatus;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Wheel steps are reported in lines; pixel deltas are divided by this.
pub const PIXELS_PER_WHEEL_LINE: f32 = 50.0;

pub struct Viewer<P> {
    config: AppConfig,
    scene: SceneRegistry,
    store: ParameterStore<SceneRegistry>,
    camera: PerspectiveCamera,
    orbit: OrbitControls,
    drag: DragController,
    pointer: PointerState,
    animation: AnimationDriver,
    loader: AssetLoader,
    rng: StdRng,
    pipeline: P,
    frames: u64,
    render_failures: u64,
}

impl<P: RenderPipeline> Viewer<P> {
    pub fn new(config: AppConfig, pipeline: P, width: u32, height: u32) -> Self {
        let mut store = ParameterStore::new();
        propagation::install(&mut store);
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(width, height);
        let orbit = OrbitControls::new(&camera);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut scene = SceneRegistry::new();
        propagation::propagate_ambient_light(&mut scene, store.values());
        Self {
            config,
            scene,
            store,
            camera,
            orbit,
            drag: DragController::new(),
            pointer: PointerState::new(width, height),
            animation: AnimationDriver::new(),
            loader: AssetLoader::new(),
            rng,
            pipeline,
            frames: 0,
            render_failures: 0,
        }
    }

    /// Queue the font, matcap textures and environment map.
    pub fn start_loading(&mut self) {
        log::info!("Loading assets from {}", self.config.asset_root.display());
        self.loader.load_font(self.config.font_path());
        for index in 1..=TextMaterialKind::MATCAP_COUNT {
            self.loader.load_matcap(index, self.config.matcap_path(index));
        }
        self.loader.load_environment(self.config.environment_path());
    }

    pub fn poll_assets(&mut self) {
        for event in self.loader.poll() {
            self.handle_asset_event(event);
        }
    }

    pub fn handle_asset_event(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Font(Ok(font)) => {
                log::info!("Font '{}' loaded ({} glyphs)", font.family_name(), font.glyph_count());
                let populated = populate_scene(
                    &mut self.scene,
                    &font,
                    self.store.values(),
                    &self.config,
                    &mut self.rng,
                );
                if let Some(summary) = populated {
                    log::info!(
                        "Scene populated: {} text lines, {} shapes",
                        summary.text_meshes,
                        summary.shapes
                    );
                }
            }
            AssetEvent::Font(Err(err)) => {
                log::error!("{err}; the scene will stay without text and shapes");
            }
            AssetEvent::Matcap { index, result } => match result {
                Ok(texture) => {
                    log::debug!("Matcap {} loaded ({}x{})", index, texture.width, texture.height);
                    self.scene.set_matcap(index, texture);
                }
                Err(err) => log::warn!("Matcap {index} unavailable: {err}"),
            },
            AssetEvent::Environment(Ok(environment)) => {
                log::info!(
                    "Environment map loaded ({}x{})",
                    environment.width,
                    environment.height
                );
                self.scene.set_environment(environment);
            }
            AssetEvent::Environment(Err(err)) => {
                log::warn!("Environment map unavailable: {err}");
            }
        }
    }

    pub fn apply_edits(&mut self, edits: impl IntoIterator<Item = (ControlId, ParamValue)>) {
        for (control, value) in edits {
            if let Err(err) = self.store.set(&mut self.scene, control, value) {
                log::warn!("Rejected {} edit: {}", control, err);
            }
        }
    }

    pub fn pointer_moved(&mut self, client: Vec2, ui_captured: bool) {
        self.pointer.moved_to(client);
        if self.drag.held().is_some() {
            if let Some(ndc) = self.pointer.ndc() {
                self.drag.pointer_move(ndc, &self.camera, &mut self.scene);
            }
            return;
        }
        if !ui_captured {
            self.orbit.rotate_to(client, self.pointer.viewport_height());
        }
    }

    /// Primary button pressed at the last known pointer position.
    pub fn pointer_pressed(&mut self, ui_captured: bool) {
        if ui_captured {
            return;
        }
        let (Some(client), Some(ndc)) = (self.pointer.client(), self.pointer.ndc()) else {
            return;
        };
        let outcome = self
            .drag
            .pointer_down(ndc, &self.camera, &self.scene, &mut self.orbit);
        if outcome == PointerDownOutcome::Missed {
            self.orbit.begin_rotate(client);
        }
    }

    /// Always handled, so a drag started outside the panel is released.
    pub fn pointer_released(&mut self) {
        self.drag.pointer_up(&mut self.orbit);
        self.orbit.end_rotate();
    }

    pub fn wheel(&mut self, lines: f32, ui_captured: bool) {
        if !ui_captured {
            self.orbit.zoom(lines);
        }
    }

    pub fn cursor_left(&mut self) {
        self.pointer.left();
        self.release_capture();
    }

    pub fn focus_lost(&mut self) {
        self.release_capture();
    }

    fn release_capture(&mut self) {
        self.drag.cancel(&mut self.orbit);
        self.orbit.end_rotate();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.camera.set_aspect(width, height);
        self.pointer.set_viewport(width, height);
        if let Err(err) = self.pipeline.resize(width, height) {
            log::error!("Render pipeline resize failed: {err}");
        }
    }

    /// One frame: animate, settle orbit damping, then draw.
    ///
    /// Never fails; a render error is logged and the next frame proceeds.
    pub fn tick(&mut self, elapsed: f32) {
        let params = self.store.values().animation();
        self.animation
            .advance(&mut self.scene, &params, elapsed, self.drag.held());
        self.orbit.update(&mut self.camera);
        if let Err(err) = self.pipeline.render_frame(&self.scene, &self.camera) {
            self.render_failures += 1;
            if self.render_failures == 1 || self.render_failures % 600 == 0 {
                log::error!("Frame {} failed to render: {err}", self.frames);
            }
        }
        self.frames += 1;
    }

    pub fn status(&self) -> PanelStatus {
        PanelStatus {
            phase: self.scene.phase(),
            shapes: self.scene.len(),
            draws: self.pipeline.stats().draws,
            held: self.drag.held(),
            assets_in_flight: self.loader.in_flight(),
        }
    }

    pub fn values(&self) -> &ParamValues {
        self.store.values()
    }

    pub fn pipeline_mut(&mut self) -> &mut P {
        &mut self.pipeline
    }

    #[cfg(test)]
    fn scene_mut(&mut self) -> &mut SceneRegistry {
        &mut self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::font::TINY_TYPEFACE;
    use crate::assets::Font;
    use crate::render::{HeadlessPipeline, RendererSettings};
    use crate::scene::material::{Material, MatcapMaterial};
    use crate::scene::shape::ShapeKind;
    use crate::scene::{ScenePhase, ShapeSpawn, Transform};
    use glam::Vec3;

    const SIZE: (u32, u32) = (800, 600);
    const CENTRE: Vec2 = Vec2::new(400.0, 300.0);

    fn viewer(shapes: usize) -> Viewer<HeadlessPipeline> {
        let config = AppConfig {
            shape_count: shapes,
            seed: Some(5),
            ..AppConfig::default()
        };
        let pipeline = HeadlessPipeline::new(RendererSettings::default(), SIZE.0, SIZE.1);
        Viewer::new(config, pipeline, SIZE.0, SIZE.1)
    }

    fn deliver_font(viewer: &mut Viewer<HeadlessPipeline>) {
        let font = Font::from_json(TINY_TYPEFACE.as_bytes()).unwrap();
        viewer.handle_asset_event(AssetEvent::Font(Ok(font)));
    }

    /// Populated viewer with one sphere at the origin, under the centre pixel.
    fn viewer_with_target() -> Viewer<HeadlessPipeline> {
        let mut viewer = viewer(0);
        deliver_font(&mut viewer);
        let scene = viewer.scene_mut();
        let material = scene
            .materials_mut()
            .insert(Material::Matcap(MatcapMaterial { matcap: 1 }));
        scene.register(ShapeSpawn {
            shape: ShapeKind::Sphere,
            transform: Transform::default(),
            material,
        });
        viewer
    }

    #[test]
    fn pending_scene_ticks_and_ignores_clicks() {
        let mut viewer = viewer(10);
        viewer.pointer_moved(CENTRE, false);
        viewer.pointer_pressed(false);
        viewer.tick(0.5);
        viewer.pointer_released();
        assert_eq!(viewer.status().phase, ScenePhase::AssetsPending);
        assert_eq!(viewer.pipeline_mut().stats().frames, 1);
        assert!(viewer.pipeline_mut().draw_list().is_empty());
    }

    #[test]
    fn font_delivery_populates_once() {
        let mut viewer = viewer(12);
        deliver_font(&mut viewer);
        deliver_font(&mut viewer);
        let status = viewer.status();
        assert_eq!(status.phase, ScenePhase::Populated);
        assert_eq!(status.shapes, 12);
    }

    #[test]
    fn failed_font_leaves_scene_empty() {
        let mut viewer = viewer(12);
        let err = crate::assets::read_font(std::path::Path::new("/nonexistent/font.json")).unwrap_err();
        viewer.handle_asset_event(AssetEvent::Font(Err(err)));
        viewer.tick(1.0);
        assert_eq!(viewer.status().phase, ScenePhase::AssetsPending);
        assert_eq!(viewer.status().shapes, 0);
    }

    #[test]
    fn held_shape_is_not_animated() {
        let mut viewer = viewer_with_target();
        viewer.pointer_moved(CENTRE, false);
        viewer.pointer_pressed(false);
        let held = viewer.status().held.unwrap();
        let before = viewer.scene.get(held).unwrap().transform;
        viewer.tick(1.0);
        assert_eq!(viewer.scene.get(held).unwrap().transform, before);
        assert!(!viewer.orbit.enabled);

        viewer.pointer_released();
        assert!(viewer.orbit.enabled);
        viewer.tick(2.0);
        assert_ne!(viewer.scene.get(held).unwrap().transform, before);
    }

    #[test]
    fn drag_moves_shape_with_pointer() {
        let mut viewer = viewer_with_target();
        viewer.pointer_moved(CENTRE, false);
        viewer.pointer_pressed(false);
        let held = viewer.status().held.unwrap();
        viewer.pointer_moved(CENTRE + Vec2::new(80.0, 0.0), false);
        let moved = viewer.scene.get(held).unwrap().transform.position;
        assert!(moved.length() > 0.1);
        let right = viewer
            .camera
            .world_view_direction()
            .cross(Vec3::Y)
            .normalize();
        assert!(moved.dot(right) > 0.0);
    }

    #[test]
    fn panel_capture_blocks_press_but_not_release() {
        let mut viewer = viewer_with_target();
        viewer.pointer_moved(CENTRE, false);
        viewer.pointer_pressed(true);
        assert!(viewer.status().held.is_none());
        assert!(!viewer.orbit.is_rotating());

        viewer.pointer_pressed(false);
        assert!(viewer.status().held.is_some());
        viewer.pointer_released();
        assert!(viewer.status().held.is_none());
    }

    #[test]
    fn press_on_empty_space_orbits() {
        let mut viewer = viewer_with_target();
        viewer.pointer_moved(Vec2::new(20.0, 20.0), false);
        viewer.pointer_pressed(false);
        assert!(viewer.status().held.is_none());
        assert!(viewer.orbit.is_rotating());
        viewer.pointer_moved(Vec2::new(120.0, 20.0), false);
        let before = viewer.camera.position;
        viewer.tick(0.1);
        assert_ne!(viewer.camera.position, before);

        viewer.pointer_released();
        assert!(!viewer.orbit.is_rotating());
        for _ in 0..400 {
            viewer.tick(0.1);
        }
        let settled = viewer.camera.position;
        viewer.pointer_moved(Vec2::new(300.0, 200.0), false);
        viewer.pointer_moved(Vec2::new(500.0, 100.0), false);
        viewer.tick(0.1);
        assert_eq!(viewer.camera.position, settled);
    }

    #[test]
    fn hovering_without_a_press_leaves_camera_alone() {
        let mut viewer = viewer_with_target();
        let before = viewer.camera.position;
        viewer.pointer_moved(Vec2::new(100.0, 100.0), false);
        viewer.pointer_moved(Vec2::new(400.0, 250.0), false);
        assert!(!viewer.orbit.is_rotating());
        for _ in 0..30 {
            viewer.tick(0.1);
        }
        assert_eq!(viewer.camera.position, before);
    }

    #[test]
    fn losing_focus_cancels_drag() {
        let mut viewer = viewer_with_target();
        viewer.pointer_moved(CENTRE, false);
        viewer.pointer_pressed(false);
        assert!(viewer.status().held.is_some());
        viewer.focus_lost();
        assert!(viewer.status().held.is_none());
        assert!(viewer.orbit.enabled);

        viewer.pointer_pressed(false);
        viewer.cursor_left();
        assert!(viewer.status().held.is_none());
    }

    #[test]
    fn edits_flow_through_the_store() {
        let mut viewer = viewer(20);
        deliver_font(&mut viewer);
        viewer.apply_edits([
            (ControlId::ScaleBase, ParamValue::Scalar(2.0)),
            (ControlId::TextMaterialType, ParamValue::Choice("Material 7")),
        ]);
        for entity in viewer.scene.all() {
            assert!((entity.transform.scale - entity.original_scale() * 2.0).abs() < 1e-6);
        }
        let text = viewer.scene.text_material().unwrap();
        assert_eq!(
            viewer.scene.materials().get(text),
            Some(&Material::Matcap(MatcapMaterial { matcap: 7 }))
        );
    }

    #[test]
    fn mismatched_edit_is_rejected() {
        let mut viewer = viewer(1);
        viewer.apply_edits([(ControlId::Metalness, ParamValue::Choice("shiny"))]);
        assert_eq!(viewer.values().scalar(ControlId::Metalness), 1.0);
    }

    #[test]
    fn resize_updates_camera_and_ignores_minimise() {
        let mut viewer = viewer(0);
        viewer.resize(1000, 500);
        assert!((viewer.camera.aspect - 2.0).abs() < 1e-6);
        viewer.resize(0, 0);
        assert!((viewer.camera.aspect - 2.0).abs() < 1e-6);
        assert_eq!(viewer.pipeline_mut().viewport(), (1000, 500));
    }
}

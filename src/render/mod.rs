mod camera;
pub mod pick;

pub use camera::{OrbitControls, PerspectiveCamera};
pub use pick::Plane;

use crate::params::Color;
use crate::scene::material::{Material, MatcapMaterial, MaterialHandle};
use crate::scene::{AmbientLight, EntityId, SceneRegistry};
use glam::Mat4;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },
}

/// Bloom pass parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 1.5,
            radius: 0.4,
            threshold: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    pub clear_color: Color,
    pub pixel_ratio: f32,
    pub shadows_enabled: bool,
    pub bloom: BloomSettings,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            pixel_ratio: 1.0,
            shadows_enabled: true,
            bloom: BloomSettings::default(),
        }
    }
}

impl RendererSettings {
    pub const MAX_PIXEL_RATIO: f32 = 2.0;

    pub fn for_scale_factor(scale_factor: f64) -> Self {
        Self {
            pixel_ratio: (scale_factor as f32).min(Self::MAX_PIXEL_RATIO),
            ..Self::default()
        }
    }
}

/// Tessellated UI for one frame, drawn on top of the scene.
#[derive(Clone, Copy)]
pub struct OverlayFrame<'a> {
    pub primitives: &'a [egui::ClippedPrimitive],
    pub textures_delta: &'a egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Drawing backend fed by the frame loop.
pub trait RenderPipeline {
    fn render_frame(
        &mut self,
        scene: &SceneRegistry,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError>;

    /// Resize render targets, including the bloom buffers.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    fn paint_overlay(&mut self, _overlay: OverlayFrame<'_>) {}

    fn stats(&self) -> FrameStats;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSource {
    Shape(EntityId),
    Text(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub source: DrawSource,
    pub world: Mat4,
    /// View-projection times world, as uploaded per draw.
    pub clip: Mat4,
    pub material: MaterialHandle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub draws: usize,
    pub overlay_vertices: usize,
    pub overlay_textures: usize,
}

/// Lighting and textures the last frame bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBindings {
    pub ambient: AmbientLight,
    /// Size of the reflection map, when a complete one is installed.
    pub environment: Option<(u32, u32)>,
    /// Matcap slots referenced by this frame's draws that have a texture.
    pub matcaps: Vec<u8>,
}

const STATS_LOG_INTERVAL: u64 = 600;

/// Backend that records what a GPU backend would draw without touching a
/// device.
#[derive(Debug)]
pub struct HeadlessPipeline {
    settings: RendererSettings,
    viewport: (u32, u32),
    draw_list: Vec<DrawItem>,
    bindings: SceneBindings,
    stats: FrameStats,
    overlay_textures: HashSet<egui::TextureId>,
    overlay_pixels_per_point: f32,
    warned_materials: HashSet<MaterialHandle>,
}

impl HeadlessPipeline {
    pub fn new(settings: RendererSettings, width: u32, height: u32) -> Self {
        log::info!(
            "Headless pipeline {}x{} (clear {}, pixel ratio {:.1}, shadows {}, bloom {:.2}/{:.2}/{:.2})",
            width,
            height,
            settings.clear_color,
            settings.pixel_ratio,
            if settings.shadows_enabled { "on" } else { "off" },
            settings.bloom.strength,
            settings.bloom.radius,
            settings.bloom.threshold
        );
        Self {
            settings,
            viewport: (width, height),
            draw_list: Vec::new(),
            bindings: SceneBindings::default(),
            stats: FrameStats::default(),
            overlay_textures: HashSet::new(),
            overlay_pixels_per_point: 1.0,
            warned_materials: HashSet::new(),
        }
    }

    #[cfg(test)]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Size of the bloom render targets.
    pub fn bloom_size(&self) -> (u32, u32) {
        let scale = |v: u32| (v as f32 * self.settings.pixel_ratio).round() as u32;
        (scale(self.viewport.0), scale(self.viewport.1))
    }

    #[cfg(test)]
    pub fn draw_list(&self) -> &[DrawItem] {
        &self.draw_list
    }

    #[cfg(test)]
    pub fn bindings(&self) -> &SceneBindings {
        &self.bindings
    }

    fn push(
        &mut self,
        scene: &SceneRegistry,
        view_projection: Mat4,
        source: DrawSource,
        world: Mat4,
        material: MaterialHandle,
    ) {
        if !scene.materials().contains(material) {
            if self.warned_materials.insert(material) {
                log::warn!("Material {} missing; skipping draw", material.raw());
            }
            return;
        }
        self.draw_list.push(DrawItem {
            source,
            world,
            clip: view_projection * world,
            material,
        });
    }

    fn bind_scene_inputs(&mut self, scene: &SceneRegistry) {
        self.bindings.ambient = scene.ambient_light();
        self.bindings.environment = scene
            .environment()
            .filter(|environment| environment.is_complete())
            .map(|environment| (environment.width, environment.height));
        self.bindings.matcaps.clear();
        for item in &self.draw_list {
            let Some(Material::Matcap(MatcapMaterial { matcap })) =
                scene.materials().get(item.material)
            else {
                continue;
            };
            if self.bindings.matcaps.contains(matcap) {
                continue;
            }
            // Textures arrive asynchronously; until then the slot stays unbound.
            if scene.matcap(*matcap).is_some_and(|texture| texture.is_complete()) {
                self.bindings.matcaps.push(*matcap);
            }
        }
        self.bindings.matcaps.sort_unstable();
    }
}

impl RenderPipeline for HeadlessPipeline {
    fn render_frame(
        &mut self,
        scene: &SceneRegistry,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidViewport { width, height });
        }
        let view_projection = camera.view_projection();
        self.draw_list.clear();
        for entity in scene.all() {
            self.push(
                scene,
                view_projection,
                DrawSource::Shape(entity.id()),
                entity.world_matrix(),
                entity.material,
            );
        }
        for (index, mesh) in scene.text_meshes().iter().enumerate() {
            self.push(
                scene,
                view_projection,
                DrawSource::Text(index),
                Mat4::from_translation(mesh.position),
                mesh.material,
            );
        }
        self.bind_scene_inputs(scene);

        self.stats.frames += 1;
        self.stats.draws = self.draw_list.len();
        if self.stats.frames % STATS_LOG_INTERVAL == 0 {
            log::debug!(
                "Frame {}: {} draws, {} matcaps bound, environment {:?}, {} overlay vertices at {:.2} px/pt, {} overlay textures",
                self.stats.frames,
                self.stats.draws,
                self.bindings.matcaps.len(),
                self.bindings.environment,
                self.stats.overlay_vertices,
                self.overlay_pixels_per_point,
                self.stats.overlay_textures
            );
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidViewport { width, height });
        }
        self.viewport = (width, height);
        let (bloom_w, bloom_h) = self.bloom_size();
        log::info!(
            "Resized to {}x{} (bloom targets {}x{})",
            width,
            height,
            bloom_w,
            bloom_h
        );
        Ok(())
    }

    fn paint_overlay(&mut self, overlay: OverlayFrame<'_>) {
        for (id, _) in &overlay.textures_delta.set {
            self.overlay_textures.insert(*id);
        }
        for id in &overlay.textures_delta.free {
            self.overlay_textures.remove(id);
        }
        self.overlay_pixels_per_point = overlay.pixels_per_point;
        self.stats.overlay_textures = self.overlay_textures.len();
        self.stats.overlay_vertices = overlay
            .primitives
            .iter()
            .map(|clipped| match &clipped.primitive {
                egui::epaint::Primitive::Mesh(mesh) => mesh.vertices.len(),
                egui::epaint::Primitive::Callback(_) => 0,
            })
            .sum();
    }

    fn stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{EnvironmentMap, TextureImage};
    use crate::scene::shape::ShapeKind;
    use crate::scene::{ShapeSpawn, TextMesh, Transform};
    use glam::Vec3;

    fn scene() -> SceneRegistry {
        let mut scene = SceneRegistry::new();
        let material = scene
            .materials_mut()
            .insert(Material::Matcap(MatcapMaterial { matcap: 2 }));
        scene.register(ShapeSpawn {
            shape: ShapeKind::Cone,
            transform: Transform {
                position: Vec3::new(1.0, 2.0, 3.0),
                ..Transform::default()
            },
            material,
        });
        scene.replace_text_material(material);
        scene.add_text(TextMesh {
            line: "hello".to_string(),
            position: Vec3::new(-1.0, 0.0, 0.0),
            width: 2.0,
            material,
        });
        scene
    }

    #[test]
    fn pixel_ratio_is_capped() {
        assert_eq!(RendererSettings::for_scale_factor(3.0).pixel_ratio, 2.0);
        assert_eq!(RendererSettings::for_scale_factor(1.25).pixel_ratio, 1.25);
        let settings = RendererSettings::default();
        assert_eq!(settings.clear_color, Color::BLACK);
        assert_eq!(settings.bloom.threshold, 0.85);
    }

    #[test]
    fn draw_list_covers_shapes_and_text() {
        let scene = scene();
        let mut pipeline = HeadlessPipeline::new(RendererSettings::default(), 640, 480);
        pipeline
            .render_frame(&scene, &PerspectiveCamera::default())
            .unwrap();
        let sources: Vec<DrawSource> = pipeline.draw_list().iter().map(|item| item.source).collect();
        assert_eq!(
            sources,
            vec![DrawSource::Shape(scene.all()[0].id()), DrawSource::Text(0)]
        );
        let origin = pipeline.draw_list()[0].world.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert_eq!(pipeline.stats().frames, 1);
    }

    #[test]
    fn empty_scene_renders_nothing() {
        let mut pipeline = HeadlessPipeline::new(RendererSettings::default(), 640, 480);
        pipeline
            .render_frame(&SceneRegistry::new(), &PerspectiveCamera::default())
            .unwrap();
        assert!(pipeline.draw_list().is_empty());
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let mut pipeline = HeadlessPipeline::new(RendererSettings::for_scale_factor(2.0), 640, 480);
        assert!(matches!(
            pipeline.resize(0, 480),
            Err(RenderError::InvalidViewport { width: 0, height: 480 })
        ));
        assert_eq!(pipeline.viewport(), (640, 480));
        pipeline.resize(800, 600).unwrap();
        assert_eq!(pipeline.bloom_size(), (1600, 1200));
    }

    #[test]
    fn released_materials_are_not_drawn() {
        let mut scene = scene();
        let handle = scene.all()[0].material;
        scene.materials_mut().release(handle);
        let mut pipeline = HeadlessPipeline::new(RendererSettings::default(), 64, 64);
        pipeline
            .render_frame(&scene, &PerspectiveCamera::default())
            .unwrap();
        assert!(pipeline.draw_list().is_empty());
    }

    fn texture(width: u32, height: u32, bytes: usize) -> TextureImage {
        TextureImage {
            width,
            height,
            srgb: true,
            rgba: vec![128u8; bytes].into(),
        }
    }

    #[test]
    fn bindings_follow_loaded_textures() {
        let mut scene = scene();
        let mut pipeline = HeadlessPipeline::new(RendererSettings::default(), 64, 64);
        pipeline
            .render_frame(&scene, &PerspectiveCamera::default())
            .unwrap();
        assert_eq!(pipeline.bindings(), &SceneBindings::default());

        scene.set_matcap(2, texture(2, 2, 16));
        scene.set_matcap(5, texture(2, 2, 16));
        scene.set_environment(EnvironmentMap {
            width: 2,
            height: 1,
            texels: vec![[0.5; 3]; 2].into(),
        });
        pipeline
            .render_frame(&scene, &PerspectiveCamera::default())
            .unwrap();
        assert_eq!(pipeline.bindings().matcaps, vec![2]);
        assert_eq!(pipeline.bindings().environment, Some((2, 1)));
        assert_eq!(pipeline.bindings().ambient, scene.ambient_light());
    }

    #[test]
    fn truncated_textures_stay_unbound() {
        let mut scene = scene();
        scene.set_matcap(2, texture(2, 2, 7));
        scene.set_environment(EnvironmentMap {
            width: 4,
            height: 2,
            texels: vec![[0.5; 3]; 3].into(),
        });
        let mut pipeline = HeadlessPipeline::new(RendererSettings::default(), 64, 64);
        pipeline
            .render_frame(&scene, &PerspectiveCamera::default())
            .unwrap();
        assert!(pipeline.bindings().matcaps.is_empty());
        assert_eq!(pipeline.bindings().environment, None);
    }

    #[test]
    fn clip_matrix_combines_camera_and_world() {
        let scene = scene();
        let camera = PerspectiveCamera::default();
        let mut pipeline = HeadlessPipeline::new(RendererSettings::default(), 64, 64);
        pipeline.render_frame(&scene, &camera).unwrap();
        let item = pipeline.draw_list()[0];
        let expected = camera.view_projection() * item.world;
        assert!(item.clip.abs_diff_eq(expected, 1e-5));
    }
}

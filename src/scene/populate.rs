use super::material::{Material, PhysicalMaterial};
use super::shape::ShapeKind;
use super::{ScenePhase, SceneRegistry, ShapeSpawn, TextMesh, Transform};
use crate::assets::Font;
use crate::config::AppConfig;
use crate::params::{Color, ParamValues};
use crate::propagation;
use glam::Vec3;
use rand::Rng;
use std::f32::consts::PI;

pub const NEON_PALETTE: [u32; 4] = [0x00ffff, 0x0088ff, 0x00aaff, 0x55ffff];

pub const TEXT_SIZE: f32 = 0.5;
pub const TEXT_LINE_SPACING: f32 = 0.8;

/// Half-widths of the box shapes are scattered in.
const SPREAD: Vec3 = Vec3::new(8.0, 5.0, 6.0);
const MIN_SCALE: f32 = 0.15;
const SCALE_RANGE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulateSummary {
    pub text_meshes: usize,
    pub shapes: usize,
}

/// Build the text block and the shape field once the font is available.
///
/// Returns `None` if the scene was already populated.
pub fn populate_scene<R: Rng + ?Sized>(
    scene: &mut SceneRegistry,
    font: &Font,
    values: &ParamValues,
    config: &AppConfig,
    rng: &mut R,
) -> Option<PopulateSummary> {
    if scene.phase() == ScenePhase::Populated {
        log::warn!("Scene already populated; ignoring repeated font delivery");
        return None;
    }

    let text_material = propagation::rebuild_text_material(scene, values.text_material_kind(), values);
    for (i, line) in config.text_lines.iter().enumerate() {
        let width = font.line_width(line, TEXT_SIZE);
        scene.add_text(TextMesh {
            line: line.clone(),
            position: Vec3::new(-width * 0.5, -(i as f32) * TEXT_LINE_SPACING, 0.0),
            width,
            material: text_material,
        });
    }

    let scalars = values.material_scalars();
    let scale_base = values.scale_base();
    for _ in 0..config.shape_count {
        let shape = ShapeKind::ALL[rng.gen_range(0..ShapeKind::ALL.len())];
        let color = Color::from_hex(NEON_PALETTE[rng.gen_range(0..NEON_PALETTE.len())]);
        let material = scene
            .materials_mut()
            .insert(Material::Physical(PhysicalMaterial::new(color, color, scalars)));
        let position = Vec3::new(
            (rng.gen::<f32>() - 0.5) * SPREAD.x * 2.0,
            (rng.gen::<f32>() - 0.5) * SPREAD.y * 2.0,
            (rng.gen::<f32>() - 0.5) * SPREAD.z * 2.0,
        );
        let rotation = Vec3::new(
            rng.gen::<f32>() * PI,
            rng.gen::<f32>() * PI,
            rng.gen::<f32>() * PI,
        );
        let scale = MIN_SCALE + rng.gen::<f32>() * SCALE_RANGE;
        let id = scene.register(ShapeSpawn {
            shape,
            transform: Transform {
                position,
                rotation,
                scale,
            },
            material,
        });
        if let Some(entity) = scene.get_mut(id) {
            entity.apply_scale_base(scale_base);
        }
    }

    scene.mark_populated();
    Some(PopulateSummary {
        text_meshes: scene.text_meshes().len(),
        shapes: scene.len(),
    })
}

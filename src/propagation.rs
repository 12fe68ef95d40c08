//! Pushes parameter values into scene materials and transforms.
//!
//! Every shape owns its own material instance, so each pass walks the whole
//! registry. Materials that lack a field are skipped, never treated as errors.

use crate::params::{Color, ControlId, ParamValues, ParameterStore};
use crate::scene::material::{MaterialHandle, TextMaterialKind};
use crate::scene::{AmbientLight, ScenePhase, SceneRegistry};

/// Write the five shading scalars into every shape material and, when it is
/// physically shaded, the shared text material.
pub fn propagate_material_scalars(scene: &mut SceneRegistry, values: &ParamValues) {
    let scalars = values.material_scalars();
    let handles: Vec<MaterialHandle> = scene.all().iter().map(|entity| entity.material).collect();
    let materials = scene.materials_mut();
    for handle in handles {
        match materials.get_mut(handle) {
            Some(material) => {
                material.apply_scalars(&scalars);
            }
            None => log::warn!("Shape material {} is gone; skipping", handle.raw()),
        }
    }

    if let Some(handle) = scene.text_material() {
        if let Some(material) = scene.materials_mut().get_mut(handle) {
            // Matcap text has no lighting scalars.
            material.apply_scalars(&scalars);
        }
    }
}

/// Set base and emissive colour of every shape to `shapeColor`.
pub fn propagate_shape_color(scene: &mut SceneRegistry, values: &ParamValues) {
    let color = values.color(ControlId::ShapeColor);
    let handles: Vec<MaterialHandle> = scene.all().iter().map(|entity| entity.material).collect();
    let materials = scene.materials_mut();
    for handle in handles {
        let Some(material) = materials.get_mut(handle) else {
            log::warn!("Shape material {} is gone; skipping", handle.raw());
            continue;
        };
        if material.set_base_color(color) {
            material.set_emissive(color);
        }
    }
}

/// Re-derive every shape's scale from its original scale.
pub fn propagate_scale(scene: &mut SceneRegistry, values: &ParamValues) {
    let scale_base = values.scale_base();
    for entity in scene.all_mut() {
        entity.apply_scale_base(scale_base);
    }
}

/// Replace the shared text material with a fresh instance of `kind`.
///
/// The previous instance is released and every text mesh is repointed.
pub fn rebuild_text_material(
    scene: &mut SceneRegistry,
    kind: TextMaterialKind,
    values: &ParamValues,
) -> MaterialHandle {
    let handle = scene.materials_mut().insert(kind.build(values));
    let previous = scene.replace_text_material(handle);
    log::debug!(
        "Text material rebuilt as {} (handle {} replaces {:?})",
        kind,
        handle.raw(),
        previous.map(MaterialHandle::raw)
    );
    handle
}

/// Recolour the shared text material in place if it has a base colour.
pub fn set_text_color(scene: &mut SceneRegistry, color: Color) -> bool {
    let Some(handle) = scene.text_material() else {
        return false;
    };
    scene
        .materials_mut()
        .get_mut(handle)
        .is_some_and(|material| material.set_base_color(color))
}

pub fn propagate_ambient_light(scene: &mut SceneRegistry, values: &ParamValues) {
    scene.set_ambient_light(AmbientLight {
        color: values.color(ControlId::AmbientLightColor),
        intensity: values.scalar(ControlId::AmbientLightIntensity),
    });
}

/// Bind the propagation passes to their controls.
///
/// Animation speeds are read by the frame loop every tick and need no
/// subscriber.
pub fn install(store: &mut ParameterStore<SceneRegistry>) {
    store.subscribe(&ControlId::MATERIAL_SCALARS, propagate_material_scalars);
    store.subscribe(&[ControlId::ShapeColor], propagate_shape_color);
    store.subscribe(&[ControlId::ScaleBase], propagate_scale);
    store.subscribe(&[ControlId::TextMaterialType], |scene, values| {
        if scene.phase() == ScenePhase::AssetsPending {
            // Population builds the text material from the current selection.
            return;
        }
        rebuild_text_material(scene, values.text_material_kind(), values);
    });
    store.subscribe(&[ControlId::TextColor], |scene, values| {
        set_text_color(scene, values.color(ControlId::TextColor));
    });
    store.subscribe(
        &[ControlId::AmbientLightColor, ControlId::AmbientLightIntensity],
        propagate_ambient_light,
    );
}

use crate::params::{Color, ParamValues};
use std::collections::HashMap;
use std::fmt;

/// Scalar shading values pushed into every physically shaded material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialScalars {
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub emissive_intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalMaterial {
    pub color: Color,
    pub emissive: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub emissive_intensity: f32,
    pub reflectivity: f32,
}

impl PhysicalMaterial {
    pub fn new(color: Color, emissive: Color, scalars: MaterialScalars) -> Self {
        Self {
            color,
            emissive,
            metalness: scalars.metalness,
            roughness: scalars.roughness,
            clearcoat: scalars.clearcoat,
            clearcoat_roughness: scalars.clearcoat_roughness,
            emissive_intensity: scalars.emissive_intensity,
            reflectivity: 1.0,
        }
    }
}

/// Metallic-roughness material without a clearcoat layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
    pub emissive: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive_intensity: f32,
}

/// Shading baked into one of the eight matcap textures. Has no colour and
/// ignores the lighting scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcapMaterial {
    pub matcap: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Physical(PhysicalMaterial),
    Standard(StandardMaterial),
    Matcap(MatcapMaterial),
}

impl Material {
    /// Write the shading scalars this material supports. Returns `false` when
    /// the material has none of them.
    pub fn apply_scalars(&mut self, scalars: &MaterialScalars) -> bool {
        match self {
            Self::Physical(material) => {
                material.metalness = scalars.metalness;
                material.roughness = scalars.roughness;
                material.clearcoat = scalars.clearcoat;
                material.clearcoat_roughness = scalars.clearcoat_roughness;
                material.emissive_intensity = scalars.emissive_intensity;
                true
            }
            Self::Standard(material) => {
                material.metalness = scalars.metalness;
                material.roughness = scalars.roughness;
                material.emissive_intensity = scalars.emissive_intensity;
                true
            }
            Self::Matcap(_) => false,
        }
    }

    pub fn base_color(&self) -> Option<Color> {
        match self {
            Self::Physical(material) => Some(material.color),
            Self::Standard(material) => Some(material.color),
            Self::Matcap(_) => None,
        }
    }

    pub fn emissive(&self) -> Option<Color> {
        match self {
            Self::Physical(material) => Some(material.emissive),
            Self::Standard(material) => Some(material.emissive),
            Self::Matcap(_) => None,
        }
    }

    pub fn set_base_color(&mut self, color: Color) -> bool {
        match self {
            Self::Physical(material) => material.color = color,
            Self::Standard(material) => material.color = color,
            Self::Matcap(_) => return false,
        }
        true
    }

    pub fn set_emissive(&mut self, color: Color) -> bool {
        match self {
            Self::Physical(material) => material.emissive = color,
            Self::Standard(material) => material.emissive = color,
            Self::Matcap(_) => return false,
        }
        true
    }

    pub fn metalness(&self) -> Option<f32> {
        match self {
            Self::Physical(material) => Some(material.metalness),
            Self::Standard(material) => Some(material.metalness),
            Self::Matcap(_) => None,
        }
    }
}

/// Selection behind the `textMaterialType` control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMaterialKind {
    /// Matcap texture number, `1..=8`.
    Matcap(u8),
    Physical,
    Standard,
}

impl Default for TextMaterialKind {
    fn default() -> Self {
        Self::Matcap(3)
    }
}

impl TextMaterialKind {
    pub const MATCAP_COUNT: u8 = 8;

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Physical" => Some(Self::Physical),
            "Standard" => Some(Self::Standard),
            _ => {
                let index: u8 = label.strip_prefix("Material ")?.parse().ok()?;
                (1..=Self::MATCAP_COUNT)
                    .contains(&index)
                    .then_some(Self::Matcap(index))
            }
        }
    }

    /// Construct a fresh material for this kind from the current values.
    pub fn build(self, values: &ParamValues) -> Material {
        let color = values.color(crate::params::ControlId::TextColor);
        let scalars = values.material_scalars();
        match self {
            Self::Matcap(index) => Material::Matcap(MatcapMaterial { matcap: index }),
            Self::Physical => Material::Physical(PhysicalMaterial::new(
                color,
                Color::BLACK,
                scalars,
            )),
            Self::Standard => Material::Standard(StandardMaterial {
                color,
                emissive: Color::BLACK,
                metalness: scalars.metalness,
                roughness: scalars.roughness,
                emissive_intensity: scalars.emissive_intensity,
            }),
        }
    }
}

impl fmt::Display for TextMaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matcap(index) => write!(f, "Material {index}"),
            Self::Physical => f.write_str("Physical"),
            Self::Standard => f.write_str("Standard"),
        }
    }
}

/// Identity of one material instance. Handles are never reused, so two
/// handles compare equal only when they name the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(u32);

impl MaterialHandle {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Owns every live material instance.
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    next_id: u32,
    materials: HashMap<MaterialHandle, Material>,
}

impl MaterialLibrary {
    pub fn insert(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next_id);
        self.next_id += 1;
        self.materials.insert(handle, material);
        handle
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(&handle)
    }

    /// Drop an instance. Later lookups through `handle` return `None`.
    pub fn release(&mut self, handle: MaterialHandle) -> Option<Material> {
        self.materials.remove(&handle)
    }

    pub fn contains(&self, handle: MaterialHandle) -> bool {
        self.materials.contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalars() -> MaterialScalars {
        MaterialScalars {
            metalness: 0.2,
            roughness: 0.4,
            clearcoat: 0.6,
            clearcoat_roughness: 0.8,
            emissive_intensity: 2.0,
        }
    }

    #[test]
    fn labels_map_to_kinds() {
        assert_eq!(
            TextMaterialKind::from_label("Material 1"),
            Some(TextMaterialKind::Matcap(1))
        );
        assert_eq!(
            TextMaterialKind::from_label("Physical"),
            Some(TextMaterialKind::Physical)
        );
        assert_eq!(TextMaterialKind::from_label("Material 0"), None);
        assert_eq!(TextMaterialKind::from_label("Material 9"), None);
        assert_eq!(TextMaterialKind::from_label("Matcap"), None);
        for index in 1..=8 {
            let kind = TextMaterialKind::Matcap(index);
            assert_eq!(TextMaterialKind::from_label(&kind.to_string()), Some(kind));
        }
    }

    #[test]
    fn matcap_ignores_scalars_and_colour() {
        let mut material = Material::Matcap(MatcapMaterial { matcap: 2 });
        assert!(!material.apply_scalars(&scalars()));
        assert!(!material.set_base_color(Color::WHITE));
        assert_eq!(material, Material::Matcap(MatcapMaterial { matcap: 2 }));
    }

    #[test]
    fn standard_takes_supported_scalars_only() {
        let mut material = Material::Standard(StandardMaterial {
            color: Color::WHITE,
            emissive: Color::BLACK,
            metalness: 1.0,
            roughness: 1.0,
            emissive_intensity: 0.0,
        });
        assert!(material.apply_scalars(&scalars()));
        let Material::Standard(standard) = material else {
            panic!("kind changed");
        };
        assert_eq!(standard.metalness, 0.2);
        assert_eq!(standard.roughness, 0.4);
        assert_eq!(standard.emissive_intensity, 2.0);
    }

    #[test]
    fn released_handles_are_not_reissued() {
        let mut library = MaterialLibrary::default();
        let first = library.insert(Material::Matcap(MatcapMaterial { matcap: 1 }));
        assert!(library.release(first).is_some());
        let second = library.insert(Material::Matcap(MatcapMaterial { matcap: 1 }));
        assert_ne!(first, second);
        assert!(library.get(first).is_none());
        assert!(library.contains(second));
    }
}

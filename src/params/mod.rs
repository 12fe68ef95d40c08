//! Live-tunable control schema.
//!
//! Every control has a fixed name, a declared domain and a default. Values are
//! validated at the store boundary: continuous ranges snap to their step and
//! clamp, enumerations reject unknown options.

pub mod color;
mod store;

pub use color::Color;
pub use store::ParameterStore;

use crate::animation::AnimationParams;
use crate::scene::material::{MaterialScalars, TextMaterialKind};
use std::fmt;
use std::str::FromStr;

pub const TEXT_MATERIAL_OPTIONS: &[&str] = &[
    "Material 1",
    "Material 2",
    "Material 3",
    "Material 4",
    "Material 5",
    "Material 6",
    "Material 7",
    "Material 8",
    "Physical",
    "Standard",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlId {
    Metalness,
    Roughness,
    Clearcoat,
    ClearcoatRoughness,
    EmissiveIntensity,
    SpeedX,
    SpeedY,
    SpeedZ,
    RotationSpeed,
    ScaleBase,
    TextMaterialType,
    TextColor,
    ShapeColor,
    AmbientLightColor,
    AmbientLightIntensity,
}

impl ControlId {
    pub const COUNT: usize = 15;

    pub const ALL: [ControlId; Self::COUNT] = [
        Self::Metalness,
        Self::Roughness,
        Self::Clearcoat,
        Self::ClearcoatRoughness,
        Self::EmissiveIntensity,
        Self::SpeedX,
        Self::SpeedY,
        Self::SpeedZ,
        Self::RotationSpeed,
        Self::ScaleBase,
        Self::TextMaterialType,
        Self::TextColor,
        Self::ShapeColor,
        Self::AmbientLightColor,
        Self::AmbientLightIntensity,
    ];

    /// Controls that feed the per-material scalar pass.
    pub const MATERIAL_SCALARS: [ControlId; 5] = [
        Self::Metalness,
        Self::Roughness,
        Self::Clearcoat,
        Self::ClearcoatRoughness,
        Self::EmissiveIntensity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Metalness => "metalness",
            Self::Roughness => "roughness",
            Self::Clearcoat => "clearcoat",
            Self::ClearcoatRoughness => "clearcoatRoughness",
            Self::EmissiveIntensity => "emissiveIntensity",
            Self::SpeedX => "speedX",
            Self::SpeedY => "speedY",
            Self::SpeedZ => "speedZ",
            Self::RotationSpeed => "rotationSpeed",
            Self::ScaleBase => "scaleBase",
            Self::TextMaterialType => "textMaterialType",
            Self::TextColor => "textColor",
            Self::ShapeColor => "shapeColor",
            Self::AmbientLightColor => "ambientLightColor",
            Self::AmbientLightIntensity => "ambientLightIntensity",
        }
    }

    /// Label shown next to the widget in the control panel.
    pub fn label(self) -> &'static str {
        match self {
            Self::Metalness => "Metalness",
            Self::Roughness => "Roughness",
            Self::Clearcoat => "Clearcoat",
            Self::ClearcoatRoughness => "Clearcoat Roughness",
            Self::EmissiveIntensity => "Emissive Intensity",
            Self::SpeedX => "Speed X",
            Self::SpeedY => "Speed Y",
            Self::SpeedZ => "Speed Z",
            Self::RotationSpeed => "Rotation Speed",
            Self::ScaleBase => "Base Scale",
            Self::TextMaterialType => "Text Material",
            Self::TextColor => "Text Color",
            Self::ShapeColor => "Shapes Color",
            Self::AmbientLightColor => "Ambient Color",
            Self::AmbientLightIntensity => "Ambient Intensity",
        }
    }

    pub fn domain(self) -> ControlDomain {
        match self {
            Self::Metalness | Self::Roughness | Self::Clearcoat | Self::ClearcoatRoughness => {
                ControlDomain::Range {
                    min: 0.0,
                    max: 1.0,
                    step: 0.01,
                }
            }
            Self::EmissiveIntensity => ControlDomain::Range {
                min: 0.0,
                max: 5.0,
                step: 0.01,
            },
            Self::SpeedX | Self::SpeedY | Self::SpeedZ => ControlDomain::Range {
                min: 0.0,
                max: 10.0,
                step: 0.01,
            },
            Self::RotationSpeed => ControlDomain::Range {
                min: 0.0,
                max: 0.05,
                step: 0.0001,
            },
            Self::ScaleBase => ControlDomain::Range {
                min: 0.1,
                max: 3.0,
                step: 0.01,
            },
            Self::TextMaterialType => ControlDomain::Options(TEXT_MATERIAL_OPTIONS),
            Self::TextColor | Self::ShapeColor | Self::AmbientLightColor => ControlDomain::Color,
            Self::AmbientLightIntensity => ControlDomain::AtLeast { min: 0.0 },
        }
    }

    pub fn default_value(self) -> ParamValue {
        match self {
            Self::Metalness => ParamValue::Scalar(1.0),
            Self::Roughness => ParamValue::Scalar(0.1),
            Self::Clearcoat => ParamValue::Scalar(1.0),
            Self::ClearcoatRoughness => ParamValue::Scalar(0.0),
            Self::EmissiveIntensity => ParamValue::Scalar(0.7),
            Self::SpeedX => ParamValue::Scalar(0.4),
            Self::SpeedY => ParamValue::Scalar(0.3),
            Self::SpeedZ => ParamValue::Scalar(0.35),
            Self::RotationSpeed => ParamValue::Scalar(0.003),
            Self::ScaleBase => ParamValue::Scalar(1.0),
            Self::TextMaterialType => ParamValue::Choice("Material 3"),
            Self::TextColor | Self::ShapeColor => ParamValue::Color(Color::from_hex(0x00ffff)),
            Self::AmbientLightColor => ParamValue::Color(Color::from_hex(0x222222)),
            Self::AmbientLightIntensity => ParamValue::Scalar(0.6),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlId {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|control| control.name() == s)
            .ok_or_else(|| ParamError::UnknownControl(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlDomain {
    Range { min: f32, max: f32, step: f32 },
    AtLeast { min: f32 },
    Options(&'static [&'static str]),
    Color,
}

/// A value that passed domain validation, possibly after clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accepted {
    pub value: ParamValue,
    pub clamped: bool,
}

impl ControlDomain {
    pub fn accept(self, control: ControlId, input: ParamInput<'_>) -> Result<Accepted, ParamError> {
        match (self, input) {
            (Self::Range { min, max, step }, ParamInput::Scalar(value)) => {
                if !value.is_finite() {
                    return Err(ParamError::NotFinite(control));
                }
                let snapped = snap_to_step(value, min, max, step);
                let tolerance = step.max(f32::EPSILON) * 1e-3;
                Ok(Accepted {
                    value: ParamValue::Scalar(snapped),
                    clamped: (snapped - value).abs() > tolerance,
                })
            }
            (Self::AtLeast { min }, ParamInput::Scalar(value)) => {
                if !value.is_finite() {
                    return Err(ParamError::NotFinite(control));
                }
                Ok(Accepted {
                    value: ParamValue::Scalar(value.max(min)),
                    clamped: value < min,
                })
            }
            (Self::Options(options), ParamInput::Choice(label)) => options
                .iter()
                .find(|option| **option == label)
                .map(|option| Accepted {
                    value: ParamValue::Choice(*option),
                    clamped: false,
                })
                .ok_or_else(|| ParamError::UnknownOption {
                    control,
                    option: label.to_string(),
                }),
            (Self::Color, ParamInput::Color(color)) => {
                if !color.is_finite() {
                    return Err(ParamError::NotFinite(control));
                }
                let saturated = color.saturate();
                Ok(Accepted {
                    value: ParamValue::Color(saturated),
                    clamped: saturated != color,
                })
            }
            (domain, _) => Err(ParamError::TypeMismatch {
                control,
                expected: domain.kind_name(),
            }),
        }
    }

    fn kind_name(self) -> &'static str {
        match self {
            Self::Range { .. } | Self::AtLeast { .. } => "numeric",
            Self::Options(_) => "option",
            Self::Color => "colour",
        }
    }
}

fn snap_to_step(value: f32, min: f32, max: f32, step: f32) -> f32 {
    let snapped = if step > 0.0 {
        min + ((value - min) / step).round() * step
    } else {
        value
    };
    snapped.clamp(min, max)
}

/// A validated control value as stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    Color(Color),
    Choice(&'static str),
}

impl ParamValue {
    pub fn as_scalar(self) -> Option<f32> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_color(self) -> Option<Color> {
        match self {
            Self::Color(color) => Some(color),
            _ => None,
        }
    }

    pub fn as_choice(self) -> Option<&'static str> {
        match self {
            Self::Choice(label) => Some(label),
            _ => None,
        }
    }
}

/// An unvalidated write request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamInput<'a> {
    Scalar(f32),
    Color(Color),
    Choice(&'a str),
}

impl From<f32> for ParamInput<'_> {
    fn from(value: f32) -> Self {
        Self::Scalar(value)
    }
}

impl From<Color> for ParamInput<'_> {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl<'a> From<&'a str> for ParamInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Choice(value)
    }
}

impl From<ParamValue> for ParamInput<'static> {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Scalar(v) => Self::Scalar(v),
            ParamValue::Color(c) => Self::Color(c),
            ParamValue::Choice(label) => Self::Choice(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown control '{0}'")]
    UnknownControl(String),
    #[error("'{option}' is not an option of {control}")]
    UnknownOption { control: ControlId, option: String },
    #[error("{control} expects a {expected} value")]
    TypeMismatch {
        control: ControlId,
        expected: &'static str,
    },
    #[error("{0} rejects non-finite values")]
    NotFinite(ControlId),
}

/// Current value of every control.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValues {
    values: [ParamValue; ControlId::COUNT],
}

impl Default for ParamValues {
    fn default() -> Self {
        Self {
            values: ControlId::ALL.map(ControlId::default_value),
        }
    }
}

impl ParamValues {
    pub fn get(&self, control: ControlId) -> ParamValue {
        self.values[control.index()]
    }

    pub fn scalar(&self, control: ControlId) -> f32 {
        self.get(control).as_scalar().unwrap_or_default()
    }

    pub fn color(&self, control: ControlId) -> Color {
        self.get(control).as_color().unwrap_or(Color::WHITE)
    }

    pub fn choice(&self, control: ControlId) -> &'static str {
        self.get(control).as_choice().unwrap_or_default()
    }

    pub fn material_scalars(&self) -> MaterialScalars {
        MaterialScalars {
            metalness: self.scalar(ControlId::Metalness),
            roughness: self.scalar(ControlId::Roughness),
            clearcoat: self.scalar(ControlId::Clearcoat),
            clearcoat_roughness: self.scalar(ControlId::ClearcoatRoughness),
            emissive_intensity: self.scalar(ControlId::EmissiveIntensity),
        }
    }

    pub fn animation(&self) -> AnimationParams {
        AnimationParams {
            speed_x: self.scalar(ControlId::SpeedX),
            speed_y: self.scalar(ControlId::SpeedY),
            speed_z: self.scalar(ControlId::SpeedZ),
            rotation_speed: self.scalar(ControlId::RotationSpeed),
        }
    }

    pub fn scale_base(&self) -> f32 {
        self.scalar(ControlId::ScaleBase)
    }

    pub fn text_material_kind(&self) -> TextMaterialKind {
        TextMaterialKind::from_label(self.choice(ControlId::TextMaterialType))
            .unwrap_or_default()
    }

    fn write(&mut self, control: ControlId, value: ParamValue) {
        self.values[control.index()] = value;
    }
}

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct TypefaceFile {
    glyphs: HashMap<String, GlyphRecord>,
    #[serde(rename = "familyName", default)]
    family_name: String,
    resolution: f32,
}

#[derive(Debug, Deserialize)]
struct GlyphRecord {
    ha: f32,
}

/// Glyph metrics from a typeface JSON font. Outlines are left to the
/// geometry backend; layout only needs advances.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    family_name: String,
    resolution: f32,
    advances: HashMap<char, f32>,
}

impl Font {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let file: TypefaceFile = serde_json::from_slice(bytes)?;
        let advances = file
            .glyphs
            .into_iter()
            .filter_map(|(key, glyph)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some((ch, glyph.ha)),
                    _ => None,
                }
            })
            .collect();
        Ok(Self {
            family_name: file.family_name,
            resolution: file.resolution.max(1.0),
            advances,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn glyph_count(&self) -> usize {
        self.advances.len()
    }

    /// Horizontal extent of `text` at `size` world units per em.
    ///
    /// Characters without a glyph fall back to `?`, then to zero width.
    pub fn line_width(&self, text: &str, size: f32) -> f32 {
        let scale = size / self.resolution;
        let fallback = self.advances.get(&'?').copied().unwrap_or(0.0);
        text.chars()
            .map(|ch| self.advances.get(&ch).copied().unwrap_or(fallback))
            .sum::<f32>()
            * scale
    }
}

/// Minimal typeface used by tests across the crate.
#[cfg(test)]
pub(crate) const TINY_TYPEFACE: &str = r#"{
    "familyName": "Tiny",
    "resolution": 1000,
    "underlineThickness": 50,
    "boundingBox": { "yMin": -200, "xMin": 0, "yMax": 800, "xMax": 900 },
    "glyphs": {
        "A": { "ha": 600, "x_min": 0, "x_max": 600, "o": "m 0 0 l 600 0" },
        "B": { "ha": 400, "o": "" },
        "?": { "ha": 500 },
        " ": { "ha": 250 }
    }
}"#;

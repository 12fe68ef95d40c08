use std::path::PathBuf;

const DEFAULT_TEXT_LINES: [&str; 4] = [
    "Eddie Jonathan Garcia Borbon",
    "Digital Artist",
    "STEAM Educator",
    "Music Composer",
];

/// Startup settings. Defaults reproduce the stock scene; a few fields can be
/// overridden through `NEONFIELD_*` environment variables.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub asset_root: PathBuf,
    pub shape_count: usize,
    /// Fixed seed for shape placement; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub text_lines: Vec<String>,
    pub window_size: [u32; 2],
    pub window_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
            shape_count: 120,
            seed: None,
            text_lines: DEFAULT_TEXT_LINES.iter().map(|line| line.to_string()).collect(),
            window_size: [1280, 720],
            window_title: "Neonfield".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Overlay values from `lookup`. Unparsable values are logged and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("NEONFIELD_ASSETS") {
            self.asset_root = PathBuf::from(root);
        }
        if let Some(raw) = lookup("NEONFIELD_SEED") {
            match raw.trim().parse() {
                Ok(seed) => self.seed = Some(seed),
                Err(err) => log::warn!("Ignoring NEONFIELD_SEED={:?}: {}", raw, err),
            }
        }
        if let Some(raw) = lookup("NEONFIELD_SHAPES") {
            match raw.trim().parse() {
                Ok(count) => self.shape_count = count,
                Err(err) => log::warn!("Ignoring NEONFIELD_SHAPES={:?}: {}", raw, err),
            }
        }
    }

    pub fn font_path(&self) -> PathBuf {
        self.asset_root
            .join("fonts")
            .join("helvetiker_regular.typeface.json")
    }

    pub fn matcap_path(&self, index: u8) -> PathBuf {
        self.asset_root
            .join("textures")
            .join("matcaps")
            .join(format!("{index}.png"))
    }

    pub fn environment_path(&self) -> PathBuf {
        self.asset_root
            .join("textures")
            .join("environmentMap")
            .join("2k.hdr")
    }
}

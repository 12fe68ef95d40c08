//! Background asset loading.
//!
//! Each request runs on its own worker thread and reports back through a
//! channel. Results are only applied on the main thread when `poll` is
//! called, so scene state is never touched off-thread. There are no retries:
//! a failed load is reported once and the dependent content stays absent.

pub mod font;

pub use font::Font;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read asset at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse typeface JSON at {path}: {source}")]
    ParseFont {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode image at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded 8-bit RGBA texture.
#[derive(Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    /// Colour data is sRGB-encoded and must be linearised when sampled.
    pub srgb: bool,
    pub rgba: Arc<[u8]>,
}

impl TextureImage {
    /// Whether the pixel buffer covers the declared size.
    pub fn is_complete(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == self.width as usize * self.height as usize * 4
    }
}

impl fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("srgb", &self.srgb)
            .finish_non_exhaustive()
    }
}

/// Equirectangular HDR map installed as the scene's reflection source.
#[derive(Clone)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    pub texels: Arc<[[f32; 3]]>,
}

impl EnvironmentMap {
    pub fn is_complete(&self) -> bool {
        self.width > 0 && self.height > 0 && self.texels.len() == self.width as usize * self.height as usize
    }
}

impl fmt::Debug for EnvironmentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum AssetEvent {
    Font(Result<Font, AssetError>),
    Matcap {
        index: u8,
        result: Result<TextureImage, AssetError>,
    },
    Environment(Result<EnvironmentMap, AssetError>),
}

pub struct AssetLoader {
    sender: Sender<AssetEvent>,
    receiver: Receiver<AssetEvent>,
    in_flight: usize,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn load_font(&mut self, path: PathBuf) {
        self.spawn("font", move || AssetEvent::Font(read_font(&path)));
    }

    pub fn load_matcap(&mut self, index: u8, path: PathBuf) {
        self.spawn("matcap", move || AssetEvent::Matcap {
            index,
            result: read_texture(&path, true),
        });
    }

    pub fn load_environment(&mut self, path: PathBuf) {
        self.spawn("environment", move || {
            AssetEvent::Environment(read_environment(&path))
        });
    }

    /// Requests that have not reported back yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Drain every finished load without blocking.
    pub fn poll(&mut self) -> Vec<AssetEvent> {
        let events: Vec<AssetEvent> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(events.len());
        events
    }

    #[cfg(test)]
    fn wait(&mut self, timeout: std::time::Duration) -> Option<AssetEvent> {
        let event = self.receiver.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(event)
    }

    fn spawn<F>(&mut self, label: &str, job: F)
    where
        F: FnOnce() -> AssetEvent + Send + 'static,
    {
        self.in_flight += 1;
        let sender = self.sender.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-{label}"))
            .spawn(move || {
                // The receiver only disappears during shutdown.
                let _ = sender.send(job());
            });
        if let Err(err) = spawned {
            log::warn!("Could not start {} loader thread: {}", label, err);
            self.in_flight -= 1;
        }
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| AssetError::Read {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_font(path: &Path) -> Result<Font, AssetError> {
    let bytes = read_bytes(path)?;
    Font::from_json(&bytes).map_err(|source| AssetError::ParseFont {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_texture(path: &Path, srgb: bool) -> Result<TextureImage, AssetError> {
    let bytes = read_bytes(path)?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    let rgba = image.to_rgba8();
    Ok(TextureImage {
        width: rgba.width(),
        height: rgba.height(),
        srgb,
        rgba: rgba.into_raw().into(),
    })
}

pub fn read_environment(path: &Path) -> Result<EnvironmentMap, AssetError> {
    let bytes = read_bytes(path)?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    let rgb = image.to_rgb32f();
    let texels: Vec<[f32; 3]> = rgb.pixels().map(|pixel| pixel.0).collect();
    Ok(EnvironmentMap {
        width: rgb.width(),
        height: rgb.height(),
        texels: texels.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn font_load_reports_through_poll() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.typeface.json");
        std::fs::write(&path, font::TINY_TYPEFACE).unwrap();

        let mut loader = AssetLoader::new();
        loader.load_font(path);
        assert_eq!(loader.in_flight(), 1);
        let event = loader.wait(Duration::from_secs(5)).unwrap();
        match event {
            AssetEvent::Font(Ok(font)) => assert_eq!(font.family_name(), "Tiny"),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn missing_font_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_font(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }

    #[test]
    fn malformed_font_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_font(&path).unwrap_err(),
            AssetError::ParseFont { .. }
        ));
    }

    #[test]
    fn matcap_png_decodes_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut loader = AssetLoader::new();
        loader.load_matcap(1, path);
        match loader.wait(Duration::from_secs(5)).unwrap() {
            AssetEvent::Matcap { index, result } => {
                let texture = result.unwrap();
                assert_eq!(index, 1);
                assert_eq!((texture.width, texture.height), (4, 2));
                assert!(texture.is_complete());
                assert!(texture.srgb);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn garbage_image_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2k.hdr");
        std::fs::write(&path, b"definitely not radiance").unwrap();
        assert!(matches!(
            read_environment(&path).unwrap_err(),
            AssetError::Decode { .. }
        ));
    }
}

//! Pointer handling: client-space conversion and the shape drag controller.

mod drag;

pub use drag::{DragController, PointerDownOutcome};

use glam::Vec2;

/// Last known pointer position and the viewport it is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    viewport: (u32, u32),
    client: Option<Vec2>,
}

impl PointerState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            client: None,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport.1 as f32
    }

    pub fn moved_to(&mut self, client: Vec2) {
        self.client = Some(client);
    }

    pub fn left(&mut self) {
        self.client = None;
    }

    pub fn client(&self) -> Option<Vec2> {
        self.client
    }

    /// Current position in normalized device coordinates.
    pub fn ndc(&self) -> Option<Vec2> {
        self.client.and_then(|client| self.to_ndc(client))
    }

    /// `x` grows right and `y` grows up, both spanning `[-1, 1]`.
    /// `None` while the viewport has no area.
    pub fn to_ndc(&self, client: Vec2) -> Option<Vec2> {
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Vec2::new(
            client.x / width as f32 * 2.0 - 1.0,
            -(client.y / height as f32) * 2.0 + 1.0,
        ))
    }
}

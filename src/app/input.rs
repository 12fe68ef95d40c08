use super::viewer::PIXELS_PER_WHEEL_LINE;
use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pointer input the viewer reacts to, reduced from raw window events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(Vec2),
    Pressed,
    Released,
    Left,
    /// Wheel motion in lines; positive scrolls away from the user.
    Wheel(f32),
}

pub fn pointer_event(event: &WindowEvent) -> Option<PointerEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(PointerEvent::Moved(Vec2::new(
            position.x as f32,
            position.y as f32,
        ))),
        WindowEvent::CursorLeft { .. } => Some(PointerEvent::Left),
        WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } => Some(match state {
            ElementState::Pressed => PointerEvent::Pressed,
            ElementState::Released => PointerEvent::Released,
        }),
        WindowEvent::MouseWheel { delta, .. } => Some(PointerEvent::Wheel(wheel_lines(*delta))),
        _ => None,
    }
}

pub fn wheel_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_WHEEL_LINE,
    }
}

pub fn is_exit_key(key: PhysicalKey, state: ElementState) -> bool {
    state == ElementState::Pressed && key == PhysicalKey::Code(KeyCode::Escape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn wheel_pixels_scale_to_lines() {
        assert_eq!(wheel_lines(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 100.0));
        assert_eq!(wheel_lines(pixels), 2.0);
    }

    #[test]
    fn escape_press_exits() {
        let escape = PhysicalKey::Code(KeyCode::Escape);
        assert!(is_exit_key(escape, ElementState::Pressed));
        assert!(!is_exit_key(escape, ElementState::Released));
        assert!(!is_exit_key(PhysicalKey::Code(KeyCode::KeyQ), ElementState::Pressed));
    }
}

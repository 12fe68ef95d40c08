use std::time::{Duration, Instant};
use winit::window::Window;

/// Monotonic seconds since the viewer started; drives the animation phase.
#[derive(Debug, Clone, Copy)]
pub struct SceneClock {
    start: Instant,
}

impl SceneClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_at(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }
}

/// Frame cadence bookkeeping and the fps readout in the window title.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Instant,
    frame_count: u32,
    frame_dt: f32,
    render_ms: f32,
    base_title: String,
}

const TITLE_REFRESH: Duration = Duration::from_millis(500);

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: Instant::now(),
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            render_ms: 0.0,
            base_title,
        }
    }

    pub fn set_render_ms(&mut self, render_ms: f32) {
        self.render_ms = render_ms;
    }

    /// Record a frame at `now`. Returns a new title twice per second.
    pub fn record(&mut self, now: Instant) -> Option<String> {
        let dt = self
            .last_frame_time
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::from_millis(16));
        self.last_frame_time = Some(now);
        self.frame_dt = dt.as_secs_f32();
        self.frame_count = self.frame_count.saturating_add(1);

        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed < TITLE_REFRESH {
            return None;
        }
        let fps = self.frame_count as f32 / elapsed.as_secs_f32();
        self.frame_count = 0;
        self.last_fps_time = now;
        Some(format!(
            "{} - {:.1} fps (cadence {:.2} ms, render {:.2} ms)",
            self.base_title,
            fps,
            self.frame_dt * 1000.0,
            self.render_ms
        ))
    }

    pub fn update(&mut self, window: &Window, now: Instant) {
        if let Some(title) = self.record(now) {
            window.set_title(&title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_refreshes_every_half_second() {
        let mut timing = FrameTiming::new("Neonfield".to_string());
        let start = Instant::now();
        timing.last_fps_time = start;
        assert!(timing.record(start + Duration::from_millis(100)).is_none());
        assert!(timing.record(start + Duration::from_millis(200)).is_none());
        let title = timing
            .record(start + Duration::from_millis(500))
            .unwrap();
        assert!(title.starts_with("Neonfield - 6.0 fps"), "{title}");
        assert!(title.contains("cadence 300.00 ms"), "{title}");
    }

    #[test]
    fn clock_counts_from_start() {
        let clock = SceneClock::start();
        let later = clock.start + Duration::from_millis(1500);
        assert!((clock.elapsed_at(later) - 1.5).abs() < 1e-6);
        assert_eq!(clock.elapsed_at(clock.start - Duration::from_millis(1)), 0.0);
    }
}

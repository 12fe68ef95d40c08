mod egui_host;
mod input;
mod timing;
mod viewer;

use crate::config::AppConfig;
use crate::render::{HeadlessPipeline, RenderPipeline, RendererSettings};
use crate::ui::ControlPanel;
use egui_host::EguiHost;
use input::PointerEvent;
use timing::{FrameTiming, SceneClock};
use viewer::Viewer;

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    egui: Option<EguiHost>,
    panel: ControlPanel,
    viewer: Option<Viewer<HeadlessPipeline>>,
    timing: FrameTiming,
    clock: SceneClock,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    fatal: Option<AppError>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let timing = FrameTiming::new(config.window_title.clone());
        Self {
            config,
            window: None,
            egui: None,
            panel: ControlPanel::new(),
            viewer: None,
            timing,
            clock: SceneClock::start(),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            fatal: None,
        }
    }

    fn init_viewer(&mut self, window: &Window) {
        let size = window.inner_size();
        let settings = RendererSettings::for_scale_factor(window.scale_factor());
        log::info!(
            "Viewport {}x{} at pixel ratio {:.2}",
            size.width,
            size.height,
            settings.pixel_ratio
        );
        let pipeline = HeadlessPipeline::new(settings, size.width, size.height);
        let mut viewer = Viewer::new(self.config.clone(), pipeline, size.width, size.height);
        viewer.start_loading();
        self.viewer = Some(viewer);
        self.egui = Some(EguiHost::new(window));
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_pointer(&mut self, event: PointerEvent, ui_captured: bool) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        match event {
            PointerEvent::Moved(client) => viewer.pointer_moved(client, ui_captured),
            PointerEvent::Pressed => viewer.pointer_pressed(ui_captured),
            PointerEvent::Released => viewer.pointer_released(),
            PointerEvent::Left => viewer.cursor_left(),
            PointerEvent::Wheel(lines) => viewer.wheel(lines, ui_captured),
        }
    }

    fn redraw(&mut self) {
        let frame_start = Instant::now();
        let (Some(window), Some(egui), Some(viewer)) =
            (self.window.clone(), self.egui.as_mut(), self.viewer.as_mut())
        else {
            return;
        };

        viewer.poll_assets();

        let panel = &mut self.panel;
        let status = viewer.status();
        let mut edits = Vec::new();
        let output = egui.run_ui(&window, |ctx| {
            edits = panel.show(ctx, viewer.values(), &status);
        });
        viewer.apply_edits(edits);

        viewer.tick(self.clock.elapsed_at(frame_start));
        viewer.pipeline_mut().paint_overlay(output.overlay());

        self.timing
            .set_render_ms(frame_start.elapsed().as_secs_f32() * 1000.0);
        self.timing.update(&window, frame_start);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let [width, height] = self.config.window_size;
        let window_attrs = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                self.fatal = Some(err.into());
                event_loop.exit();
                return;
            }
        };

        self.init_viewer(&window);
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let ui_captured = match (&mut self.egui, &self.window) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };

        if let Some(pointer) = input::pointer_event(&event) {
            self.handle_pointer(pointer, ui_captured);
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if input::is_exit_key(event.physical_key, event.state) {
                    event_loop.exit();
                }
            }
            WindowEvent::Focused(false) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.focus_lost();
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.resize(new_size.width, new_size.height);
                }
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = AppConfig::from_env();
    log::info!("{} starting with {} shapes", config.window_title, config.shape_count);
    log::info!("   Press ESC or close window to exit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    if let Some(err) = app.fatal.take() {
        return Err(err);
    }

    log::info!("Goodbye");
    Ok(())
}

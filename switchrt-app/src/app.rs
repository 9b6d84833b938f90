use std::sync::Arc;

use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use switchrt_experiment::{
    AuthService, ExperimentConfig, ExperimentEvent, ExperimentStateMachine, JsonFileStore,
    MemoryAuth, NextStep, Route, SessionToken,
};
use switchrt_render::{SkiaRenderer, caption};
use switchrt_timing::{HighPrecisionTimer, Timer};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    experiment: ExperimentStateMachine<HighPrecisionTimer, ThreadRng>,
    /// Times render passes; separate from the experiment clock.
    frame_timer: HighPrecisionTimer,
    auth: MemoryAuth,
    token: SessionToken,
    store: JsonFileStore,
    windowed: bool,
    title: String,
    refresh_rate: Option<f64>,
    should_exit: bool,
}

impl App {
    pub fn new(
        config: ExperimentConfig,
        route: Route,
        auth: MemoryAuth,
        token: SessionToken,
        store: JsonFileStore,
        windowed: bool,
    ) -> Result<Self> {
        let mut experiment =
            ExperimentStateMachine::new(config, HighPrecisionTimer::new(), rand::rng());
        experiment
            .enter_route(route, &auth, &token)
            .with_context(|| format!("cannot enter {route}"))?;

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            experiment,
            frame_timer: HighPrecisionTimer::new(),
            auth,
            token,
            store,
            windowed,
            title: String::new(),
            refresh_rate: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            os = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            results = %self.store.path().display(),
            "starting; Z/X/N/M respond, Space continues, Esc exits"
        );
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .context("no monitor available")?;
        self.refresh_rate = monitor
            .refresh_rate_millihertz()
            .map(|rate| f64::from(rate) / 1000.0);

        self.title = caption(&self.experiment.screen());
        let mut attributes = Window::default_attributes().with_title(self.title.clone());
        if !self.windowed {
            attributes = attributes
                .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
                .with_resizable(false);
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            refresh_hz = ?self.refresh_rate,
            "display configured"
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);
        self.renderer = Some(SkiaRenderer::new(size.width, size.height)?);

        if !self.windowed {
            window.set_cursor_visible(false);
        }
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let screen = self.experiment.screen();

        let title = caption(&screen);
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }

        let stats = renderer.render_frame(&screen, pixels.frame_mut(), &mut self.frame_timer)?;
        let t = self.frame_timer.now();
        pixels.render()?;
        if stats.redrawn {
            debug!(
                present_ms = self.frame_timer.elapsed(t).as_secs_f64() * 1e3,
                clear_ms = stats.clear.as_secs_f64() * 1e3,
                draw_ms = stats.draw.as_secs_f64() * 1e3,
                copy_ms = stats.copy.as_secs_f64() * 1e3,
                "frame"
            );
        }
        Ok(())
    }

    fn update(&mut self) {
        self.experiment.pump();
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if event.repeat {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => self.cleanup_and_exit(event_loop),
            Key::Named(NamedKey::Space | NamedKey::Enter) => self.continue_from_stats(),
            Key::Character(text) => {
                if let Some(c) = response_char(text) {
                    self.experiment.handle_event(ExperimentEvent::KeyPressed(c));
                }
            }
            _ => {}
        }
    }

    fn continue_from_stats(&mut self) {
        match self.experiment.continue_action() {
            NextStep::Wait => {}
            NextStep::Navigate(route) => {
                if let Err(e) = self.experiment.enter_route(route, &self.auth, &self.token) {
                    error!(error = %e, %route, "cannot continue");
                }
            }
            NextStep::Submit => {
                match self
                    .experiment
                    .submit(&self.auth, &self.token, &mut self.store)
                {
                    Ok(id) => {
                        info!(session = id, "run complete");
                        self.auth.logout(&self.token);
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(error = %e, "submission failed; press Space to retry");
                    }
                    Err(e) => error!(error = %e, "submission rejected"),
                }
            }
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                warn!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(size.width, size.height) {
                warn!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(size.width, size.height) {
                warn!(error = %e, "failed to resize canvas");
            }
        }
        debug!(width = size.width, height = size.height, "display resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            return;
        }
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.experiment.leave();
        self.auth.logout(&self.token);

        let stats = self.frame_timer.frame_stats();
        info!(
            frames = stats.samples,
            mean_ms = stats.average_frame_time_ns / 1e6,
            jitter_ms = stats.jitter_ns / 1e6,
            fps = stats.effective_fps,
            "render timing"
        );

        self.should_exit = true;
        event_loop.exit();
    }
}

/// One key press is one response, even when the platform composes several
/// characters for it.
fn response_char(text: &str) -> Option<char> {
    text.chars().next()
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    error!(error = %e, "render failed");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_key(&event, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_text_yields_one_response() {
        assert_eq!(response_char("z"), Some('z'));
        assert_eq!(response_char("zx"), Some('z'));
        assert_eq!(response_char("ñm"), Some('ñ'));
        assert_eq!(response_char(""), None);
    }
}

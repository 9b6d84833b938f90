use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use switchrt_core::{Screen, SessionKind};
use switchrt_timing::Timer;
use tiny_skia::{Color, Paint, Pixmap, PixmapPaint, Rect, Transform};

use crate::digits::{cell_size, layout_number, segments};

const INK: [u8; 4] = [34, 34, 34, 255];
const STIMULUS_INK: [u8; 4] = [255, 255, 255, 255];
/// Band across the top of the stats screen after a failed submission.
const ALERT: [u8; 4] = [200, 40, 40, 255];

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    /// False when the screen was unchanged and the frame left as is.
    pub redrawn: bool,
}

/// Window title for a screen. Carries the words the digit canvas cannot.
pub fn caption(screen: &Screen) -> String {
    match screen {
        Screen::Idle => "Colour/number task".to_string(),
        Screen::Countdown { .. } => "Get ready".to_string(),
        Screen::Stimulus(_) => "Blue: Z < 5 < X    Pink: N odd, M even".to_string(),
        Screen::Stats {
            kind,
            correct_count,
            average_reaction_time_ms,
            submit_failed,
        } => {
            let next = match (*kind, *submit_failed) {
                (_, true) => "Submission failed. Space to retry",
                (SessionKind::Short, false) => "Space: start test",
                (SessionKind::Long, false) => "Space: submit",
            };
            format!(
                "{}: {correct_count} correct, {average_reaction_time_ms} ms average. {next}",
                kind.results_title()
            )
        }
        Screen::Complete => "Results submitted. Thank you".to_string(),
    }
}

pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    canvas: Pixmap,
    /// Rendered digits keyed by digit, ink and pixel height.
    glyphs: HashMap<(u8, [u8; 4], u32), Pixmap>,
    last_screen: Option<Screen>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        Ok(Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            canvas,
            glyphs: HashMap::new(),
            last_screen: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        self.width = width;
        self.height = height;
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
        self.glyphs.clear();
        self.last_screen = None;
        Ok(())
    }

    fn digit_height(&self) -> f32 {
        (self.height as f32 * 0.25).max(8.0)
    }

    /// Draws `screen` into `frame` (RGBA, row-major) when it differs from the
    /// previous frame.
    pub fn render_frame<T: Timer>(
        &mut self,
        screen: &Screen,
        frame: &mut [u8],
        timer: &mut T,
    ) -> Result<RenderStats> {
        let expected = self.width as usize * self.height as usize * 4;
        if frame.len() != expected {
            bail!(
                "frame buffer holds {} bytes, expected {expected} for {}x{}",
                frame.len(),
                self.width,
                self.height
            );
        }
        if self.last_screen.as_ref() == Some(screen) {
            return Ok(RenderStats::default());
        }

        let t_clear = {
            let t = timer.now();
            let [r, g, b, a] = screen.background();
            self.canvas.fill(Color::from_rgba8(r, g, b, a));
            timer.elapsed(t)
        };

        let t_draw = {
            let t = timer.now();
            self.draw_screen(screen)?;
            timer.elapsed(t)
        };

        let t_copy = {
            let t = timer.now();
            frame.copy_from_slice(self.canvas.data());
            timer.elapsed(t)
        };

        let total = t_clear + t_draw + t_copy;
        timer.record_frame(total);
        self.last_screen = Some(screen.clone());

        Ok(RenderStats {
            clear: t_clear,
            draw: t_draw,
            copy: t_copy,
            total,
            redrawn: true,
        })
    }

    fn draw_screen(&mut self, screen: &Screen) -> Result<()> {
        let height = self.digit_height();
        match screen {
            Screen::Idle | Screen::Complete | Screen::Countdown { label: None } => Ok(()),
            Screen::Countdown { label: Some(n) } => {
                self.draw_number(u64::from(*n), self.center, height, INK)
            }
            Screen::Stimulus(stimulus) => {
                self.draw_number(u64::from(stimulus.value), self.center, height, STIMULUS_INK)
            }
            Screen::Stats {
                correct_count,
                average_reaction_time_ms,
                submit_failed,
                ..
            } => {
                if *submit_failed {
                    self.draw_alert_band()?;
                }
                let small = height * 0.6;
                let upper = (self.center.0, self.height as f32 * 0.33);
                let lower = (self.center.0, self.height as f32 * 0.67);
                self.draw_number(*correct_count as u64, upper, small, INK)?;
                self.draw_number(*average_reaction_time_ms, lower, small, INK)
            }
        }
    }

    fn draw_alert_band(&mut self) -> Result<()> {
        let band = (self.height as f32 * 0.08).max(2.0);
        let rect = Rect::from_xywh(0.0, 0.0, self.width as f32, band)
            .context("canvas too small for the alert band")?;
        let mut paint = Paint::default();
        paint.set_color_rgba8(ALERT[0], ALERT[1], ALERT[2], ALERT[3]);
        paint.anti_alias = false;
        self.canvas.fill_rect(rect, &paint, Transform::identity(), None);
        Ok(())
    }

    fn draw_number(
        &mut self,
        value: u64,
        center: (f32, f32),
        height: f32,
        ink: [u8; 4],
    ) -> Result<()> {
        for cell in layout_number(value, center, height) {
            let key = (cell.digit, ink, height.ceil() as u32);
            if !self.glyphs.contains_key(&key) {
                let glyph = render_digit(cell.digit, height, ink)?;
                self.glyphs.insert(key, glyph);
            }
            if let Some(glyph) = self.glyphs.get(&key) {
                self.canvas.draw_pixmap(
                    cell.x.round() as i32,
                    cell.y.round() as i32,
                    glyph.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }
        }
        Ok(())
    }
}

/// Rasterises one digit onto a transparent pixmap sized to its cell.
fn render_digit(digit: u8, height: f32, ink: [u8; 4]) -> Result<Pixmap> {
    let (w, h) = cell_size(height);
    let mut pixmap = Pixmap::new(w.ceil().max(1.0) as u32, h.ceil().max(1.0) as u32)
        .context("cannot allocate digit pixmap")?;
    let mut paint = Paint::default();
    paint.set_color_rgba8(ink[0], ink[1], ink[2], ink[3]);
    paint.anti_alias = false;
    for seg in segments(digit, height) {
        if let Some(rect) = Rect::from_xywh(seg.x, seg.y, seg.w, seg.h) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
    Ok(pixmap)
}

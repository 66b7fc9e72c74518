//! Debug overlays drawn after the comments

use std::time::Duration;

use danmaku_core::{Color, FontFace};
use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::fonts::GlyphSource;

const OVERLAY_FONT_SIZE: f32 = 60.0;

/// Frame rate estimate from the interval between paints
#[derive(Debug, Clone, Copy, Default)]
pub struct FpsCounter {
    last: Option<Duration>,
    frame_ms: f32,
}

impl FpsCounter {
    /// Record a paint at `now`
    pub fn tick(&mut self, now: Duration) {
        if let Some(last) = self.last {
            self.frame_ms = now.saturating_sub(last).as_secs_f32() * 1000.0;
        }
        self.last = Some(now);
    }

    /// Milliseconds between the last two paints
    pub fn frame_ms(&self) -> f32 {
        self.frame_ms
    }

    /// Paints per second, zero until two paints were seen
    pub fn fps(&self) -> f32 {
        if self.frame_ms > 0.0 {
            1000.0 / self.frame_ms
        } else {
            0.0
        }
    }

    /// Overlay caption
    pub fn label(&self) -> String {
        format!("FPS:{:.0}({:.0}ms)", self.fps(), self.frame_ms)
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

/// Outline `rect` in `color`
pub fn stroke_rect(surface: &mut Pixmap, rect: Rect, color: Color, transform: Transform) {
    let path = PathBuilder::from_rect(rect);
    let stroke = Stroke {
        width: 2.0,
        ..Stroke::default()
    };
    surface.stroke_path(&path, &solid(color), &stroke, transform, None);
}

/// Comment bounds in cyan and each line's box in yellow
pub fn collision_boxes(surface: &mut Pixmap, comment: Rect, lines: &[Rect], transform: Transform) {
    stroke_rect(surface, comment, Color::rgb(0, 0xFF, 0xFF), transform);
    for line in lines {
        stroke_rect(surface, *line, Color::rgb(0xFF, 0xFF, 0), transform);
    }
}

/// White outlined caption with its top-left corner at `(x, y)`
pub fn caption(surface: &mut Pixmap, glyphs: &dyn GlyphSource, text: &str, x: f32, y: f32, transform: Transform) {
    let path = match glyphs.text_path(text, FontFace::Defont, OVERLAY_FONT_SIZE) {
        Ok(Some(path)) => path,
        Ok(None) => return,
        Err(err) => {
            log::debug!("overlay caption skipped: {err}");
            return;
        }
    };
    let transform = transform.pre_translate(x, y + OVERLAY_FONT_SIZE);
    let stroke = Stroke {
        width: 4.0,
        ..Stroke::default()
    };
    surface.stroke_path(&path, &solid(Color::BLACK), &stroke, transform, None);
    surface.fill_path(&path, &solid(Color::WHITE), tiny_skia::FillRule::Winding, transform, None);
}

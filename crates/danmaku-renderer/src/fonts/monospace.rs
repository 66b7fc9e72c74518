//! Box-glyph font provider with fixed advances

use danmaku_core::FontFace;
use tiny_skia::{Path, PathBuilder, Rect};

use super::{FontMetrics, GlyphSource};
use crate::utils::RenderError;

/// Treats every character as a cell of `0.5em` (half-width) or `1em`
#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceFonts;

impl MonospaceFonts {
    /// Advance of one character in ems
    pub fn advance(c: char) -> f32 {
        match c {
            '\n' | '\r' => 0.0,
            ' '..='~' | '｡'..='ﾟ' => 0.5,
            _ => 1.0,
        }
    }
}

impl FontMetrics for MonospaceFonts {
    fn text_width(&self, text: &str, _font: FontFace, font_size: f32) -> f32 {
        text.chars().map(Self::advance).sum::<f32>() * font_size
    }
}

impl GlyphSource for MonospaceFonts {
    fn text_path(&self, text: &str, _font: FontFace, font_size: f32) -> Result<Option<Path>, RenderError> {
        let mut builder = PathBuilder::new();
        let mut pen = 0.0;
        for c in text.chars() {
            let advance = Self::advance(c) * font_size;
            if !c.is_whitespace() && advance > 0.0 {
                let rect = Rect::from_xywh(pen + advance * 0.1, -font_size * 0.8, advance * 0.8, font_size * 0.8)
                    .ok_or_else(|| RenderError::DrawingError(format!("degenerate glyph box for {c:?}")))?;
                builder.push_rect(rect);
            }
            pen += advance;
        }
        Ok(builder.finish())
    }
}

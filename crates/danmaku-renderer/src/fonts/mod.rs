//! Font metrics and glyph outlines
//!
//! The measurer only needs advance widths ([`FontMetrics`]); the rasterizer
//! also needs outlines ([`GlyphSource`]). Two providers ship with the crate:
//! [`SystemFonts`] backed by fontdb/rustybuzz/ttf-parser, and
//! [`MonospaceFonts`], a deterministic box-glyph provider used when no system
//! font matches and in tests.

mod monospace;
mod system;

pub use monospace::MonospaceFonts;
pub use system::SystemFonts;

use danmaku_core::FontFace;
use tiny_skia::Path;

use crate::utils::RenderError;

/// Advance-width queries
pub trait FontMetrics {
    /// Width of a single line of `text` at `font_size`, same units as the size
    fn text_width(&self, text: &str, font: FontFace, font_size: f32) -> f32;
}

/// Outline queries on top of [`FontMetrics`]
pub trait GlyphSource: FontMetrics {
    /// Outline of one line of `text` with the pen starting at the origin on
    /// the baseline, y pointing down
    ///
    /// Returns `Ok(None)` when nothing visible would be drawn.
    fn text_path(&self, text: &str, font: FontFace, font_size: f32) -> Result<Option<Path>, RenderError>;
}

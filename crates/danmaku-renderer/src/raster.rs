//! Rasterizing measured comments into standalone bitmaps

use danmaku_core::Color;
use tiny_skia::{FillRule, LineJoin, Paint, Pixmap, Stroke, Transform};

use crate::config::RenderConfig;
use crate::fonts::GlyphSource;
use crate::measure::{split_lines, MeasuredComment};
use crate::utils::RenderError;

/// Html5 baselines sit this fraction of a line above the line bottom
const HTML5_BASELINE_RISE: f32 = 0.16;

/// Transparent margin around the text, pixels
pub fn bitmap_padding(config: &RenderConfig, scale: f32) -> f32 {
    (config.line_width * scale).ceil() + 2.0
}

/// Baseline of line `n` below the text top, stage units
fn baseline(config: &RenderConfig, measured: &MeasuredComment, n: usize, offset: f32) -> f32 {
    let styled = &measured.styled;
    if styled.flash {
        (styled.line_offset + n as f32 + 1.0) * measured.font_size
            + config.comment_y_padding.get(measured.resized_y) / 2.0
    } else {
        let line_height = measured.line_height;
        line_height * (n as f32 + 1.0) - line_height * HTML5_BASELINE_RISE + offset
    }
}

fn paint_with(color: Color, opacity: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, (opacity.clamp(0.0, 1.0) * 255.0).round() as u8);
    paint.anti_alias = true;
    paint
}

/// Draw a comment into a new bitmap, outline first then fill
///
/// # Errors
///
/// Fails when the bitmap cannot be allocated or a glyph outline cannot be
/// produced.
pub fn rasterize(
    config: &RenderConfig,
    glyphs: &dyn GlyphSource,
    measured: &MeasuredComment,
) -> Result<Pixmap, RenderError> {
    let scale = measured.scale;
    let pad = bitmap_padding(config, scale);
    let width = (measured.width_px + pad * 2.0).ceil().max(1.0) as u32;
    let height = (measured.height_px + pad * 2.0).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidPixmap { width, height })?;

    let styled = &measured.styled;
    let stroke_color = if styled.color == Color::BLACK {
        config.stroke_inversion_color
    } else {
        config.stroke_color
    };
    let stroke_paint = paint_with(stroke_color, config.stroke_opacity);
    let fill_opacity = if styled.live {
        config.live_fill_opacity
    } else {
        1.0
    };
    let fill_paint = paint_with(styled.color, fill_opacity);
    let stroke = Stroke {
        width: config.line_width * scale,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let font_size = measured.font_size * scale;
    for (n, line) in split_lines(styled, config.style.flash_mode).iter().enumerate() {
        let mut x = pad;
        for run in line {
            let offset = config.fonts.get(run.font).offset;
            let y = pad + baseline(config, measured, n, offset) * scale;
            if let Some(path) = glyphs.text_path(run.text, run.font, font_size)? {
                let transform = Transform::from_translate(x, y);
                if stroke.width > 0.0 {
                    pixmap.stroke_path(&path, &stroke_paint, &stroke, transform, None);
                }
                pixmap.fill_path(&path, &fill_paint, FillRule::Winding, transform, None);
            }
            x += glyphs.text_width(run.text, run.font, font_size);
        }
    }
    Ok(pixmap)
}

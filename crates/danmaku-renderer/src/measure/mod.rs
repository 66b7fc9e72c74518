//! Text measurement and shrink-to-fit
//!
//! Turns a [`StyledComment`] into a [`MeasuredComment`] with stage-unit and
//! pixel geometry. Two independent resizes may apply:
//!
//! - vertical: too many lines for the size class switches once to the
//!   resized line height (`resized_y`)
//! - horizontal: fixed comments wider than the stage budget get their char
//!   size searched down in whole units (`resized_x`)
//!
//! Measuring is a pure function of the styled comment and the configuration,
//! so [`TextMeasurer::remeasure`] is idempotent.

use danmaku_core::{FlashMode, FontFace, StyledComment};
use smallvec::SmallVec;

use crate::config::RenderConfig;
use crate::fonts::FontMetrics;

/// Font size as a fraction of the char cell
pub const FONT_SIZE_RATIO: f32 = 0.8;

/// One run of a line drawn with a single font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    /// Text without line breaks
    pub text: &'a str,
    /// Resolved font
    pub font: FontFace,
}

/// Runs of one visual line
pub type Line<'a> = SmallVec<[Run<'a>; 2]>;

/// Split segments into lines with every run's font resolved
///
/// Under [`FlashMode::Xp`] a segment without a font uses the comment font;
/// under [`FlashMode::Vista`] it keeps the font of the previous segment.
pub fn split_lines(styled: &StyledComment, mode: FlashMode) -> Vec<Line<'_>> {
    let mut lines = vec![Line::new()];
    let mut last_font = styled.font;
    for segment in &styled.segments {
        let font = match (segment.font, mode) {
            (Some(font), _) => font,
            (None, FlashMode::Xp) => styled.font,
            (None, FlashMode::Vista) => last_font,
        };
        last_font = font;

        for (n, piece) in segment.text.split('\n').enumerate() {
            if n > 0 {
                lines.push(Line::new());
            }
            let piece = piece.strip_suffix('\r').unwrap_or(piece);
            if !piece.is_empty() {
                if let Some(line) = lines.last_mut() {
                    line.push(Run { text: piece, font });
                }
            }
        }
    }
    lines
}

/// A styled comment with resolved geometry
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredComment {
    /// Interpreter output
    pub styled: StyledComment,
    /// Char cell, stage units
    pub char_size: f32,
    /// Line pitch, stage units
    pub line_height: f32,
    /// Glyph size, stage units
    pub font_size: f32,
    /// Widest line, stage units
    pub width: f32,
    /// Total height, stage units
    pub height: f32,
    /// Width of every line, stage units
    pub line_widths: Vec<f32>,
    /// Char size was searched to fit the width budget
    pub resized_x: bool,
    /// Line height switched to the resized table
    pub resized_y: bool,
    /// Stage-to-pixel factor
    pub scale: f32,
    /// Widest line, pixels
    pub width_px: f32,
    /// Total height, pixels
    pub height_px: f32,
}

impl MeasuredComment {
    /// Number of visual lines
    pub fn line_count(&self) -> usize {
        self.line_widths.len()
    }
}

/// Measures comments against one configuration and metrics provider
pub struct TextMeasurer<'a, M: ?Sized = dyn FontMetrics> {
    config: &'a RenderConfig,
    metrics: &'a M,
    user_scale: f32,
}

impl<'a, M: FontMetrics + ?Sized> TextMeasurer<'a, M> {
    /// Measurer with an extra user scale applied on top of the stage scale
    pub fn new(config: &'a RenderConfig, metrics: &'a M, user_scale: f32) -> Self {
        Self {
            config,
            metrics,
            user_scale,
        }
    }

    /// Width of every line at `char_size`, stage units
    fn line_widths(&self, styled: &StyledComment, char_size: f32) -> Vec<f32> {
        let font_size = char_size * FONT_SIZE_RATIO;
        split_lines(styled, self.config.style.flash_mode)
            .iter()
            .map(|line| {
                line.iter()
                    .map(|run| self.metrics.text_width(run.text, run.font, font_size))
                    .sum()
            })
            .collect()
    }

    fn max_width(&self, styled: &StyledComment, char_size: f32) -> f32 {
        self.line_widths(styled, char_size)
            .into_iter()
            .fold(0.0, f32::max)
    }

    /// Largest whole-step char size in `1..=ceiling` whose width fits `limit`
    ///
    /// Starts from `start`; when nothing fits the search stops at 1, the
    /// narrowest reachable width.
    fn fit_char_size(&self, styled: &StyledComment, start: f32, ceiling: f32, limit: f32) -> f32 {
        let fits = |size: f32| self.max_width(styled, size) <= limit;
        let mut size = start.clamp(1.0, ceiling.max(1.0));
        if fits(size) {
            while size + 1.0 <= ceiling && fits(size + 1.0) {
                size += 1.0;
            }
        } else {
            while size > 1.0 && !fits(size) {
                size = (size - 1.0).max(1.0);
            }
        }
        size
    }

    /// Measure a styled comment
    pub fn measure(&self, styled: StyledComment) -> MeasuredComment {
        let config = self.config;
        let flash = styled.flash;
        let fixed = styled.lane.is_fixed();
        let sizes = config.char_size.get(flash).get(styled.size);
        let heights = config.line_height.get(flash).get(styled.size);
        let line_count = styled.line_count.max(1);

        let resized_y = !styled.ender && line_count > styled.size.resize_line_threshold();
        let mut line_height = heights.get(resized_y);
        let mut char_size = sizes.default * (line_height / heights.default);

        let mut widths = self.line_widths(&styled, char_size);
        let width = widths.iter().copied().fold(0.0, f32::max);

        let stage = config.stage.get(flash);
        let limit = if styled.full_width {
            stage.full_width
        } else {
            stage.width
        };

        let resized_x = fixed && width > limit;
        if resized_x {
            let start = char_size * limit / width;
            let fitted = self.fit_char_size(&styled, start.floor(), char_size, limit);
            line_height *= fitted / char_size;
            char_size = fitted;
            widths = self.line_widths(&styled, char_size);
        }

        let width = widths.iter().copied().fold(0.0, f32::max);
        let mut height = line_height * line_count as f32;
        if fixed {
            height += config.comment_y_padding.get(resized_y);
        }

        let scale = config.comment_scale(flash) * self.user_scale;
        MeasuredComment {
            styled,
            char_size,
            line_height,
            font_size: char_size * FONT_SIZE_RATIO,
            width,
            height,
            line_widths: widths,
            resized_x,
            resized_y,
            scale,
            width_px: width * scale,
            height_px: height * scale,
        }
    }

    /// Measure again from the styled record, yielding identical geometry
    pub fn remeasure(&self, measured: &MeasuredComment) -> MeasuredComment {
        self.measure(measured.styled.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::MonospaceFonts;
    use danmaku_core::{Comment, Interpreter, ScriptState, Segment};
    use pretty_assertions::assert_eq;

    /// Styled as an html5-era comment
    fn styled(comment: Comment) -> StyledComment {
        let config = RenderConfig::default();
        let comment = comment.with_date(1_600_000_000, 0);
        Interpreter::new(&config.style).apply(&mut ScriptState::new(), &comment)
    }

    fn measure(comment: Comment) -> MeasuredComment {
        let config = RenderConfig::default();
        TextMeasurer::new(&config, &MonospaceFonts, 1.0).measure(styled(comment))
    }

    #[test]
    fn single_line_medium_comment() {
        let measured = measure(Comment::new(0, 0, "あいう"));
        assert!(!measured.resized_x && !measured.resized_y);
        assert_eq!(measured.char_size, 27.0);
        assert!((measured.width - 3.0 * 27.0 * 0.8).abs() < 1e-4);
        assert_eq!(measured.height, 29.0);
        assert!((measured.width_px - measured.width * 1080.0 / 385.0).abs() < 1e-3);
    }

    #[test]
    fn fixed_comments_get_padding() {
        let measured = measure(Comment::new(0, 0, "a\nb").with_mail(["ue"]));
        assert_eq!(measured.line_count(), 2);
        assert_eq!(measured.height, 29.0 * 2.0 + 4.0);
    }

    #[test]
    fn too_many_lines_switch_to_resized_height() {
        let measured = measure(Comment::new(0, 0, "1\n2\n3").with_mail(["big"]));
        assert!(measured.resized_y);
        assert_eq!(measured.line_height, 24.0);
        assert!((measured.char_size - 39.0 * 24.0 / 45.0).abs() < 1e-4);

        let ender = measure(Comment::new(0, 0, "1\n2\n3").with_mail(["big", "ender"]));
        assert!(!ender.resized_y);
        assert_eq!(ender.line_height, 45.0);
    }

    #[test]
    fn wide_fixed_comment_shrinks_to_budget() {
        let text = "あ".repeat(40);
        let measured = measure(Comment::new(0, 0, text.as_str()).with_mail(["shita"]));
        assert!(measured.resized_x);
        assert!(measured.width <= 512.0);
        assert_eq!(measured.char_size.fract(), 0.0);
        // one more unit would overflow
        assert!(40.0 * (measured.char_size + 1.0) * 0.8 > 512.0);

        let scrolling = measure(Comment::new(0, 0, text.as_str()));
        assert!(!scrolling.resized_x);
        assert!(scrolling.width > 512.0);
    }

    #[test]
    fn full_uses_the_wider_budget() {
        let text = "あ".repeat(28);
        let narrow = measure(Comment::new(0, 0, text.as_str()).with_mail(["ue"]));
        let full = measure(Comment::new(0, 0, text.as_str()).with_mail(["ue", "full"]));
        assert!(narrow.resized_x);
        assert!(!full.resized_x);
    }

    #[test]
    fn unreachable_budget_stops_at_one() {
        let text = "あ".repeat(700);
        let measured = measure(Comment::new(0, 0, text.as_str()).with_mail(["ue"]));
        assert_eq!(measured.char_size, 1.0);
        assert!(measured.width > 512.0);
    }

    #[test]
    fn remeasure_is_idempotent() {
        let config = RenderConfig::default();
        let measurer = TextMeasurer::new(&config, &MonospaceFonts, 1.5);
        let text = format!("{}\n{}\n{}", "x".repeat(90), "y".repeat(10), "z");
        let first = measurer.measure(styled(Comment::new(0, 0, text).with_mail(["ue", "big"])));
        let second = measurer.remeasure(&first);
        assert_eq!(first, second);
        assert_eq!(measurer.remeasure(&second), second);
    }

    #[test]
    fn lines_resolve_fonts_per_mode() {
        let mut comment = styled(Comment::new(0, 0, "x"));
        comment.font = FontFace::Mincho;
        comment.segments = [
            Segment::with_font("ab", FontFace::Simsun),
            Segment::plain("c\nd"),
        ]
        .into_iter()
        .collect();

        let xp = split_lines(&comment, FlashMode::Xp);
        assert_eq!(xp.len(), 2);
        assert_eq!(xp[0][1], Run { text: "c", font: FontFace::Mincho });
        assert_eq!(xp[1][0], Run { text: "d", font: FontFace::Mincho });

        let vista = split_lines(&comment, FlashMode::Vista);
        assert_eq!(vista[0][1].font, FontFace::Simsun);
        assert_eq!(vista[1][0].font, FontFace::Simsun);
    }
}

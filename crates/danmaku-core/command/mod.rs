//! Mail command parsing
//!
//! A comment's mail field is a list of loosely-typed tokens. [`parse_commands`]
//! reads them left to right into a [`StyleDirective`]; the first occurrence of
//! each category wins and unknown tokens are ignored, so parsing never fails.

mod color;

pub use color::{Color, ColorTable};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::comment::Comment;

/// Vertical placement class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Lane {
    /// Scrolls right to left (`naka`)
    #[default]
    Scrolling,
    /// Fixed, stacked from the top (`ue`)
    Top,
    /// Fixed, stacked from the bottom (`shita`)
    Bottom,
}

impl Lane {
    /// Map a lower-cased mail token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "naka" => Some(Self::Scrolling),
            "ue" => Some(Self::Top),
            "shita" => Some(Self::Bottom),
            _ => None,
        }
    }

    /// Whether the lane is horizontally centred and static
    pub fn is_fixed(self) -> bool {
        !matches!(self, Self::Scrolling)
    }
}

/// Text size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CommentSize {
    /// `big`
    Big,
    /// `medium`
    #[default]
    Medium,
    /// `small`
    Small,
}

impl CommentSize {
    /// Map a lower-cased mail token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "big" => Some(Self::Big),
            "medium" => Some(Self::Medium),
            "small" => Some(Self::Small),
            _ => None,
        }
    }

    /// Line count above which a comment is shrunk vertically
    pub fn resize_line_threshold(self) -> usize {
        match self {
            Self::Big => 2,
            Self::Medium => 4,
            Self::Small => 6,
        }
    }
}

/// Font face selector
///
/// `Defont`, `Mincho` and `Gothic` are mail vocabulary; `Simsun` and `Gulim`
/// only arise from flash-era segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FontFace {
    /// Platform default sans face
    #[default]
    Defont,
    /// Serif face
    Mincho,
    /// Gothic sans face
    Gothic,
    /// Simplified Chinese fallback
    Simsun,
    /// Korean fallback
    Gulim,
}

impl FontFace {
    /// Map a lower-cased mail token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "defont" => Some(Self::Defont),
            "mincho" => Some(Self::Mincho),
            "gothic" => Some(Self::Gothic),
            _ => None,
        }
    }

    /// Stable lower-case name
    pub fn name(self) -> &'static str {
        match self {
            Self::Defont => "defont",
            Self::Mincho => "mincho",
            Self::Gothic => "gothic",
            Self::Simsun => "simsun",
            Self::Gulim => "gulim",
        }
    }
}

/// Partial style read from mail tokens
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleDirective {
    /// Placement lane
    pub lane: Option<Lane>,
    /// Size class
    pub size: Option<CommentSize>,
    /// Text colour
    pub color: Option<Color>,
    /// Font face
    pub font: Option<FontFace>,
    /// Use the wide width budget for fixed lanes
    pub full_width: bool,
    /// Never shrink for line count
    pub ender: bool,
    /// Semi-transparent fill
    pub live: bool,
    /// Never drawn
    pub invisible: bool,
    /// Display duration in seconds
    pub duration_sec: Option<f64>,
}

fn parse_duration(token: &str) -> Option<f64> {
    let rest = token.strip_prefix('@')?;
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse::<f64>().ok().filter(|d| d.is_finite())
}

/// Read a comment's mail tokens into a [`StyleDirective`]
pub fn parse_commands(comment: &Comment, colors: &ColorTable) -> StyleDirective {
    let mut directive = StyleDirective::default();
    for raw in &comment.mail {
        let token = raw.to_lowercase();

        if let Some(duration) = parse_duration(&token) {
            directive.duration_sec.get_or_insert(duration);
            continue;
        }
        if let Some(lane) = Lane::from_token(&token) {
            directive.lane.get_or_insert(lane);
            continue;
        }
        if let Some(size) = CommentSize::from_token(&token) {
            directive.size.get_or_insert(size);
            continue;
        }
        if let Some(font) = FontFace::from_token(&token) {
            directive.font.get_or_insert(font);
            continue;
        }
        if directive.color.is_none() {
            if let Some(color) = colors.get(&token) {
                directive.color = Some(color);
                continue;
            }
            if comment.premium && token.starts_with('#') {
                if let Ok(color) = Color::from_hex(&token) {
                    directive.color = Some(color);
                    continue;
                }
            }
        }
        match token.as_str() {
            "full" => directive.full_width = true,
            "ender" => directive.ender = true,
            "_live" => directive.live = true,
            "invisible" => directive.invisible = true,
            _ => {}
        }
    }
    directive
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(mail: &[&str], premium: bool) -> StyleDirective {
        let mut comment = Comment::new(0, 0, "x").with_mail(mail.iter().copied());
        comment.premium = premium;
        parse_commands(&comment, &ColorTable::default())
    }

    #[test]
    fn first_occurrence_wins_per_category() {
        let d = parse(&["shita", "UE", "small", "big", "mincho", "gothic", "@5", "@9"], false);
        assert_eq!(d.lane, Some(Lane::Bottom));
        assert_eq!(d.size, Some(CommentSize::Small));
        assert_eq!(d.font, Some(FontFace::Mincho));
        assert_eq!(d.duration_sec, Some(5.0));
    }

    #[test]
    fn hex_colors_require_premium() {
        assert_eq!(parse(&["#ff0000"], false).color, None);
        assert_eq!(parse(&["#ff0000"], true).color, Some(Color::rgb(0xFF, 0, 0)));
        assert_eq!(parse(&["#xyz"], true).color, None);
    }

    #[test]
    fn named_color_beats_later_hex() {
        let d = parse(&["Blue", "#ff0000"], true);
        assert_eq!(d.color, Some(Color::rgb(0, 0, 0xFF)));
    }

    #[test]
    fn flags_and_unknown_tokens() {
        let d = parse(&["184", "full", "ender", "_live", "invisible", "patissier"], false);
        assert!(d.full_width && d.ender && d.live && d.invisible);
        assert_eq!(d.lane, None);
        assert_eq!(d.color, None);
    }

    #[test]
    fn duration_accepts_decimal_prefix() {
        assert_eq!(parse(&["@1.5"], false).duration_sec, Some(1.5));
        assert_eq!(parse(&["@2s"], false).duration_sec, Some(2.0));
        assert_eq!(parse(&["@"], false).duration_sec, None);
        assert_eq!(parse(&["@1.2.3", "@4"], false).duration_sec, Some(4.0));
    }
}

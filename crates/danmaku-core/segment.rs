//! Script-aware content segmentation
//!
//! Flash-era players picked a fallback font per run of text depending on which
//! font happened to carry the glyphs. [`segment_flash`] reproduces that split:
//! printable ASCII and half-width kana stay with the comment font, other runs
//! are scanned for the first character of each [`FlashCharTable`] class.

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::command::FontFace;
use crate::config::FlashMode;
use crate::utils::CoreError;

/// A run of content drawn with a single font
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    /// Text of the run, may contain line breaks
    pub text: String,
    /// Font override, `None` inherits the comment font
    pub font: Option<FontFace>,
}

impl Segment {
    /// Segment that inherits the comment font
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: None,
        }
    }

    /// Segment with an explicit font
    pub fn with_font(text: impl Into<String>, font: FontFace) -> Self {
        Self {
            text: text.into(),
            font: Some(font),
        }
    }
}

/// Most comments are a single run
pub type Segments = SmallVec<[Segment; 1]>;

/// Set of characters written as literal chars and `a-z` style ranges
///
/// A `-` at either end of the source is taken literally.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct CharClass {
    source: String,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    /// Parse a class description
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCharClass`] when a range is reversed.
    pub fn parse(source: &str) -> Result<Self, CoreError> {
        let chars: Vec<char> = source.chars().collect();
        let mut ranges = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let start = chars[i];
            if i + 2 < chars.len() && chars[i + 1] == '-' {
                let end = chars[i + 2];
                if end < start {
                    return Err(CoreError::InvalidCharClass(format!(
                        "reversed range {start}-{end}"
                    )));
                }
                ranges.push((start, end));
                i += 3;
            } else {
                ranges.push((start, start));
                i += 1;
            }
        }
        Ok(Self {
            source: source.to_string(),
            ranges,
        })
    }

    /// Whether `c` belongs to the class
    pub fn contains(&self, c: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
    }

    /// Char index of the first member in `text`
    pub fn find(&self, text: &str) -> Option<usize> {
        text.chars().position(|c| self.contains(c))
    }

    /// Number of members in `text`
    pub fn count(&self, text: &str) -> usize {
        text.chars().filter(|&c| self.contains(c)).count()
    }

    /// Original description
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for CharClass {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CharClass> for String {
    fn from(value: CharClass) -> Self {
        value.source
    }
}

fn class(source: &str) -> CharClass {
    // Built-in tables are well formed; an empty class only disables detection.
    CharClass::parse(source).unwrap_or_else(|_| CharClass {
        source: String::new(),
        ranges: Vec::new(),
    })
}

/// Characters that identify which legacy font carries a glyph
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct FlashCharTable {
    /// Glyphs only SimSun renders
    pub simsun_strong: CharClass,
    /// Glyphs SimSun renders when nothing stronger matched
    pub simsun_weak: CharClass,
    /// Hangul and other Gulim glyphs
    pub gulim: CharClass,
    /// Glyphs that force the gothic face
    pub gothic: CharClass,
}

impl Default for FlashCharTable {
    fn default() -> Self {
        Self {
            simsun_strong: class("ǎǐǒǔǖǘǚǜ们这说话语东车门见长马鸟龙鱼贝页风飞问间时对开关"),
            simsun_weak: class("ⅰ-ⅹ∶〡-〩"),
            gulim: class("ㄱ-ㆎ가-힣"),
            gothic: class("①-⑳Ⅰ-Ⅹ㍉㌔㌢㍍㌘㌧㌃㌶㍑㍗㌍㌦㌣㌫㍊㌻"),
        }
    }
}

/// Characters that shift a flash comment's baseline
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ScriptCharTable {
    /// Superscript characters
    #[cfg_attr(feature = "serde", serde(rename = "super"))]
    pub superscript: CharClass,
    /// Subscript characters
    #[cfg_attr(feature = "serde", serde(rename = "sub"))]
    pub subscript: CharClass,
}

impl Default for ScriptCharTable {
    fn default() -> Self {
        Self {
            superscript: class("ª²³¹ºⁱ⁴-⁹⁺-ⁿ"),
            subscript: class("₀-₎ₐ-ₜ"),
        }
    }
}

impl ScriptCharTable {
    /// Baseline shift in lines
    pub fn line_offset(&self, content: &str) -> f32 {
        self.superscript.count(content) as f32 * -0.15 + self.subscript.count(content) as f32 * 0.4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlashClass {
    SimsunStrong,
    SimsunWeak,
    Gulim,
    Gothic,
}

impl FlashClass {
    fn font(self) -> FontFace {
        match self {
            Self::SimsunStrong | Self::SimsunWeak => FontFace::Simsun,
            Self::Gulim => FontFace::Gulim,
            Self::Gothic => FontFace::Defont,
        }
    }
}

fn is_half_width(c: char) -> bool {
    matches!(c, ' '..='~' | '｡'..='ﾟ')
}

/// Split `content` into alternating half-width and other runs
fn split_runs(content: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (idx, c) in content.char_indices() {
        let half = is_half_width(c);
        if let Some(prev) = current {
            if prev != half {
                runs.push(&content[start..idx]);
                start = idx;
            }
        }
        current = Some(half);
    }
    if start < content.len() {
        runs.push(&content[start..]);
    }
    runs
}

/// Byte offset of the char at `char_idx`
fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(idx, _)| idx)
}

/// Segment flash-era content by font fallback boundaries
pub fn segment_flash(content: &str, table: &FlashCharTable, mode: FlashMode) -> Segments {
    let mut segments = Segments::new();
    for part in split_runs(content) {
        if part.chars().all(is_half_width) {
            segments.push(Segment::plain(part));
            continue;
        }

        let mut hits: SmallVec<[(FlashClass, usize); 4]> = [
            (FlashClass::SimsunStrong, &table.simsun_strong),
            (FlashClass::SimsunWeak, &table.simsun_weak),
            (FlashClass::Gulim, &table.gulim),
            (FlashClass::Gothic, &table.gothic),
        ]
        .into_iter()
        .filter_map(|(kind, class)| class.find(part).map(|idx| (kind, idx)))
        .collect();

        match hits.len() {
            0 => segments.push(Segment::plain(part)),
            1 => segments.push(Segment::with_font(part, hits[0].0.font())),
            _ => {
                hits.sort_by_key(|&(_, idx)| idx);
                match mode {
                    FlashMode::Xp => {
                        let mut offset = 0;
                        for pair in hits.windows(2) {
                            let end = byte_offset(part, pair[1].1);
                            segments.push(Segment::with_font(&part[offset..end], pair[0].0.font()));
                            offset = end;
                        }
                        let (last, _) = hits[hits.len() - 1];
                        segments.push(Segment::with_font(&part[offset..], last.font()));
                    }
                    FlashMode::Vista => {
                        let (first, _) = hits[0];
                        let (second, second_idx) = hits[1];
                        if first == FlashClass::Gothic {
                            let split = byte_offset(part, second_idx);
                            segments.push(Segment::with_font(&part[..split], first.font()));
                            segments.push(Segment::with_font(&part[split..], second.font()));
                        } else {
                            segments.push(Segment::with_font(part, first.font()));
                        }
                    }
                }
            }
        }
    }
    segments.retain(|s| !s.text.is_empty());
    if segments.is_empty() {
        segments.push(Segment::plain(""));
    }
    segments
}

/// Total line count across segments
pub fn line_count(segments: &[Segment]) -> usize {
    1 + segments
        .iter()
        .map(|s| s.text.matches('\n').count())
        .sum::<usize>()
}

//! Rendering constants
//!
//! Everything the measurer, layout engine and rasterizer treat as a constant
//! lives in [`RenderConfig`]. All fields have defaults; a partial JSON document
//! overrides only what it names, and unknown keys are rejected.
//!
//! Sizes are expressed in *stage units*: the 512×385 coordinate space comments
//! were authored against. [`RenderConfig::comment_scale`] maps them onto the
//! canvas.

use danmaku_core::{Color, CommentSize, FontFace, StyleConfig};
use serde::{Deserialize, Serialize};

use crate::utils::RenderError;

/// Value that differs between html5 and flash-era metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerFamily<T> {
    /// Html5 player value
    pub html5: T,
    /// Flash player value
    pub flash: T,
}

impl<T: Copy> PerFamily<T> {
    /// Pick by family
    pub fn get(&self, flash: bool) -> T {
        if flash {
            self.flash
        } else {
            self.html5
        }
    }
}

/// Value before and after vertical auto-resize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resizable {
    /// Normal value
    pub default: f32,
    /// Value once the comment was shrunk for line count
    pub resized: f32,
}

impl Resizable {
    const fn new(default: f32, resized: f32) -> Self {
        Self { default, resized }
    }

    /// Pick by resize state
    pub fn get(&self, resized: bool) -> f32 {
        if resized {
            self.resized
        } else {
            self.default
        }
    }
}

/// Per size class table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeTable {
    /// `big`
    pub big: Resizable,
    /// `medium`
    pub medium: Resizable,
    /// `small`
    pub small: Resizable,
}

impl SizeTable {
    /// Entry for a size class
    pub fn get(&self, size: CommentSize) -> Resizable {
        match size {
            CommentSize::Big => self.big,
            CommentSize::Medium => self.medium,
            CommentSize::Small => self.small,
        }
    }

    fn values(&self) -> [f32; 6] {
        [
            self.big.default,
            self.big.resized,
            self.medium.default,
            self.medium.resized,
            self.small.default,
            self.small.resized,
        ]
    }
}

/// Authoring stage dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSize {
    /// Width budget for fixed comments
    pub width: f32,
    /// Width budget for fixed comments carrying `full`
    pub full_width: f32,
    /// Stage height
    pub height: f32,
}

/// Horizontal boundaries scrolling comments are tested against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollisionRange {
    /// Left boundary, canvas pixels
    pub left: f32,
    /// Right boundary, canvas pixels
    pub right: f32,
}

/// Font family lookup for one [`FontFace`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontSpec {
    /// Family names tried in order
    pub families: Vec<String>,
    /// Fall back to a serif generic family instead of sans-serif
    #[serde(default)]
    pub serif: bool,
    /// Font weight
    #[serde(default = "default_weight")]
    pub weight: u16,
    /// Baseline adjustment in stage units
    #[serde(default)]
    pub offset: f32,
}

fn default_weight() -> u16 {
    600
}

impl FontSpec {
    fn new(families: &[&str], serif: bool, offset: f32) -> Self {
        Self {
            families: families.iter().map(|f| (*f).to_string()).collect(),
            serif,
            weight: default_weight(),
            offset,
        }
    }
}

/// Family lookup for every face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontTable {
    /// Default sans face
    pub defont: FontSpec,
    /// Serif face
    pub mincho: FontSpec,
    /// Gothic face
    pub gothic: FontSpec,
    /// Simplified Chinese fallback
    pub simsun: FontSpec,
    /// Korean fallback
    pub gulim: FontSpec,
}

impl FontTable {
    /// Spec for a face
    pub fn get(&self, face: FontFace) -> &FontSpec {
        match face {
            FontFace::Defont => &self.defont,
            FontFace::Mincho => &self.mincho,
            FontFace::Gothic => &self.gothic,
            FontFace::Simsun => &self.simsun,
            FontFace::Gulim => &self.gulim,
        }
    }
}

impl Default for FontTable {
    fn default() -> Self {
        Self {
            defont: FontSpec::new(
                &["MS PGothic", "Hiragino Kaku Gothic ProN", "Noto Sans CJK JP", "Noto Sans JP", "Arial"],
                false,
                0.0,
            ),
            mincho: FontSpec::new(
                &["MS PMincho", "Hiragino Mincho ProN", "Noto Serif CJK JP", "Noto Serif JP"],
                true,
                -0.5,
            ),
            gothic: FontSpec::new(
                &["Yu Gothic", "Meiryo", "Hiragino Sans", "Noto Sans CJK JP"],
                false,
                0.5,
            ),
            simsun: FontSpec::new(&["SimSun", "NSimSun", "Noto Serif CJK SC"], true, 0.0),
            gulim: FontSpec::new(&["Gulim", "Malgun Gothic", "Noto Sans CJK KR"], false, 0.0),
        }
    }
}

/// All rendering constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Canvas width in pixels
    pub canvas_width: u32,
    /// Canvas height in pixels
    pub canvas_height: u32,
    /// Authoring stage per family
    pub stage: PerFamily<StageSize>,
    /// Scrolling collision boundaries
    pub collision_range: CollisionRange,
    /// Character cell size, stage units
    pub char_size: PerFamily<SizeTable>,
    /// Line pitch, stage units
    pub line_height: PerFamily<SizeTable>,
    /// Extra height of fixed comments, stage units
    pub comment_y_padding: Resizable,
    /// Outline colour
    pub stroke_color: Color,
    /// Outline colour used for black text
    pub stroke_inversion_color: Color,
    /// Outline alpha
    pub stroke_opacity: f32,
    /// Outline width, stage units
    pub line_width: f32,
    /// Fill alpha of `_live` comments
    pub live_fill_opacity: f32,
    /// Extra bitmap lifetime after a comment leaves the screen, milliseconds
    pub cache_age_ms: u64,
    /// Font families per face
    pub fonts: FontTable,
    /// Interpreter tables
    pub style: StyleConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let stage = |full_width| StageSize {
            width: 512.0,
            full_width,
            height: 385.0,
        };
        Self {
            canvas_width: 1920,
            canvas_height: 1080,
            stage: PerFamily {
                html5: stage(680.0),
                flash: stage(640.0),
            },
            collision_range: CollisionRange {
                left: 235.0,
                right: 1685.0,
            },
            char_size: PerFamily {
                html5: SizeTable {
                    big: Resizable::new(39.0, 20.0),
                    medium: Resizable::new(27.0, 14.0),
                    small: Resizable::new(18.0, 10.0),
                },
                flash: SizeTable {
                    big: Resizable::new(39.0, 19.5),
                    medium: Resizable::new(24.0, 12.0),
                    small: Resizable::new(15.0, 7.5),
                },
            },
            line_height: PerFamily {
                html5: SizeTable {
                    big: Resizable::new(45.0, 24.0),
                    medium: Resizable::new(29.0, 15.0),
                    small: Resizable::new(18.0, 10.0),
                },
                flash: SizeTable {
                    big: Resizable::new(45.0, 23.0),
                    medium: Resizable::new(29.0, 14.5),
                    small: Resizable::new(18.0, 9.0),
                },
            },
            comment_y_padding: Resizable::new(4.0, 2.0),
            stroke_color: Color::BLACK,
            stroke_inversion_color: Color::WHITE,
            stroke_opacity: 0.4,
            line_width: 2.8,
            live_fill_opacity: 0.5,
            cache_age_ms: 2000,
            fonts: FontTable::default(),
            style: StyleConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Stage-to-canvas scale factor
    pub fn comment_scale(&self, flash: bool) -> f32 {
        self.canvas_height as f32 / self.stage.get(flash).height
    }

    /// Check every constant for usable values
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidOptions`] naming the first bad field.
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |what: &str| Err(RenderError::InvalidOptions(what.to_string()));

        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(RenderError::InvalidDimensions);
        }
        for stage in [self.stage.html5, self.stage.flash] {
            if !(stage.width > 0.0 && stage.full_width >= stage.width && stage.height > 0.0) {
                return invalid("stage sizes must be positive and full_width >= width");
            }
        }
        let range = self.collision_range;
        if !(0.0 <= range.left && range.left < range.right && range.right <= self.canvas_width as f32) {
            return invalid("collision_range must satisfy 0 <= left < right <= canvas_width");
        }
        let tables = [
            self.char_size.html5,
            self.char_size.flash,
            self.line_height.html5,
            self.line_height.flash,
        ];
        if tables
            .iter()
            .flat_map(SizeTable::values)
            .any(|v| !(v.is_finite() && v > 0.0))
        {
            return invalid("char_size and line_height entries must be positive");
        }
        if !(self.comment_y_padding.default >= 0.0 && self.comment_y_padding.resized >= 0.0) {
            return invalid("comment_y_padding must not be negative");
        }
        for (name, value) in [
            ("stroke_opacity", self.stroke_opacity),
            ("live_fill_opacity", self.live_fill_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RenderError::InvalidOptions(format!("{name} must be within 0..=1")));
            }
        }
        if !(self.line_width.is_finite() && self.line_width >= 0.0) {
            return invalid("line_width must not be negative");
        }
        self.style.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.comment_scale(false) - 1080.0 / 385.0).abs() < 1e-5);
    }

    #[test]
    fn partial_override_from_json() {
        let config: RenderConfig = serde_json::from_str(
            r##"{"canvas_width": 1280, "canvas_height": 720,
                "collision_range": {"left": 100, "right": 1100},
                "stroke_color": "#112233"}"##,
        )
        .unwrap();
        assert_eq!(config.canvas_width, 1280);
        assert_eq!(config.stroke_color, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(config.cache_age_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_and_invalid_values() {
        assert!(serde_json::from_str::<RenderConfig>(r#"{"canvasWidth": 10}"#).is_err());
        assert!(serde_json::from_str::<RenderConfig>(r#"{"stroke_color": "black"}"#).is_err());

        let mut config = RenderConfig::default();
        config.collision_range.left = 1700.0;
        assert!(config.validate().is_err());

        let mut config = RenderConfig::default();
        config.canvas_height = 0;
        assert!(matches!(config.validate(), Err(RenderError::InvalidDimensions)));

        let mut config = RenderConfig::default();
        config.char_size.flash.small.resized = 0.0;
        assert!(config.validate().is_err());
    }
}

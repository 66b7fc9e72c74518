//! Comment colours and the named colour vocabulary

use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::utils::CoreError;

/// Opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// `#FFFFFF`
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
    /// `#000000`
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Build from channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`, case-insensitive
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] for any other shape.
    pub fn from_hex(text: &str) -> Result<Self, CoreError> {
        let digits = text
            .strip_prefix('#')
            .ok_or_else(|| CoreError::InvalidColor(text.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidColor(text.to_string()));
        }
        let channel = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| CoreError::InvalidColor(text.to_string()))
        };
        match digits.len() {
            3 => {
                let expand = |i: usize| channel(&digits[i..=i].repeat(2));
                Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(CoreError::InvalidColor(text.to_string())),
        }
    }

    /// Upper-case `#RRGGBB`
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_hex()
    }
}

/// Named colours accepted as mail tokens
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ColorTable {
    names: HashMap<String, Color, RandomState>,
}

impl ColorTable {
    /// Empty table
    pub fn empty() -> Self {
        Self {
            names: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add or replace a name, stored lower-cased
    pub fn insert(&mut self, name: &str, color: Color) {
        self.names.insert(name.to_lowercase(), color);
    }

    /// Look up a lower-cased token
    pub fn get(&self, name: &str) -> Option<Color> {
        self.names.get(name).copied()
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no names are defined
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        const NAMED: [(&str, Color); 27] = [
            ("white", Color::rgb(0xFF, 0xFF, 0xFF)),
            ("red", Color::rgb(0xFF, 0x00, 0x00)),
            ("pink", Color::rgb(0xFF, 0x80, 0x80)),
            ("orange", Color::rgb(0xFF, 0xC0, 0x00)),
            ("yellow", Color::rgb(0xFF, 0xFF, 0x00)),
            ("green", Color::rgb(0x00, 0xFF, 0x00)),
            ("cyan", Color::rgb(0x00, 0xFF, 0xFF)),
            ("blue", Color::rgb(0x00, 0x00, 0xFF)),
            ("purple", Color::rgb(0xC0, 0x00, 0xFF)),
            ("black", Color::rgb(0x00, 0x00, 0x00)),
            ("white2", Color::rgb(0xCC, 0xCC, 0x99)),
            ("niconicowhite", Color::rgb(0xCC, 0xCC, 0x99)),
            ("red2", Color::rgb(0xCC, 0x00, 0x33)),
            ("truered", Color::rgb(0xCC, 0x00, 0x33)),
            ("pink2", Color::rgb(0xFF, 0x33, 0xCC)),
            ("orange2", Color::rgb(0xFF, 0x66, 0x00)),
            ("passionorange", Color::rgb(0xFF, 0x66, 0x00)),
            ("yellow2", Color::rgb(0x99, 0x99, 0x00)),
            ("madyellow", Color::rgb(0x99, 0x99, 0x00)),
            ("green2", Color::rgb(0x00, 0xCC, 0x66)),
            ("elementalgreen", Color::rgb(0x00, 0xCC, 0x66)),
            ("cyan2", Color::rgb(0x00, 0xCC, 0xCC)),
            ("blue2", Color::rgb(0x33, 0x99, 0xFF)),
            ("marineblue", Color::rgb(0x33, 0x99, 0xFF)),
            ("purple2", Color::rgb(0x66, 0x33, 0xCC)),
            ("nobleviolet", Color::rgb(0x66, 0x33, 0xCC)),
            ("black2", Color::rgb(0x66, 0x66, 0x66)),
        ];
        let mut table = Self::empty();
        for (name, color) in NAMED {
            table.insert(name, color);
        }
        table
    }
}

//! Style-level configuration shared by the interpreter and the renderer

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::command::ColorTable;
use crate::segment::{FlashCharTable, ScriptCharTable};
use crate::utils::CoreError;

/// Which metric family comments are rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RenderMode {
    /// Decide per comment from its date and mail tokens
    #[default]
    Default,
    /// Always use html5 metrics
    Html5,
    /// Always use flash metrics
    Flash,
}

/// Font fallback behaviour of the emulated flash player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FlashMode {
    /// Switch fonts at every detected boundary
    Xp,
    /// Only split when the gothic face leads
    #[default]
    Vista,
}

/// Flash player retirement date, unix seconds
pub const DEFAULT_FLASH_THRESHOLD: i64 = 1_499_871_600;

/// Styling tables consumed by [`crate::Interpreter`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct StyleConfig {
    /// Named colours accepted in mail
    pub colors: ColorTable,
    /// Legacy font detection classes
    pub flash_chars: FlashCharTable,
    /// Super/subscript classes for flash baselines
    pub flash_script_chars: ScriptCharTable,
    /// Legacy fallback behaviour
    pub flash_mode: FlashMode,
    /// Comments posted before this unix time use flash metrics
    pub flash_threshold: i64,
    /// Metric family selection
    pub mode: RenderMode,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            colors: ColorTable::default(),
            flash_chars: FlashCharTable::default(),
            flash_script_chars: ScriptCharTable::default(),
            flash_mode: FlashMode::default(),
            flash_threshold: DEFAULT_FLASH_THRESHOLD,
            mode: RenderMode::default(),
        }
    }
}

impl StyleConfig {
    /// Reject tables the interpreter cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] when the colour table is empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.colors.is_empty() {
            return Err(CoreError::config("color table must define at least one color"));
        }
        Ok(())
    }
}

//! Error types for rendering

use thiserror::Error;

/// Rendering error types
#[derive(Error, Debug)]
pub enum RenderError {
    /// Invalid dimensions provided
    #[error("Invalid dimensions: dimensions must be positive and non-zero")]
    InvalidDimensions,

    /// Pixmap allocation failed
    #[error("Failed to create pixmap of {width}x{height}")]
    InvalidPixmap {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Options failed validation or deserialization
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Font lookup or parsing failed
    #[error("Font error: {0}")]
    FontError(String),

    /// Text shaping failed
    #[error("Text shaping failed: {0}")]
    ShapingError(String),

    /// Drawing a comment bitmap failed
    #[error("Drawing failed: {0}")]
    DrawingError(String),

    /// Core error from danmaku-core
    #[error("Core error: {0}")]
    CoreError(#[from] danmaku_core::CoreError),
}

impl RenderError {
    /// Check if error only affects a single comment
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ShapingError(_)
                | Self::DrawingError(_)
                | Self::FontError(_)
                | Self::InvalidPixmap { .. }
        )
    }

    /// Check if error indicates missing resources
    pub fn is_resource_error(&self) -> bool {
        matches!(self, Self::FontError(_) | Self::InvalidPixmap { .. })
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidOptions(err.to_string())
    }
}

//! Renderer construction options

use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::renderer::VideoHandle;
use crate::utils::RenderError;

/// Options accepted by [`crate::Renderer::new`]
///
/// Deserializes from JSON with every field optional; unknown fields are
/// rejected. The video source is attached programmatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererOptions {
    /// Outline every comment and line box
    pub show_collision_boxes: bool,
    /// Draw the frame rate counter
    pub show_fps: bool,
    /// Draw the number of comments on screen
    pub show_comment_count: bool,
    /// Extra scale applied to comment geometry
    pub scale: f32,
    /// Cover-fit the video instead of letterboxing it
    pub legacy_pip_aspect_mode: bool,
    /// Rasterize every comment at construction
    pub eager_rasterize_all: bool,
    /// Rendering constants
    pub config: RenderConfig,
    /// Frame source drawn beneath the comments
    #[serde(skip)]
    pub video: Option<VideoHandle>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            show_collision_boxes: false,
            show_fps: false,
            show_comment_count: false,
            scale: 1.0,
            legacy_pip_aspect_mode: false,
            eager_rasterize_all: false,
            config: RenderConfig::default(),
            video: None,
        }
    }
}

impl RendererOptions {
    /// Parse and validate options from JSON
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidOptions`] for unknown fields or values of
    /// the wrong type, and any error from [`RendererOptions::validate`].
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Attach a video source
    pub fn with_video(mut self, video: VideoHandle) -> Self {
        self.video = Some(video);
        self
    }

    /// Check option values
    ///
    /// # Errors
    ///
    /// Rejects a non-positive scale and anything [`RenderConfig::validate`]
    /// rejects.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(RenderError::InvalidOptions(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        self.config.validate()
    }
}

//! Danmaku comment renderer on tiny-skia
//!
//! `danmaku-renderer` takes the styled comments produced by
//! [`danmaku_core`] and turns them into frames: it measures text against a
//! font provider, places comments so they do not overlap, rasterizes them
//! into cached bitmaps and composites the comments active at a video
//! position onto a [`tiny_skia::Pixmap`].
//!
//! ```no_run
//! use danmaku_core::Comment;
//! use danmaku_renderer::{Renderer, RendererOptions};
//! use tiny_skia::Pixmap;
//!
//! let surface = Pixmap::new(1920, 1080).unwrap();
//! let comments = vec![Comment::new(0, 100, "hello").with_mail(["ue"])];
//! let mut renderer = Renderer::new(surface, comments, RendererOptions::default()).unwrap();
//!
//! renderer.paint(150, false);
//! let frame = renderer.surface();
//! # let _ = frame;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod fonts;
pub mod layout;
pub mod measure;
pub mod options;
pub mod raster;
pub mod renderer;
pub mod utils;

pub use cache::{BitmapCache, CacheKey, CacheStats, Clock, ManualClock, MonotonicClock};
pub use config::RenderConfig;
pub use fonts::{FontMetrics, GlyphSource, MonospaceFonts, SystemFonts};
pub use layout::{Layout, LayoutBox, LayoutEngine, Placement, Position, TickIndex};
pub use measure::{MeasuredComment, TextMeasurer};
pub use options::RendererOptions;
pub use renderer::{BitmapSlot, CommentItem, Renderer, VideoHandle, VideoSource};
pub use utils::RenderError;

/// Re-export of the comment model
pub use danmaku_core::{Comment, RenderMode, StyledComment};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # danmaku-core
//!
//! Comment model and styling interpreter for niconico-style "danmaku" overlays.
//!
//! This crate turns raw comment records into fully resolved styling decisions
//! without touching any rendering machinery:
//!
//! - [`command`]: per-comment mail token parsing into a [`StyleDirective`]
//! - [`script`]: the nicoscript interpreter, whose owner-posted directives
//!   (`@デフォルト`, `@置換`, `@逆`, `@コメント禁止`) alter nearby comments
//! - [`segment`]: script-aware font fallback segmentation for flash-era comments
//!
//! ## Quick Start
//!
//! ```rust
//! use danmaku_core::{Comment, Interpreter, ScriptState, StyleConfig, Lane};
//!
//! let config = StyleConfig::default();
//! let interpreter = Interpreter::new(&config);
//! let mut state = ScriptState::new();
//!
//! let comment = Comment::new(0, 100, "hello").with_mail(["ue", "red"]);
//! let styled = interpreter.apply(&mut state, &comment);
//!
//! assert_eq!(styled.lane, Lane::Top);
//! assert_eq!(styled.long, 300);
//! ```

#![deny(clippy::all)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod comment;
pub mod config;
pub mod script;
pub mod segment;
pub mod utils;

pub use command::{parse_commands, Color, ColorTable, CommentSize, FontFace, Lane, StyleDirective};
pub use comment::{sort_comments, Comment};
pub use config::{FlashMode, RenderMode, StyleConfig};
pub use script::{Interpreter, ScriptState, StyledComment};
pub use segment::{CharClass, Segment, Segments};
pub use utils::{CoreError, ScriptError};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

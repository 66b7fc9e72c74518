//! Utility types shared across the renderer

mod errors;

pub use errors::RenderError;

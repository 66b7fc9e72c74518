//! Shared utilities for the core crate

mod errors;

pub use errors::{CoreError, ScriptError};

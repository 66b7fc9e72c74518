//! Error types for comment styling and nicoscript handling
//!
//! Nothing in the interpreter surfaces these to callers at paint time: a
//! malformed directive is logged and skipped. They exist so the individual
//! parsing steps can use `?` and so configuration loading can fail loudly.

use thiserror::Error;

/// Errors raised while reading a nicoscript directive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// Content does not start with a recognized `@` marker
    #[error("not a nicoscript directive")]
    NotADirective,

    /// A quoted argument was never closed
    #[error("unterminated quote starting at char {0}")]
    UnterminatedQuote(usize),

    /// A required argument is absent
    #[error("missing {0} argument")]
    MissingArgument(&'static str),

    /// An argument has a value outside its vocabulary
    #[error("invalid {field}: {value:?}")]
    InvalidArgument {
        /// Which argument was rejected
        field: &'static str,
        /// The rejected token
        value: String,
    },
}

impl ScriptError {
    /// Shorthand for [`ScriptError::InvalidArgument`]
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            value: value.into(),
        }
    }
}

/// Main error type for core configuration and model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Color literal could not be parsed
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Character class specification is malformed
    #[error("invalid character class: {0}")]
    InvalidCharClass(String),

    /// Configuration value out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// Script directive error
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

impl CoreError {
    /// Create a configuration error from any displayable message
    pub fn config<T: std::fmt::Display>(message: T) -> Self {
        Self::Config(message.to_string())
    }

    /// Check if error is recoverable by skipping the offending item
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Script(_))
    }
}

//! Validation error type shared by the domain types in this crate.
//!
//! This is the `ValidationError` of the engine's error taxonomy: invalid
//! configuration, malformed bars, or order arguments that are out of range
//! or mode-incompatible. It never carries partial state: construction
//! either succeeds or the invalid value is rejected before anything is
//! built from it.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("(de)serialization failed: {message}")]
    Serialization { message: String },
}

impl ModelError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        Self::validation(err.to_string())
    }
}

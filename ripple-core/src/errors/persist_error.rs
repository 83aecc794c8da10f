//! Persisted-form errors.

use super::error_code::{self, RippleErrorCode};

/// Errors that can occur while encoding or reloading a persisted model.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to encode model: {message}")]
    Encode { message: String },

    #[error("Failed to decode model blob: {message}")]
    Decode { message: String },

    #[error("Unsupported blob version {version}")]
    UnsupportedVersion { version: u32 },
}

impl RippleErrorCode for PersistError {
    fn error_code(&self) -> &'static str {
        error_code::PERSIST_ERROR
    }
}

//! Error types for Pinboard core.

use thiserror::Error;

/// Core errors raised by credential handling.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("malformed password hash: {0}")]
    MalformedHash(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

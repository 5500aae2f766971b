//! Error types for the store module.

use pinboard_core::{InviteToken, ResourceRef};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(ResourceRef),

    /// Another user already holds this username (compared case-insensitively).
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// Another board already holds this invite token.
    #[error("invite token collision")]
    InviteTokenTaken(InviteToken),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking worker running a query panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Task(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("connection poisoned: {0}")]
    Poisoned(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

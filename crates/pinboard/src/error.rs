//! Error types for the Pinboard service.

use pinboard_core::{CoreError, FieldErrors};
use pinboard_perms::PermsError;
use pinboard_store::StoreError;
use serde_json::{json, Value};
use thiserror::Error;

/// Reported when a request carries no credentials.
pub const CREDENTIALS_MISSING: &str = "Authentication credentials were not provided.";
/// Reported when the presented bearer token matches no session.
pub const INVALID_TOKEN: &str = "Invalid token.";
/// Reported when an invite is redeemed without logging in.
pub const LOGIN_REQUIRED: &str = "must be logged in";
/// Reported for a registration or rename onto a taken username.
pub const USERNAME_TAKEN: &str = "USERNAME_IS_USED_BY_USER";
/// Reported for a failed login.
pub const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

/// Errors that can occur during Pinboard operations.
///
/// Every variant has a fixed HTTP status and JSON body, see
/// [`PinboardError::status`] and [`PinboardError::body`].
#[derive(Debug, Error)]
pub enum PinboardError {
    /// No valid credentials.
    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),

    /// Authenticated, but not allowed to do this to a visible resource.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Missing, or invisible to the actor.
    #[error("not found")]
    NotFound,

    /// No board holds the presented invite token.
    #[error("invite token not found")]
    InviteNotFound,

    /// A payload references a record that does not exist, is not visible,
    /// or may not be used there.
    #[error("invalid reference: {0}")]
    InvalidReference(FieldErrors),

    /// Malformed fields.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Login with an unknown username or a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The path exists but does not accept this method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Storage error.
    #[error("storage error: {0}")]
    Store(StoreError),

    /// Core error (password hashing).
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A response body could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl PinboardError {
    /// Build a single-field validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        PinboardError::Validation(FieldErrors::single(field, message))
    }

    /// Build a single-field reference error.
    pub fn reference(field: &str, message: impl Into<String>) -> Self {
        PinboardError::InvalidReference(FieldErrors::single(field, message))
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            PinboardError::Unauthenticated(_) => 401,
            PinboardError::Forbidden(_) | PinboardError::InvalidReference(_) => 403,
            PinboardError::NotFound | PinboardError::InviteNotFound => 404,
            PinboardError::MethodNotAllowed => 405,
            PinboardError::Validation(_) | PinboardError::InvalidCredentials => 400,
            PinboardError::Store(_) | PinboardError::Core(_) | PinboardError::Encoding(_) => 500,
        }
    }

    /// JSON body for this error.
    pub fn body(&self) -> Value {
        match self {
            PinboardError::Unauthenticated(detail) | PinboardError::Forbidden(detail) => {
                json!({ "detail": detail })
            }
            PinboardError::NotFound => json!({ "detail": "Not found." }),
            PinboardError::InviteNotFound => {
                json!({ "detail": "Such invite token does not exist" })
            }
            PinboardError::InvalidReference(errors) | PinboardError::Validation(errors) => {
                serde_json::to_value(errors).unwrap_or(Value::Null)
            }
            PinboardError::InvalidCredentials => {
                json!({ "non_field_errors": [BAD_CREDENTIALS] })
            }
            PinboardError::MethodNotAllowed => json!({ "detail": "Method not allowed." }),
            PinboardError::Store(_) | PinboardError::Core(_) | PinboardError::Encoding(_) => {
                json!({ "detail": "Internal server error." })
            }
        }
    }

    /// Whether this is a server-side failure rather than a client error.
    pub fn is_internal(&self) -> bool {
        self.status() >= 500
    }
}

impl From<StoreError> for PinboardError {
    fn from(err: StoreError) -> Self {
        match err {
            // A record vanished between the existence check and the write.
            StoreError::NotFound(_) => PinboardError::NotFound,
            StoreError::UsernameTaken(_) => PinboardError::field("username", USERNAME_TAKEN),
            other => PinboardError::Store(other),
        }
    }
}

impl From<PermsError> for PinboardError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::Unauthenticated => PinboardError::Unauthenticated(CREDENTIALS_MISSING),
            PermsError::Hidden => PinboardError::NotFound,
            PermsError::Forbidden(detail) => PinboardError::Forbidden(detail),
            PermsError::NotAMember(_) => {
                PinboardError::reference("assigned_to", crate::guard::NOT_A_MEMBER)
            }
        }
    }
}

/// Result type for Pinboard operations.
pub type Result<T> = std::result::Result<T, PinboardError>;

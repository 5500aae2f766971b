//! Error types for the permissions module.

use pinboard_core::UserId;
use thiserror::Error;

/// Why an actor may not perform an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The actor is anonymous and the operation needs a user.
    #[error("authentication required")]
    Unauthenticated,

    /// The target exists but is not visible to the actor. Callers report
    /// this exactly like a missing record.
    #[error("resource is not visible to the actor")]
    Hidden,

    /// The target is visible but the actor lacks the role for this write.
    #[error("permission denied: {0}")]
    Forbidden(&'static str),

    /// A proposed assignee is neither owner nor member of the board.
    #[error("{0} is not a member of this board")]
    NotAMember(UserId),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;

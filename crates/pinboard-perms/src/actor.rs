//! The principal a request runs as.

use pinboard_core::{User, UserId};

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No credentials were presented.
    Anonymous,
    /// An authenticated user.
    User { id: UserId, is_admin: bool },
}

impl Actor {
    pub fn user(id: UserId) -> Self {
        Actor::User {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: UserId) -> Self {
        Actor::User { id, is_admin: true }
    }

    /// The user id, or `None` for anonymous actors.
    pub fn id(&self) -> Option<UserId> {
        match self {
            Actor::Anonymous => None,
            Actor::User { id, .. } => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User { .. })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::User { is_admin: true, .. })
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor::User {
            id: user.id,
            is_admin: user.is_admin,
        }
    }
}

/// What an actor is trying to do to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

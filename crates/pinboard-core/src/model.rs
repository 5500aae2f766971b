//! Entity records and the drafts/patches used to create and change them.
//!
//! Relations form a strict tree: Board → Section → Sticker. Board membership
//! is not stored on [`Board`]; it lives in its own join table and is loaded
//! as a [`BoardRoster`](crate::roster::BoardRoster).

use std::collections::BTreeSet;

use crate::ids::{BoardId, SectionId, StickerId, UserId};
use crate::token::InviteToken;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Argon2id PHC string. Never leaves the service.
    pub password_hash: String,
    pub is_admin: bool,
    /// Unix milliseconds.
    pub created_at: i64,
}

/// Data for a user about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Changes to an existing user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// A board: the root of the resource tree and the unit of access control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    pub owner: UserId,
    /// The single live invite token.
    pub invite_token: InviteToken,
}

/// Data for a board about to be created. The owner and invite token are
/// supplied by the service, never by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBoard {
    pub title: String,
    pub description: String,
}

/// Changes to a board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replacement member set. The owner is never stored as a member.
    pub users: Option<BTreeSet<UserId>>,
}

impl BoardUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.users.is_none()
    }
}

/// A section (column) of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub board: BoardId,
    pub title: String,
    pub description: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    pub board: BoardId,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionUpdate {
    /// Target board. Only the current board is accepted.
    pub board: Option<BoardId>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A sticker (card) inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sticker {
    pub id: StickerId,
    pub section: SectionId,
    pub title: String,
    pub text: String,
    pub created_at: i64,
    /// Owner or member of the effective board, or `None` when unassigned.
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSticker {
    pub section: SectionId,
    pub title: String,
    pub text: String,
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickerUpdate {
    /// Target section. Must belong to the same board.
    pub section: Option<SectionId>,
    pub title: Option<String>,
    pub text: Option<String>,
    /// `Some(None)` clears the assignment.
    pub assigned_to: Option<Option<UserId>>,
}

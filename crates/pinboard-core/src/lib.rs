//! # Pinboard Core
//!
//! Pure primitives for Pinboard: identifiers, entity records, board rosters,
//! tokens, credentials and field validation.
//!
//! This crate contains no I/O and no storage. Everything here is plain data
//! plus the computations the store and the service share.
//!
//! ## Key Types
//!
//! - [`Board`], [`Section`], [`Sticker`], [`User`] - the entity records
//! - [`BoardRoster`] - owner and members of a board
//! - [`InviteToken`] - the rotating capability for joining a board
//! - [`BearerToken`] / [`TokenDigest`] - login sessions
//! - [`FieldErrors`] - field-keyed validation messages

pub mod credential;
pub mod error;
pub mod ids;
pub mod model;
pub mod roster;
pub mod token;
pub mod validation;

pub use credential::{
    check_password, hash_password, password_meets_policy, verify_password, MIN_PASSWORD_LEN,
    PASSWORD_POLICY_MESSAGE,
};
pub use error::{CoreError, Result};
pub use ids::{BoardId, ResourceRef, SectionId, StickerId, UserId};
pub use model::{
    Board, BoardUpdate, NewBoard, NewSection, NewSticker, NewUser, Section, SectionUpdate, Sticker,
    StickerUpdate, User, UserUpdate,
};
pub use roster::{BoardRoster, Role};
pub use token::{BearerToken, InviteToken, TokenDigest, INVITE_TOKEN_LEN};
pub use validation::{FieldErrors, FieldLimits};

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

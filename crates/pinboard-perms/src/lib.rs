//! # Pinboard Permissions
//!
//! The authorization engine: who may read or change which board, section,
//! sticker or user record.
//!
//! ## Overview
//!
//! Access is owner/member based and hierarchical. A board's roster (its owner
//! plus its member set) governs the board and everything below it. This crate
//! is pure policy; resolving a section or sticker to its board's roster is
//! the store's job (`pinboard_store::HierarchyExt`).
//!
//! ## Key Concepts
//!
//! - **Actor**: anonymous, or an authenticated user (possibly an admin)
//! - **Hidden**: a target that exists but is invisible to the actor; it must
//!   be reported exactly like a missing one
//! - **List scope**: listings are filtered to the actor's visible boards and
//!   are empty for anonymous actors
//!
//! ## Usage
//!
//! ```rust
//! use pinboard_core::{BoardId, BoardRoster, UserId};
//! use pinboard_perms::{authorize, Actor, Operation, PermsError, Target};
//!
//! let roster = BoardRoster::new(BoardId::new(1), UserId::new(1), [UserId::new(2)]);
//! let member = Actor::user(UserId::new(2));
//!
//! assert!(authorize(&member, Operation::Read, &Target::Board(&roster)).is_ok());
//! assert!(matches!(
//!     authorize(&member, Operation::Delete, &Target::Board(&roster)),
//!     Err(PermsError::Forbidden(_))
//! ));
//! ```

pub mod actor;
pub mod error;
pub mod policy;

pub use actor::{Actor, Operation};
pub use error::{PermsError, Result};
pub use policy::{authorize, can_see, check_assignee, list_scope, ListScope, Target, NOT_PERMITTED};

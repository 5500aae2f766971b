//! # Pinboard
//!
//! The unified API for Pinboard - a kanban-style board sharing backend.
//!
//! ## Overview
//!
//! Users own boards holding sections of stickers (cards). Owners bring in
//! collaborators with a single-use invite token that rotates every time it
//! admits someone, and stickers can be assigned to anyone on the board.
//!
//! ## Key Concepts
//!
//! - **Roster**: a board's owner plus its members. It governs the board and
//!   every section and sticker below it
//! - **Invite token**: the one live capability for joining a board
//! - **Visibility**: boards outside the actor's rosters behave as if they
//!   did not exist
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pinboard::{Api, ApiRequest, Pinboard, PinboardConfig};
//! use pinboard::store::SqliteStore;
//! use serde_json::json;
//!
//! async fn example() {
//!     // Open storage
//!     let store = SqliteStore::open("pinboard.db").unwrap();
//!
//!     // Create the service and put the dispatcher in front of it
//!     let api = Api::new(Pinboard::new(store, PinboardConfig::default()));
//!
//!     let response = api
//!         .handle(ApiRequest::post(
//!             "/api/registration/",
//!             json!({"username": "alice", "password": "Password1"}),
//!         ))
//!         .await;
//!     assert_eq!(response.status, 201);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `pinboard::core` - Ids, entity records, tokens, validation
//! - `pinboard::store` - Storage abstraction and SQLite
//! - `pinboard::perms` - Actors and the authorization policy

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod invite;
pub mod service;

// Re-export component crates
pub use pinboard_core as core;
pub use pinboard_perms as perms;
pub use pinboard_store as store;

// Re-export main types for convenience
pub use api::{Api, ApiRequest, ApiResponse, Method};
pub use config::PinboardConfig;
pub use error::{PinboardError, Result};
pub use service::{BoardView, Pinboard, UserChanges, UserProfile};

// Re-export commonly used component types
pub use pinboard_core::{
    Board, BoardId, BoardUpdate, InviteToken, NewBoard, NewSection, NewSticker, Section,
    SectionId, SectionUpdate, Sticker, StickerId, StickerUpdate, User, UserId,
};
pub use pinboard_perms::Actor;

//! # Pinboard Store
//!
//! Storage abstraction for Pinboard. Provides a trait-based interface for
//! persisting users, sessions, boards, sections and stickers, with SQLite and
//! in-memory implementations.
//!
//! ## Overview
//!
//! The service only ever talks to the [`Store`] trait, which keeps it
//! storage-agnostic. The primary implementation is [`SqliteStore`], with
//! [`MemoryStore`] for tests. [`HierarchyExt`] adds parent-chain resolution
//! on top of any store.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`RedeemResult`] - Outcome of an atomic invite redemption
//! - [`HierarchyExt`] - Sticker → Section → Board resolution
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pinboard_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("pinboard.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let user = store.find_user_by_username("alice").await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Compare-and-rotate**: invite redemption checks the live token and
//!   rotates it in one unit, so a token admits at most one new member
//! - **Cascades**: deleting a parent removes everything below it
//! - **Case-insensitive usernames**: uniqueness is enforced on a lowercased key

pub mod error;
pub mod hierarchy;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use hierarchy::HierarchyExt;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RedeemResult, Store};

//! # Pinboard Testkit
//!
//! Testing utilities for Pinboard.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an [`Api`](pinboard::Api) over a store, with helpers to
//!   register users and build boards, sections and stickers
//! - **Generators**: Proptest strategies for usernames, passwords and titles
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use pinboard_testkit::fixtures::TestFixture;
//!
//! # async fn example() {
//! let fixture = TestFixture::new();
//! let alice = fixture.register("alice").await;
//! let board = fixture.board(&alice, "Roadmap").await;
//! let section = fixture.section(&alice, board, "Doing").await;
//! # }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use pinboard_testkit::generators::{valid_password, weak_password};
//! use pinboard::core::password_meets_policy;
//!
//! proptest! {
//!     #[test]
//!     fn policy_matches_generators(good in valid_password(), bad in weak_password()) {
//!         prop_assert!(password_meets_policy(&good));
//!         prop_assert!(!password_meets_policy(&bad));
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{id_of, Session, TestFixture, DEFAULT_PASSWORD};
pub use generators::{id_set, title, username, valid_password, weak_password};

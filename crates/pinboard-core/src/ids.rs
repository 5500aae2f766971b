//! Strong identifier types for Pinboard entities.
//!
//! All identifiers are newtypes over the store's integer row ids, so a
//! `SectionId` can never be passed where a `BoardId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw row id.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Get the raw row id.
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered user.
    UserId,
    "user"
);
entity_id!(
    /// Identifier of a board.
    BoardId,
    "board"
);
entity_id!(
    /// Identifier of a section within a board.
    SectionId,
    "section"
);
entity_id!(
    /// Identifier of a sticker within a section.
    StickerId,
    "sticker"
);

/// A typed reference to any of the four resource kinds.
///
/// Used to report which hop of the Board → Section → Sticker chain was
/// missing when a lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    User(UserId),
    Board(BoardId),
    Section(SectionId),
    Sticker(StickerId),
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::User(id) => write!(f, "{}", id),
            ResourceRef::Board(id) => write!(f, "{}", id),
            ResourceRef::Section(id) => write!(f, "{}", id),
            ResourceRef::Sticker(id) => write!(f, "{}", id),
        }
    }
}

impl From<UserId> for ResourceRef {
    fn from(id: UserId) -> Self {
        ResourceRef::User(id)
    }
}

impl From<BoardId> for ResourceRef {
    fn from(id: BoardId) -> Self {
        ResourceRef::Board(id)
    }
}

impl From<SectionId> for ResourceRef {
    fn from(id: SectionId) -> Self {
        ResourceRef::Section(id)
    }
}

impl From<StickerId> for ResourceRef {
    fn from(id: StickerId) -> Self {
        ResourceRef::Sticker(id)
    }
}

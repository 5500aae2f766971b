//! Board rosters: the owner plus the member set of one board.
//!
//! The roster is what every access decision is made against. Sections and
//! stickers have no access list of their own; they inherit the roster of
//! their effective board.

use std::collections::BTreeSet;

use crate::ids::{BoardId, UserId};

/// How a user relates to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Member,
}

/// Owner and members of a board.
///
/// The owner is never part of `members`; construction strips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRoster {
    board: BoardId,
    owner: UserId,
    members: BTreeSet<UserId>,
}

impl BoardRoster {
    /// Build a roster, dropping the owner from the member set if present.
    pub fn new(board: BoardId, owner: UserId, members: impl IntoIterator<Item = UserId>) -> Self {
        let members = members.into_iter().filter(|m| *m != owner).collect();
        Self {
            board,
            owner,
            members,
        }
    }

    pub fn board(&self) -> BoardId {
        self.board
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Non-owner collaborators.
    pub fn members(&self) -> &BTreeSet<UserId> {
        &self.members
    }

    /// The user's role on this board, if any.
    pub fn role_of(&self, user: UserId) -> Option<Role> {
        if user == self.owner {
            Some(Role::Owner)
        } else if self.members.contains(&user) {
            Some(Role::Member)
        } else {
            None
        }
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Owner or member.
    pub fn has_access(&self, user: UserId) -> bool {
        self.role_of(user).is_some()
    }

    /// Owner followed by members, in id order.
    pub fn everyone(&self) -> impl Iterator<Item = UserId> + '_ {
        std::iter::once(self.owner).chain(self.members.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_roles() {
        let roster = BoardRoster::new(BoardId::new(1), UserId::new(1), [UserId::new(2)]);
        assert_eq!(roster.role_of(UserId::new(1)), Some(Role::Owner));
        assert_eq!(roster.role_of(UserId::new(2)), Some(Role::Member));
        assert_eq!(roster.role_of(UserId::new(3)), None);
        assert!(!roster.has_access(UserId::new(3)));
    }

    #[test]
    fn test_everyone_lists_owner_first() {
        let roster = BoardRoster::new(
            BoardId::new(1),
            UserId::new(5),
            [UserId::new(9), UserId::new(2)],
        );
        let all: Vec<_> = roster.everyone().collect();
        assert_eq!(all, vec![UserId::new(5), UserId::new(2), UserId::new(9)]);
    }

    proptest! {
        #[test]
        fn owner_is_never_a_member(owner in 1i64..20, members in prop::collection::vec(1i64..20, 0..10)) {
            let roster = BoardRoster::new(
                BoardId::new(1),
                UserId::new(owner),
                members.into_iter().map(UserId::new),
            );
            prop_assert!(!roster.members().contains(&UserId::new(owner)));
            prop_assert_eq!(roster.role_of(UserId::new(owner)), Some(Role::Owner));
        }
    }
}

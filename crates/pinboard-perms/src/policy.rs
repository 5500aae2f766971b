//! The access policy.
//!
//! Every decision reduces to one question about a [`BoardRoster`]: is the
//! actor the owner, a member, or neither. Sections and stickers carry no
//! access list of their own, so the caller resolves their effective board
//! and passes its roster in.
//!
//! | Target  | Read           | Update / Delete | Create                      |
//! |---------|----------------|-----------------|-----------------------------|
//! | Board   | owner, member  | owner           | any user (via `Boards`)     |
//! | Section | owner, member  | owner, member   | owner, member of the board  |
//! | Sticker | owner, member  | owner, member   | owner, member of the board  |
//! | User    | self           | self            | admin (via `Users`)         |
//!
//! Sticker writes additionally require the assignee, if any, to be on the
//! roster.

use pinboard_core::{BoardRoster, UserId};

use crate::actor::{Actor, Operation};
use crate::error::{PermsError, Result};

/// Message for a visible target the actor may not change.
pub const NOT_PERMITTED: &str = "You do not have permission to perform this action.";

/// What an operation is aimed at.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// An existing board.
    Board(&'a BoardRoster),
    /// A section, or a new section's parent board, by that board's roster.
    Section(&'a BoardRoster),
    /// A sticker, or a new sticker's parent, by the roster of the
    /// effective board. `assignee` is the assignment the sticker will hold
    /// once the operation is applied.
    Sticker {
        roster: &'a BoardRoster,
        assignee: Option<UserId>,
    },
    /// An existing user record.
    User(UserId),
    /// The board collection.
    Boards,
    /// The user collection.
    Users,
}

/// Decide whether `actor` may perform `operation` on `target`.
///
/// Anonymous actors are always rejected with `Unauthenticated`. A roster
/// target the actor cannot see yields `Hidden`, which callers must report
/// as a missing record.
pub fn authorize(actor: &Actor, operation: Operation, target: &Target<'_>) -> Result<()> {
    let Some(me) = actor.id() else {
        return Err(PermsError::Unauthenticated);
    };

    match *target {
        Target::Boards => match operation {
            Operation::Read | Operation::Create => Ok(()),
            Operation::Update | Operation::Delete => Err(PermsError::Forbidden(NOT_PERMITTED)),
        },

        Target::Users => match operation {
            Operation::Create if actor.is_admin() => Ok(()),
            _ => Err(PermsError::Forbidden(NOT_PERMITTED)),
        },

        Target::Board(roster) => {
            if !roster.has_access(me) {
                return Err(PermsError::Hidden);
            }
            match operation {
                Operation::Read => Ok(()),
                Operation::Update | Operation::Delete if roster.is_owner(me) => Ok(()),
                _ => Err(PermsError::Forbidden(NOT_PERMITTED)),
            }
        }

        Target::Section(roster) => {
            if roster.has_access(me) {
                Ok(())
            } else {
                Err(PermsError::Hidden)
            }
        }

        Target::Sticker { roster, assignee } => {
            if !roster.has_access(me) {
                return Err(PermsError::Hidden);
            }
            if matches!(operation, Operation::Create | Operation::Update) {
                check_assignee(roster, assignee)?;
            }
            Ok(())
        }

        Target::User(user) => {
            if user != me {
                return Err(PermsError::Hidden);
            }
            match operation {
                Operation::Create => Err(PermsError::Forbidden(NOT_PERMITTED)),
                _ => Ok(()),
            }
        }
    }
}

/// An assignee must be the owner or a member of the sticker's board.
pub fn check_assignee(roster: &BoardRoster, assignee: Option<UserId>) -> Result<()> {
    match assignee {
        Some(user) if !roster.has_access(user) => Err(PermsError::NotAMember(user)),
        _ => Ok(()),
    }
}

/// Whether the actor can see a board (and everything under it).
pub fn can_see(actor: &Actor, roster: &BoardRoster) -> bool {
    actor.id().is_some_and(|me| roster.has_access(me))
}

/// Which records a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Anonymous listings are empty, not an error.
    Nothing,
    /// Boards this user owns or belongs to, and everything under them.
    VisibleTo(UserId),
}

pub fn list_scope(actor: &Actor) -> ListScope {
    match actor.id() {
        Some(id) => ListScope::VisibleTo(id),
        None => ListScope::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_core::BoardId;
    use proptest::prelude::*;

    const OWNER: UserId = UserId::new(1);
    const MEMBER: UserId = UserId::new(2);
    const OUTSIDER: UserId = UserId::new(3);

    fn roster() -> BoardRoster {
        BoardRoster::new(BoardId::new(10), OWNER, [MEMBER])
    }

    const ALL_OPS: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    #[test]
    fn test_anonymous_denied_everywhere() {
        let roster = roster();
        let targets = [
            Target::Board(&roster),
            Target::Section(&roster),
            Target::Sticker {
                roster: &roster,
                assignee: None,
            },
            Target::User(OWNER),
            Target::Boards,
            Target::Users,
        ];
        for target in &targets {
            for op in ALL_OPS {
                assert_eq!(
                    authorize(&Actor::Anonymous, op, target),
                    Err(PermsError::Unauthenticated)
                );
            }
        }
        assert_eq!(list_scope(&Actor::Anonymous), ListScope::Nothing);
    }

    #[test]
    fn test_board_owner_only_writes() {
        let roster = roster();
        let board = Target::Board(&roster);

        for op in [Operation::Read, Operation::Update, Operation::Delete] {
            assert_eq!(authorize(&Actor::user(OWNER), op, &board), Ok(()));
        }

        assert_eq!(authorize(&Actor::user(MEMBER), Operation::Read, &board), Ok(()));
        assert_eq!(
            authorize(&Actor::user(MEMBER), Operation::Update, &board),
            Err(PermsError::Forbidden(NOT_PERMITTED))
        );
        assert_eq!(
            authorize(&Actor::user(MEMBER), Operation::Delete, &board),
            Err(PermsError::Forbidden(NOT_PERMITTED))
        );
    }

    #[test]
    fn test_outsider_sees_nothing() {
        let roster = roster();
        let outsider = Actor::user(OUTSIDER);
        for op in ALL_OPS {
            assert_eq!(
                authorize(&outsider, op, &Target::Board(&roster)),
                Err(PermsError::Hidden)
            );
            assert_eq!(
                authorize(&outsider, op, &Target::Section(&roster)),
                Err(PermsError::Hidden)
            );
        }
        assert!(!can_see(&outsider, &roster));
    }

    #[test]
    fn test_members_edit_sections_and_stickers() {
        let roster = roster();
        let member = Actor::user(MEMBER);
        for op in ALL_OPS {
            assert_eq!(authorize(&member, op, &Target::Section(&roster)), Ok(()));
            let sticker = Target::Sticker {
                roster: &roster,
                assignee: Some(OWNER),
            };
            assert_eq!(authorize(&member, op, &sticker), Ok(()));
        }
    }

    #[test]
    fn test_assignee_must_be_on_roster() {
        let roster = roster();
        let sticker = Target::Sticker {
            roster: &roster,
            assignee: Some(OUTSIDER),
        };
        assert_eq!(
            authorize(&Actor::user(OWNER), Operation::Create, &sticker),
            Err(PermsError::NotAMember(OUTSIDER))
        );
        assert_eq!(
            authorize(&Actor::user(OWNER), Operation::Update, &sticker),
            Err(PermsError::NotAMember(OUTSIDER))
        );
        // A stale assignment does not block deletion.
        assert_eq!(
            authorize(&Actor::user(OWNER), Operation::Delete, &sticker),
            Ok(())
        );
    }

    #[test]
    fn test_user_records_are_private() {
        let me = Actor::user(MEMBER);
        assert_eq!(authorize(&me, Operation::Read, &Target::User(MEMBER)), Ok(()));
        assert_eq!(authorize(&me, Operation::Delete, &Target::User(MEMBER)), Ok(()));
        assert_eq!(
            authorize(&me, Operation::Read, &Target::User(OWNER)),
            Err(PermsError::Hidden)
        );
    }

    #[test]
    fn test_admin_creates_users() {
        assert_eq!(
            authorize(&Actor::admin(OWNER), Operation::Create, &Target::Users),
            Ok(())
        );
        assert_eq!(
            authorize(&Actor::user(OWNER), Operation::Create, &Target::Users),
            Err(PermsError::Forbidden(NOT_PERMITTED))
        );
    }

    #[test]
    fn test_admin_has_no_extra_board_power() {
        let roster = roster();
        assert_eq!(
            authorize(&Actor::admin(OUTSIDER), Operation::Read, &Target::Board(&roster)),
            Err(PermsError::Hidden)
        );
    }

    proptest! {
        #[test]
        fn prop_access_matches_roster(
            owner in 1i64..20,
            members in proptest::collection::btree_set(1i64..20, 0..6),
            actor in 1i64..20,
        ) {
            let roster = BoardRoster::new(
                BoardId::new(1),
                UserId::new(owner),
                members.iter().copied().map(UserId::new),
            );
            let actor_id = UserId::new(actor);
            let result = authorize(&Actor::user(actor_id), Operation::Update, &Target::Board(&roster));

            if actor == owner {
                prop_assert_eq!(result, Ok(()));
            } else if members.contains(&actor) {
                prop_assert_eq!(result, Err(PermsError::Forbidden(NOT_PERMITTED)));
            } else {
                prop_assert_eq!(result, Err(PermsError::Hidden));
            }
        }
    }
}

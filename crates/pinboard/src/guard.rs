//! Mutation guards: checks on the references a payload carries.
//!
//! A payload may name a parent (`board`, `section`) or a user (`assigned_to`,
//! `users`). Each reference is looked up before it is used. A missing one
//! fails with an error naming the field, and so does one the actor cannot
//! see, so the two cases are indistinguishable.

use std::collections::BTreeSet;

use pinboard_core::{BoardId, BoardRoster, FieldErrors, Section, SectionId, Sticker, UserId};
use pinboard_perms::{authorize, can_see, Actor, Operation, PermsError, Target};
use pinboard_store::{HierarchyExt, Store};

use crate::error::{PinboardError, Result};

pub const NO_SUCH_BOARD: &str = "such board does not exist";
pub const NO_SUCH_SECTION: &str = "Such section does not exist";
pub const NO_SUCH_USER: &str = "Such user does not exist";
pub const NOT_A_MEMBER: &str = "User is not a member of this board";
pub const STICKER_CROSSES_BOARDS: &str = "Cannot move a sticker to another board";
pub const SECTION_CROSSES_BOARDS: &str = "Cannot move a section to another board";

/// Resolve the board a new section is created on.
///
/// A missing or invisible board is rejected with 403
/// `{"detail": "such board does not exist"}`.
pub async fn section_parent<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    board: BoardId,
) -> Result<BoardRoster> {
    let Some(roster) = store.get_roster(board).await? else {
        return Err(PinboardError::Forbidden(NO_SUCH_BOARD));
    };
    match authorize(actor, Operation::Create, &Target::Section(&roster)) {
        Ok(()) => Ok(roster),
        Err(PermsError::Hidden) => Err(PinboardError::Forbidden(NO_SUCH_BOARD)),
        Err(e) => Err(e.into()),
    }
}

/// Resolve the section a sticker is created in or moved to, with the roster
/// of its board.
pub async fn sticker_parent<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    section: SectionId,
) -> Result<(Section, BoardRoster)> {
    let Some(record) = store.get_section(section).await? else {
        return Err(PinboardError::reference("section", NO_SUCH_SECTION));
    };
    let roster = store.effective_roster(section.into()).await?;
    if !can_see(actor, &roster) {
        return Err(PinboardError::reference("section", NO_SUCH_SECTION));
    }
    Ok((record, roster))
}

/// A sticker may move between sections of its own board only.
pub async fn sticker_move<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    sticker: &Sticker,
    to: SectionId,
) -> Result<()> {
    if to == sticker.section {
        return Ok(());
    }
    let (target, _) = sticker_parent(store, actor, to).await?;
    let from = store.section_board(sticker.section).await?;
    if target.board != from {
        return Err(PinboardError::reference("section", STICKER_CROSSES_BOARDS));
    }
    Ok(())
}

/// Sections never change boards. Naming the current board is a no-op.
pub fn section_move(section: &Section, to: Option<BoardId>) -> Result<()> {
    match to {
        Some(board) if board != section.board => {
            Err(PinboardError::reference("board", SECTION_CROSSES_BOARDS))
        }
        _ => Ok(()),
    }
}

/// An assignee must exist and be on the board's roster.
pub async fn assignee<S: Store + ?Sized>(
    store: &S,
    roster: &BoardRoster,
    assignee: Option<UserId>,
) -> Result<()> {
    let Some(user) = assignee else {
        return Ok(());
    };
    if store.get_user(user).await?.is_none() {
        return Err(PinboardError::reference("assigned_to", NO_SUCH_USER));
    }
    pinboard_perms::check_assignee(roster, Some(user))?;
    Ok(())
}

/// Every user in a replacement member set must exist.
pub async fn board_users<S: Store + ?Sized>(store: &S, users: &BTreeSet<UserId>) -> Result<()> {
    let mut errors = FieldErrors::new();
    for user in users {
        if store.get_user(*user).await?.is_none() {
            errors.add(
                "users",
                format!("Invalid pk \"{}\" - object does not exist.", user.get()),
            );
        }
    }
    errors
        .into_result()
        .map_err(PinboardError::InvalidReference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_core::{InviteToken, NewBoard, NewSection, NewUser};
    use pinboard_store::MemoryStore;

    struct World {
        store: MemoryStore,
        alice: UserId,
        bob: UserId,
        board: BoardId,
        todo: Section,
        foreign: Section,
    }

    async fn user(store: &MemoryStore, name: &str) -> UserId {
        store
            .insert_user(&NewUser {
                username: name.into(),
                password_hash: "x".into(),
                is_admin: false,
            })
            .await
            .unwrap()
            .id
    }

    async fn board(store: &MemoryStore, owner: UserId, token: &str) -> BoardId {
        store
            .insert_board(
                owner,
                &NewBoard {
                    title: "T".into(),
                    description: String::new(),
                },
                &InviteToken::from_string(token),
            )
            .await
            .unwrap()
            .id
    }

    async fn section(store: &MemoryStore, board: BoardId) -> Section {
        store
            .insert_section(&NewSection {
                board,
                title: "s".into(),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    async fn world() -> World {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let board_id = board(&store, alice, "A").await;
        let other = board(&store, alice, "B").await;
        let todo = section(&store, board_id).await;
        let foreign = section(&store, other).await;
        World {
            store,
            alice,
            bob,
            board: board_id,
            todo,
            foreign,
        }
    }

    fn sticker_in(section: &Section) -> Sticker {
        Sticker {
            id: pinboard_core::StickerId::new(1),
            section: section.id,
            title: "card".into(),
            text: String::new(),
            created_at: 0,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn test_section_parent_hides_foreign_boards() {
        let w = world().await;

        assert!(section_parent(&w.store, &Actor::user(w.alice), w.board).await.is_ok());

        let err = section_parent(&w.store, &Actor::user(w.bob), w.board)
            .await
            .unwrap_err();
        assert!(matches!(err, PinboardError::Forbidden(NO_SUCH_BOARD)));

        let err = section_parent(&w.store, &Actor::user(w.alice), BoardId::new(999))
            .await
            .unwrap_err();
        assert!(matches!(err, PinboardError::Forbidden(NO_SUCH_BOARD)));
    }

    #[tokio::test]
    async fn test_sticker_move_within_board() {
        let w = world().await;
        let done = section(&w.store, w.board).await;
        let sticker = sticker_in(&w.todo);

        sticker_move(&w.store, &Actor::user(w.alice), &sticker, done.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sticker_move_across_boards_rejected() {
        let w = world().await;
        let sticker = sticker_in(&w.todo);

        let err = sticker_move(&w.store, &Actor::user(w.alice), &sticker, w.foreign.id)
            .await
            .unwrap_err();
        assert_eq!(
            err.body(),
            serde_json::json!({"section": [STICKER_CROSSES_BOARDS]})
        );
    }

    #[tokio::test]
    async fn test_sticker_parent_resolves_through_hierarchy() {
        let w = world().await;

        let (record, roster) = sticker_parent(&w.store, &Actor::user(w.alice), w.foreign.id)
            .await
            .unwrap();
        assert_eq!(record.id, w.foreign.id);
        assert_eq!(roster, w.store.effective_roster(w.foreign.id.into()).await.unwrap());
        assert_ne!(roster.board(), w.board);

        let err = sticker_parent(&w.store, &Actor::user(w.bob), w.todo.id)
            .await
            .unwrap_err();
        assert_eq!(err.body(), serde_json::json!({"section": [NO_SUCH_SECTION]}));
    }

    #[tokio::test]
    async fn test_sticker_move_to_missing_section() {
        let w = world().await;
        let sticker = sticker_in(&w.todo);

        let err = sticker_move(&w.store, &Actor::user(w.alice), &sticker, SectionId::new(77))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(err.body(), serde_json::json!({"section": [NO_SUCH_SECTION]}));
    }

    #[test]
    fn test_section_move() {
        let section = Section {
            id: SectionId::new(1),
            board: BoardId::new(1),
            title: "s".into(),
            description: String::new(),
            created_at: 0,
        };
        assert!(section_move(&section, None).is_ok());
        assert!(section_move(&section, Some(BoardId::new(1))).is_ok());
        assert!(matches!(
            section_move(&section, Some(BoardId::new(2))),
            Err(PinboardError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_assignee_checks() {
        let w = world().await;
        let roster = w.store.roster_of(w.board).await.unwrap();

        assert!(assignee(&w.store, &roster, None).await.is_ok());
        assert!(assignee(&w.store, &roster, Some(w.alice)).await.is_ok());

        let err = assignee(&w.store, &roster, Some(w.bob)).await.unwrap_err();
        assert_eq!(err.body(), serde_json::json!({"assigned_to": [NOT_A_MEMBER]}));

        let err = assignee(&w.store, &roster, Some(UserId::new(404)))
            .await
            .unwrap_err();
        assert_eq!(err.body(), serde_json::json!({"assigned_to": [NO_SUCH_USER]}));
    }

    #[tokio::test]
    async fn test_board_users_reports_each_missing_id() {
        let w = world().await;
        let users: BTreeSet<_> = [w.bob, UserId::new(8), UserId::new(9)].into_iter().collect();

        let err = board_users(&w.store, &users).await.unwrap_err();
        let PinboardError::InvalidReference(errors) = err else {
            panic!("expected a reference error");
        };
        assert_eq!(errors.get("users").map(|m| m.len()), Some(2));
    }
}

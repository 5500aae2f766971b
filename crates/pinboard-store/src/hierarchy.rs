//! Hierarchy resolution: walking Sticker → Section → Board.
//!
//! Access is decided against a board roster, so every section or sticker has
//! to be traced back to the board it hangs off. These helpers are the only
//! place that walk is written down.

use async_trait::async_trait;
use pinboard_core::{BoardId, BoardRoster, ResourceRef, Section, SectionId, StickerId};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// Parent-chain lookups available on every [`Store`].
///
/// Each hop checks that the next record exists; a missing link fails with
/// `NotFound` naming that link rather than yielding a partial answer.
#[async_trait]
pub trait HierarchyExt: Store {
    /// Board a section belongs to.
    async fn section_board(&self, section: SectionId) -> Result<BoardId>;

    /// Section a sticker belongs to.
    async fn sticker_section(&self, sticker: StickerId) -> Result<Section>;

    /// Board a sticker belongs to, through its section.
    async fn sticker_board(&self, sticker: StickerId) -> Result<BoardId>;

    /// Roster of a board, failing if the board is gone.
    async fn roster_of(&self, board: BoardId) -> Result<BoardRoster>;

    /// The board whose roster governs access to `resource`.
    ///
    /// Users are not part of any board, so asking about one is an error.
    async fn effective_board(&self, resource: ResourceRef) -> Result<BoardId>;

    /// Shorthand for `roster_of(effective_board(resource))`.
    async fn effective_roster(&self, resource: ResourceRef) -> Result<BoardRoster>;
}

#[async_trait]
impl<S: Store + ?Sized> HierarchyExt for S {
    async fn section_board(&self, section: SectionId) -> Result<BoardId> {
        self.get_section(section)
            .await?
            .map(|s| s.board)
            .ok_or(StoreError::NotFound(ResourceRef::Section(section)))
    }

    async fn sticker_section(&self, sticker: StickerId) -> Result<Section> {
        let record = self
            .get_sticker(sticker)
            .await?
            .ok_or(StoreError::NotFound(ResourceRef::Sticker(sticker)))?;
        self.get_section(record.section)
            .await?
            .ok_or(StoreError::NotFound(ResourceRef::Section(record.section)))
    }

    async fn sticker_board(&self, sticker: StickerId) -> Result<BoardId> {
        Ok(self.sticker_section(sticker).await?.board)
    }

    async fn roster_of(&self, board: BoardId) -> Result<BoardRoster> {
        self.get_roster(board)
            .await?
            .ok_or(StoreError::NotFound(ResourceRef::Board(board)))
    }

    async fn effective_board(&self, resource: ResourceRef) -> Result<BoardId> {
        match resource {
            ResourceRef::Board(board) => {
                if self.get_board(board).await?.is_none() {
                    return Err(StoreError::NotFound(resource));
                }
                Ok(board)
            }
            ResourceRef::Section(section) => self.section_board(section).await,
            ResourceRef::Sticker(sticker) => self.sticker_board(sticker).await,
            ResourceRef::User(user) => Err(StoreError::InvalidData(format!(
                "{} has no effective board",
                user
            ))),
        }
    }

    async fn effective_roster(&self, resource: ResourceRef) -> Result<BoardRoster> {
        let board = self.effective_board(resource).await?;
        self.roster_of(board).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pinboard_core::{InviteToken, NewBoard, NewSection, NewSticker, NewUser, UserId};

    async fn tree() -> (MemoryStore, UserId, BoardId, SectionId, StickerId) {
        let store = MemoryStore::new();
        let owner = store
            .insert_user(&NewUser {
                username: "alice".into(),
                password_hash: "x".into(),
                is_admin: false,
            })
            .await
            .unwrap()
            .id;
        let board = store
            .insert_board(
                owner,
                &NewBoard {
                    title: "T".into(),
                    description: String::new(),
                },
                &InviteToken::from_string("X"),
            )
            .await
            .unwrap()
            .id;
        let section = store
            .insert_section(&NewSection {
                board,
                title: "todo".into(),
                description: String::new(),
            })
            .await
            .unwrap()
            .id;
        let sticker = store
            .insert_sticker(&NewSticker {
                section,
                title: "card".into(),
                text: String::new(),
                assigned_to: None,
            })
            .await
            .unwrap()
            .id;
        (store, owner, board, section, sticker)
    }

    #[tokio::test]
    async fn test_every_level_resolves_to_board() {
        let (store, owner, board, section, sticker) = tree().await;

        assert_eq!(store.effective_board(board.into()).await.unwrap(), board);
        assert_eq!(store.effective_board(section.into()).await.unwrap(), board);
        assert_eq!(store.effective_board(sticker.into()).await.unwrap(), board);

        let roster = store.effective_roster(sticker.into()).await.unwrap();
        assert_eq!(roster.owner(), owner);
    }

    #[tokio::test]
    async fn test_missing_link_is_not_found() {
        let (store, _, _, _, _) = tree().await;

        let err = store
            .effective_board(StickerId::new(99).into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound(ResourceRef::Sticker(id)) if id == StickerId::new(99)
        ));

        let err = store.roster_of(BoardId::new(42)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ResourceRef::Board(_))));
    }

    #[tokio::test]
    async fn test_user_has_no_board() {
        let (store, owner, _, _, _) = tree().await;
        let err = store.effective_board(owner.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_resolution_follows_moves() {
        let (store, owner, _, section, sticker) = tree().await;
        let other = store
            .insert_board(
                owner,
                &NewBoard {
                    title: "U".into(),
                    description: String::new(),
                },
                &InviteToken::from_string("Y"),
            )
            .await
            .unwrap()
            .id;

        store
            .update_section(
                section,
                &pinboard_core::SectionUpdate {
                    board: Some(other),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(store.sticker_board(sticker).await.unwrap(), other);
    }
}

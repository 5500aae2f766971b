//! The Pinboard service: unified API over users, boards, sections and
//! stickers.
//!
//! Every operation takes the [`Actor`] it runs as. The service resolves the
//! target, asks the authorization policy, runs the mutation guards and only
//! then touches the store.

use std::sync::Arc;

use pinboard_core::{
    hash_password, Board, BoardId, BoardRoster, BoardUpdate, InviteToken, NewBoard, NewSection,
    NewSticker, Section, SectionId, SectionUpdate, Sticker, StickerId, StickerUpdate, User,
    UserId, UserUpdate,
};
use pinboard_perms::{authorize, list_scope, Actor, ListScope, Operation, Target};
use pinboard_store::{HierarchyExt, Store, StoreError};

use crate::config::PinboardConfig;
use crate::error::{PinboardError, Result, CREDENTIALS_MISSING};
use crate::guard;

/// A board together with its roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub board: Board,
    pub roster: BoardRoster,
}

/// A user record as its owner sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user: User,
    /// Boards the user owns.
    pub boards: Vec<BoardId>,
    /// Boards the user is a member of.
    pub guest_boards: Vec<BoardId>,
}

/// Changes a user may make to their own record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// The main Pinboard struct.
///
/// Provides a unified API for:
/// - Registering, authenticating and managing users
/// - Creating and sharing boards
/// - Organizing sections and stickers
/// - Redeeming invites
pub struct Pinboard<S: Store> {
    /// The storage backend.
    pub(crate) store: Arc<S>,
    /// Configuration.
    pub(crate) config: PinboardConfig,
}

impl<S: Store> Clone for Pinboard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

/// The actor's user id, or `Unauthenticated`.
pub(crate) fn require_user(actor: &Actor) -> Result<UserId> {
    actor
        .id()
        .ok_or(PinboardError::Unauthenticated(CREDENTIALS_MISSING))
}

impl<S: Store> Pinboard<S> {
    /// Create a new service instance.
    pub fn new(store: S, config: PinboardConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PinboardConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a user through the admin path.
    pub async fn create_user(
        &self,
        actor: &Actor,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User> {
        require_user(actor)?;
        authorize(actor, Operation::Create, &Target::Users)?;

        let user = self.insert_user(username, password, is_admin).await?;
        tracing::info!(user = user.id.get(), is_admin, "user created by admin");
        Ok(user)
    }

    /// Fetch the actor's own record. Other users' records are not found.
    pub async fn get_user(&self, actor: &Actor, id: UserId) -> Result<UserProfile> {
        require_user(actor)?;
        authorize(actor, Operation::Read, &Target::User(id))?;
        self.profile(id).await
    }

    pub async fn update_user(
        &self,
        actor: &Actor,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<UserProfile> {
        require_user(actor)?;
        authorize(actor, Operation::Update, &Target::User(id))?;

        let mut errors = pinboard_core::FieldErrors::new();
        if let Some(username) = &changes.username {
            self.config.limits.check_username(&mut errors, username);
        }
        if let Some(password) = &changes.password {
            pinboard_core::check_password(&mut errors, password);
        }
        errors.into_result().map_err(PinboardError::Validation)?;

        let password_hash = match &changes.password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        let update = UserUpdate {
            username: changes.username.clone(),
            password_hash,
        };
        self.store
            .update_user(id, &update)
            .await?
            .ok_or(PinboardError::NotFound)?;
        self.profile(id).await
    }

    /// Delete a user with everything they own.
    pub async fn delete_user(&self, actor: &Actor, id: UserId) -> Result<()> {
        require_user(actor)?;
        authorize(actor, Operation::Delete, &Target::User(id))?;

        if !self.store.delete_user(id).await? {
            return Err(PinboardError::NotFound);
        }
        tracing::info!(user = id.get(), "user deleted");
        Ok(())
    }

    /// Delete the actor's own account.
    pub async fn delete_me(&self, actor: &Actor) -> Result<()> {
        let me = require_user(actor)?;
        self.delete_user(actor, me).await
    }

    async fn profile(&self, id: UserId) -> Result<UserProfile> {
        let user = self.store.get_user(id).await?.ok_or(PinboardError::NotFound)?;
        Ok(UserProfile {
            boards: self.store.owned_boards(id).await?,
            guest_boards: self.store.guest_boards(id).await?,
            user,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Board Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Boards the actor owns or belongs to. Empty for anonymous actors.
    pub async fn list_boards(&self, actor: &Actor) -> Result<Vec<BoardView>> {
        let ListScope::VisibleTo(user) = list_scope(actor) else {
            return Ok(Vec::new());
        };

        let boards = self.store.list_boards_for(user).await?;
        let mut views = Vec::with_capacity(boards.len());
        for board in boards {
            let roster = self.store.roster_of(board.id).await?;
            views.push(BoardView { board, roster });
        }
        Ok(views)
    }

    /// Create a board owned by the actor, with a fresh invite token.
    pub async fn create_board(&self, actor: &Actor, board: &NewBoard) -> Result<BoardView> {
        let owner = require_user(actor)?;
        authorize(actor, Operation::Create, &Target::Boards)?;
        self.config
            .limits
            .validate_new_board(board)
            .map_err(PinboardError::Validation)?;

        let mut collision = None;
        for _ in 0..self.config.invite_rotation_attempts.max(1) {
            let token = self.fresh_invite_token();
            match self.store.insert_board(owner, board, &token).await {
                Ok(board) => {
                    tracing::info!(board = board.id.get(), owner = owner.get(), "board created");
                    let roster = BoardRoster::new(board.id, owner, std::iter::empty());
                    return Ok(BoardView { board, roster });
                }
                Err(StoreError::InviteTokenTaken(token)) => collision = Some(token),
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.token_exhausted(collision))
    }

    pub async fn get_board(&self, actor: &Actor, id: BoardId) -> Result<BoardView> {
        self.visible_board(actor, id, Operation::Read).await
    }

    /// Update a board. Only the owner may do this; members get `Forbidden`.
    pub async fn update_board(
        &self,
        actor: &Actor,
        id: BoardId,
        update: &BoardUpdate,
    ) -> Result<BoardView> {
        let current = self.visible_board(actor, id, Operation::Update).await?;
        self.config
            .limits
            .validate_board_update(update)
            .map_err(PinboardError::Validation)?;
        if let Some(users) = &update.users {
            guard::board_users(self.store.as_ref(), users).await?;
        }
        if update.is_empty() {
            return Ok(current);
        }

        let board = self
            .store
            .update_board(id, update)
            .await?
            .ok_or(PinboardError::NotFound)?;
        let roster = self.store.roster_of(id).await?;
        if update.users.is_some() {
            tracing::info!(
                board = id.get(),
                members = roster.members().len(),
                "board members replaced"
            );
        }
        Ok(BoardView { board, roster })
    }

    pub async fn delete_board(&self, actor: &Actor, id: BoardId) -> Result<()> {
        self.visible_board(actor, id, Operation::Delete).await?;
        if !self.store.delete_board(id).await? {
            return Err(PinboardError::NotFound);
        }
        tracing::info!(board = id.get(), "board deleted");
        Ok(())
    }

    pub async fn board_sections(&self, actor: &Actor, id: BoardId) -> Result<Vec<Section>> {
        self.visible_board(actor, id, Operation::Read).await?;
        Ok(self.store.list_sections(id).await?)
    }

    pub async fn board_stickers(&self, actor: &Actor, id: BoardId) -> Result<Vec<Sticker>> {
        self.visible_board(actor, id, Operation::Read).await?;
        Ok(self.store.list_board_stickers(id).await?)
    }

    /// Owner followed by members.
    pub async fn board_users(&self, actor: &Actor, id: BoardId) -> Result<Vec<User>> {
        let view = self.visible_board(actor, id, Operation::Read).await?;
        let mut users = Vec::new();
        for id in view.roster.everyone() {
            if let Some(user) = self.store.get_user(id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn visible_board(
        &self,
        actor: &Actor,
        id: BoardId,
        operation: Operation,
    ) -> Result<BoardView> {
        require_user(actor)?;
        let board = self.store.get_board(id).await?.ok_or(PinboardError::NotFound)?;
        let roster = self.store.roster_of(id).await?;
        authorize(actor, operation, &Target::Board(&roster))?;
        Ok(BoardView { board, roster })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Section Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Sections of every board the actor can see.
    pub async fn list_sections(&self, actor: &Actor) -> Result<Vec<Section>> {
        match list_scope(actor) {
            ListScope::VisibleTo(user) => Ok(self.store.list_sections_for(user).await?),
            ListScope::Nothing => Ok(Vec::new()),
        }
    }

    pub async fn create_section(&self, actor: &Actor, section: &NewSection) -> Result<Section> {
        require_user(actor)?;
        self.config
            .limits
            .validate_new_section(section)
            .map_err(PinboardError::Validation)?;
        guard::section_parent(self.store.as_ref(), actor, section.board).await?;

        let section = self.store.insert_section(section).await?;
        tracing::debug!(section = section.id.get(), board = section.board.get(), "section created");
        Ok(section)
    }

    pub async fn get_section(&self, actor: &Actor, id: SectionId) -> Result<Section> {
        Ok(self.visible_section(actor, id, Operation::Read).await?.0)
    }

    pub async fn update_section(
        &self,
        actor: &Actor,
        id: SectionId,
        update: &SectionUpdate,
    ) -> Result<Section> {
        let (section, _) = self.visible_section(actor, id, Operation::Update).await?;
        self.config
            .limits
            .validate_section_update(update)
            .map_err(PinboardError::Validation)?;
        guard::section_move(&section, update.board)?;

        let update = SectionUpdate {
            board: None,
            ..update.clone()
        };
        self.store
            .update_section(id, &update)
            .await?
            .ok_or(PinboardError::NotFound)
    }

    pub async fn delete_section(&self, actor: &Actor, id: SectionId) -> Result<()> {
        self.visible_section(actor, id, Operation::Delete).await?;
        if !self.store.delete_section(id).await? {
            return Err(PinboardError::NotFound);
        }
        Ok(())
    }

    pub async fn section_stickers(&self, actor: &Actor, id: SectionId) -> Result<Vec<Sticker>> {
        self.visible_section(actor, id, Operation::Read).await?;
        Ok(self.store.list_stickers(id).await?)
    }

    async fn visible_section(
        &self,
        actor: &Actor,
        id: SectionId,
        operation: Operation,
    ) -> Result<(Section, BoardRoster)> {
        require_user(actor)?;
        let section = self.store.get_section(id).await?.ok_or(PinboardError::NotFound)?;
        let roster = self.store.effective_roster(id.into()).await?;
        authorize(actor, operation, &Target::Section(&roster))?;
        Ok((section, roster))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sticker Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Stickers of every board the actor can see.
    pub async fn list_stickers(&self, actor: &Actor) -> Result<Vec<Sticker>> {
        match list_scope(actor) {
            ListScope::VisibleTo(user) => Ok(self.store.list_stickers_for(user).await?),
            ListScope::Nothing => Ok(Vec::new()),
        }
    }

    pub async fn create_sticker(&self, actor: &Actor, sticker: &NewSticker) -> Result<Sticker> {
        require_user(actor)?;
        self.config
            .limits
            .validate_new_sticker(sticker)
            .map_err(PinboardError::Validation)?;

        let (_, roster) = guard::sticker_parent(self.store.as_ref(), actor, sticker.section).await?;
        guard::assignee(self.store.as_ref(), &roster, sticker.assigned_to).await?;
        authorize(
            actor,
            Operation::Create,
            &Target::Sticker {
                roster: &roster,
                assignee: sticker.assigned_to,
            },
        )?;

        let sticker = self.store.insert_sticker(sticker).await?;
        tracing::debug!(sticker = sticker.id.get(), section = sticker.section.get(), "sticker created");
        Ok(sticker)
    }

    pub async fn get_sticker(&self, actor: &Actor, id: StickerId) -> Result<Sticker> {
        Ok(self.visible_sticker(actor, id, Operation::Read).await?.0)
    }

    /// Update a sticker. Moves stay within the board and a new assignee
    /// must be on its roster; a rejected update changes nothing.
    pub async fn update_sticker(
        &self,
        actor: &Actor,
        id: StickerId,
        update: &StickerUpdate,
    ) -> Result<Sticker> {
        let (sticker, roster) = self.visible_sticker(actor, id, Operation::Read).await?;
        self.config
            .limits
            .validate_sticker_update(update)
            .map_err(PinboardError::Validation)?;

        if let Some(section) = update.section {
            guard::sticker_move(self.store.as_ref(), actor, &sticker, section).await?;
        }
        let assignee = match update.assigned_to {
            Some(assignee) => {
                guard::assignee(self.store.as_ref(), &roster, assignee).await?;
                assignee
            }
            None => sticker.assigned_to,
        };
        authorize(
            actor,
            Operation::Update,
            &Target::Sticker {
                roster: &roster,
                assignee,
            },
        )?;

        self.store
            .update_sticker(id, update)
            .await?
            .ok_or(PinboardError::NotFound)
    }

    pub async fn delete_sticker(&self, actor: &Actor, id: StickerId) -> Result<()> {
        self.visible_sticker(actor, id, Operation::Delete).await?;
        if !self.store.delete_sticker(id).await? {
            return Err(PinboardError::NotFound);
        }
        Ok(())
    }

    async fn visible_sticker(
        &self,
        actor: &Actor,
        id: StickerId,
        operation: Operation,
    ) -> Result<(Sticker, BoardRoster)> {
        require_user(actor)?;
        let sticker = self.store.get_sticker(id).await?.ok_or(PinboardError::NotFound)?;
        let roster = self.store.effective_roster(id.into()).await?;
        authorize(
            actor,
            operation,
            &Target::Sticker {
                roster: &roster,
                assignee: None,
            },
        )?;
        Ok((sticker, roster))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn fresh_invite_token(&self) -> InviteToken {
        InviteToken::generate(self.config.invite_token_len)
    }

    pub(crate) fn token_exhausted(&self, collision: Option<InviteToken>) -> PinboardError {
        tracing::warn!(
            attempts = self.config.invite_rotation_attempts,
            "could not generate a unique invite token"
        );
        match collision {
            Some(token) => PinboardError::Store(StoreError::InviteTokenTaken(token)),
            None => PinboardError::Store(StoreError::InvalidData(
                "invite token generation was not attempted".into(),
            )),
        }
    }
}

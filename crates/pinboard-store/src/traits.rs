//! Store trait: the abstract interface for entity persistence.
//!
//! This trait keeps the service storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use pinboard_core::{
    Board, BoardId, BoardRoster, BoardUpdate, InviteToken, NewBoard, NewSection, NewSticker,
    NewUser, Section, SectionId, SectionUpdate, Sticker, StickerId, StickerUpdate, TokenDigest,
    User, UserId, UserUpdate,
};

use crate::error::Result;

/// Result of an atomic invite redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemResult {
    /// The user was added as a member and the token was rotated.
    Joined,
    /// The user already owns or belongs to the board (idempotent, nothing changed).
    AlreadyMember,
    /// The board's token no longer matches the one redeemed; another
    /// redemption rotated it first.
    Stale,
}

/// The Store trait: async interface for entity persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, `spawn_blocking` is used internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Existence first**: inserts that reference a parent (`board`, `section`,
///   `assigned_to`) fail with `NotFound` naming the parent instead of
///   writing a dangling row.
/// - **Cascades**: deleting a board removes its sections, stickers and
///   member rows; deleting a section removes its stickers; deleting a user
///   removes their boards, memberships and sessions and clears assignments.
/// - **Membership** is a join table indexed both ways (board → members,
///   user → guest boards).
/// - **Roster invariant**: the owner is never stored as a member, and a user
///   leaving a roster loses their sticker assignments on that board.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a user. Fails with `UsernameTaken` on a case-insensitive clash.
    async fn insert_user(&self, user: &NewUser) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Look up a user by username, ignoring case.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Apply changes to a user. Returns `None` if the user does not exist.
    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<Option<User>>;

    /// Delete a user and everything that hangs off them. Returns whether
    /// the user existed.
    async fn delete_user(&self, id: UserId) -> Result<bool>;

    /// Boards owned by a user, in creation order.
    async fn owned_boards(&self, user: UserId) -> Result<Vec<BoardId>>;

    /// Boards a user is a (non-owner) member of, in creation order.
    async fn guest_boards(&self, user: UserId) -> Result<Vec<BoardId>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Session Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a bearer token digest for a user, replacing any previous one.
    async fn put_session(&self, user: UserId, digest: &TokenDigest) -> Result<()>;

    async fn find_session(&self, digest: &TokenDigest) -> Result<Option<UserId>>;

    async fn delete_session(&self, user: UserId) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Board Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a board owned by `owner`. Fails with `InviteTokenTaken` if the
    /// token is already held by another board.
    async fn insert_board(
        &self,
        owner: UserId,
        board: &NewBoard,
        invite_token: &InviteToken,
    ) -> Result<Board>;

    async fn get_board(&self, id: BoardId) -> Result<Option<Board>>;

    async fn find_board_by_invite(&self, token: &InviteToken) -> Result<Option<Board>>;

    /// Boards the user owns or is a member of, in creation order.
    async fn list_boards_for(&self, user: UserId) -> Result<Vec<Board>>;

    /// Apply changes to a board. A `users` replacement is applied in the
    /// same transaction, with the owner filtered out and assignments of
    /// departing members cleared.
    async fn update_board(&self, id: BoardId, update: &BoardUpdate) -> Result<Option<Board>>;

    async fn delete_board(&self, id: BoardId) -> Result<bool>;

    /// Owner and members of a board.
    async fn get_roster(&self, id: BoardId) -> Result<Option<BoardRoster>>;

    /// Atomically redeem an invite: if `user` is not yet on the roster and
    /// the board still holds `expected`, add the member and set the token to
    /// `next`, as one unit.
    async fn redeem_invite(
        &self,
        board: BoardId,
        expected: &InviteToken,
        user: UserId,
        next: &InviteToken,
    ) -> Result<RedeemResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Section Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_section(&self, section: &NewSection) -> Result<Section>;

    async fn get_section(&self, id: SectionId) -> Result<Option<Section>>;

    /// Sections of one board, in creation order.
    async fn list_sections(&self, board: BoardId) -> Result<Vec<Section>>;

    /// Sections of every board the user can see.
    async fn list_sections_for(&self, user: UserId) -> Result<Vec<Section>>;

    async fn update_section(&self, id: SectionId, update: &SectionUpdate)
        -> Result<Option<Section>>;

    async fn delete_section(&self, id: SectionId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Sticker Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_sticker(&self, sticker: &NewSticker) -> Result<Sticker>;

    async fn get_sticker(&self, id: StickerId) -> Result<Option<Sticker>>;

    /// Stickers of one section, in creation order.
    async fn list_stickers(&self, section: SectionId) -> Result<Vec<Sticker>>;

    /// Stickers of every section of one board.
    async fn list_board_stickers(&self, board: BoardId) -> Result<Vec<Sticker>>;

    /// Stickers of every board the user can see.
    async fn list_stickers_for(&self, user: UserId) -> Result<Vec<Sticker>>;

    async fn update_sticker(&self, id: StickerId, update: &StickerUpdate)
        -> Result<Option<Sticker>>;

    async fn delete_sticker(&self, id: StickerId) -> Result<bool>;
}

//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use pinboard_core::{
    now_millis, Board, BoardId, BoardRoster, BoardUpdate, InviteToken, NewBoard, NewSection,
    NewSticker, NewUser, ResourceRef, Section, SectionId, SectionUpdate, Sticker, StickerId,
    StickerUpdate, TokenDigest, User, UserId, UserUpdate,
};

use crate::error::{Result, StoreError};
use crate::traits::{RedeemResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// write takes the lock once, so each operation is atomic.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Last issued row id per table.
    last_user: i64,
    last_board: i64,
    last_section: i64,
    last_sticker: i64,

    users: BTreeMap<UserId, User>,

    /// Lowercased username -> user.
    usernames: HashMap<String, UserId>,

    /// Bearer token digest -> user, plus the reverse for revocation.
    sessions: HashMap<TokenDigest, UserId>,
    session_of: HashMap<UserId, TokenDigest>,

    boards: BTreeMap<BoardId, Board>,

    /// Invite token -> board.
    invites: HashMap<InviteToken, BoardId>,

    /// Membership join table, indexed both ways.
    members: BTreeSet<(BoardId, UserId)>,
    guest_of: BTreeSet<(UserId, BoardId)>,

    sections: BTreeMap<SectionId, Section>,
    stickers: BTreeMap<StickerId, Sticker>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn roster(&self, board: &Board) -> BoardRoster {
        BoardRoster::new(board.id, board.owner, self.members_of(board.id))
    }

    fn members_of(&self, board: BoardId) -> Vec<UserId> {
        self.members
            .range((board, UserId::new(i64::MIN))..=(board, UserId::new(i64::MAX)))
            .map(|(_, user)| *user)
            .collect()
    }

    fn guest_boards_of(&self, user: UserId) -> Vec<BoardId> {
        self.guest_of
            .range((user, BoardId::new(i64::MIN))..=(user, BoardId::new(i64::MAX)))
            .map(|(_, board)| *board)
            .collect()
    }

    fn add_member(&mut self, board: BoardId, user: UserId) {
        self.members.insert((board, user));
        self.guest_of.insert((user, board));
    }

    fn remove_member(&mut self, board: BoardId, user: UserId) {
        self.members.remove(&(board, user));
        self.guest_of.remove(&(user, board));
    }

    /// Boards visible to a user, in creation order.
    fn visible_boards(&self, user: UserId) -> Vec<&Board> {
        let guest: BTreeSet<BoardId> = self.guest_boards_of(user).into_iter().collect();
        let mut boards: Vec<&Board> = self
            .boards
            .values()
            .filter(|b| b.owner == user || guest.contains(&b.id))
            .collect();
        boards.sort_by_key(|b| (b.created_at, b.id));
        boards
    }

    fn sections_of(&self, board: BoardId) -> Vec<&Section> {
        let mut sections: Vec<&Section> =
            self.sections.values().filter(|s| s.board == board).collect();
        sections.sort_by_key(|s| (s.created_at, s.id));
        sections
    }

    fn stickers_of(&self, section: SectionId) -> Vec<&Sticker> {
        let mut stickers: Vec<&Sticker> = self
            .stickers
            .values()
            .filter(|s| s.section == section)
            .collect();
        stickers.sort_by_key(|s| (s.created_at, s.id));
        stickers
    }

    fn board_of_section(&self, section: SectionId) -> Option<BoardId> {
        self.sections.get(&section).map(|s| s.board)
    }

    /// Clear assignments on one board's stickers that point at users no
    /// longer on its roster.
    fn unassign_departed(&mut self, board: BoardId) {
        let Some(roster) = self.boards.get(&board).map(|b| self.roster(b)) else {
            return;
        };
        let sections: BTreeSet<SectionId> = self
            .sections
            .values()
            .filter(|s| s.board == board)
            .map(|s| s.id)
            .collect();
        for sticker in self.stickers.values_mut() {
            if !sections.contains(&sticker.section) {
                continue;
            }
            if let Some(assignee) = sticker.assigned_to {
                if !roster.has_access(assignee) {
                    sticker.assigned_to = None;
                }
            }
        }
    }

    fn remove_section(&mut self, id: SectionId) -> bool {
        if self.sections.remove(&id).is_none() {
            return false;
        }
        self.stickers.retain(|_, s| s.section != id);
        true
    }

    fn remove_board(&mut self, id: BoardId) -> bool {
        let Some(board) = self.boards.remove(&id) else {
            return false;
        };
        self.invites.remove(&board.invite_token);
        for member in self.members_of(id) {
            self.remove_member(id, member);
        }
        let sections: Vec<SectionId> = self.sections_of(id).iter().map(|s| s.id).collect();
        for section in sections {
            self.remove_section(section);
        }
        true
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        let mut inner = self.write()?;

        let key = user.username.to_lowercase();
        if inner.usernames.contains_key(&key) {
            return Err(StoreError::UsernameTaken(user.username.clone()));
        }

        inner.last_user += 1;
        let record = User {
            id: UserId::new(inner.last_user),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            is_admin: user.is_admin,
            created_at: now_millis(),
        };
        inner.usernames.insert(key, record.id);
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let inner = self.read()?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.read()?;
        Ok(inner
            .usernames
            .get(&username.to_lowercase())
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<Option<User>> {
        let mut inner = self.write()?;

        let Some(current) = inner.users.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(username) = &update.username {
            let old_key = current.username.to_lowercase();
            let new_key = username.to_lowercase();
            if new_key != old_key {
                if inner.usernames.contains_key(&new_key) {
                    return Err(StoreError::UsernameTaken(username.clone()));
                }
                inner.usernames.remove(&old_key);
                inner.usernames.insert(new_key, id);
            }
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(hash) = &update.password_hash {
            user.password_hash = hash.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut inner = self.write()?;

        let Some(user) = inner.users.remove(&id) else {
            return Ok(false);
        };
        inner.usernames.remove(&user.username.to_lowercase());
        if let Some(digest) = inner.session_of.remove(&id) {
            inner.sessions.remove(&digest);
        }

        let owned: Vec<BoardId> = inner
            .boards
            .values()
            .filter(|b| b.owner == id)
            .map(|b| b.id)
            .collect();
        for board in owned {
            inner.remove_board(board);
        }
        for board in inner.guest_boards_of(id) {
            inner.remove_member(board, id);
        }
        for sticker in inner.stickers.values_mut() {
            if sticker.assigned_to == Some(id) {
                sticker.assigned_to = None;
            }
        }
        Ok(true)
    }

    async fn owned_boards(&self, user: UserId) -> Result<Vec<BoardId>> {
        let inner = self.read()?;
        let mut boards: Vec<&Board> = inner.boards.values().filter(|b| b.owner == user).collect();
        boards.sort_by_key(|b| (b.created_at, b.id));
        Ok(boards.into_iter().map(|b| b.id).collect())
    }

    async fn guest_boards(&self, user: UserId) -> Result<Vec<BoardId>> {
        let inner = self.read()?;
        let mut boards: Vec<&Board> = inner
            .guest_boards_of(user)
            .into_iter()
            .filter_map(|id| inner.boards.get(&id))
            .collect();
        boards.sort_by_key(|b| (b.created_at, b.id));
        Ok(boards.into_iter().map(|b| b.id).collect())
    }

    async fn put_session(&self, user: UserId, digest: &TokenDigest) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.users.contains_key(&user) {
            return Err(StoreError::NotFound(ResourceRef::User(user)));
        }
        if let Some(previous) = inner.session_of.insert(user, *digest) {
            inner.sessions.remove(&previous);
        }
        inner.sessions.insert(*digest, user);
        Ok(())
    }

    async fn find_session(&self, digest: &TokenDigest) -> Result<Option<UserId>> {
        let inner = self.read()?;
        Ok(inner.sessions.get(digest).copied())
    }

    async fn delete_session(&self, user: UserId) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(digest) = inner.session_of.remove(&user) {
            inner.sessions.remove(&digest);
        }
        Ok(())
    }

    async fn insert_board(
        &self,
        owner: UserId,
        board: &NewBoard,
        invite_token: &InviteToken,
    ) -> Result<Board> {
        let mut inner = self.write()?;

        if !inner.users.contains_key(&owner) {
            return Err(StoreError::NotFound(ResourceRef::User(owner)));
        }
        if inner.invites.contains_key(invite_token) {
            return Err(StoreError::InviteTokenTaken(invite_token.clone()));
        }

        inner.last_board += 1;
        let record = Board {
            id: BoardId::new(inner.last_board),
            title: board.title.clone(),
            description: board.description.clone(),
            created_at: now_millis(),
            owner,
            invite_token: invite_token.clone(),
        };
        inner.invites.insert(invite_token.clone(), record.id);
        inner.boards.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_board(&self, id: BoardId) -> Result<Option<Board>> {
        let inner = self.read()?;
        Ok(inner.boards.get(&id).cloned())
    }

    async fn find_board_by_invite(&self, token: &InviteToken) -> Result<Option<Board>> {
        let inner = self.read()?;
        Ok(inner
            .invites
            .get(token)
            .and_then(|id| inner.boards.get(id))
            .cloned())
    }

    async fn list_boards_for(&self, user: UserId) -> Result<Vec<Board>> {
        let inner = self.read()?;
        Ok(inner.visible_boards(user).into_iter().cloned().collect())
    }

    async fn update_board(&self, id: BoardId, update: &BoardUpdate) -> Result<Option<Board>> {
        let mut inner = self.write()?;

        let Some(owner) = inner.boards.get(&id).map(|b| b.owner) else {
            return Ok(None);
        };

        if let Some(users) = &update.users {
            if let Some(missing) = users.iter().find(|u| !inner.users.contains_key(*u)) {
                return Err(StoreError::NotFound(ResourceRef::User(*missing)));
            }
            for member in inner.members_of(id) {
                if !users.contains(&member) {
                    inner.remove_member(id, member);
                }
            }
            for user in users.iter().filter(|u| **u != owner) {
                inner.add_member(id, *user);
            }
            inner.unassign_departed(id);
        }

        let Some(board) = inner.boards.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            board.title = title.clone();
        }
        if let Some(description) = &update.description {
            board.description = description.clone();
        }
        Ok(Some(board.clone()))
    }

    async fn delete_board(&self, id: BoardId) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner.remove_board(id))
    }

    async fn get_roster(&self, id: BoardId) -> Result<Option<BoardRoster>> {
        let inner = self.read()?;
        Ok(inner.boards.get(&id).map(|b| inner.roster(b)))
    }

    async fn redeem_invite(
        &self,
        board: BoardId,
        expected: &InviteToken,
        user: UserId,
        next: &InviteToken,
    ) -> Result<RedeemResult> {
        let mut inner = self.write()?;

        let Some(record) = inner.boards.get(&board) else {
            return Err(StoreError::NotFound(ResourceRef::Board(board)));
        };
        if inner.roster(record).has_access(user) {
            return Ok(RedeemResult::AlreadyMember);
        }
        if &record.invite_token != expected {
            return Ok(RedeemResult::Stale);
        }
        if !inner.users.contains_key(&user) {
            return Err(StoreError::NotFound(ResourceRef::User(user)));
        }
        if inner.invites.contains_key(next) {
            return Err(StoreError::InviteTokenTaken(next.clone()));
        }

        inner.add_member(board, user);
        inner.invites.remove(expected);
        inner.invites.insert(next.clone(), board);
        if let Some(record) = inner.boards.get_mut(&board) {
            record.invite_token = next.clone();
        }
        Ok(RedeemResult::Joined)
    }

    async fn insert_section(&self, section: &NewSection) -> Result<Section> {
        let mut inner = self.write()?;

        if !inner.boards.contains_key(&section.board) {
            return Err(StoreError::NotFound(ResourceRef::Board(section.board)));
        }

        inner.last_section += 1;
        let record = Section {
            id: SectionId::new(inner.last_section),
            board: section.board,
            title: section.title.clone(),
            description: section.description.clone(),
            created_at: now_millis(),
        };
        inner.sections.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_section(&self, id: SectionId) -> Result<Option<Section>> {
        let inner = self.read()?;
        Ok(inner.sections.get(&id).cloned())
    }

    async fn list_sections(&self, board: BoardId) -> Result<Vec<Section>> {
        let inner = self.read()?;
        Ok(inner.sections_of(board).into_iter().cloned().collect())
    }

    async fn list_sections_for(&self, user: UserId) -> Result<Vec<Section>> {
        let inner = self.read()?;
        let boards: BTreeSet<BoardId> = inner.visible_boards(user).iter().map(|b| b.id).collect();
        let mut sections: Vec<&Section> = inner
            .sections
            .values()
            .filter(|s| boards.contains(&s.board))
            .collect();
        sections.sort_by_key(|s| (s.created_at, s.id));
        Ok(sections.into_iter().cloned().collect())
    }

    async fn update_section(
        &self,
        id: SectionId,
        update: &SectionUpdate,
    ) -> Result<Option<Section>> {
        let mut inner = self.write()?;

        if let Some(board) = update.board {
            if !inner.boards.contains_key(&board) {
                return Err(StoreError::NotFound(ResourceRef::Board(board)));
            }
        }

        let Some(section) = inner.sections.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(board) = update.board {
            section.board = board;
        }
        if let Some(title) = &update.title {
            section.title = title.clone();
        }
        if let Some(description) = &update.description {
            section.description = description.clone();
        }
        Ok(Some(section.clone()))
    }

    async fn delete_section(&self, id: SectionId) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner.remove_section(id))
    }

    async fn insert_sticker(&self, sticker: &NewSticker) -> Result<Sticker> {
        let mut inner = self.write()?;

        if !inner.sections.contains_key(&sticker.section) {
            return Err(StoreError::NotFound(ResourceRef::Section(sticker.section)));
        }
        if let Some(assignee) = sticker.assigned_to {
            if !inner.users.contains_key(&assignee) {
                return Err(StoreError::NotFound(ResourceRef::User(assignee)));
            }
        }

        inner.last_sticker += 1;
        let record = Sticker {
            id: StickerId::new(inner.last_sticker),
            section: sticker.section,
            title: sticker.title.clone(),
            text: sticker.text.clone(),
            created_at: now_millis(),
            assigned_to: sticker.assigned_to,
        };
        inner.stickers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_sticker(&self, id: StickerId) -> Result<Option<Sticker>> {
        let inner = self.read()?;
        Ok(inner.stickers.get(&id).cloned())
    }

    async fn list_stickers(&self, section: SectionId) -> Result<Vec<Sticker>> {
        let inner = self.read()?;
        Ok(inner.stickers_of(section).into_iter().cloned().collect())
    }

    async fn list_board_stickers(&self, board: BoardId) -> Result<Vec<Sticker>> {
        let inner = self.read()?;
        let mut stickers: Vec<&Sticker> = inner
            .stickers
            .values()
            .filter(|s| inner.board_of_section(s.section) == Some(board))
            .collect();
        stickers.sort_by_key(|s| (s.created_at, s.id));
        Ok(stickers.into_iter().cloned().collect())
    }

    async fn list_stickers_for(&self, user: UserId) -> Result<Vec<Sticker>> {
        let inner = self.read()?;
        let boards: BTreeSet<BoardId> = inner.visible_boards(user).iter().map(|b| b.id).collect();
        let mut stickers: Vec<&Sticker> = inner
            .stickers
            .values()
            .filter(|s| {
                inner
                    .board_of_section(s.section)
                    .is_some_and(|b| boards.contains(&b))
            })
            .collect();
        stickers.sort_by_key(|s| (s.created_at, s.id));
        Ok(stickers.into_iter().cloned().collect())
    }

    async fn update_sticker(
        &self,
        id: StickerId,
        update: &StickerUpdate,
    ) -> Result<Option<Sticker>> {
        let mut inner = self.write()?;

        if let Some(section) = update.section {
            if !inner.sections.contains_key(&section) {
                return Err(StoreError::NotFound(ResourceRef::Section(section)));
            }
        }
        if let Some(Some(assignee)) = update.assigned_to {
            if !inner.users.contains_key(&assignee) {
                return Err(StoreError::NotFound(ResourceRef::User(assignee)));
            }
        }

        let Some(sticker) = inner.stickers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(section) = update.section {
            sticker.section = section;
        }
        if let Some(title) = &update.title {
            sticker.title = title.clone();
        }
        if let Some(text) = &update.text {
            sticker.text = text.clone();
        }
        if let Some(assigned_to) = update.assigned_to {
            sticker.assigned_to = assigned_to;
        }
        Ok(Some(sticker.clone()))
    }

    async fn delete_sticker(&self, id: StickerId) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner.stickers.remove(&id).is_some())
    }
}

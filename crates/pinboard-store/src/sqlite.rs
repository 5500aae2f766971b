//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. Referential integrity
//! (cascades, `ON DELETE SET NULL` for assignments) is enforced by foreign
//! keys, which are switched on for every connection.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use pinboard_core::{
    now_millis, Board, BoardId, BoardRoster, BoardUpdate, InviteToken, NewBoard, NewSection,
    NewSticker, NewUser, ResourceRef, Section, SectionId, SectionUpdate, Sticker, StickerId,
    StickerUpdate, TokenDigest, User, UserId, UserUpdate,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{RedeemResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

const USER_COLUMNS: &str = "u.id AS id, u.username AS username, u.password_hash AS password_hash,
     u.is_admin AS is_admin, u.created_at AS created_at";

const BOARD_COLUMNS: &str = "b.id AS id, b.title AS title, b.description AS description,
     b.created_at AS created_at, b.owner_id AS owner_id, b.invite_token AS invite_token";

const SECTION_COLUMNS: &str = "s.id AS id, s.board_id AS board_id, s.title AS title,
     s.description AS description, s.created_at AS created_at";

const STICKER_COLUMNS: &str = "st.id AS id, st.section_id AS section_id, st.title AS title,
     st.text AS text, st.created_at AS created_at, st.assigned_to AS assigned_to";

/// Boards owned by or shared with user `?1`.
const VISIBLE_BOARDS: &str = "b.owner_id = ?1
     OR b.id IN (SELECT board_id FROM board_members WHERE user_id = ?1)";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get("id")?),
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        is_admin: row.get("is_admin")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_board(row: &rusqlite::Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: BoardId::new(row.get("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        owner: UserId::new(row.get("owner_id")?),
        invite_token: InviteToken::from_string(row.get::<_, String>("invite_token")?),
    })
}

fn row_to_section(row: &rusqlite::Row<'_>) -> rusqlite::Result<Section> {
    Ok(Section {
        id: SectionId::new(row.get("id")?),
        board: BoardId::new(row.get("board_id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_sticker(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sticker> {
    Ok(Sticker {
        id: StickerId::new(row.get("id")?),
        section: SectionId::new(row.get("section_id")?),
        title: row.get("title")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        assigned_to: row.get::<_, Option<i64>>("assigned_to")?.map(UserId::new),
    })
}

fn load_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
        params![id.get()],
        row_to_user,
    )
    .optional()
    .map_err(StoreError::from)
}

fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![id.get()],
        |row| row.get(0),
    )?)
}

fn load_board(conn: &Connection, id: BoardId) -> Result<Option<Board>> {
    conn.query_row(
        &format!("SELECT {BOARD_COLUMNS} FROM boards b WHERE b.id = ?1"),
        params![id.get()],
        row_to_board,
    )
    .optional()
    .map_err(StoreError::from)
}

fn board_exists(conn: &Connection, id: BoardId) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM boards WHERE id = ?1)",
        params![id.get()],
        |row| row.get(0),
    )?)
}

fn invite_in_use(conn: &Connection, token: &InviteToken) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM boards WHERE invite_token = ?1)",
        params![token.as_str()],
        |row| row.get(0),
    )?)
}

fn load_roster(conn: &Connection, board: &Board) -> Result<BoardRoster> {
    let mut stmt =
        conn.prepare("SELECT user_id FROM board_members WHERE board_id = ?1 ORDER BY user_id")?;
    let members = stmt
        .query_map(params![board.id.get()], |row| {
            row.get::<_, i64>(0).map(UserId::new)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(BoardRoster::new(board.id, board.owner, members))
}

fn load_section(conn: &Connection, id: SectionId) -> Result<Option<Section>> {
    conn.query_row(
        &format!("SELECT {SECTION_COLUMNS} FROM sections s WHERE s.id = ?1"),
        params![id.get()],
        row_to_section,
    )
    .optional()
    .map_err(StoreError::from)
}

fn section_exists(conn: &Connection, id: SectionId) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sections WHERE id = ?1)",
        params![id.get()],
        |row| row.get(0),
    )?)
}

fn load_sticker(conn: &Connection, id: StickerId) -> Result<Option<Sticker>> {
    conn.query_row(
        &format!("SELECT {STICKER_COLUMNS} FROM stickers st WHERE st.id = ?1"),
        params![id.get()],
        row_to_sticker,
    )
    .optional()
    .map_err(StoreError::from)
}

fn query_ids(conn: &Connection, sql: &str, key: i64) -> Result<Vec<BoardId>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![key], |row| row.get::<_, i64>(0).map(BoardId::new))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Clear assignments on one board's stickers that point at users no
/// longer on its roster.
fn unassign_departed(conn: &Connection, board: BoardId) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE stickers SET assigned_to = NULL
         WHERE assigned_to IS NOT NULL
           AND section_id IN (SELECT id FROM sections WHERE board_id = ?1)
           AND assigned_to != (SELECT owner_id FROM boards WHERE id = ?1)
           AND assigned_to NOT IN (SELECT user_id FROM board_members WHERE board_id = ?1)",
        params![board.get()],
    )?)
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User> {
        let user = user.clone();

        self.blocking(move |conn| {
            let key = user.username.to_lowercase();
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username_key = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            if taken {
                return Err(StoreError::UsernameTaken(user.username));
            }

            conn.execute(
                "INSERT INTO users (username, username_key, password_hash, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.username,
                    key,
                    user.password_hash,
                    user.is_admin,
                    now_millis()
                ],
            )?;
            let id = UserId::new(conn.last_insert_rowid());
            load_user(conn, id)?.ok_or(StoreError::NotFound(ResourceRef::User(id)))
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.blocking(move |conn| load_user(conn, id)).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let key = username.to_lowercase();

        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username_key = ?1"),
                params![key],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<Option<User>> {
        let update = update.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if load_user(&tx, id)?.is_none() {
                return Ok(None);
            }

            if let Some(username) = &update.username {
                let key = username.to_lowercase();
                let taken: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE username_key = ?1 AND id != ?2)",
                    params![key, id.get()],
                    |row| row.get(0),
                )?;
                if taken {
                    return Err(StoreError::UsernameTaken(username.clone()));
                }
                tx.execute(
                    "UPDATE users SET username = ?2, username_key = ?3 WHERE id = ?1",
                    params![id.get(), username, key],
                )?;
            }

            if let Some(hash) = &update.password_hash {
                tx.execute(
                    "UPDATE users SET password_hash = ?2 WHERE id = ?1",
                    params![id.get(), hash],
                )?;
            }

            let user = load_user(&tx, id)?;
            tx.commit()?;
            Ok(user)
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        // Sessions, owned boards (and their sections/stickers) and member
        // rows cascade; assignments are set to NULL.
        self.blocking(move |conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id.get()])?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn owned_boards(&self, user: UserId) -> Result<Vec<BoardId>> {
        self.blocking(move |conn| {
            query_ids(
                conn,
                "SELECT id FROM boards WHERE owner_id = ?1 ORDER BY created_at, id",
                user.get(),
            )
        })
        .await
    }

    async fn guest_boards(&self, user: UserId) -> Result<Vec<BoardId>> {
        self.blocking(move |conn| {
            query_ids(
                conn,
                "SELECT b.id FROM board_members m JOIN boards b ON b.id = m.board_id
                 WHERE m.user_id = ?1 ORDER BY b.created_at, b.id",
                user.get(),
            )
        })
        .await
    }

    async fn put_session(&self, user: UserId, digest: &TokenDigest) -> Result<()> {
        let digest = *digest;

        self.blocking(move |conn| {
            if !user_exists(conn, user)? {
                return Err(StoreError::NotFound(ResourceRef::User(user)));
            }
            conn.execute(
                "INSERT INTO sessions (user_id, token_digest, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    token_digest = excluded.token_digest,
                    created_at = excluded.created_at",
                params![user.get(), digest.as_bytes().as_slice(), now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn find_session(&self, digest: &TokenDigest) -> Result<Option<UserId>> {
        let digest = *digest;

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT user_id FROM sessions WHERE token_digest = ?1",
                params![digest.as_bytes().as_slice()],
                |row| row.get::<_, i64>(0).map(UserId::new),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn delete_session(&self, user: UserId) -> Result<()> {
        self.blocking(move |conn| {
            conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user.get()])?;
            Ok(())
        })
        .await
    }

    async fn insert_board(
        &self,
        owner: UserId,
        board: &NewBoard,
        invite_token: &InviteToken,
    ) -> Result<Board> {
        let board = board.clone();
        let invite_token = invite_token.clone();

        self.blocking(move |conn| {
            if !user_exists(conn, owner)? {
                return Err(StoreError::NotFound(ResourceRef::User(owner)));
            }
            if invite_in_use(conn, &invite_token)? {
                return Err(StoreError::InviteTokenTaken(invite_token));
            }

            conn.execute(
                "INSERT INTO boards (title, description, created_at, owner_id, invite_token)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    board.title,
                    board.description,
                    now_millis(),
                    owner.get(),
                    invite_token.as_str()
                ],
            )?;
            let id = BoardId::new(conn.last_insert_rowid());
            load_board(conn, id)?.ok_or(StoreError::NotFound(ResourceRef::Board(id)))
        })
        .await
    }

    async fn get_board(&self, id: BoardId) -> Result<Option<Board>> {
        self.blocking(move |conn| load_board(conn, id)).await
    }

    async fn find_board_by_invite(&self, token: &InviteToken) -> Result<Option<Board>> {
        let token = token.clone();

        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {BOARD_COLUMNS} FROM boards b WHERE b.invite_token = ?1"),
                params![token.as_str()],
                row_to_board,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_boards_for(&self, user: UserId) -> Result<Vec<Board>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOARD_COLUMNS} FROM boards b
                 WHERE {VISIBLE_BOARDS}
                 ORDER BY b.created_at, b.id"
            ))?;
            let boards = stmt
                .query_map(params![user.get()], row_to_board)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(boards)
        })
        .await
    }

    async fn update_board(&self, id: BoardId, update: &BoardUpdate) -> Result<Option<Board>> {
        let update = update.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let Some(board) = load_board(&tx, id)? else {
                return Ok(None);
            };

            if let Some(users) = &update.users {
                for user in users {
                    if !user_exists(&tx, *user)? {
                        return Err(StoreError::NotFound(ResourceRef::User(*user)));
                    }
                }
                tx.execute(
                    "DELETE FROM board_members WHERE board_id = ?1",
                    params![id.get()],
                )?;
                for user in users.iter().filter(|u| **u != board.owner) {
                    tx.execute(
                        "INSERT INTO board_members (board_id, user_id) VALUES (?1, ?2)",
                        params![id.get(), user.get()],
                    )?;
                }
                let cleared = unassign_departed(&tx, id)?;
                if cleared > 0 {
                    tracing::debug!(board = id.get(), cleared, "cleared assignments of departed members");
                }
            }

            if let Some(title) = &update.title {
                tx.execute(
                    "UPDATE boards SET title = ?2 WHERE id = ?1",
                    params![id.get(), title],
                )?;
            }
            if let Some(description) = &update.description {
                tx.execute(
                    "UPDATE boards SET description = ?2 WHERE id = ?1",
                    params![id.get(), description],
                )?;
            }

            let board = load_board(&tx, id)?;
            tx.commit()?;
            Ok(board)
        })
        .await
    }

    async fn delete_board(&self, id: BoardId) -> Result<bool> {
        self.blocking(move |conn| {
            let deleted = conn.execute("DELETE FROM boards WHERE id = ?1", params![id.get()])?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn get_roster(&self, id: BoardId) -> Result<Option<BoardRoster>> {
        self.blocking(move |conn| match load_board(conn, id)? {
            Some(board) => load_roster(conn, &board).map(Some),
            None => Ok(None),
        })
        .await
    }

    async fn redeem_invite(
        &self,
        board: BoardId,
        expected: &InviteToken,
        user: UserId,
        next: &InviteToken,
    ) -> Result<RedeemResult> {
        let expected = expected.clone();
        let next = next.clone();

        self.blocking(move |conn| {
            // Take the write lock up front so the read-check-write below is
            // atomic even against other connections to the same file.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let Some(record) = load_board(&tx, board)? else {
                return Err(StoreError::NotFound(ResourceRef::Board(board)));
            };
            if load_roster(&tx, &record)?.has_access(user) {
                return Ok(RedeemResult::AlreadyMember);
            }
            if record.invite_token != expected {
                return Ok(RedeemResult::Stale);
            }
            if !user_exists(&tx, user)? {
                return Err(StoreError::NotFound(ResourceRef::User(user)));
            }
            if invite_in_use(&tx, &next)? {
                return Err(StoreError::InviteTokenTaken(next));
            }

            tx.execute(
                "INSERT INTO board_members (board_id, user_id) VALUES (?1, ?2)",
                params![board.get(), user.get()],
            )?;
            let rotated = tx.execute(
                "UPDATE boards SET invite_token = ?2 WHERE id = ?1 AND invite_token = ?3",
                params![board.get(), next.as_str(), expected.as_str()],
            )?;
            if rotated != 1 {
                return Ok(RedeemResult::Stale);
            }

            tx.commit()?;
            Ok(RedeemResult::Joined)
        })
        .await
    }

    async fn insert_section(&self, section: &NewSection) -> Result<Section> {
        let section = section.clone();

        self.blocking(move |conn| {
            if !board_exists(conn, section.board)? {
                return Err(StoreError::NotFound(ResourceRef::Board(section.board)));
            }
            conn.execute(
                "INSERT INTO sections (board_id, title, description, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    section.board.get(),
                    section.title,
                    section.description,
                    now_millis()
                ],
            )?;
            let id = SectionId::new(conn.last_insert_rowid());
            load_section(conn, id)?.ok_or(StoreError::NotFound(ResourceRef::Section(id)))
        })
        .await
    }

    async fn get_section(&self, id: SectionId) -> Result<Option<Section>> {
        self.blocking(move |conn| load_section(conn, id)).await
    }

    async fn list_sections(&self, board: BoardId) -> Result<Vec<Section>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections s
                 WHERE s.board_id = ?1
                 ORDER BY s.created_at, s.id"
            ))?;
            let sections = stmt
                .query_map(params![board.get()], row_to_section)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sections)
        })
        .await
    }

    async fn list_sections_for(&self, user: UserId) -> Result<Vec<Section>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections s
                 JOIN boards b ON b.id = s.board_id
                 WHERE {VISIBLE_BOARDS}
                 ORDER BY s.created_at, s.id"
            ))?;
            let sections = stmt
                .query_map(params![user.get()], row_to_section)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sections)
        })
        .await
    }

    async fn update_section(
        &self,
        id: SectionId,
        update: &SectionUpdate,
    ) -> Result<Option<Section>> {
        let update = update.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if load_section(&tx, id)?.is_none() {
                return Ok(None);
            }

            if let Some(board) = update.board {
                if !board_exists(&tx, board)? {
                    return Err(StoreError::NotFound(ResourceRef::Board(board)));
                }
                tx.execute(
                    "UPDATE sections SET board_id = ?2 WHERE id = ?1",
                    params![id.get(), board.get()],
                )?;
            }
            if let Some(title) = &update.title {
                tx.execute(
                    "UPDATE sections SET title = ?2 WHERE id = ?1",
                    params![id.get(), title],
                )?;
            }
            if let Some(description) = &update.description {
                tx.execute(
                    "UPDATE sections SET description = ?2 WHERE id = ?1",
                    params![id.get(), description],
                )?;
            }

            let section = load_section(&tx, id)?;
            tx.commit()?;
            Ok(section)
        })
        .await
    }

    async fn delete_section(&self, id: SectionId) -> Result<bool> {
        self.blocking(move |conn| {
            let deleted = conn.execute("DELETE FROM sections WHERE id = ?1", params![id.get()])?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_sticker(&self, sticker: &NewSticker) -> Result<Sticker> {
        let sticker = sticker.clone();

        self.blocking(move |conn| {
            if !section_exists(conn, sticker.section)? {
                return Err(StoreError::NotFound(ResourceRef::Section(sticker.section)));
            }
            if let Some(assignee) = sticker.assigned_to {
                if !user_exists(conn, assignee)? {
                    return Err(StoreError::NotFound(ResourceRef::User(assignee)));
                }
            }
            conn.execute(
                "INSERT INTO stickers (section_id, title, text, created_at, assigned_to)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    sticker.section.get(),
                    sticker.title,
                    sticker.text,
                    now_millis(),
                    sticker.assigned_to.map(|u| u.get())
                ],
            )?;
            let id = StickerId::new(conn.last_insert_rowid());
            load_sticker(conn, id)?.ok_or(StoreError::NotFound(ResourceRef::Sticker(id)))
        })
        .await
    }

    async fn get_sticker(&self, id: StickerId) -> Result<Option<Sticker>> {
        self.blocking(move |conn| load_sticker(conn, id)).await
    }

    async fn list_stickers(&self, section: SectionId) -> Result<Vec<Sticker>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STICKER_COLUMNS} FROM stickers st
                 WHERE st.section_id = ?1
                 ORDER BY st.created_at, st.id"
            ))?;
            let stickers = stmt
                .query_map(params![section.get()], row_to_sticker)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(stickers)
        })
        .await
    }

    async fn list_board_stickers(&self, board: BoardId) -> Result<Vec<Sticker>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STICKER_COLUMNS} FROM stickers st
                 JOIN sections s ON s.id = st.section_id
                 WHERE s.board_id = ?1
                 ORDER BY st.created_at, st.id"
            ))?;
            let stickers = stmt
                .query_map(params![board.get()], row_to_sticker)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(stickers)
        })
        .await
    }

    async fn list_stickers_for(&self, user: UserId) -> Result<Vec<Sticker>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STICKER_COLUMNS} FROM stickers st
                 JOIN sections s ON s.id = st.section_id
                 JOIN boards b ON b.id = s.board_id
                 WHERE {VISIBLE_BOARDS}
                 ORDER BY st.created_at, st.id"
            ))?;
            let stickers = stmt
                .query_map(params![user.get()], row_to_sticker)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(stickers)
        })
        .await
    }

    async fn update_sticker(
        &self,
        id: StickerId,
        update: &StickerUpdate,
    ) -> Result<Option<Sticker>> {
        let update = update.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            if load_sticker(&tx, id)?.is_none() {
                return Ok(None);
            }

            if let Some(section) = update.section {
                if !section_exists(&tx, section)? {
                    return Err(StoreError::NotFound(ResourceRef::Section(section)));
                }
                tx.execute(
                    "UPDATE stickers SET section_id = ?2 WHERE id = ?1",
                    params![id.get(), section.get()],
                )?;
            }
            if let Some(assigned_to) = update.assigned_to {
                if let Some(assignee) = assigned_to {
                    if !user_exists(&tx, assignee)? {
                        return Err(StoreError::NotFound(ResourceRef::User(assignee)));
                    }
                }
                tx.execute(
                    "UPDATE stickers SET assigned_to = ?2 WHERE id = ?1",
                    params![id.get(), assigned_to.map(|u| u.get())],
                )?;
            }
            if let Some(title) = &update.title {
                tx.execute(
                    "UPDATE stickers SET title = ?2 WHERE id = ?1",
                    params![id.get(), title],
                )?;
            }
            if let Some(text) = &update.text {
                tx.execute(
                    "UPDATE stickers SET text = ?2 WHERE id = ?1",
                    params![id.get(), text],
                )?;
            }

            let sticker = load_sticker(&tx, id)?;
            tx.commit()?;
            Ok(sticker)
        })
        .await
    }

    async fn delete_sticker(&self, id: StickerId) -> Result<bool> {
        self.blocking(move |conn| {
            let deleted = conn.execute("DELETE FROM stickers WHERE id = ?1", params![id.get()])?;
            Ok(deleted > 0)
        })
        .await
    }
}

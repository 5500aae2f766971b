//! Test fixtures for common scenarios.
//!
//! Setup helpers panic on failure: a fixture that cannot build its scenario
//! should fail the test at the point of setup.

use pinboard::core::{hash_password, NewUser};
use pinboard::store::{MemoryStore, Store};
use pinboard::{
    Api, ApiRequest, ApiResponse, BoardId, Pinboard, PinboardConfig, SectionId, StickerId, UserId,
};
use serde_json::{json, Value};

/// Password used for every fixture user.
pub const DEFAULT_PASSWORD: &str = "Password1";

/// A logged-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserId,
    pub username: String,
    pub token: String,
}

impl Session {
    pub fn get(&self, path: &str) -> ApiRequest {
        ApiRequest::get(path).with_token(&self.token)
    }

    pub fn post(&self, path: &str, body: Value) -> ApiRequest {
        ApiRequest::post(path, body).with_token(&self.token)
    }

    pub fn put(&self, path: &str, body: Value) -> ApiRequest {
        ApiRequest::put(path, body).with_token(&self.token)
    }

    pub fn patch(&self, path: &str, body: Value) -> ApiRequest {
        ApiRequest::patch(path, body).with_token(&self.token)
    }

    pub fn delete(&self, path: &str) -> ApiRequest {
        ApiRequest::delete(path).with_token(&self.token)
    }
}

/// The `id` field of a response body.
pub fn id_of(body: &Value) -> i64 {
    body["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("response has no id: {}", body))
}

/// A test fixture wrapping a dispatcher over some store.
pub struct TestFixture<S: Store = MemoryStore> {
    pub api: Api<S>,
}

impl TestFixture<MemoryStore> {
    /// Create a fixture over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> TestFixture<S> {
    /// Create a fixture over the given store with the default config.
    pub fn with_store(store: S) -> Self {
        Self::with_config(store, PinboardConfig::default())
    }

    pub fn with_config(store: S, config: PinboardConfig) -> Self {
        Self {
            api: Api::new(Pinboard::new(store, config)),
        }
    }

    pub fn pinboard(&self) -> &Pinboard<S> {
        self.api.pinboard()
    }

    pub fn store(&self) -> &S {
        self.api.pinboard().store()
    }

    /// Send a request through the dispatcher.
    pub async fn send(&self, request: ApiRequest) -> ApiResponse {
        self.api.handle(request).await
    }

    /// Send a request and require a 201, returning the new record's id.
    pub async fn create(&self, request: ApiRequest) -> i64 {
        let response = self.send(request).await;
        assert_eq!(response.status, 201, "create failed: {}", response.body);
        id_of(&response.body)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a user through the public endpoint and log them in.
    pub async fn register(&self, username: &str) -> Session {
        let response = self
            .send(ApiRequest::post(
                "/api/registration/",
                json!({"username": username, "password": DEFAULT_PASSWORD}),
            ))
            .await;
        assert_eq!(response.status, 201, "registration failed: {}", response.body);
        self.login(username).await
    }

    /// Insert an admin directly into the store and log them in.
    pub async fn admin(&self, username: &str) -> Session {
        let user = NewUser {
            username: username.to_string(),
            password_hash: hash_password(DEFAULT_PASSWORD).expect("hash password"),
            is_admin: true,
        };
        self.store().insert_user(&user).await.expect("insert admin");
        self.login(username).await
    }

    /// Log in an existing fixture user.
    pub async fn login(&self, username: &str) -> Session {
        let response = self
            .send(ApiRequest::post(
                "/api/login/",
                json!({"username": username, "password": DEFAULT_PASSWORD}),
            ))
            .await;
        assert_eq!(response.status, 200, "login failed: {}", response.body);
        let token = response.body["token"]
            .as_str()
            .expect("login returns a token")
            .to_string();

        let user = self
            .store()
            .find_user_by_username(username)
            .await
            .expect("lookup user")
            .expect("user exists");
        Session {
            user: user.id,
            username: user.username,
            token,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Boards, Sections & Stickers
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn board(&self, owner: &Session, title: &str) -> BoardId {
        let id = self
            .create(owner.post("/api/boards/", json!({"title": title})))
            .await;
        BoardId::new(id)
    }

    pub async fn section(&self, who: &Session, board: BoardId, title: &str) -> SectionId {
        let id = self
            .create(who.post(
                "/api/sections/",
                json!({"title": title, "board": board}),
            ))
            .await;
        SectionId::new(id)
    }

    pub async fn sticker(&self, who: &Session, section: SectionId, title: &str) -> StickerId {
        let id = self
            .create(who.post(
                "/api/stickers/",
                json!({"title": title, "section": section}),
            ))
            .await;
        StickerId::new(id)
    }

    /// The board's current invite token, read as its owner or a member.
    pub async fn invite_token(&self, who: &Session, board: BoardId) -> String {
        let response = self
            .send(who.get(&format!("/api/boards/{}/", board.get())))
            .await;
        assert_eq!(response.status, 200, "board fetch failed: {}", response.body);
        response.body["invite_link"]
            .as_str()
            .expect("board has an invite link")
            .to_string()
    }

    /// Bring `guest` onto the board with its current invite token.
    pub async fn join(&self, owner: &Session, guest: &Session, board: BoardId) {
        let token = self.invite_token(owner, board).await;
        let response = self
            .send(guest.post(&format!("/api/invite/{}/", token), Value::Null))
            .await;
        assert_eq!(response.status, 200, "join failed: {}", response.body);
    }
}

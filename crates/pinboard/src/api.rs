//! Transport-agnostic request dispatcher.
//!
//! [`Api::handle`] takes an HTTP-shaped request (method, path, optional
//! `Authorization` header, JSON body) and returns a status code with a JSON
//! body. It owns routing, payload decoding and response encoding; everything
//! else is delegated to [`Pinboard`]. A web framework only has to translate
//! its own request type into an [`ApiRequest`].
//!
//! Paths may carry an `/api` prefix and a trailing slash: `/api/boards/1/`
//! and `/boards/1` name the same resource.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use pinboard_core::{
    Board, BoardId, BoardUpdate, FieldErrors, InviteToken, NewBoard, NewSection, NewSticker,
    Section, SectionId, SectionUpdate, Sticker, StickerId, StickerUpdate, User, UserId,
};
use pinboard_perms::Actor;
use pinboard_store::Store;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{PinboardError, Result};
use crate::service::{BoardView, Pinboard, UserChanges, UserProfile};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {}", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// An incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Raw `Authorization` header value, if any.
    pub authorization: Option<String>,
    /// JSON body; `Null` when the request had none.
    pub body: Value,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            body: Value::Null,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Attach a bearer token as `Authorization: Token <key>`.
    pub fn with_token(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Token {}", token));
        self
    }
}

/// The response to an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// JSON body; `Null` for 204.
    pub body: Value,
}

impl ApiResponse {
    fn with_status<T: Serialize>(status: u16, body: &T) -> Result<Self> {
        Ok(Self {
            status,
            body: serde_json::to_value(body)?,
        })
    }

    fn ok<T: Serialize>(body: &T) -> Result<Self> {
        Self::with_status(200, body)
    }

    fn created<T: Serialize>(body: &T) -> Result<Self> {
        Self::with_status(201, body)
    }

    fn no_content() -> Result<Self> {
        Ok(Self {
            status: 204,
            body: Value::Null,
        })
    }

    fn error(err: &PinboardError) -> Self {
        Self {
            status: err.status(),
            body: err.body(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Bodies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct BoardBody<'a> {
    id: BoardId,
    title: &'a str,
    description: &'a str,
    created: i64,
    owner: UserId,
    users: &'a BTreeSet<UserId>,
    invite_link: &'a str,
}

impl<'a> From<&'a BoardView> for BoardBody<'a> {
    fn from(view: &'a BoardView) -> Self {
        let Board {
            id,
            title,
            description,
            created_at,
            owner,
            invite_token,
        } = &view.board;
        Self {
            id: *id,
            title,
            description,
            created: *created_at,
            owner: *owner,
            users: view.roster.members(),
            invite_link: invite_token.as_str(),
        }
    }
}

#[derive(Serialize)]
struct SectionBody<'a> {
    id: SectionId,
    title: &'a str,
    description: &'a str,
    created: i64,
    board: BoardId,
}

impl<'a> From<&'a Section> for SectionBody<'a> {
    fn from(section: &'a Section) -> Self {
        Self {
            id: section.id,
            title: &section.title,
            description: &section.description,
            created: section.created_at,
            board: section.board,
        }
    }
}

#[derive(Serialize)]
struct StickerBody<'a> {
    id: StickerId,
    title: &'a str,
    text: &'a str,
    created: i64,
    section: SectionId,
    assigned_to: Option<UserId>,
}

impl<'a> From<&'a Sticker> for StickerBody<'a> {
    fn from(sticker: &'a Sticker) -> Self {
        Self {
            id: sticker.id,
            title: &sticker.title,
            text: &sticker.text,
            created: sticker.created_at,
            section: sticker.section,
            assigned_to: sticker.assigned_to,
        }
    }
}

/// Public fields of a user. The password hash never leaves the service.
#[derive(Serialize)]
struct UserBody<'a> {
    id: UserId,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    boards: Option<&'a [BoardId]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guest_boards: Option<&'a [BoardId]>,
}

impl<'a> From<&'a User> for UserBody<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id,
            username: &user.username,
            boards: None,
            guest_boards: None,
        }
    }
}

impl<'a> From<&'a UserProfile> for UserBody<'a> {
    fn from(profile: &'a UserProfile) -> Self {
        Self {
            boards: Some(profile.boards.as_slice()),
            guest_boards: Some(profile.guest_boards.as_slice()),
            ..UserBody::from(&profile.user)
        }
    }
}

fn list<'a, T: 'a, B: Serialize + From<&'a T>>(items: &'a [T]) -> Vec<B> {
    items.iter().map(B::from).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Registration,
    Login,
    Logout,
    Boards,
    Board(BoardId),
    BoardSections(BoardId),
    BoardUsers(BoardId),
    BoardStickers(BoardId),
    Sections,
    Section(SectionId),
    SectionStickers(SectionId),
    Stickers,
    Sticker(StickerId),
    Invite(String),
    Users,
    User(UserId),
    DeleteMe,
}

impl Route {
    fn parse(path: &str) -> Option<Route> {
        let path = path.split(|c| c == '?' || c == '#').next().unwrap_or_default();
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.first() == Some(&"api") {
            segments.remove(0);
        }

        let route = match segments.as_slice() {
            ["registration"] => Route::Registration,
            ["login"] => Route::Login,
            ["logout"] => Route::Logout,
            ["boards"] => Route::Boards,
            ["boards", id] => Route::Board(BoardId::new(parse_id(id)?)),
            ["boards", id, "sections"] => Route::BoardSections(BoardId::new(parse_id(id)?)),
            ["boards", id, "users"] => Route::BoardUsers(BoardId::new(parse_id(id)?)),
            ["boards", id, "stickers"] => Route::BoardStickers(BoardId::new(parse_id(id)?)),
            ["sections"] => Route::Sections,
            ["sections", id] => Route::Section(SectionId::new(parse_id(id)?)),
            ["sections", id, "stickers"] => {
                Route::SectionStickers(SectionId::new(parse_id(id)?))
            }
            ["stickers"] => Route::Stickers,
            ["stickers", id] => Route::Sticker(StickerId::new(parse_id(id)?)),
            ["invite", token] => Route::Invite((*token).to_string()),
            ["users"] => Route::Users,
            ["users", "delete_me"] => Route::DeleteMe,
            ["users", id] => Route::User(UserId::new(parse_id(id)?)),
            _ => return None,
        };
        Some(route)
    }

    /// Routes reachable without credentials; a bad token is ignored there.
    fn is_public(&self) -> bool {
        matches!(self, Route::Registration | Route::Login)
    }
}

fn parse_id(segment: &str) -> Option<i64> {
    segment.parse().ok().filter(|id: &i64| *id > 0)
}

fn allow(method: Method, allowed: &[Method]) -> Result<()> {
    if allowed.contains(&method) {
        Ok(())
    } else {
        Err(PinboardError::MethodNotAllowed)
    }
}

const DETAIL: &[Method] = &[Method::Get, Method::Put, Method::Patch, Method::Delete];
const COLLECTION: &[Method] = &[Method::Get, Method::Post];

// ─────────────────────────────────────────────────────────────────────────────
// Payload Decoding
// ─────────────────────────────────────────────────────────────────────────────

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";

/// Decodes fields from a JSON object body, collecting every problem.
///
/// In partial mode (PATCH) no field is required.
struct Payload<'a> {
    fields: Option<&'a Map<String, Value>>,
    partial: bool,
    errors: FieldErrors,
}

impl<'a> Payload<'a> {
    fn new(body: &'a Value, partial: bool) -> Result<Self> {
        let fields = match body {
            Value::Null => None,
            Value::Object(map) => Some(map),
            other => {
                return Err(PinboardError::field(
                    "non_field_errors",
                    format!(
                        "Invalid data. Expected a dictionary, but got {}.",
                        json_type(other)
                    ),
                ))
            }
        };
        Ok(Self {
            fields,
            partial,
            errors: FieldErrors::new(),
        })
    }

    fn for_method(body: &'a Value, method: Method) -> Result<Self> {
        Self::new(body, method == Method::Patch)
    }

    fn raw(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        let value = self.fields.and_then(|f| f.get(field));
        if value.is_none() && required && !self.partial {
            self.errors.add(field, REQUIRED);
        }
        value
    }

    fn string(&mut self, field: &str, required: bool) -> Option<String> {
        match self.raw(field, required)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => {
                self.errors.add(field, NOT_NULL);
                None
            }
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.errors.add(field, "Not a valid string.");
                None
            }
        }
    }

    fn flag(&mut self, field: &str) -> Option<bool> {
        match self.raw(field, false)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.errors.add(field, "Must be a valid boolean.");
                None
            }
        }
    }

    /// A primary key. Numeric strings are accepted, as form posts send them.
    fn id(&mut self, field: &str, required: bool) -> Option<i64> {
        let value = self.raw(field, required)?;
        self.decode_id(field, value)
    }

    /// A nullable primary key: `Some(None)` when explicitly `null`.
    fn nullable_id(&mut self, field: &str) -> Option<Option<i64>> {
        match self.raw(field, false)? {
            Value::Null => Some(None),
            value => self.decode_id(field, value).map(Some),
        }
    }

    fn id_set(&mut self, field: &str) -> Option<BTreeSet<i64>> {
        match self.raw(field, false)? {
            Value::Array(items) => {
                let mut ids = BTreeSet::new();
                for item in items {
                    ids.insert(self.decode_id(field, item)?);
                }
                Some(ids)
            }
            other => {
                self.errors.add(
                    field,
                    format!(
                        "Expected a list of items but got type \"{}\".",
                        json_type(other)
                    ),
                );
                None
            }
        }
    }

    fn decode_id(&mut self, field: &str, value: &Value) -> Option<i64> {
        let id = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Null => {
                self.errors.add(field, NOT_NULL);
                return None;
            }
            _ => None,
        };
        if id.is_none() {
            self.errors.add(
                field,
                format!(
                    "Incorrect type. Expected pk value, received {}.",
                    json_type(value)
                ),
            );
        }
        id
    }

    fn finish(self) -> Result<()> {
        self.errors.into_result().map_err(PinboardError::Validation)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// The request dispatcher.
pub struct Api<S: Store> {
    pinboard: Pinboard<S>,
}

impl<S: Store> Api<S> {
    pub fn new(pinboard: Pinboard<S>) -> Self {
        Self { pinboard }
    }

    pub fn pinboard(&self) -> &Pinboard<S> {
        &self.pinboard
    }

    /// Handle one request. Never fails: every error becomes a response.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        match self.dispatch(&request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_internal() {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        error = %err,
                        "request failed"
                    );
                } else {
                    tracing::debug!(
                        method = %request.method,
                        path = %request.path,
                        status = err.status(),
                        "request rejected"
                    );
                }
                ApiResponse::error(&err)
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let route = Route::parse(&request.path).ok_or(PinboardError::NotFound)?;
        let actor = if route.is_public() {
            Actor::Anonymous
        } else {
            self.pinboard
                .authenticate(request.authorization.as_deref())
                .await?
        };
        let method = request.method;
        let body = &request.body;

        match route {
            Route::Registration => {
                allow(method, &[Method::Post])?;
                self.registration(body).await
            }
            Route::Login => {
                allow(method, &[Method::Post])?;
                self.login(body).await
            }
            Route::Logout => {
                allow(method, &[Method::Post])?;
                self.pinboard.logout(&actor).await?;
                ApiResponse::no_content()
            }
            Route::Boards => {
                allow(method, COLLECTION)?;
                self.boards(&actor, method, body).await
            }
            Route::Board(id) => {
                allow(method, DETAIL)?;
                self.board(&actor, method, id, body).await
            }
            Route::BoardSections(id) => {
                allow(method, &[Method::Get])?;
                let sections = self.pinboard.board_sections(&actor, id).await?;
                ApiResponse::ok(&list::<_, SectionBody>(&sections))
            }
            Route::BoardUsers(id) => {
                allow(method, &[Method::Get])?;
                let users = self.pinboard.board_users(&actor, id).await?;
                ApiResponse::ok(&list::<_, UserBody>(&users))
            }
            Route::BoardStickers(id) => {
                allow(method, &[Method::Get])?;
                let stickers = self.pinboard.board_stickers(&actor, id).await?;
                ApiResponse::ok(&list::<_, StickerBody>(&stickers))
            }
            Route::Sections => {
                allow(method, COLLECTION)?;
                self.sections(&actor, method, body).await
            }
            Route::Section(id) => {
                allow(method, DETAIL)?;
                self.section(&actor, method, id, body).await
            }
            Route::SectionStickers(id) => {
                allow(method, &[Method::Get])?;
                let stickers = self.pinboard.section_stickers(&actor, id).await?;
                ApiResponse::ok(&list::<_, StickerBody>(&stickers))
            }
            Route::Stickers => {
                allow(method, COLLECTION)?;
                self.stickers(&actor, method, body).await
            }
            Route::Sticker(id) => {
                allow(method, DETAIL)?;
                self.sticker(&actor, method, id, body).await
            }
            Route::Invite(token) => {
                allow(method, &[Method::Post])?;
                let board = self
                    .pinboard
                    .redeem_invite(&actor, &InviteToken::from_string(token))
                    .await?;
                ApiResponse::ok(&json!({ "id": board }))
            }
            Route::Users => {
                allow(method, &[Method::Post])?;
                self.create_user(&actor, body).await
            }
            Route::User(id) => {
                allow(method, DETAIL)?;
                self.user(&actor, method, id, body).await
            }
            Route::DeleteMe => {
                allow(method, &[Method::Delete])?;
                self.pinboard.delete_me(&actor).await?;
                ApiResponse::no_content()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users & Sessions
    // ─────────────────────────────────────────────────────────────────────────

    async fn registration(&self, body: &Value) -> Result<ApiResponse> {
        let mut payload = Payload::new(body, false)?;
        let username = payload.string("username", true);
        let password = payload.string("password", true);
        payload.finish()?;

        let user = self
            .pinboard
            .register(&username.unwrap_or_default(), &password.unwrap_or_default())
            .await?;
        ApiResponse::created(&UserBody::from(&user))
    }

    async fn login(&self, body: &Value) -> Result<ApiResponse> {
        let mut payload = Payload::new(body, false)?;
        let username = payload.string("username", true);
        let password = payload.string("password", true);
        payload.finish()?;

        let token = self
            .pinboard
            .login(&username.unwrap_or_default(), &password.unwrap_or_default())
            .await?;
        ApiResponse::ok(&json!({ "token": token.as_str() }))
    }

    async fn create_user(&self, actor: &Actor, body: &Value) -> Result<ApiResponse> {
        let mut payload = Payload::new(body, false)?;
        let username = payload.string("username", true);
        let password = payload.string("password", true);
        let is_admin = payload.flag("is_admin").unwrap_or(false);
        payload.finish()?;

        let user = self
            .pinboard
            .create_user(
                actor,
                &username.unwrap_or_default(),
                &password.unwrap_or_default(),
                is_admin,
            )
            .await?;
        ApiResponse::created(&UserBody::from(&user))
    }

    async fn user(
        &self,
        actor: &Actor,
        method: Method,
        id: UserId,
        body: &Value,
    ) -> Result<ApiResponse> {
        match method {
            Method::Get => {
                let profile = self.pinboard.get_user(actor, id).await?;
                ApiResponse::ok(&UserBody::from(&profile))
            }
            Method::Delete => {
                self.pinboard.delete_user(actor, id).await?;
                ApiResponse::no_content()
            }
            _ => {
                let mut payload = Payload::for_method(body, method)?;
                let changes = UserChanges {
                    username: payload.string("username", true),
                    password: payload.string("password", false),
                };
                payload.finish()?;

                let profile = self.pinboard.update_user(actor, id, &changes).await?;
                ApiResponse::ok(&UserBody::from(&profile))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Boards
    // ─────────────────────────────────────────────────────────────────────────

    async fn boards(&self, actor: &Actor, method: Method, body: &Value) -> Result<ApiResponse> {
        if method == Method::Get {
            let boards = self.pinboard.list_boards(actor).await?;
            return ApiResponse::ok(&list::<_, BoardBody>(&boards));
        }

        let mut payload = Payload::new(body, false)?;
        let board = NewBoard {
            title: payload.string("title", true).unwrap_or_default(),
            description: payload.string("description", false).unwrap_or_default(),
        };
        payload.finish()?;

        let view = self.pinboard.create_board(actor, &board).await?;
        ApiResponse::created(&BoardBody::from(&view))
    }

    async fn board(
        &self,
        actor: &Actor,
        method: Method,
        id: BoardId,
        body: &Value,
    ) -> Result<ApiResponse> {
        match method {
            Method::Get => {
                let view = self.pinboard.get_board(actor, id).await?;
                ApiResponse::ok(&BoardBody::from(&view))
            }
            Method::Delete => {
                self.pinboard.delete_board(actor, id).await?;
                ApiResponse::no_content()
            }
            _ => {
                let mut payload = Payload::for_method(body, method)?;
                let update = BoardUpdate {
                    title: payload.string("title", true),
                    description: payload.string("description", false),
                    users: payload
                        .id_set("users")
                        .map(|ids| ids.into_iter().map(UserId::new).collect()),
                };
                payload.finish()?;

                let view = self.pinboard.update_board(actor, id, &update).await?;
                ApiResponse::ok(&BoardBody::from(&view))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sections
    // ─────────────────────────────────────────────────────────────────────────

    async fn sections(&self, actor: &Actor, method: Method, body: &Value) -> Result<ApiResponse> {
        if method == Method::Get {
            let sections = self.pinboard.list_sections(actor).await?;
            return ApiResponse::ok(&list::<_, SectionBody>(&sections));
        }

        let mut payload = Payload::new(body, false)?;
        let title = payload.string("title", true);
        let description = payload.string("description", false);
        let board = payload.id("board", true);
        payload.finish()?;

        let section = NewSection {
            board: BoardId::new(board.unwrap_or_default()),
            title: title.unwrap_or_default(),
            description: description.unwrap_or_default(),
        };
        let section = self.pinboard.create_section(actor, &section).await?;
        ApiResponse::created(&SectionBody::from(&section))
    }

    async fn section(
        &self,
        actor: &Actor,
        method: Method,
        id: SectionId,
        body: &Value,
    ) -> Result<ApiResponse> {
        match method {
            Method::Get => {
                let section = self.pinboard.get_section(actor, id).await?;
                ApiResponse::ok(&SectionBody::from(&section))
            }
            Method::Delete => {
                self.pinboard.delete_section(actor, id).await?;
                ApiResponse::no_content()
            }
            _ => {
                let mut payload = Payload::for_method(body, method)?;
                let update = SectionUpdate {
                    board: payload.id("board", true).map(BoardId::new),
                    title: payload.string("title", true),
                    description: payload.string("description", false),
                };
                payload.finish()?;

                let section = self.pinboard.update_section(actor, id, &update).await?;
                ApiResponse::ok(&SectionBody::from(&section))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stickers
    // ─────────────────────────────────────────────────────────────────────────

    async fn stickers(&self, actor: &Actor, method: Method, body: &Value) -> Result<ApiResponse> {
        if method == Method::Get {
            let stickers = self.pinboard.list_stickers(actor).await?;
            return ApiResponse::ok(&list::<_, StickerBody>(&stickers));
        }

        let mut payload = Payload::new(body, false)?;
        let title = payload.string("title", true);
        let text = payload.string("text", false);
        let section = payload.id("section", true);
        let assigned_to = payload.nullable_id("assigned_to").flatten();
        payload.finish()?;

        let sticker = NewSticker {
            section: SectionId::new(section.unwrap_or_default()),
            title: title.unwrap_or_default(),
            text: text.unwrap_or_default(),
            assigned_to: assigned_to.map(UserId::new),
        };
        let sticker = self.pinboard.create_sticker(actor, &sticker).await?;
        ApiResponse::created(&StickerBody::from(&sticker))
    }

    async fn sticker(
        &self,
        actor: &Actor,
        method: Method,
        id: StickerId,
        body: &Value,
    ) -> Result<ApiResponse> {
        match method {
            Method::Get => {
                let sticker = self.pinboard.get_sticker(actor, id).await?;
                ApiResponse::ok(&StickerBody::from(&sticker))
            }
            Method::Delete => {
                self.pinboard.delete_sticker(actor, id).await?;
                ApiResponse::no_content()
            }
            _ => {
                let mut payload = Payload::for_method(body, method)?;
                let update = StickerUpdate {
                    section: payload.id("section", true).map(SectionId::new),
                    title: payload.string("title", true),
                    text: payload.string("text", false),
                    assigned_to: payload
                        .nullable_id("assigned_to")
                        .map(|a| a.map(UserId::new)),
                };
                payload.finish()?;

                let sticker = self.pinboard.update_sticker(actor, id, &update).await?;
                ApiResponse::ok(&StickerBody::from(&sticker))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parsing() {
        assert_eq!(Route::parse("/api/boards/"), Some(Route::Boards));
        assert_eq!(Route::parse("/boards"), Some(Route::Boards));
        assert_eq!(
            Route::parse("/api/boards/7/sections"),
            Some(Route::BoardSections(BoardId::new(7)))
        );
        assert_eq!(
            Route::parse("/sections/3/stickers/"),
            Some(Route::SectionStickers(SectionId::new(3)))
        );
        assert_eq!(Route::parse("/api/users/delete_me"), Some(Route::DeleteMe));
        assert_eq!(Route::parse("/users/5/"), Some(Route::User(UserId::new(5))));
        assert_eq!(
            Route::parse("/api/invite/abcDEF123/"),
            Some(Route::Invite("abcDEF123".into()))
        );
        assert_eq!(Route::parse("/login/?next=/"), Some(Route::Login));
    }

    #[test]
    fn test_unknown_routes() {
        assert_eq!(Route::parse("/api/"), None);
        assert_eq!(Route::parse("/boards/abc/"), None);
        assert_eq!(Route::parse("/boards/0/"), None);
        assert_eq!(Route::parse("/boards/1/owners"), None);
        assert_eq!(Route::parse("/invite/"), None);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("patch".parse::<Method>(), Ok(Method::Patch));
        assert!("TRACE".parse::<Method>().is_err());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_payload_required_fields() {
        let body = json!({"title": "x"});
        let mut payload = Payload::new(&body, false).unwrap();
        assert_eq!(payload.string("title", true).as_deref(), Some("x"));
        assert_eq!(payload.id("board", true), None);

        let err = payload.finish().unwrap_err();
        assert_eq!(err.body(), json!({"board": ["This field is required."]}));
    }

    #[test]
    fn test_payload_partial_skips_required() {
        let body = json!({});
        let mut payload = Payload::new(&body, true).unwrap();
        assert_eq!(payload.string("title", true), None);
        assert!(payload.finish().is_ok());
    }

    #[test]
    fn test_payload_ids() {
        let body = json!({"board": "12", "assigned_to": null, "users": [3, "4"], "bad": true});
        let mut payload = Payload::new(&body, false).unwrap();
        assert_eq!(payload.id("board", true), Some(12));
        assert_eq!(payload.nullable_id("assigned_to"), Some(None));
        assert_eq!(payload.id_set("users"), Some([3, 4].into_iter().collect()));
        assert_eq!(payload.id("bad", false), None);

        let err = payload.finish().unwrap_err();
        assert_eq!(
            err.body(),
            json!({"bad": ["Incorrect type. Expected pk value, received bool."]})
        );
    }

    #[test]
    fn test_payload_rejects_non_object() {
        let body = json!([1, 2]);
        assert!(matches!(
            Payload::new(&body, false),
            Err(PinboardError::Validation(_))
        ));
    }
}

//! End-to-end tests through the request dispatcher.

use pinboard::{ApiRequest, Method};
use pinboard_testkit::{id_of, TestFixture};
use serde_json::{json, Value};

const NOT_PERMITTED: &str = "You do not have permission to perform this action.";

// ─────────────────────────────────────────────────────────────────────────────
// Registration & Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_registration_rejects_weak_password() {
    let fixture = TestFixture::new();
    let response = fixture
        .send(ApiRequest::post(
            "/api/registration/",
            json!({"username": "a123", "password": "pww"}),
        ))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({"password": ["Password must be at least 8 characters long, contain at least one digit"]})
    );
}

#[tokio::test]
async fn test_registration_requires_fields() {
    let fixture = TestFixture::new();
    let response = fixture
        .send(ApiRequest::post("/api/registration/", json!({})))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({
            "username": ["This field is required."],
            "password": ["This field is required."]
        })
    );
}

#[tokio::test]
async fn test_registration_ignores_bad_token() {
    let fixture = TestFixture::new();
    let response = fixture
        .send(
            ApiRequest::post(
                "/registration",
                json!({"username": "alice", "password": "Password1"}),
            )
            .with_token("stale"),
        )
        .await;

    assert_eq!(response.status, 201);
    assert_eq!(response.body["username"], "alice");
    assert!(response.body.get("password").is_none());
}

#[tokio::test]
async fn test_failed_login() {
    let fixture = TestFixture::new();
    fixture.register("alice").await;

    let response = fixture
        .send(ApiRequest::post(
            "/api/login/",
            json!({"username": "alice", "password": "Wrong1234"}),
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({"non_field_errors": ["Unable to log in with provided credentials."]})
    );
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let fixture = TestFixture::new();
    let response = fixture
        .send(ApiRequest::get("/api/boards/").with_token("forged"))
        .await;

    assert_eq!(response.status, 401);
    assert_eq!(response.body, json!({"detail": "Invalid token."}));
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;

    let response = fixture.send(alice.post("/api/logout/", Value::Null)).await;
    assert_eq!(response.status, 204);

    let response = fixture.send(alice.get("/api/boards/")).await;
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn test_delete_me_removes_owned_boards() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let board = fixture.board(&alice, "Doomed").await;
    fixture.join(&alice, &bob, board).await;

    let response = fixture.send(alice.delete("/api/users/delete_me/")).await;
    assert_eq!(response.status, 204);

    let response = fixture.send(alice.get("/api/boards/")).await;
    assert_eq!(response.status, 401);
    assert_eq!(response.body, json!({"detail": "Invalid token."}));

    let response = fixture.send(bob.get("/api/boards/")).await;
    assert_eq!(response.body, json!([]));
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_admin_only_user_creation() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let root = fixture.admin("root").await;
    let body = json!({"username": "carol", "password": "Password1"});

    let response = fixture
        .send(ApiRequest::post("/api/users/", body.clone()))
        .await;
    assert_eq!(response.status, 401);

    let response = fixture.send(alice.post("/api/users/", body.clone())).await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({"detail": NOT_PERMITTED}));

    let response = fixture.send(root.post("/api/users/", body)).await;
    assert_eq!(response.status, 201);
    assert_eq!(response.body["username"], "carol");
    fixture.login("carol").await;
}

#[tokio::test]
async fn test_user_profile_is_private() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let owned = fixture.board(&alice, "Mine").await;
    let shared = fixture.board(&bob, "Theirs").await;
    fixture.join(&bob, &alice, shared).await;

    let me = format!("/api/users/{}/", alice.user.get());
    let response = fixture.send(alice.get(&me)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["boards"], json!([owned.get()]));
    assert_eq!(response.body["guest_boards"], json!([shared.get()]));

    let response = fixture.send(bob.get(&me)).await;
    assert_eq!(response.status, 404);
    let response = fixture.send(bob.delete(&me)).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_user_rename() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    fixture.register("bob").await;
    let me = format!("/api/users/{}/", alice.user.get());

    let response = fixture.send(alice.patch(&me, json!({"username": "Bob"}))).await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({"username": ["USERNAME_IS_USED_BY_USER"]})
    );

    let response = fixture.send(alice.put(&me, json!({}))).await;
    assert_eq!(response.body, json!({"username": ["This field is required."]}));

    let response = fixture.send(alice.put(&me, json!({"username": "alicia"}))).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["username"], "alicia");
}

// ─────────────────────────────────────────────────────────────────────────────
// Boards
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_board_creation() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;

    let response = fixture
        .send(alice.post(
            "/api/boards/",
            json!({"title": "Roadmap", "description": "Q3"}),
        ))
        .await;
    assert_eq!(response.status, 201);
    assert_eq!(response.body["title"], "Roadmap");
    assert_eq!(response.body["owner"], alice.user.get());
    assert_eq!(response.body["users"], json!([]));
    assert!(!response.body["invite_link"].as_str().unwrap_or_default().is_empty());

    let response = fixture
        .send(alice.post("/api/boards/", json!({"title": "  "})))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.body, json!({"title": ["This field may not be blank."]}));
}

#[tokio::test]
async fn test_unrelated_user_sees_nothing() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let eve = fixture.register("eve").await;
    let board = fixture.board(&alice, "Private").await;
    let section = fixture.section(&alice, board, "Todo").await;
    let sticker = fixture.sticker(&alice, section, "Secret").await;

    for path in ["/api/boards/", "/api/sections/", "/api/stickers/"] {
        let response = fixture.send(eve.get(path)).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!([]), "{}", path);
    }

    for path in [
        format!("/api/boards/{}/", board.get()),
        format!("/api/boards/{}/sections/", board.get()),
        format!("/api/boards/{}/users/", board.get()),
        format!("/api/sections/{}/", section.get()),
        format!("/api/stickers/{}/", sticker.get()),
    ] {
        let response = fixture.send(eve.get(&path)).await;
        assert_eq!(response.status, 404, "{}", path);
    }

    let response = fixture
        .send(eve.patch(&format!("/api/boards/{}/", board.get()), json!({"title": "Mine"})))
        .await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_anonymous_access() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let board = fixture.board(&alice, "Private").await;

    let response = fixture.send(ApiRequest::get("/api/boards/")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!([]));

    let response = fixture
        .send(ApiRequest::get(format!("/api/boards/{}/", board.get())))
        .await;
    assert_eq!(response.status, 401);

    let response = fixture
        .send(ApiRequest::post("/api/boards/", json!({"title": "x"})))
        .await;
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn test_member_cannot_edit_board() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let board = fixture.board(&alice, "Shared").await;
    fixture.join(&alice, &bob, board).await;
    let path = format!("/api/boards/{}/", board.get());

    let response = fixture.send(bob.patch(&path, json!({"title": "Hijacked"}))).await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({"detail": NOT_PERMITTED}));

    let response = fixture.send(bob.delete(&path)).await;
    assert_eq!(response.status, 403);

    let response = fixture.send(bob.get(&path)).await;
    assert_eq!(response.body["title"], "Shared");
}

#[tokio::test]
async fn test_board_member_replacement() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let board = fixture.board(&alice, "Shared").await;
    fixture.join(&alice, &bob, board).await;
    let section = fixture.section(&alice, board, "Todo").await;
    let sticker = fixture
        .create(alice.post(
            "/api/stickers/",
            json!({"title": "Task", "section": section, "assigned_to": bob.user}),
        ))
        .await;
    let path = format!("/api/boards/{}/", board.get());

    let response = fixture
        .send(alice.patch(&path, json!({"users": [bob.user.get(), 999_999]})))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(
        response.body,
        json!({"users": ["Invalid pk \"999999\" - object does not exist."]})
    );

    let response = fixture.send(alice.patch(&path, json!({"users": []}))).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["users"], json!([]));

    let response = fixture.send(bob.get(&path)).await;
    assert_eq!(response.status, 404);

    let response = fixture
        .send(alice.get(&format!("/api/stickers/{}/", sticker)))
        .await;
    assert_eq!(response.body["assigned_to"], Value::Null);
}

#[tokio::test]
async fn test_board_users_lists_owner_first() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let board = fixture.board(&alice, "Shared").await;
    fixture.join(&alice, &bob, board).await;

    let response = fixture
        .send(bob.get(&format!("/api/boards/{}/users/", board.get())))
        .await;
    assert_eq!(response.status, 200);
    let names: Vec<&str> = response
        .body
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|u| u["username"].as_str())
        .collect();
    assert_eq!(names, ["alice", "bob"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_section_on_missing_board() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;

    let response = fixture
        .send(alice.post(
            "/api/sections/",
            json!({"title": "Backlog", "board": 9_999_999}),
        ))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({"detail": "such board does not exist"}));
}

#[tokio::test]
async fn test_section_on_foreign_board() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let eve = fixture.register("eve").await;
    let board = fixture.board(&alice, "Private").await;

    let response = fixture
        .send(eve.post("/api/sections/", json!({"title": "Mine", "board": board})))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({"detail": "such board does not exist"}));
}

#[tokio::test]
async fn test_section_stays_on_its_board() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let first = fixture.board(&alice, "First").await;
    let second = fixture.board(&alice, "Second").await;
    let section = fixture.section(&alice, first, "Todo").await;
    let path = format!("/api/sections/{}/", section.get());

    let response = fixture.send(alice.patch(&path, json!({"board": second}))).await;
    assert_eq!(response.status, 403);
    assert_eq!(
        response.body,
        json!({"board": ["Cannot move a section to another board"]})
    );

    let response = fixture
        .send(alice.put(&path, json!({"title": "Doing", "board": first})))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["title"], "Doing");
    assert_eq!(response.body["board"], first.get());
}

#[tokio::test]
async fn test_member_manages_sections() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let board = fixture.board(&alice, "Shared").await;
    fixture.join(&alice, &bob, board).await;

    let section = fixture.section(&bob, board, "Bob's column").await;
    let response = fixture
        .send(alice.get(&format!("/api/boards/{}/sections/", board.get())))
        .await;
    assert_eq!(response.body.as_array().map(Vec::len), Some(1));

    let response = fixture
        .send(bob.delete(&format!("/api/sections/{}/", section.get())))
        .await;
    assert_eq!(response.status, 204);
}

#[tokio::test]
async fn test_section_access_follows_board_roster() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let board = fixture.board(&alice, "Shared").await;
    let section = fixture.section(&alice, board, "Todo").await;
    let path = format!("/api/sections/{}/", section.get());

    assert_eq!(fixture.send(bob.get(&path)).await.status, 404);

    fixture.join(&alice, &bob, board).await;
    assert_eq!(fixture.send(bob.get(&path)).await.status, 200);

    let board_path = format!("/api/boards/{}/", board.get());
    let response = fixture.send(alice.patch(&board_path, json!({"users": []}))).await;
    assert_eq!(response.status, 200);
    assert_eq!(fixture.send(bob.get(&path)).await.status, 404);
    assert_eq!(fixture.send(alice.get(&path)).await.status, 200);
}

// ─────────────────────────────────────────────────────────────────────────────
// Stickers
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sticker_move_within_board() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let board = fixture.board(&alice, "Roadmap").await;
    let todo = fixture.section(&alice, board, "Todo").await;
    let done = fixture.section(&alice, board, "Done").await;
    let sticker = fixture.sticker(&alice, todo, "Write docs").await;
    let path = format!("/api/stickers/{}/", sticker.get());

    let response = fixture
        .send(alice.put(
            &path,
            json!({"title": "Write docs", "text": "all of them", "section": done}),
        ))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["section"], done.get());
    assert_eq!(response.body["text"], "all of them");

    let response = fixture
        .send(alice.put(
            &path,
            json!({"title": "Write docs", "section": 9_999_999}),
        ))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({"section": ["Such section does not exist"]}));

    let response = fixture
        .send(alice.get(&format!("/api/sections/{}/stickers/", done.get())))
        .await;
    assert_eq!(response.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_sticker_cannot_cross_boards() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let first = fixture.board(&alice, "First").await;
    let second = fixture.board(&alice, "Second").await;
    let here = fixture.section(&alice, first, "Here").await;
    let there = fixture.section(&alice, second, "There").await;
    let sticker = fixture.sticker(&alice, here, "Stay").await;
    let path = format!("/api/stickers/{}/", sticker.get());

    let response = fixture
        .send(alice.patch(&path, json!({"section": there, "title": "Moved"})))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(
        response.body,
        json!({"section": ["Cannot move a sticker to another board"]})
    );

    let response = fixture.send(alice.get(&path)).await;
    assert_eq!(response.body["section"], here.get());
    assert_eq!(response.body["title"], "Stay");
}

#[tokio::test]
async fn test_sticker_into_foreign_section() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let eve = fixture.register("eve").await;
    let board = fixture.board(&alice, "Private").await;
    let section = fixture.section(&alice, board, "Todo").await;

    let response = fixture
        .send(eve.post("/api/stickers/", json!({"title": "Spam", "section": section})))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({"section": ["Such section does not exist"]}));
}

#[tokio::test]
async fn test_sticker_assignee_must_be_on_board() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let bob = fixture.register("bob").await;
    let carol = fixture.register("carol").await;
    let board = fixture.board(&alice, "Shared").await;
    fixture.join(&alice, &bob, board).await;
    let section = fixture.section(&alice, board, "Todo").await;
    let sticker = fixture.sticker(&alice, section, "Task").await;
    let path = format!("/api/stickers/{}/", sticker.get());

    let response = fixture
        .send(alice.patch(&path, json!({"assigned_to": carol.user})))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(
        response.body,
        json!({"assigned_to": ["User is not a member of this board"]})
    );

    let response = fixture
        .send(alice.patch(&path, json!({"assigned_to": 9_999_999})))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, json!({"assigned_to": ["Such user does not exist"]}));

    let response = fixture
        .send(alice.patch(&path, json!({"assigned_to": bob.user})))
        .await;
    assert_eq!(response.status, 200);

    let response = fixture.send(bob.get(&path)).await;
    assert_eq!(response.body["assigned_to"], bob.user.get());

    let response = fixture
        .send(bob.patch(&path, json!({"assigned_to": null})))
        .await;
    assert_eq!(response.body["assigned_to"], Value::Null);
}

#[tokio::test]
async fn test_sticker_create_with_assignee() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;
    let carol = fixture.register("carol").await;
    let board = fixture.board(&alice, "Solo").await;
    let section = fixture.section(&alice, board, "Todo").await;

    let response = fixture
        .send(alice.post(
            "/api/stickers/",
            json!({"title": "Task", "section": section, "assigned_to": carol.user}),
        ))
        .await;
    assert_eq!(response.status, 403);

    let id = fixture
        .create(alice.post(
            "/api/stickers/",
            json!({"title": "Task", "section": section, "assigned_to": alice.user}),
        ))
        .await;
    let response = fixture
        .send(alice.get(&format!("/api/boards/{}/stickers/", board.get())))
        .await;
    assert_eq!(response.body.as_array().map(|s| id_of(&s[0])), Some(id));
}

// ─────────────────────────────────────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_method_not_allowed() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;

    let response = fixture.send(alice.delete("/api/boards/")).await;
    assert_eq!(response.status, 405);
    assert_eq!(response.body, json!({"detail": "Method not allowed."}));

    let response = fixture
        .send(ApiRequest::new(Method::Get, "/api/login/"))
        .await;
    assert_eq!(response.status, 405);
}

#[tokio::test]
async fn test_unknown_path() {
    let fixture = TestFixture::new();
    let alice = fixture.register("alice").await;

    let response = fixture.send(alice.get("/api/widgets/")).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.body, json!({"detail": "Not found."}));

    let response = fixture.send(alice.get("/api/boards/9999/")).await;
    assert_eq!(response.status, 404);
}

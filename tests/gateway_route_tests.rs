mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::StubDispatcher;
use serde_json::{Value, json};
use std::sync::Arc;
use studyhall::db::DbActorHandle;
use studyhall::server::{AppState, studyhall_router};
use tower::ServiceExt;

struct TestApp {
    app: axum::Router,
    db: DbActorHandle,
    token: String,
    _guard: tempfile::TempDir,
}

async fn test_app(dispatcher: StubDispatcher) -> TestApp {
    let (db, guard) = common::spawn_temp_db().await;
    let token = db.create_session("user-a").await.unwrap();
    let app = studyhall_router(AppState::new(db.clone(), Arc::new(dispatcher)));
    TestApp {
        app,
        db,
        token,
        _guard: guard,
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn guard_rejects_missing_and_unknown_tokens() {
    let t = test_app(StubDispatcher::replying("unused")).await;

    let resp = t
        .app
        .clone()
        .oneshot(request("GET", "/api/chats", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = t
        .app
        .oneshot(request("GET", "/api/chats", Some("bogus"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chats_create_and_list_over_http() {
    let t = test_app(StubDispatcher::replying("unused")).await;

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/chats",
            Some(&t.token),
            Some(json!({ "category": "SAT" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let chat = json_body(resp).await;
    assert_eq!(chat["category"], "SAT");
    assert_eq!(chat["title"], "New Chat");

    let resp = t
        .app
        .oneshot(request("GET", "/api/chats", Some(&t.token), None))
        .await
        .unwrap();
    let chats = json_body(resp).await;
    assert_eq!(chats.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn turn_endpoint_runs_full_exchange() {
    let t = test_app(StubDispatcher::replying("x = 2")).await;
    let chat = t.db.create_chat("user-a", "Algebra", "New Chat").await.unwrap();

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/chats/{}/turns", chat.id),
            Some(&t.token),
            Some(json!({ "content": "Solve x+2=4" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["reply"], "x = 2");
    assert_eq!(body["fallback"], false);

    let messages = t.db.list_messages(chat.id).await.unwrap();
    assert_eq!(messages.len(), 2);

    // Blank submissions are ignored, not errors.
    let resp = t
        .app
        .oneshot(request(
            "POST",
            &format!("/api/chats/{}/turns", chat.id),
            Some(&t.token),
            Some(json!({ "content": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(t.db.list_messages(chat.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn turn_endpoint_defaults_to_stored_preferences() {
    let dispatcher = Arc::new(StubDispatcher::replying("ok"));
    let (db, _guard) = common::spawn_temp_db().await;
    let token = db.create_session("user-a").await.unwrap();
    db.update_preferences(
        "user-a",
        studyhall::db::PreferencesPatch {
            language: Some("bn".to_string()),
            show_step_by_step: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let chat = db.create_chat("user-a", "Algebra", "New Chat").await.unwrap();
    let app = studyhall_router(AppState::new(db, dispatcher.clone()));

    let resp = app
        .oneshot(request(
            "POST",
            &format!("/api/chats/{}/turns", chat.id),
            Some(&token),
            Some(json!({ "content": "Solve x+2=4" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = dispatcher.calls.lock().unwrap();
    let (contents, _) = calls.last().unwrap();
    let final_text = contents.last().unwrap().joined_text();
    assert_eq!(
        final_text,
        "IMPORTANT: Respond only in Bengali (Bangla) language.\n\nSolve x+2=4\
         \n\nPlease provide a concise answer without detailed steps."
    );
}

#[tokio::test]
async fn notes_routes_cover_search_and_patch() {
    let t = test_app(StubDispatcher::replying("unused")).await;

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/notes",
            Some(&t.token),
            Some(json!({ "title": "Algebra formulas", "content": "a^2+b^2", "tags": ["math"] })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let note = json_body(resp).await;

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            "/api/notes/search?q=algebra",
            Some(&t.token),
            None,
        ))
        .await
        .unwrap();
    let hits = json_body(resp).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let resp = t
        .app
        .oneshot(request(
            "PATCH",
            &format!("/api/notes/{}", note["id"]),
            Some(&t.token),
            Some(json!({ "tags": ["math", "exam"] })),
        ))
        .await
        .unwrap();
    let patched = json_body(resp).await;
    assert_eq!(patched["tags"], json!(["math", "exam"]));
    assert_eq!(patched["title"], "Algebra formulas");
}

#[tokio::test]
async fn preferences_routes_get_or_create_then_update() {
    let t = test_app(StubDispatcher::replying("unused")).await;

    let resp = t
        .app
        .clone()
        .oneshot(request("GET", "/api/preferences", Some(&t.token), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let prefs = json_body(resp).await;
    assert_eq!(prefs["theme"], "light");
    assert_eq!(prefs["show_step_by_step"], true);

    let resp = t
        .app
        .oneshot(request(
            "PUT",
            "/api/preferences",
            Some(&t.token),
            Some(json!({ "theme": "dark" })),
        ))
        .await
        .unwrap();
    let updated = json_body(resp).await;
    assert_eq!(updated["theme"], "dark");
    assert_eq!(updated["language"], "en");
}

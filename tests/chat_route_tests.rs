mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::StubDispatcher;
use serde_json::{Value, json};
use std::sync::Arc;
use studyhall::server::{AppState, studyhall_router};
use tower::ServiceExt;

async fn state_with(dispatcher: StubDispatcher) -> (AppState, tempfile::TempDir) {
    let (db, guard) = common::spawn_temp_db().await;
    (AppState::new(db, Arc::new(dispatcher)), guard)
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_rejects_missing_or_non_array_messages() {
    let (state, _guard) = state_with(StubDispatcher::replying("unused")).await;
    let app = studyhall_router(state);

    let resp = app
        .clone()
        .oneshot(chat_request(json!({ "language": "en" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "Messages are required and must be an array");

    let resp = app
        .oneshot(chat_request(json!({ "messages": "not an array" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_returns_model_response() {
    let (state, _guard) = state_with(StubDispatcher::replying("x = 2")).await;
    let app = studyhall_router(state);

    let resp = app
        .oneshot(chat_request(json!({
            "messages": [{ "role": "user", "content": "Solve x+2=4" }],
            "showStepByStep": false,
        })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["response"], "x = 2");
}

#[tokio::test]
async fn chat_maps_dispatch_failure_to_500() {
    let (state, _guard) = state_with(StubDispatcher::failing()).await;
    let app = studyhall_router(state);

    let resp = app
        .oneshot(chat_request(json!({
            "messages": [{ "role": "user", "content": "hi" }],
        })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "Failed to generate response");
}

#[tokio::test]
async fn chat_forwards_image_and_locale_options() {
    let dispatcher = Arc::new(StubDispatcher::replying("A triangle."));
    let (db, _guard) = common::spawn_temp_db().await;
    let app = studyhall_router(AppState::new(db, dispatcher.clone()));

    let resp = app
        .oneshot(chat_request(json!({
            "messages": [
                { "role": "user", "content": "earlier" },
                { "role": "model", "content": "reply" },
                { "role": "user", "content": "What shape is this?" }
            ],
            "imageData": "aW1hZ2U=",
            "language": "hi",
        })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = dispatcher.calls.lock().unwrap();
    let (contents, image) = calls.last().unwrap();
    assert_eq!(image.as_deref(), Some("aW1hZ2U="));
    // Synthetic locale turn + three forwarded messages.
    assert_eq!(contents.len(), 4);
    assert!(contents[0].joined_text().contains("Hindi"));
    assert!(
        contents[3]
            .joined_text()
            .starts_with("IMPORTANT: Respond only in Hindi language.")
    );
}

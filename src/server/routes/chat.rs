//! Stateless compose-and-dispatch endpoint (`POST /api/chat`).
//!
//! Wire contract: callers send model-boundary roles
//! (`user`/`model`), a 400 with a bare `{"error": ...}` body on a missing
//! or non-array `messages`, and a 500 `{"error": ...}` on any internal
//! failure including model dispatch.

use crate::prompt::{self, PromptMessage, PromptRole};
use crate::server::router::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;

pub async fn chat_handler(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let Some(messages) = body.get("messages").and_then(Value::as_array) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Messages are required and must be an array" })),
        )
            .into_response();
    };

    let messages: Vec<PromptMessage> = messages
        .iter()
        .map(|msg| PromptMessage {
            role: msg
                .get("role")
                .and_then(Value::as_str)
                .and_then(PromptRole::parse)
                .unwrap_or(PromptRole::User),
            content: msg
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();

    let language = body.get("language").and_then(Value::as_str).unwrap_or("en");
    let show_step_by_step = body
        .get("showStepByStep")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let image_data = body.get("imageData").and_then(Value::as_str);

    let result = async {
        let contents = prompt::compose(&messages, language, show_step_by_step)?;
        match image_data {
            Some(image) => state.dispatcher.generate_with_image(contents, image).await,
            None => state.dispatcher.generate_text(contents).await,
        }
    }
    .await;

    match result {
        Ok(response) => Json(json!({ "response": response })).into_response(),
        Err(e) => {
            error!(error = %e, "chat dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate response" })),
            )
                .into_response()
        }
    }
}

//! Conversation routes: chat CRUD, message listing, and the turn endpoint
//! that drives one full orchestrated exchange.

use crate::db::models::{ChatHistory, ChatMessage};
use crate::error::StudyhallError;
use crate::orchestrator::{self, TurnOutcome, TurnRequest};
use crate::server::guards::auth::CurrentUser;
use crate::server::router::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ChatCreateBody {
    pub category: String,
    #[serde(default = "default_chat_title")]
    pub title: String,
}

fn default_chat_title() -> String {
    "New Chat".to_string()
}

pub async fn create_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<ChatCreateBody>,
) -> Result<Json<ChatHistory>, StudyhallError> {
    let chat = state
        .db
        .create_chat(&user.user_id, &body.category, &body.title)
        .await?;
    Ok(Json(chat))
}

pub async fn list_chats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ChatHistory>>, StudyhallError> {
    Ok(Json(state.db.list_chats(&user.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ChatRenameBody {
    pub title: String,
}

pub async fn rename_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(chat_id): Path<i64>,
    Json(body): Json<ChatRenameBody>,
) -> Result<Json<ChatHistory>, StudyhallError> {
    let chat = state
        .db
        .rename_chat(&user.user_id, chat_id, &body.title)
        .await?;
    Ok(Json(chat))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(chat_id): Path<i64>,
) -> Result<StatusCode, StudyhallError> {
    state.db.delete_chat(&user.user_id, chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_messages(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<ChatMessage>>, StudyhallError> {
    Ok(Json(state.db.list_messages(chat_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnBody {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_data: Option<String>,
    /// Stored preferences supply these when absent.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub show_step_by_step: Option<bool>,
}

pub async fn submit_turn(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(chat_id): Path<i64>,
    Json(body): Json<TurnBody>,
) -> Result<Response, StudyhallError> {
    let prefs = state.db.get_or_create_preferences(&user.user_id).await?;

    let outcome = orchestrator::submit_turn(
        &state.db,
        state.dispatcher.as_ref(),
        TurnRequest {
            chat_id,
            content: body.content,
            image_base64: body.image_data,
            language: body.language.unwrap_or(prefs.language),
            show_step_by_step: body.show_step_by_step.unwrap_or(prefs.show_step_by_step),
        },
    )
    .await;

    match outcome {
        TurnOutcome::Ignored => Ok(StatusCode::NO_CONTENT.into_response()),
        TurnOutcome::Replied { reply, fallback } => {
            Ok(Json(json!({ "reply": reply, "fallback": fallback })).into_response())
        }
    }
}

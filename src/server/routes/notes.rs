//! Note and folder routes.

use crate::db::models::{Note, NoteFolder};
use crate::db::patch::{NoteCreate, NotePatch};
use crate::error::StudyhallError;
use crate::server::guards::auth::CurrentUser;
use crate::server::router::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCreateBody {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

pub async fn create_folder(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<FolderCreateBody>,
) -> Result<Json<NoteFolder>, StudyhallError> {
    let folder = state
        .db
        .create_folder(&user.user_id, &body.name, body.parent_id)
        .await?;
    Ok(Json(folder))
}

pub async fn list_folders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<NoteFolder>>, StudyhallError> {
    Ok(Json(state.db.list_folders(&user.user_id).await?))
}

pub async fn create_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<NoteCreate>,
) -> Result<Json<Note>, StudyhallError> {
    Ok(Json(state.db.create_note(&user.user_id, body).await?))
}

#[derive(Debug, Deserialize)]
pub struct NoteListQuery {
    #[serde(default)]
    pub folder_id: Option<i64>,
}

pub async fn list_notes(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<NoteListQuery>,
) -> Result<Json<Vec<Note>>, StudyhallError> {
    Ok(Json(
        state.db.list_notes(&user.user_id, query.folder_id).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct NoteSearchQuery {
    pub q: String,
}

/// Title-only full-text search; bodies are never matched.
pub async fn search_notes(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<NoteSearchQuery>,
) -> Result<Json<Vec<Note>>, StudyhallError> {
    Ok(Json(state.db.search_notes(&user.user_id, &query.q).await?))
}

pub async fn update_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<i64>,
    Json(patch): Json<NotePatch>,
) -> Result<Json<Note>, StudyhallError> {
    Ok(Json(
        state.db.update_note(&user.user_id, note_id, patch).await?,
    ))
}

pub async fn delete_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<i64>,
) -> Result<StatusCode, StudyhallError> {
    state.db.delete_note(&user.user_id, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

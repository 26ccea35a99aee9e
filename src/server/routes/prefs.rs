//! Preference routes: get-or-create on read, last-write-wins on update.

use crate::db::models::UserPreferences;
use crate::db::patch::PreferencesPatch;
use crate::error::StudyhallError;
use crate::server::guards::auth::CurrentUser;
use crate::server::router::AppState;
use axum::{Json, extract::State};

pub async fn get_preferences(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserPreferences>, StudyhallError> {
    Ok(Json(
        state.db.get_or_create_preferences(&user.user_id).await?,
    ))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<UserPreferences>, StudyhallError> {
    Ok(Json(
        state.db.update_preferences(&user.user_id, patch).await?,
    ))
}

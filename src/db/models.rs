use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// Message author, as stored. Mapped to the model-boundary role
/// (`user`/`model`) only inside the prompt composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation (a `chat_history` row).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ChatHistory {
    pub id: i64,
    pub user_id: String,
    pub category: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One message of a conversation. Immutable once created; append-only,
/// ordered by `created_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_id: i64,
    pub role: Role,
    pub content: String,
    pub has_attachment: bool,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Note {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub folder_id: Option<i64>,
    pub tags: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct NoteFolder {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    /// Parent looked up by id, not ownership; single level in practice.
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Singleton per user, last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct UserPreferences {
    pub user_id: String,
    pub theme: String,
    pub language: String,
    pub reading_level: String,
    pub show_step_by_step: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_READING_LEVEL: &str = "standard";
pub const DEFAULT_SHOW_STEP_BY_STEP: bool = true;

use crate::db::models::Role;
use serde::{Deserialize, Serialize};

/// Payload for inserting one chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreate {
    pub chat_id: i64,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub has_attachment: bool,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

impl MessageCreate {
    pub fn text(chat_id: i64, role: Role, content: impl Into<String>) -> Self {
        Self {
            chat_id,
            role,
            content: content.into(),
            has_attachment: false,
            attachment_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreate {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial note update; absent fields keep their stored value.
/// `folder_id` distinguishes "leave alone" (absent) from "detach" (null).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Partial preferences update; last-write-wins, no versioning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_step_by_step: Option<bool>,
}

use crate::db::DbActorHandle;
use crate::db::models::{
    DEFAULT_LANGUAGE, DEFAULT_READING_LEVEL, DEFAULT_SHOW_STEP_BY_STEP, DEFAULT_THEME,
    UserPreferences,
};
use crate::db::patch::PreferencesPatch;
use crate::error::StudyhallError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{info, warn};

/// The serialized shape of the local durable preference blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferenceState {
    pub theme: String,
    pub language: String,
    pub reading_level: String,
    pub show_step_by_step: bool,
    pub current_chat_id: Option<i64>,
}

impl Default for PreferenceState {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            reading_level: DEFAULT_READING_LEVEL.to_string(),
            show_step_by_step: DEFAULT_SHOW_STEP_BY_STEP,
            current_chat_id: None,
        }
    }
}

/// Per-user preference context.
///
/// Mutators update memory and rewrite the local blob; nothing is pushed to
/// the remote record implicitly. [`PreferenceStore::sync_remote`] is the
/// single synchronization point, and its result is the caller's to await
/// or ignore.
pub struct PreferenceStore {
    state: RwLock<PreferenceState>,
    path: PathBuf,
    db: DbActorHandle,
    user_id: String,
}

impl PreferenceStore {
    /// Opens the store, seeding from the local blob when one exists.
    /// A missing or unreadable blob leaves defaults in place.
    pub fn open(db: DbActorHandle, user_id: impl Into<String>, path: PathBuf) -> Self {
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "preference blob unreadable, using defaults");
                    PreferenceState::default()
                }
            },
            Err(_) => PreferenceState::default(),
        };

        Self {
            state: RwLock::new(state),
            path,
            db,
            user_id: user_id.into(),
        }
    }

    /// Best-effort hydration from the remote record (get-or-create).
    /// Failure is logged and leaves the current state untouched.
    pub async fn hydrate(&self) {
        match self.db.get_or_create_preferences(&self.user_id).await {
            Ok(prefs) => {
                self.mutate(|state| {
                    state.theme = prefs.theme;
                    state.language = prefs.language;
                    state.reading_level = prefs.reading_level;
                    state.show_step_by_step = prefs.show_step_by_step;
                });
                info!(user = %self.user_id, "preferences hydrated from store");
            }
            Err(e) => {
                warn!(user = %self.user_id, error = %e, "preference hydration failed, keeping defaults");
            }
        }
    }

    pub fn snapshot(&self) -> PreferenceState {
        self.state.read().expect("preference lock poisoned").clone()
    }

    pub fn set_theme(&self, theme: impl Into<String>) {
        let theme = theme.into();
        self.mutate(|state| state.theme = theme);
    }

    pub fn toggle_theme(&self) {
        self.mutate(|state| {
            state.theme = if state.theme == "light" {
                "dark".to_string()
            } else {
                "light".to_string()
            };
        });
    }

    pub fn set_language(&self, language: impl Into<String>) {
        let language = language.into();
        self.mutate(|state| state.language = language);
    }

    pub fn set_reading_level(&self, level: impl Into<String>) {
        let level = level.into();
        self.mutate(|state| state.reading_level = level);
    }

    pub fn toggle_step_by_step(&self) {
        self.mutate(|state| state.show_step_by_step = !state.show_step_by_step);
    }

    pub fn set_current_chat(&self, chat_id: Option<i64>) {
        self.mutate(|state| state.current_chat_id = chat_id);
    }

    /// Pushes the in-memory record to the remote preference row.
    /// Last-write-wins; the caller decides whether a failure matters.
    pub async fn sync_remote(&self) -> Result<UserPreferences, StudyhallError> {
        let state = self.snapshot();
        self.db
            .update_preferences(
                &self.user_id,
                PreferencesPatch {
                    theme: Some(state.theme),
                    language: Some(state.language),
                    reading_level: Some(state.reading_level),
                    show_step_by_step: Some(state.show_step_by_step),
                },
            )
            .await
    }

    fn mutate(&self, apply: impl FnOnce(&mut PreferenceState)) {
        let snapshot = {
            let mut state = self.state.write().expect("preference lock poisoned");
            apply(&mut state);
            state.clone()
        };
        self.persist_blob(&snapshot);
    }

    fn persist_blob(&self, state: &PreferenceState) {
        let raw = match serde_json::to_string_pretty(state) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to serialize preference blob");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, raw) {
            warn!(path = %self.path.display(), error = %e, "failed to write preference blob");
        }
    }
}

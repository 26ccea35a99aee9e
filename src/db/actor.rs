use crate::db::models::{
    ChatHistory, ChatMessage, DEFAULT_LANGUAGE, DEFAULT_READING_LEVEL, DEFAULT_SHOW_STEP_BY_STEP,
    DEFAULT_THEME, Note, NoteFolder, UserPreferences,
};
use crate::db::patch::{MessageCreate, NoteCreate, NotePatch, PreferencesPatch};
use crate::db::schema::SQLITE_INIT;
use crate::error::StudyhallError;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

type Reply<T> = RpcReplyPort<Result<T, StudyhallError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    /// Record a session token for a user and return the token.
    CreateSession(String, Reply<String>),

    /// Resolve a bearer token to its user id; unknown token is an
    /// authorization error.
    ResolveSession(String, Reply<String>),

    /// Create a conversation (user, category, title).
    CreateChat(String, String, String, Reply<ChatHistory>),

    /// List a user's conversations, most recently updated first.
    ListChats(String, Reply<Vec<ChatHistory>>),

    /// Rename a conversation owned by the user.
    RenameChat(String, i64, String, Reply<ChatHistory>),

    /// Delete a conversation owned by the user (messages cascade).
    DeleteChat(String, i64, Reply<()>),

    /// List a conversation's messages in creation order.
    ListMessages(i64, Reply<Vec<ChatMessage>>),

    /// Append one message and touch the parent chat's `updated_at`.
    SaveMessage(MessageCreate, Reply<ChatMessage>),

    /// Create a folder (user, name, parent).
    CreateFolder(String, String, Option<i64>, Reply<NoteFolder>),

    /// List a user's folders by name ascending.
    ListFolders(String, Reply<Vec<NoteFolder>>),

    /// Create a note for the user.
    CreateNote(String, NoteCreate, Reply<Note>),

    /// List a user's notes, optionally restricted to one folder.
    ListNotes(String, Option<i64>, Reply<Vec<Note>>),

    /// Full-text search over note titles only.
    SearchNotes(String, String, Reply<Vec<Note>>),

    /// Patch a note owned by the user.
    UpdateNote(String, i64, NotePatch, Reply<Note>),

    /// Delete a note owned by the user.
    DeleteNote(String, i64, Reply<()>),

    /// Fetch preferences, synthesizing the default record when absent.
    GetOrCreatePreferences(String, Reply<UserPreferences>),

    /// Patch preferences (get-or-create first; last-write-wins).
    UpdatePreferences(String, PreferencesPatch, Reply<UserPreferences>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

macro_rules! rpc {
    ($self:ident, $variant:ident $(, $arg:expr)*) => {
        ractor::call!($self.actor, DbActorMessage::$variant $(, $arg)*).map_err(|e| {
            StudyhallError::RactorError(format!(
                concat!("DbActor ", stringify!($variant), " RPC failed: {}"),
                e
            ))
        })?
    };
}

impl DbActorHandle {
    pub async fn create_session(&self, user_id: &str) -> Result<String, StudyhallError> {
        rpc!(self, CreateSession, user_id.to_string())
    }

    pub async fn resolve_session(&self, token: &str) -> Result<String, StudyhallError> {
        rpc!(self, ResolveSession, token.to_string())
    }

    pub async fn create_chat(
        &self,
        user_id: &str,
        category: &str,
        title: &str,
    ) -> Result<ChatHistory, StudyhallError> {
        rpc!(
            self,
            CreateChat,
            user_id.to_string(),
            category.to_string(),
            title.to_string()
        )
    }

    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatHistory>, StudyhallError> {
        rpc!(self, ListChats, user_id.to_string())
    }

    pub async fn rename_chat(
        &self,
        user_id: &str,
        chat_id: i64,
        title: &str,
    ) -> Result<ChatHistory, StudyhallError> {
        rpc!(self, RenameChat, user_id.to_string(), chat_id, title.to_string())
    }

    pub async fn delete_chat(&self, user_id: &str, chat_id: i64) -> Result<(), StudyhallError> {
        rpc!(self, DeleteChat, user_id.to_string(), chat_id)
    }

    pub async fn list_messages(&self, chat_id: i64) -> Result<Vec<ChatMessage>, StudyhallError> {
        rpc!(self, ListMessages, chat_id)
    }

    pub async fn save_message(
        &self,
        create: MessageCreate,
    ) -> Result<ChatMessage, StudyhallError> {
        rpc!(self, SaveMessage, create)
    }

    pub async fn create_folder(
        &self,
        user_id: &str,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<NoteFolder, StudyhallError> {
        rpc!(self, CreateFolder, user_id.to_string(), name.to_string(), parent_id)
    }

    pub async fn list_folders(&self, user_id: &str) -> Result<Vec<NoteFolder>, StudyhallError> {
        rpc!(self, ListFolders, user_id.to_string())
    }

    pub async fn create_note(
        &self,
        user_id: &str,
        create: NoteCreate,
    ) -> Result<Note, StudyhallError> {
        rpc!(self, CreateNote, user_id.to_string(), create)
    }

    pub async fn list_notes(
        &self,
        user_id: &str,
        folder_id: Option<i64>,
    ) -> Result<Vec<Note>, StudyhallError> {
        rpc!(self, ListNotes, user_id.to_string(), folder_id)
    }

    pub async fn search_notes(
        &self,
        user_id: &str,
        term: &str,
    ) -> Result<Vec<Note>, StudyhallError> {
        rpc!(self, SearchNotes, user_id.to_string(), term.to_string())
    }

    pub async fn update_note(
        &self,
        user_id: &str,
        note_id: i64,
        patch: NotePatch,
    ) -> Result<Note, StudyhallError> {
        rpc!(self, UpdateNote, user_id.to_string(), note_id, patch)
    }

    pub async fn delete_note(&self, user_id: &str, note_id: i64) -> Result<(), StudyhallError> {
        rpc!(self, DeleteNote, user_id.to_string(), note_id)
    }

    pub async fn get_or_create_preferences(
        &self,
        user_id: &str,
    ) -> Result<UserPreferences, StudyhallError> {
        rpc!(self, GetOrCreatePreferences, user_id.to_string())
    }

    pub async fn update_preferences(
        &self,
        user_id: &str,
        patch: PreferencesPatch,
    ) -> Result<UserPreferences, StudyhallError> {
        rpc!(self, UpdatePreferences, user_id.to_string(), patch)
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let pool = &state.pool;
        match message {
            DbActorMessage::CreateSession(user_id, reply) => {
                let _ = reply.send(self.create_session(pool, &user_id).await);
            }
            DbActorMessage::ResolveSession(token, reply) => {
                let _ = reply.send(self.resolve_session(pool, &token).await);
            }
            DbActorMessage::CreateChat(user_id, category, title, reply) => {
                let _ = reply.send(self.create_chat(pool, &user_id, &category, &title).await);
            }
            DbActorMessage::ListChats(user_id, reply) => {
                let _ = reply.send(self.list_chats(pool, &user_id).await);
            }
            DbActorMessage::RenameChat(user_id, chat_id, title, reply) => {
                let _ = reply.send(self.rename_chat(pool, &user_id, chat_id, &title).await);
            }
            DbActorMessage::DeleteChat(user_id, chat_id, reply) => {
                let _ = reply.send(self.delete_chat(pool, &user_id, chat_id).await);
            }
            DbActorMessage::ListMessages(chat_id, reply) => {
                let _ = reply.send(self.list_messages(pool, chat_id).await);
            }
            DbActorMessage::SaveMessage(create, reply) => {
                let _ = reply.send(self.save_message(pool, create).await);
            }
            DbActorMessage::CreateFolder(user_id, name, parent_id, reply) => {
                let _ = reply.send(self.create_folder(pool, &user_id, &name, parent_id).await);
            }
            DbActorMessage::ListFolders(user_id, reply) => {
                let _ = reply.send(self.list_folders(pool, &user_id).await);
            }
            DbActorMessage::CreateNote(user_id, create, reply) => {
                let _ = reply.send(self.create_note(pool, &user_id, create).await);
            }
            DbActorMessage::ListNotes(user_id, folder_id, reply) => {
                let _ = reply.send(self.list_notes(pool, &user_id, folder_id).await);
            }
            DbActorMessage::SearchNotes(user_id, term, reply) => {
                let _ = reply.send(self.search_notes(pool, &user_id, &term).await);
            }
            DbActorMessage::UpdateNote(user_id, note_id, patch, reply) => {
                let _ = reply.send(self.update_note(pool, &user_id, note_id, patch).await);
            }
            DbActorMessage::DeleteNote(user_id, note_id, reply) => {
                let _ = reply.send(self.delete_note(pool, &user_id, note_id).await);
            }
            DbActorMessage::GetOrCreatePreferences(user_id, reply) => {
                let _ = reply.send(self.get_or_create_preferences(pool, &user_id).await);
            }
            DbActorMessage::UpdatePreferences(user_id, patch, reply) => {
                let _ = reply.send(self.update_preferences(pool, &user_id, patch).await);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn create_session(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<String, StudyhallError> {
        let token = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(token)
    }

    async fn resolve_session(
        &self,
        pool: &SqlitePool,
        token: &str,
    ) -> Result<String, StudyhallError> {
        let user_id: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(pool)
                .await?;
        user_id.ok_or(StudyhallError::Unauthorized)
    }

    async fn create_chat(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        category: &str,
        title: &str,
    ) -> Result<ChatHistory, StudyhallError> {
        let now = Utc::now();
        let chat = sqlx::query_as::<_, ChatHistory>(
            r#"
        INSERT INTO chat_history (user_id, category, title, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, user_id, category, title, created_at, updated_at
        "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(title)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(chat)
    }

    async fn list_chats(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<ChatHistory>, StudyhallError> {
        let rows = sqlx::query_as::<_, ChatHistory>(
            r#"
        SELECT id, user_id, category, title, created_at, updated_at
        FROM chat_history
        WHERE user_id = ?
        ORDER BY updated_at DESC
        "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn rename_chat(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        chat_id: i64,
        title: &str,
    ) -> Result<ChatHistory, StudyhallError> {
        let chat = sqlx::query_as::<_, ChatHistory>(
            r#"
        UPDATE chat_history
        SET title = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        RETURNING id, user_id, category, title, created_at, updated_at
        "#,
        )
        .bind(title)
        .bind(Utc::now())
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        chat.ok_or(StudyhallError::NotFound("chat"))
    }

    async fn delete_chat(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        chat_id: i64,
    ) -> Result<(), StudyhallError> {
        let result = sqlx::query("DELETE FROM chat_history WHERE id = ? AND user_id = ?")
            .bind(chat_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StudyhallError::NotFound("chat"));
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        pool: &SqlitePool,
        chat_id: i64,
    ) -> Result<Vec<ChatMessage>, StudyhallError> {
        let rows = sqlx::query_as::<_, ChatMessage>(
            r#"
        SELECT id, chat_id, role, content, has_attachment, attachment_url, created_at
        FROM chat_messages
        WHERE chat_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
        )
        .bind(chat_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn save_message(
        &self,
        pool: &SqlitePool,
        create: MessageCreate,
    ) -> Result<ChatMessage, StudyhallError> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
        INSERT INTO chat_messages (chat_id, role, content, has_attachment, attachment_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, chat_id, role, content, has_attachment, attachment_url, created_at
        "#,
        )
        .bind(create.chat_id)
        .bind(create.role)
        .bind(&create.content)
        .bind(create.has_attachment)
        .bind(&create.attachment_url)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // Conversations are "updated" implicitly by message inserts.
        sqlx::query("UPDATE chat_history SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(create.chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    async fn create_folder(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<NoteFolder, StudyhallError> {
        let now = Utc::now();
        let folder = sqlx::query_as::<_, NoteFolder>(
            r#"
        INSERT INTO note_folders (user_id, name, parent_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, user_id, name, parent_id, created_at, updated_at
        "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(parent_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(folder)
    }

    async fn list_folders(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<NoteFolder>, StudyhallError> {
        let rows = sqlx::query_as::<_, NoteFolder>(
            r#"
        SELECT id, user_id, name, parent_id, created_at, updated_at
        FROM note_folders
        WHERE user_id = ?
        ORDER BY name ASC
        "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn create_note(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        create: NoteCreate,
    ) -> Result<Note, StudyhallError> {
        let now = Utc::now();
        let note = sqlx::query_as::<_, Note>(
            r#"
        INSERT INTO notes (user_id, title, content, folder_id, tags, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, title, content, folder_id, tags, created_at, updated_at
        "#,
        )
        .bind(user_id)
        .bind(&create.title)
        .bind(&create.content)
        .bind(create.folder_id)
        .bind(serde_json::to_string(&create.tags)?)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(note)
    }

    async fn list_notes(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        folder_id: Option<i64>,
    ) -> Result<Vec<Note>, StudyhallError> {
        let rows = match folder_id {
            Some(folder) => {
                sqlx::query_as::<_, Note>(
                    r#"
                SELECT id, user_id, title, content, folder_id, tags, created_at, updated_at
                FROM notes
                WHERE user_id = ? AND folder_id = ?
                ORDER BY updated_at DESC
                "#,
                )
                .bind(user_id)
                .bind(folder)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Note>(
                    r#"
                SELECT id, user_id, title, content, folder_id, tags, created_at, updated_at
                FROM notes
                WHERE user_id = ?
                ORDER BY updated_at DESC
                "#,
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn search_notes(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        term: &str,
    ) -> Result<Vec<Note>, StudyhallError> {
        // Quote the term so user input is matched as a phrase rather than
        // interpreted as FTS5 query syntax.
        let phrase = format!("\"{}\"", term.replace('"', "\"\""));
        let rows = sqlx::query_as::<_, Note>(
            r#"
        SELECT n.id, n.user_id, n.title, n.content, n.folder_id, n.tags, n.created_at, n.updated_at
        FROM notes n
        JOIN notes_title_fts f ON f.rowid = n.id
        WHERE notes_title_fts MATCH ? AND n.user_id = ?
        ORDER BY n.updated_at DESC
        "#,
        )
        .bind(phrase)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn update_note(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        note_id: i64,
        patch: NotePatch,
    ) -> Result<Note, StudyhallError> {
        let current = sqlx::query_as::<_, Note>(
            r#"
        SELECT id, user_id, title, content, folder_id, tags, created_at, updated_at
        FROM notes
        WHERE id = ? AND user_id = ?
        "#,
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(StudyhallError::NotFound("note"))?;

        let title = patch.title.unwrap_or(current.title);
        let content = patch.content.unwrap_or(current.content);
        let folder_id = patch.folder_id.unwrap_or(current.folder_id);
        let tags = patch.tags.unwrap_or(current.tags.0);

        let note = sqlx::query_as::<_, Note>(
            r#"
        UPDATE notes
        SET title = ?, content = ?, folder_id = ?, tags = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        RETURNING id, user_id, title, content, folder_id, tags, created_at, updated_at
        "#,
        )
        .bind(&title)
        .bind(&content)
        .bind(folder_id)
        .bind(serde_json::to_string(&tags)?)
        .bind(Utc::now())
        .bind(note_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(note)
    }

    async fn delete_note(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        note_id: i64,
    ) -> Result<(), StudyhallError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
            .bind(note_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StudyhallError::NotFound("note"));
        }
        Ok(())
    }

    async fn get_or_create_preferences(
        &self,
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<UserPreferences, StudyhallError> {
        let existing = sqlx::query_as::<_, UserPreferences>(
            r#"
        SELECT user_id, theme, language, reading_level, show_step_by_step, created_at, updated_at
        FROM user_preferences
        WHERE user_id = ?
        "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if let Some(prefs) = existing {
            return Ok(prefs);
        }

        let now = Utc::now();
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
        INSERT INTO user_preferences
            (user_id, theme, language, reading_level, show_step_by_step, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET updated_at = updated_at
        RETURNING user_id, theme, language, reading_level, show_step_by_step, created_at, updated_at
        "#,
        )
        .bind(user_id)
        .bind(DEFAULT_THEME)
        .bind(DEFAULT_LANGUAGE)
        .bind(DEFAULT_READING_LEVEL)
        .bind(DEFAULT_SHOW_STEP_BY_STEP)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(prefs)
    }

    async fn update_preferences(
        &self,
        pool: &SqlitePool,
        user_id: &str,
        patch: PreferencesPatch,
    ) -> Result<UserPreferences, StudyhallError> {
        let current = self.get_or_create_preferences(pool, user_id).await?;

        let theme = patch.theme.unwrap_or(current.theme);
        let language = patch.language.unwrap_or(current.language);
        let reading_level = patch.reading_level.unwrap_or(current.reading_level);
        let show_step_by_step = patch.show_step_by_step.unwrap_or(current.show_step_by_step);

        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
        UPDATE user_preferences
        SET theme = ?, language = ?, reading_level = ?, show_step_by_step = ?, updated_at = ?
        WHERE user_id = ?
        RETURNING user_id, theme, language, reading_level, show_step_by_step, created_at, updated_at
        "#,
        )
        .bind(&theme)
        .bind(&language)
        .bind(&reading_level)
        .bind(show_step_by_step)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(prefs)
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> DbActorHandle {
    // Unnamed: test binaries spawn several actors in one process, and
    // ractor names are process-global.
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .expect("failed to spawn DbActor");

    DbActorHandle { actor }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StudyhallError> {
    for stmt in SQLITE_INIT {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}

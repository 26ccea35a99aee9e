//! SQL DDL for initializing the database schema.
//! SQLite-first design; applied idempotently at actor startup.
//!
//! Statements are kept as individual strings (not one `;`-joined blob)
//! because the FTS trigger bodies contain semicolons of their own.

pub const SQLITE_INIT: &[&str] = &[
    // -----------------------------------------------------------------------
    // Sessions: bearer token -> user id. Issuance is the auth provider's
    // job; the gateway only resolves tokens.
    // -----------------------------------------------------------------------
    r#"
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------
    r#"
CREATE TABLE IF NOT EXISTS chat_history (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339, touched by every message insert
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_chat_history_user ON chat_history(user_id, updated_at)",
    r#"
CREATE TABLE IF NOT EXISTS chat_messages (
    id INTEGER PRIMARY KEY NOT NULL,
    chat_id INTEGER NOT NULL REFERENCES chat_history(id) ON DELETE CASCADE,
    role TEXT NOT NULL, -- 'user' | 'assistant'
    content TEXT NOT NULL,
    has_attachment INTEGER NOT NULL DEFAULT 0,
    attachment_url TEXT NULL,
    created_at TEXT NOT NULL -- RFC3339
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_chat ON chat_messages(chat_id, created_at)",
    // -----------------------------------------------------------------------
    // Folders and notes
    // -----------------------------------------------------------------------
    r#"
CREATE TABLE IF NOT EXISTS note_folders (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    parent_id INTEGER NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_note_folders_user ON note_folders(user_id, name)",
    r#"
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    folder_id INTEGER NULL REFERENCES note_folders(id) ON DELETE SET NULL,
    tags TEXT NOT NULL DEFAULT '[]', -- JSON array of strings
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id, updated_at)",
    // Title search goes through FTS5; bodies are deliberately not indexed.
    r#"
CREATE VIRTUAL TABLE IF NOT EXISTS notes_title_fts
USING fts5(title, content='notes', content_rowid='id')
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS notes_title_fts_ai AFTER INSERT ON notes BEGIN
    INSERT INTO notes_title_fts(rowid, title) VALUES (new.id, new.title);
END
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS notes_title_fts_ad AFTER DELETE ON notes BEGIN
    INSERT INTO notes_title_fts(notes_title_fts, rowid, title)
    VALUES ('delete', old.id, old.title);
END
"#,
    r#"
CREATE TRIGGER IF NOT EXISTS notes_title_fts_au AFTER UPDATE OF title ON notes BEGIN
    INSERT INTO notes_title_fts(notes_title_fts, rowid, title)
    VALUES ('delete', old.id, old.title);
    INSERT INTO notes_title_fts(rowid, title) VALUES (new.id, new.title);
END
"#,
    // -----------------------------------------------------------------------
    // Preferences: one row per user
    // -----------------------------------------------------------------------
    r#"
CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY NOT NULL,
    theme TEXT NOT NULL DEFAULT 'light',
    language TEXT NOT NULL DEFAULT 'en',
    reading_level TEXT NOT NULL DEFAULT 'standard',
    show_step_by_step INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339
)
"#,
];

//! Database module: the persistence gateway for chats, messages, notes,
//! folders, sessions, and preferences.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `patch.rs`: create/partial-update payloads
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: all DB access serialized through one ractor actor

pub mod actor;
pub mod models;
pub mod patch;
pub mod schema;

pub use models::{ChatHistory, ChatMessage, Note, NoteFolder, Role, UserPreferences};
pub use patch::{MessageCreate, NoteCreate, NotePatch, PreferencesPatch};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, spawn};

pub mod chat;
pub mod chats;
pub mod notes;
pub mod prefs;

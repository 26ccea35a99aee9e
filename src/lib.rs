pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod orchestrator;
pub mod prefs;
pub mod prompt;
pub mod server;

pub use error::StudyhallError;

mod basic;
mod gemini;

pub use basic::BasicConfig;
pub use gemini::GeminiConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Upstream model settings (see `gemini` table in config.toml).
    #[serde(default)]
    pub gemini: GeminiConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file,
    /// and `STUDYHALL_*` environment variables (e.g.
    /// `STUDYHALL_GEMINI.API_KEY`).
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed("STUDYHALL_").split("."))
    }

    /// Loads configuration and validates required fields.
    pub fn from_toml() -> Self {
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration: {err}")
        });
        if cfg.gemini.api_key.trim().is_empty() {
            panic!("gemini.api_key must be set and non-empty");
        }
        cfg
    }
}

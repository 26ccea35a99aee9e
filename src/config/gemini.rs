use serde::{Deserialize, Serialize};
use url::Url;

/// Upstream Gemini endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`. Required for dispatch; an empty
    /// key is rejected at startup by `Config::from_toml()`.
    /// TOML: `gemini.api_key`.
    #[serde(default)]
    pub api_key: String,

    /// Model identifier, e.g. `gemini-1.5-flash`.
    /// TOML: `gemini.model`. Default: `gemini-1.5-flash`.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL. Overridable for tests against a local stub.
    /// TOML: `gemini.endpoint`. Default: the public v1beta endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,

    /// Optional forward proxy for upstream calls.
    /// TOML: `gemini.proxy`.
    #[serde(default)]
    pub proxy: Option<Url>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
            proxy: None,
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_endpoint() -> Url {
    Url::parse("https://generativelanguage.googleapis.com/v1beta/")
        .expect("default gemini endpoint must parse")
}

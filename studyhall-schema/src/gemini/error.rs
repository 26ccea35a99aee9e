use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structured error envelope returned by the Gemini API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorBody {
    pub error: GeminiErrorObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorObject {
    pub code: u16,
    pub message: String,

    /// Canonical status string, e.g. `RESOURCE_EXHAUSTED`, `UNAUTHENTICATED`.
    #[serde(default)]
    pub status: String,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

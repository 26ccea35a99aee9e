use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use studyhall_schema::GeminiErrorBody;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StudyhallError {
    /// Malformed inbound request.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No active session, or the bearer token is unknown.
    #[error("Not authenticated")]
    Unauthorized,

    /// Row absent, or owned by a different user.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Gemini API error: {}", .0.error.message)]
    GeminiServerError(GeminiErrorBody),

    /// Upstream returned 200 with no usable candidate text.
    #[error("Model returned an empty response")]
    EmptyModelResponse,

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for StudyhallError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            StudyhallError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_REQUEST".to_string(),
                    message,
                    details: None,
                },
            ),

            StudyhallError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorObject {
                    code: "UNAUTHORIZED".to_string(),
                    message: "A valid session is required.".to_string(),
                    details: None,
                },
            ),

            StudyhallError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{what} not found."),
                    details: None,
                },
            ),

            StudyhallError::UpstreamStatus(_)
            | StudyhallError::GeminiServerError(_)
            | StudyhallError::EmptyModelResponse
            | StudyhallError::ReqwestError(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorObject {
                    code: "UPSTREAM_ERROR".to_string(),
                    message: "Upstream model service error.".to_string(),
                    details: None,
                },
            ),

            StudyhallError::DatabaseError(_)
            | StudyhallError::RactorError(_)
            | StudyhallError::JsonError(_)
            | StudyhallError::IoError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                },
            ),
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

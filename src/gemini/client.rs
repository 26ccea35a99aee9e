use crate::config::GeminiConfig;
use crate::error::StudyhallError;
use async_trait::async_trait;
use std::time::Duration;
use studyhall_schema::{Content, GeminiErrorBody, GenerateContentRequest, GenerateContentResponse, Part};
use tracing::{debug, warn};

/// Prompt used when an image turn carries no text.
pub const DEFAULT_IMAGE_PROMPT: &str = "What's in this image?";

/// Attached images are always sent with this MIME type.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// The two call shapes against the generative-model endpoint.
///
/// A trait seam so the orchestrator can be exercised without the network.
/// Failures are permanent for the current turn: no retry, no backoff.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Text-only turn carrying the full mapped history.
    async fn generate_text(&self, contents: Vec<Content>) -> Result<String, StudyhallError>;

    /// Image-augmented turn. The inline bytes are attached to the final
    /// user message; prior history is carried the same as for text turns.
    async fn generate_with_image(
        &self,
        contents: Vec<Content>,
        image_base64: &str,
    ) -> Result<String, StudyhallError>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    cfg: GeminiConfig,
}

impl GeminiClient {
    pub fn new(cfg: GeminiConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120));

        if let Some(proxy_url) = cfg.proxy.as_ref() {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .expect("invalid proxy url for reqwest client");
            builder = builder.proxy(proxy);
        }

        Self {
            client: builder.build().expect("failed to build reqwest client"),
            cfg,
        }
    }

    async fn generate(&self, contents: Vec<Content>) -> Result<String, StudyhallError> {
        let url = self
            .cfg
            .endpoint
            .join(&format!("models/{}:generateContent", self.cfg.model))
            .map_err(|e| StudyhallError::Validation(format!("bad endpoint url: {e}")))?;

        let body = GenerateContentRequest::new(contents);
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.cfg.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let bytes = resp.bytes().await?;
            if let Ok(gemini_err) = serde_json::from_slice::<GeminiErrorBody>(&bytes) {
                warn!(
                    code = gemini_err.error.code,
                    status = %gemini_err.error.status,
                    "Upstream returned structured error"
                );
                return Err(StudyhallError::GeminiServerError(gemini_err));
            }
            warn!(
                "Upstream non-JSON error. Status: {}, Body: {:.100}",
                status,
                String::from_utf8_lossy(&bytes)
            );
            return Err(StudyhallError::UpstreamStatus(status));
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        debug!(
            candidates = parsed.candidates.len(),
            model_version = parsed.model_version.as_deref().unwrap_or("-"),
            "generateContent ok"
        );
        parsed.first_text().ok_or(StudyhallError::EmptyModelResponse)
    }
}

#[async_trait]
impl Dispatch for GeminiClient {
    async fn generate_text(&self, contents: Vec<Content>) -> Result<String, StudyhallError> {
        self.generate(contents).await
    }

    async fn generate_with_image(
        &self,
        contents: Vec<Content>,
        image_base64: &str,
    ) -> Result<String, StudyhallError> {
        self.generate(attach_inline_image(contents, image_base64))
            .await
    }
}

/// Rebuilds the final message with its text plus the inline image bytes.
/// The image belongs to this request only; it is never part of history.
fn attach_inline_image(mut contents: Vec<Content>, image_base64: &str) -> Vec<Content> {
    let (role, text) = match contents.pop() {
        Some(last) => {
            let text = last.joined_text();
            (last.role, text)
        }
        None => ("user".to_string(), String::new()),
    };

    let text = if text.is_empty() {
        DEFAULT_IMAGE_PROMPT.to_string()
    } else {
        text
    };

    contents.push(Content {
        role,
        parts: vec![
            Part::text(text),
            Part::inline_image(IMAGE_MIME_TYPE, image_base64),
        ],
    });
    contents
}

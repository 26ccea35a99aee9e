//! Chat orchestration: drives one user turn end-to-end.
//!
//! Sequence per turn: persist the user message, compose the prompt from the
//! full history, dispatch to the model, persist the assistant message (real
//! or fallback). Two persistence writes, one network call, strictly in that
//! order; nothing is retried.

use crate::db::models::{ChatMessage, Role};
use crate::db::patch::MessageCreate;
use crate::db::DbActorHandle;
use crate::error::StudyhallError;
use crate::gemini::Dispatch;
use crate::prompt::{self, PromptMessage};
use chrono::Utc;
use tracing::{error, warn};

/// Fixed assistant reply persisted when dispatch fails. A failed turn is
/// permanent; the user retries by sending again.
pub const FALLBACK_REPLY: &str =
    "Sorry, there was an error processing your request. Please try again.";

#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub chat_id: i64,
    pub content: String,
    pub image_base64: Option<String>,
    pub language: String,
    pub show_step_by_step: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Blank input with no image attached; the turn is dropped without
    /// surfacing an error.
    Ignored,
    Replied {
        reply: String,
        /// True when the reply is [`FALLBACK_REPLY`] rather than model output.
        fallback: bool,
    },
}

pub async fn submit_turn(
    db: &DbActorHandle,
    dispatcher: &dyn Dispatch,
    req: TurnRequest,
) -> TurnOutcome {
    if req.content.trim().is_empty() && req.image_base64.is_none() {
        return TurnOutcome::Ignored;
    }

    let user_create = MessageCreate {
        chat_id: req.chat_id,
        role: Role::User,
        content: req.content.clone(),
        has_attachment: req.image_base64.is_some(),
        attachment_url: None,
    };

    // The turn continues optimistically on a failed write; the in-memory
    // history below already reflects the message.
    let saved_user = match db.save_message(user_create).await {
        Ok(msg) => Some(msg),
        Err(e) => {
            error!(chat_id = req.chat_id, error = %e, "failed to persist user message");
            None
        }
    };

    let history = load_history(db, &req, saved_user).await;
    let reply = dispatch(dispatcher, &history, &req).await;

    let (reply, fallback) = match reply {
        Ok(text) => (text, false),
        Err(e) => {
            error!(chat_id = req.chat_id, error = %e, "model dispatch failed, using fallback");
            (FALLBACK_REPLY.to_string(), true)
        }
    };

    if let Err(e) = db
        .save_message(MessageCreate::text(req.chat_id, Role::Assistant, reply.clone()))
        .await
    {
        error!(chat_id = req.chat_id, error = %e, "failed to persist assistant message");
    }

    TurnOutcome::Replied { reply, fallback }
}

/// Full turn history including the just-submitted user message, whether or
/// not its write succeeded.
async fn load_history(
    db: &DbActorHandle,
    req: &TurnRequest,
    saved_user: Option<ChatMessage>,
) -> Vec<ChatMessage> {
    let mut history = match db.list_messages(req.chat_id).await {
        Ok(messages) => messages,
        Err(e) => {
            warn!(chat_id = req.chat_id, error = %e, "failed to load history, composing from current turn only");
            Vec::new()
        }
    };

    match saved_user {
        Some(saved) if history.iter().any(|m| m.id == saved.id) => {}
        Some(saved) => history.push(saved),
        None => history.push(ChatMessage {
            id: 0,
            chat_id: req.chat_id,
            role: Role::User,
            content: req.content.clone(),
            has_attachment: req.image_base64.is_some(),
            attachment_url: None,
            created_at: Utc::now(),
        }),
    }
    history
}

async fn dispatch(
    dispatcher: &dyn Dispatch,
    history: &[ChatMessage],
    req: &TurnRequest,
) -> Result<String, StudyhallError> {
    let messages: Vec<PromptMessage> = history.iter().map(PromptMessage::from).collect();
    let contents = prompt::compose(&messages, &req.language, req.show_step_by_step)?;

    match req.image_base64.as_deref() {
        Some(image) => dispatcher.generate_with_image(contents, image).await,
        None => dispatcher.generate_text(contents).await,
    }
}

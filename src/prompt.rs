//! Prompt composition: turns raw conversation history plus the user's
//! locale and verbosity options into the exact contents sent to the model.

use crate::db::models::{ChatMessage, Role};
use crate::error::StudyhallError;
use studyhall_schema::Content;

pub const STEP_BY_STEP_INSTRUCTION: &str =
    "\n\nPlease provide a detailed step-by-step explanation in your answer.";
pub const CONCISE_INSTRUCTION: &str =
    "\n\nPlease provide a concise answer without detailed steps.";

/// One history entry at the composer boundary, already role-mapped for the
/// model (`user`/`model`).
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    User,
    Model,
}

impl PromptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptRole::User => "user",
            PromptRole::Model => "model",
        }
    }

    /// Accepts both the model-boundary spelling and the stored one.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(PromptRole::User),
            "model" | "assistant" => Some(PromptRole::Model),
            _ => None,
        }
    }
}

impl From<&ChatMessage> for PromptMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            Role::User => PromptRole::User,
            Role::Assistant => PromptRole::Model,
        };
        Self {
            role,
            content: msg.content.clone(),
        }
    }
}

/// Resolves a locale code to the display name used in prompt directives.
/// Unmapped codes pass through verbatim.
pub fn language_display_name(code: &str) -> &str {
    match code {
        "bn" => "Bengali (Bangla)",
        "hi" => "Hindi",
        "ar" => "Arabic",
        other => other,
    }
}

/// Builds the outgoing contents from history and preferences.
///
/// Exactly one of the two verbosity instructions is appended to the final
/// message. For non-English locales the final message is additionally
/// prefixed with a respond-only-in directive and the whole conversation
/// gains a synthetic leading turn enforcing the language.
pub fn compose(
    messages: &[PromptMessage],
    language: &str,
    show_step_by_step: bool,
) -> Result<Vec<Content>, StudyhallError> {
    let (last, history) = messages
        .split_last()
        .ok_or_else(|| StudyhallError::Validation("messages must not be empty".to_string()))?;

    let mut contents: Vec<Content> = Vec::with_capacity(messages.len() + 1);

    if language != "en" {
        let name = language_display_name(language);
        contents.push(Content::user_text(format!(
            "This conversation must be in {name} language. \
             Do not translate any response back to English."
        )));
    }

    for msg in history {
        contents.push(Content {
            role: msg.role.as_str().to_string(),
            parts: vec![studyhall_schema::Part::text(msg.content.clone())],
        });
    }

    let mut prompt = last.content.clone();
    if show_step_by_step {
        prompt.push_str(STEP_BY_STEP_INSTRUCTION);
    } else {
        prompt.push_str(CONCISE_INSTRUCTION);
    }
    if language != "en" {
        let name = language_display_name(language);
        prompt = format!("IMPORTANT: Respond only in {name} language.\n\n{prompt}");
    }

    contents.push(Content {
        role: last.role.as_str().to_string(),
        parts: vec![studyhall_schema::Part::text(prompt)],
    });

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> PromptMessage {
        PromptMessage {
            role: PromptRole::User,
            content: content.to_string(),
        }
    }

    fn model(content: &str) -> PromptMessage {
        PromptMessage {
            role: PromptRole::Model,
            content: content.to_string(),
        }
    }

    #[test]
    fn mapped_locales_use_display_names() {
        assert_eq!(language_display_name("bn"), "Bengali (Bangla)");
        assert_eq!(language_display_name("hi"), "Hindi");
        assert_eq!(language_display_name("ar"), "Arabic");
        assert_eq!(language_display_name("fr"), "fr");
    }

    #[test]
    fn exactly_one_verbosity_instruction() {
        for show in [true, false] {
            let contents = compose(&[user("Solve x+2=4")], "en", show).unwrap();
            let text = contents.last().unwrap().joined_text();
            let detailed = text.contains(STEP_BY_STEP_INSTRUCTION.trim_start());
            let concise = text.contains(CONCISE_INSTRUCTION.trim_start());
            assert_ne!(detailed, concise);
            assert_eq!(detailed, show);
        }
    }

    #[test]
    fn bengali_concise_turn_matches_contract() {
        let contents = compose(&[user("Solve x+2=4")], "bn", false).unwrap();
        assert_eq!(contents.len(), 2);

        assert_eq!(contents[0].role, "user");
        assert_eq!(
            contents[0].joined_text(),
            "This conversation must be in Bengali (Bangla) language. \
             Do not translate any response back to English."
        );

        assert_eq!(
            contents[1].joined_text(),
            "IMPORTANT: Respond only in Bengali (Bangla) language.\n\nSolve x+2=4\
             \n\nPlease provide a concise answer without detailed steps."
        );
    }

    #[test]
    fn english_turn_has_no_synthetic_lead() {
        let contents = compose(&[user("hi"), model("hello"), user("thanks")], "en", true).unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].joined_text(), "hi");
        assert_eq!(contents[1].role, "model");
        assert!(contents[2].joined_text().starts_with("thanks"));
    }

    #[test]
    fn prior_history_is_untouched() {
        let contents = compose(&[user("q1"), model("a1"), user("q2")], "hi", true).unwrap();
        // synthetic + q1 + a1 + augmented q2
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[1].joined_text(), "q1");
        assert_eq!(contents[2].joined_text(), "a1");
    }

    #[test]
    fn empty_history_is_a_validation_error() {
        let err = compose(&[], "en", true).unwrap_err();
        assert!(matches!(err, StudyhallError::Validation(_)));
    }
}

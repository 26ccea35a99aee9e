//! Model dispatcher: the sole point of contact with the Gemini endpoint.

mod client;

pub use client::{DEFAULT_IMAGE_PROMPT, Dispatch, GeminiClient, IMAGE_MIME_TYPE};

//! Wire types for the Gemini v1beta `generateContent` API.
//!
//! Only the subset the dispatcher actually sends and reads is modeled;
//! unrecognized upstream fields are preserved in `extra` maps so payloads
//! round-trip losslessly.

mod error;
mod request;
mod response;

pub use error::{GeminiErrorBody, GeminiErrorObject};
pub use request::{Content, GenerateContentRequest, InlineData, Part};
pub use response::{Candidate, GenerateContentResponse};

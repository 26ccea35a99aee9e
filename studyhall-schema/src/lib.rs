pub mod gemini;

pub use gemini::{
    Candidate, Content, GeminiErrorBody, GenerateContentRequest, GenerateContentResponse,
    InlineData, Part,
};

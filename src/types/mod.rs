//! Request and response types for the Gemini `generateContent` API.

pub mod content;
pub mod generation;

pub use content::{Blob, Content, Part, Role};
pub use generation::{
    BlockReason, Candidate, FinishReason, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, PromptFeedback, SafetyRating, UsageMetadata,
};

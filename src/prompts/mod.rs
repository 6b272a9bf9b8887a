//! Prompt construction for the two advice endpoints.

pub mod diagnosis;
pub mod recommendation;
pub mod store;

pub use diagnosis::build_diagnosis_prompt;
pub use recommendation::{build_recommendation_prompt, recommendation_schema};
pub use store::{PromptData, PromptStore};

//! Error types for the Gemini integration and their classification.

mod categories;
mod classifier;
mod mapper;
mod types;

pub use categories::*;
pub use classifier::{classify, ErrorType, GeminiErrorDetails};
pub use mapper::*;
pub use types::*;

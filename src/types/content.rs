//! Content-related types for the Gemini API.

use serde::{Deserialize, Serialize};

/// A part of a content message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content; `thought` marks reasoning summaries from thinking models.
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Inline binary data.
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    /// Any part kind this crate does not interpret.
    Other(serde_json::Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: None,
        }
    }

    /// The answer text of this part; thought summaries are excluded.
    pub fn as_answer_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, thought } if *thought != Some(true) => Some(text),
            _ => None,
        }
    }
}

/// Binary data blob with MIME type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64-encoded binary data.
    pub data: String,
}

/// A content message with a role and parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A single-part user message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part::text(text)],
        }
    }
}

/// The role of a message author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

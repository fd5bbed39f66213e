//! Text extraction from vendor chunk shapes and prompt inputs.

use serde::{Deserialize, Serialize};

/// Extracts the text carried by one streamed chunk, if any.
pub trait ChunkText {
    fn chunk_text(&self) -> Option<&str>;
}

impl ChunkText for String {
    fn chunk_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl ChunkText for &'static str {
    fn chunk_text(&self) -> Option<&str> {
        Some(*self)
    }
}

/// Raw audio carries no text.
impl ChunkText for Vec<u8> {
    fn chunk_text(&self) -> Option<&str> {
        None
    }
}

/// One chat turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// The common completion chunk shape across chat vendors. Any subset of
/// the fields may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionChunk {
    pub content: Option<String>,
    pub delta: Option<String>,
    pub text: Option<String>,
    pub message: Option<ChatMessage>,
}

impl CompletionChunk {
    /// A chunk carrying only `content`.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A chunk carrying only `delta`.
    pub fn delta(delta: impl Into<String>) -> Self {
        Self {
            delta: Some(delta.into()),
            ..Self::default()
        }
    }
}

/// First non-empty of `content`, `delta`, `text`, `message.content`.
impl ChunkText for CompletionChunk {
    fn chunk_text(&self) -> Option<&str> {
        [
            self.content.as_deref(),
            self.delta.as_deref(),
            self.text.as_deref(),
            self.message.as_ref().map(|m| m.content.as_str()),
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
    }
}

/// Input to a language model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl Prompt {
    /// All text in the prompt. Message contents are joined with a space;
    /// roles are ignored.
    pub fn text_content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Messages(messages) => messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ChatMessage>> for Prompt {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self::Messages(messages)
    }
}

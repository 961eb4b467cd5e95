//! Provider-neutral request and response types for model calls.

use crate::{ConversationMessage, Role};
use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One message of a model request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: Role,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// A system instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationMessage> for ChatMessage {
    fn from(message: &ConversationMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// A request to "send these messages, get text back".
///
/// # Examples
///
/// ```
/// use taleweaver_core::{ChatMessage, GenerateRequest};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![ChatMessage::user("Begin the tale")])
///     .temperature(0.7)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages().len(), 1);
/// assert_eq!(*request.temperature(), Some(0.7));
/// assert_eq!(*request.max_tokens(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct GenerateRequest {
    /// Messages in the order the model should read them
    messages: Vec<ChatMessage>,
    /// Model override
    #[builder(default, setter(into, strip_option))]
    model: Option<String>,
    /// Sampling temperature override
    #[builder(default, setter(into, strip_option))]
    temperature: Option<f32>,
    /// Completion length override
    #[builder(default, setter(into, strip_option))]
    max_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Start building a request.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }

    /// Total characters across all messages.
    pub fn prompt_chars(&self) -> usize {
        self.messages.iter().map(|m| m.content.len()).sum()
    }
}

/// Text returned by a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Completion text exactly as the provider returned it
    pub text: String,
}

impl GenerateResponse {
    /// Wrap completion text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

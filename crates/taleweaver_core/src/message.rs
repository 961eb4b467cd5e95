//! Conversation history entries.

use crate::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the conversation the model has seen.
///
/// # Examples
///
/// ```
/// use taleweaver_core::{ConversationMessage, Role};
///
/// let message = ConversationMessage::new(Role::User, "Open the door").with_chapter(3);
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.chapter, Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// Author of the entry
    pub role: Role,
    /// Text content
    pub content: String,
    /// When the entry was appended
    pub timestamp: DateTime<Utc>,
    /// Chapter the entry belongs to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
}

impl ConversationMessage {
    /// Create an entry stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            chapter: None,
        }
    }

    /// Tag the entry with a chapter number.
    pub fn with_chapter(mut self, chapter: u32) -> Self {
        self.chapter = Some(chapter);
        self
    }
}

//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Who authored a conversation entry.
///
/// # Examples
///
/// ```
/// use taleweaver_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "System");
/// assert_eq!(Role::System.as_str(), "system");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standing instructions for the model
    System,
    /// Messages written on behalf of the reader
    User,
    /// Model completions
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

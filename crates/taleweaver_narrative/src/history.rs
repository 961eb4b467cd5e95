//! Bounded conversation log.

use taleweaver_core::{ChatMessage, ConversationMessage, Role};

/// Default number of retained messages.
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// Ordered log of prior turns with a hard cap.
///
/// When the cap is exceeded every system message is kept and only the most recent
/// non-system messages that still fit survive, in their original order. If the system
/// messages alone exceed the cap, only the newest `cap` of them are kept.
///
/// # Examples
///
/// ```
/// use taleweaver_core::Role;
/// use taleweaver_narrative::ConversationHistory;
///
/// let mut history = ConversationHistory::new(3);
/// history.append(Role::System, "You narrate.");
/// for turn in ["one", "two", "three"] {
///     history.append(Role::User, turn);
/// }
///
/// assert_eq!(history.len(), 3);
/// assert_eq!(history.messages()[0].role, Role::System);
/// assert_eq!(history.messages()[1].content, "two");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationHistory {
    messages: Vec<ConversationMessage>,
    cap: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl ConversationHistory {
    /// Empty history holding at most `cap` messages (at least one).
    pub fn new(cap: usize) -> Self {
        Self {
            messages: Vec::new(),
            cap: cap.max(1),
        }
    }

    /// Restore a persisted history, re-applying the cap.
    pub fn from_messages(messages: impl IntoIterator<Item = ConversationMessage>, cap: usize) -> Self {
        let mut history = Self::new(cap);
        history.messages = messages.into_iter().collect();
        history.enforce_cap();
        history
    }

    /// Append a message at the tail.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.push(ConversationMessage::new(role, content));
    }

    /// Append a message tagged with the chapter it belongs to.
    pub fn append_for_chapter(&mut self, role: Role, content: impl Into<String>, chapter: u32) {
        self.push(ConversationMessage::new(role, content).with_chapter(chapter));
    }

    /// Append an already-built message.
    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
        self.enforce_cap();
    }

    /// Drop every message.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Messages in order.
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of retained messages.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Project the log into model request messages.
    pub fn to_request_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(ChatMessage::from).collect()
    }

    /// Consume the history, returning its messages.
    pub fn into_messages(self) -> Vec<ConversationMessage> {
        self.messages
    }

    fn enforce_cap(&mut self) {
        if self.messages.len() <= self.cap {
            return;
        }

        let system_count = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .count();

        if system_count >= self.cap {
            let mut skip = system_count - self.cap;
            self.messages.retain(|m| {
                if m.role != Role::System {
                    return false;
                }
                if skip > 0 {
                    skip -= 1;
                    return false;
                }
                true
            });
        } else {
            let non_system = self.messages.len() - system_count;
            let mut skip = non_system - (self.cap - system_count);
            self.messages.retain(|m| {
                if m.role == Role::System {
                    return true;
                }
                if skip > 0 {
                    skip -= 1;
                    return false;
                }
                true
            });
        }

        tracing::debug!(
            retained = self.messages.len(),
            system = system_count.min(self.cap),
            "Trimmed conversation history"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_keeps_system_and_recent_turns() {
        let mut history = ConversationHistory::new(4);
        history.append(Role::System, "rules");
        for i in 0..6 {
            history.append(Role::User, format!("u{i}"));
        }
        history.append(Role::System, "late rules");

        let contents: Vec<_> = history.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["rules", "u4", "u5", "late rules"]);
    }

    #[test]
    fn test_never_exceeds_cap() {
        let mut history = ConversationHistory::new(5);
        for i in 0..50 {
            let role = if i % 7 == 0 { Role::System } else { Role::Assistant };
            history.append(role, format!("m{i}"));
            assert!(history.len() <= 5);
        }
    }

    #[test]
    fn test_system_overflow_keeps_newest_systems() {
        let mut history = ConversationHistory::new(2);
        history.append(Role::System, "s1");
        history.append(Role::User, "u1");
        history.append(Role::System, "s2");
        history.append(Role::System, "s3");

        let contents: Vec<_> = history.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["s2", "s3"]);
    }

    #[test]
    fn test_reset_and_restore() {
        let mut history = ConversationHistory::default();
        history.append_for_chapter(Role::User, "go north", 3);
        assert_eq!(history.messages()[0].chapter, Some(3));

        let restored = ConversationHistory::from_messages(history.clone().into_messages(), 20);
        assert_eq!(restored, history);

        history.reset();
        assert!(history.is_empty());
        assert_eq!(history.cap(), DEFAULT_HISTORY_CAP);
    }

    #[test]
    fn test_request_projection_preserves_order() {
        let mut history = ConversationHistory::new(10);
        history.append(Role::System, "rules");
        history.append(Role::User, "begin");
        history.append(Role::Assistant, "{\"scene\":\"x\"}");

        let request = history.to_request_messages();
        assert_eq!(request.len(), 3);
        assert_eq!(request[1], ChatMessage::user("begin"));
    }
}

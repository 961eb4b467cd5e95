//! Choices offered to the reader.

use serde::{Deserialize, Serialize};

/// Reserved id of the "head toward the ending" choice.
///
/// A choice carrying this id never has its consequences applied; taking it jumps
/// straight to the ending flow.
pub const ENDING_CHOICE_ID: u32 = 999;

/// A single option the reader can take.
///
/// Ids are unique within one generated batch only.
///
/// # Examples
///
/// ```
/// use taleweaver_core::{Choice, ENDING_CHOICE_ID};
///
/// let choice = Choice::new(1, "Press on", "Keep moving before the trail goes cold", 3);
/// assert!(!choice.is_ending_offer());
/// assert!(Choice::ending_offer().is_ending_offer());
/// assert_eq!(Choice::ending_offer().id, ENDING_CHOICE_ID);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Identifier, unique within its batch
    pub id: u32,
    /// Short label shown to the reader
    pub text: String,
    /// Longer description of what the choice implies
    pub description: String,
    /// Difficulty from 1 (safe) to 5 (reckless)
    pub difficulty: u8,
    /// Optional hint of what may follow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequences: Option<String>,
}

impl Choice {
    /// Create a choice, clamping difficulty into 1..=5.
    pub fn new(
        id: u32,
        text: impl Into<String>,
        description: impl Into<String>,
        difficulty: u8,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            description: description.into(),
            difficulty: difficulty.clamp(1, 5),
            consequences: None,
        }
    }

    /// The sentinel choice offering to wrap the story up.
    pub fn ending_offer() -> Self {
        Self {
            id: ENDING_CHOICE_ID,
            text: "Bring the story to its ending".to_string(),
            description: "The threads are drawing together. Step toward the conclusion of this tale."
                .to_string(),
            difficulty: 1,
            consequences: Some("The story will move into its final chapter.".to_string()),
        }
    }

    /// Whether this is the reserved ending sentinel.
    pub fn is_ending_offer(&self) -> bool {
        self.id == ENDING_CHOICE_ID
    }
}

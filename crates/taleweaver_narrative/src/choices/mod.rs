//! Choice generation.
//!
//! A batch always holds between [`MIN_CHOICES`] and [`MAX_CHOICES`] regular choices with
//! sequential ids, plus at most one ending sentinel. Layers are tried in order and the
//! first one that produces a batch wins:
//!
//! 1. the model, when a driver is available
//! 2. contextual templates keyed on cues in the scene
//! 3. genre sets keyed on scene keywords
//! 4. a fixed triple

mod contextual;
mod count;
mod genre;

pub use contextual::{SceneCue, contextual_choices, detect_cue};
pub use count::{MAX_CHOICES, MIN_CHOICES, effective_progress, offers_ending, target_choice_count};
pub use genre::{classify_scene, default_choices, genre_choices};

use crate::extract_payload;
use crate::prompts::{build_request, choice_messages};
use serde_json::Value;
use std::sync::Arc;
use taleweaver_core::{Character, Choice, RandomSource, StoryState};
use taleweaver_error::TaleweaverResult;
use taleweaver_interface::StoryDriver;

/// Which layer produced a batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChoiceSource {
    /// Generated by the model
    Model,
    /// Built from cues in the scene
    Contextual,
    /// Built from the scene's genre keywords
    Genre,
    /// The fixed last-resort triple
    Default,
}

/// A batch of choices and where it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceBatch {
    /// Choices in display order, the ending sentinel last when present
    pub choices: Vec<Choice>,
    /// Layer that produced the regular choices
    pub source: ChoiceSource,
}

impl ChoiceBatch {
    /// Whether the batch offers to end the story.
    pub fn offers_ending(&self) -> bool {
        self.choices.iter().any(Choice::is_ending_offer)
    }

    /// Choices other than the ending sentinel.
    pub fn regular(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter().filter(|c| !c.is_ending_offer())
    }

    /// Find a choice by id.
    pub fn find(&self, id: u32) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// Decides how many choices to offer and what they are.
#[derive(Clone)]
pub struct ChoiceEngine {
    random: Arc<dyn RandomSource>,
}

impl std::fmt::Debug for ChoiceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoiceEngine").finish_non_exhaustive()
    }
}

impl ChoiceEngine {
    /// Create an engine drawing from the given randomness.
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Generate a batch for the scene. Never fails.
    #[tracing::instrument(skip_all, fields(chapter = state.chapter, has_driver = driver.is_some()))]
    pub async fn generate_choices(
        &self,
        driver: Option<&dyn StoryDriver>,
        scene: &str,
        characters: &[Character],
        state: &StoryState,
    ) -> ChoiceBatch {
        let target = target_choice_count(state, self.random.as_ref());
        tracing::debug!(target, "Choice count decided");

        let mut batch = match driver {
            Some(driver) => match self.model_choices(driver, scene, characters, state, target).await {
                Ok(Some(choices)) => ChoiceBatch {
                    choices,
                    source: ChoiceSource::Model,
                },
                Ok(None) => {
                    tracing::warn!("Model choices unusable, using heuristic choices");
                    self.heuristic_batch(scene, characters, target)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Model call for choices failed, using heuristic choices");
                    self.heuristic_batch(scene, characters, target)
                }
            },
            None => self.heuristic_batch(scene, characters, target),
        };

        if offers_ending(state) {
            batch.choices.push(Choice::ending_offer());
        }

        tracing::info!(
            source = %batch.source,
            count = batch.choices.len(),
            ending = batch.offers_ending(),
            "Generated choices"
        );
        batch
    }

    /// Layers 2 to 4, without the model.
    pub fn heuristic_batch(&self, scene: &str, characters: &[Character], target: usize) -> ChoiceBatch {
        let target = target.clamp(MIN_CHOICES, MAX_CHOICES);

        if let Some(choices) = contextual_choices(scene, characters, target, self.random.as_ref()) {
            return ChoiceBatch {
                choices,
                source: ChoiceSource::Contextual,
            };
        }
        if let Some(choices) = genre_choices(scene, target, self.random.as_ref()) {
            return ChoiceBatch {
                choices,
                source: ChoiceSource::Genre,
            };
        }
        ChoiceBatch {
            choices: default_choices(),
            source: ChoiceSource::Default,
        }
    }

    async fn model_choices(
        &self,
        driver: &dyn StoryDriver,
        scene: &str,
        characters: &[Character],
        state: &StoryState,
        target: usize,
    ) -> TaleweaverResult<Option<Vec<Choice>>> {
        let request = build_request(choice_messages(scene, characters, state, target))?;
        let response = driver.generate(&request).await?;
        Ok(parse_model_choices(&extract_payload(&response.text), target))
    }
}

/// Turn an extracted payload into a batch of at most `target` choices.
///
/// Accepts a bare array or an object with a `choices` array. Items missing any of
/// `id`, `text`, `description` or `difficulty` are dropped; fewer than two valid items
/// yields `None`.
pub fn parse_model_choices(payload: &Value, target: usize) -> Option<Vec<Choice>> {
    let items = payload
        .as_array()
        .or_else(|| payload.get("choices").and_then(Value::as_array))?;

    let mut choices: Vec<Choice> = items.iter().filter_map(parse_choice).collect();
    if choices.len() < MIN_CHOICES {
        tracing::debug!(valid = choices.len(), "Too few valid model choices");
        return None;
    }

    choices.truncate(target.clamp(MIN_CHOICES, MAX_CHOICES));
    for (i, choice) in choices.iter_mut().enumerate() {
        choice.id = i as u32 + 1;
    }
    Some(choices)
}

fn parse_choice(item: &Value) -> Option<Choice> {
    item.get("id")?;
    let text = item.get("text")?.as_str()?.trim();
    let description = item.get("description")?.as_str()?.trim();
    let difficulty = item.get("difficulty").and_then(|d| {
        d.as_f64()
            .or_else(|| d.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
    })?;
    if text.is_empty() {
        return None;
    }

    let mut choice = Choice::new(0, text, description, difficulty.round().clamp(1.0, 5.0) as u8);
    choice.consequences = item
        .get("consequences")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array() {
        let payload = json!([
            {"id": 7, "text": "Climb", "description": "Up the wall", "difficulty": 9},
            {"id": "b", "text": "Wait", "description": "Stay put", "difficulty": "0"},
            {"id": 3, "text": "Run", "description": "Away", "difficulty": 2.6, "consequences": "Noise"}
        ]);
        let choices = parse_model_choices(&payload, 5).unwrap();

        assert_eq!(choices.len(), 3);
        assert_eq!(choices[0].id, 1);
        assert_eq!(choices[0].difficulty, 5);
        assert_eq!(choices[1].difficulty, 1);
        assert_eq!(choices[2].difficulty, 3);
        assert_eq!(choices[2].consequences.as_deref(), Some("Noise"));
    }

    #[test]
    fn test_parse_wrapped_and_truncated() {
        let payload = json!({"choices": [
            {"id": 1, "text": "A", "description": "a", "difficulty": 1},
            {"id": 2, "text": "B", "description": "b", "difficulty": 2},
            {"id": 3, "text": "C", "description": "c", "difficulty": 3}
        ]});
        let choices = parse_model_choices(&payload, 2).unwrap();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[1].text, "B");
    }

    #[test]
    fn test_invalid_items_dropped() {
        let payload = json!([
            {"id": 1, "text": "A", "description": "a", "difficulty": 1},
            {"text": "no id", "description": "x", "difficulty": 1},
            {"id": 3, "text": "", "description": "blank", "difficulty": 1},
            {"id": 4, "text": "no difficulty", "description": "x"}
        ]);
        assert!(parse_model_choices(&payload, 5).is_none());
        assert!(parse_model_choices(&json!({"scene": "x"}), 5).is_none());
    }
}

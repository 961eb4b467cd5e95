//! Typed validation of extracted model payloads.
//!
//! Extraction guarantees syntactically valid JSON; this module decides whether it is
//! usable story data. Required fields must be present, numbers are clamped into range,
//! unknown labels fall back to defaults, and placeholder character names are replaced
//! with genre-appropriate ones.

use crate::{FallbackContentGenerator, GENERIC_CONTINUATION};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use taleweaver_core::{Character, Genre, SceneType, StoryGoal};
use taleweaver_error::{NarrativeError, NarrativeErrorKind};

static PLACEHOLDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:character|npc|name|person|unknown|char|hero|heroine|villain|protagonist|ally|companion|stranger)\s*#?\s*\d*$|^[?\s]+$|^\[.*\]$|^<.*>$|^\{.*\}$",
    )
    .expect("valid regex")
});

/// Whether a name is a generic stand-in rather than a real name.
pub fn is_placeholder_name(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || PLACEHOLDER_NAME.is_match(name)
}

/// Story fields recovered from a model payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoryPayload {
    /// Scene text, never empty
    pub scene: String,
    /// Cast mentioned in the payload, names already validated
    pub characters: Vec<Character>,
    /// Mood label
    pub mood: Option<String>,
    /// Tension clamped to 1..=10
    pub tension: Option<u8>,
    /// Scene shape, when the label was recognised
    pub scene_type: Option<SceneType>,
    /// Progress clamped to 0..=100
    pub progress: Option<f32>,
    /// Newly unlocked achievements
    pub achievements: Vec<String>,
    /// Goals defined by the payload
    pub goals: Option<Vec<StoryGoal>>,
    /// Ids of goals the payload marks as achieved
    pub completed_goals: Vec<String>,
    /// Whether choices should follow
    pub needs_choice: Option<bool>,
}

fn missing(field: &str) -> NarrativeError {
    NarrativeError::new(NarrativeErrorKind::MissingField(field.to_string()))
}

fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| value.get(*name).filter(|v| !v.is_null()))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(text_of)
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
}

/// Parse a lowercase label into a serde enum, `None` when unrecognised.
fn label<T: DeserializeOwned>(value: &Value) -> Option<T> {
    let label = value.as_str()?.trim().to_lowercase();
    serde_json::from_value(Value::String(label)).ok()
}

fn list_of_text(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        Some(other) => text_of(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Validate a story payload.
///
/// With `require_characters` an empty cast is an error; otherwise the cast may be absent
/// (later chapters only mention new or changed characters).
///
/// # Errors
///
/// `MissingField` when the scene is missing or is the extractor's generic stand-in, or when
/// a required cast is empty.
pub fn validate_story_payload(
    value: &Value,
    genre: Genre,
    require_characters: bool,
    fallback: &FallbackContentGenerator,
) -> Result<StoryPayload, NarrativeError> {
    if !value.is_object() {
        return Err(NarrativeError::new(NarrativeErrorKind::InvalidField {
            field: "payload".to_string(),
            reason: "expected a JSON object".to_string(),
        }));
    }

    let scene = field(value, &["scene", "currentScene", "content"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != GENERIC_CONTINUATION)
        .ok_or_else(|| missing("scene"))?
        .to_string();

    let characters = validate_characters(field(value, &["characters"]), genre, fallback);
    if require_characters && characters.is_empty() {
        return Err(missing("characters"));
    }

    let goals = field(value, &["goals", "storyGoals"])
        .and_then(Value::as_array)
        .map(|items| parse_goals(items))
        .filter(|goals| !goals.is_empty());

    let mut achievements = list_of_text(field(value, &["achievements"]));
    achievements.extend(list_of_text(field(value, &["achievement"])));

    Ok(StoryPayload {
        scene,
        characters,
        mood: field(value, &["mood"]).and_then(text_of),
        tension: field(value, &["tension", "tensionLevel"])
            .and_then(number_of)
            .map(|t| t.round().clamp(1.0, 10.0) as u8),
        scene_type: field(value, &["sceneType"]).and_then(label),
        progress: field(value, &["progress", "storyProgress"])
            .and_then(number_of)
            .map(|p| p.clamp(0.0, 100.0) as f32),
        achievements,
        goals,
        completed_goals: list_of_text(field(value, &["completedGoals"])),
        needs_choice: field(value, &["needsChoice"]).and_then(Value::as_bool),
    })
}

fn validate_characters(
    value: Option<&Value>,
    genre: Genre,
    fallback: &FallbackContentGenerator,
) -> Vec<Character> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    let mut characters: Vec<Character> = items.iter().filter_map(parse_character).collect();

    let mut next_index = 0;
    for i in 0..characters.len() {
        if !is_placeholder_name(&characters[i].name) {
            continue;
        }
        let replacement = loop {
            let candidate = fallback.replacement_name(genre, next_index);
            next_index += 1;
            if !characters.iter().any(|c| c.name.eq_ignore_ascii_case(&candidate)) {
                break candidate;
            }
        };
        tracing::debug!(placeholder = %characters[i].name, %replacement, "Replaced placeholder name");
        characters[i].name = replacement;
    }

    characters
}

fn parse_character(item: &Value) -> Option<Character> {
    if let Some(name) = item.as_str() {
        return Some(Character::new(name.trim(), "supporting", ""));
    }
    item.as_object()?;

    let name = field(item, &["name"]).and_then(text_of).unwrap_or_default();
    let role = field(item, &["role"])
        .and_then(text_of)
        .unwrap_or_else(|| "supporting".to_string());
    let traits = field(item, &["traits", "personality", "description"])
        .and_then(text_of)
        .unwrap_or_default();

    let mut character = Character::new(name, role, traits);
    character.appearance = field(item, &["appearance"]).and_then(text_of);
    character.backstory = field(item, &["backstory", "background"]).and_then(text_of);
    Some(character)
}

fn parse_goals(items: &[Value]) -> Vec<StoryGoal> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let description = field(item, &["description", "goal"]).and_then(text_of)?;
            let id = field(item, &["id"])
                .and_then(text_of)
                .unwrap_or_else(|| format!("goal_{}", i + 1));
            let mut goal = StoryGoal::new(
                id,
                description,
                field(item, &["type", "goalType"]).and_then(label).unwrap_or_default(),
                field(item, &["priority"]).and_then(label).unwrap_or_default(),
            );
            if let Some(status) = field(item, &["status"]).and_then(label) {
                goal.status = status;
            }
            Some(goal)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taleweaver_core::{GoalPriority, GoalType};

    fn validate(value: Value, require: bool) -> Result<StoryPayload, NarrativeError> {
        validate_story_payload(&value, Genre::Fantasy, require, &FallbackContentGenerator::new())
    }

    #[test]
    fn test_placeholder_detection() {
        for name in ["Character 1", "Name", "NPC", "Unknown", "???", "npc #2", "[name]", "<hero>", ""] {
            assert!(is_placeholder_name(name), "{name:?}");
        }
        for name in ["Mira", "Captain Unknown Sea", "Nameless Jon", "Dr. Okafor"] {
            assert!(!is_placeholder_name(name), "{name:?}");
        }
    }

    #[test]
    fn test_full_payload() {
        let payload = validate(
            json!({
                "scene": "  The gate opens. ",
                "characters": [
                    {"name": "Mira", "role": "guide", "traits": ["wry", "brave"]},
                    {"name": "Character 2", "role": "rival"},
                    "Tomas"
                ],
                "mood": "tense",
                "tension": 14,
                "sceneType": "Action",
                "progress": "42.5",
                "achievements": ["First Steps"],
                "goals": [{"id": "g1", "description": "Reach the tower", "type": "main", "priority": "HIGH"},
                          {"description": "Help Tomas", "type": "nonsense"}],
                "completedGoals": ["g0"],
                "needsChoice": true
            }),
            true,
        )
        .unwrap();

        assert_eq!(payload.scene, "The gate opens.");
        assert_eq!(payload.characters.len(), 3);
        assert_eq!(payload.characters[0].traits, "wry, brave");
        assert_eq!(payload.characters[1].name, "Elowen Ashgrove");
        assert_eq!(payload.characters[2].role, "supporting");
        assert_eq!(payload.tension, Some(10));
        assert_eq!(payload.scene_type, Some(SceneType::Action));
        assert_eq!(payload.progress, Some(42.5));
        let goals = payload.goals.unwrap();
        assert_eq!(goals[0].priority, GoalPriority::High);
        assert_eq!(goals[1].id, "goal_2");
        assert_eq!(goals[1].goal_type, GoalType::Main);
        assert_eq!(payload.completed_goals, vec!["g0".to_string()]);
        assert_eq!(payload.needs_choice, Some(true));
    }

    #[test]
    fn test_missing_scene_rejected() {
        assert!(validate(json!({"characters": [{"name": "Mira"}]}), false).is_err());
        assert!(validate(json!({"scene": "   "}), false).is_err());
        assert!(validate(crate::fallback_payload(), false).is_err());
        assert!(validate(json!([1, 2]), false).is_err());
    }

    #[test]
    fn test_characters_required_only_when_asked() {
        assert!(validate(json!({"scene": "x"}), true).is_err());
        let payload = validate(json!({"scene": "x", "sceneType": "dance", "tension": "high"}), false).unwrap();
        assert!(payload.characters.is_empty());
        assert_eq!(payload.scene_type, None);
        assert_eq!(payload.tension, None);
    }

    #[test]
    fn test_replacement_skips_names_in_use() {
        let payload = validate(
            json!({"scene": "x", "characters": [
                {"name": "Elowen Ashgrove"}, {"name": "NPC"}, {"name": "Unknown"}
            ]}),
            true,
        )
        .unwrap();
        let names: Vec<_> = payload.characters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Elowen Ashgrove", "Garrick Thorne", "Seren Vale"]);
    }
}

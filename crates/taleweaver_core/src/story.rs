//! The narrative snapshot and its parts.

use crate::Genre;
use serde::{Deserialize, Serialize};

/// A member of the cast.
///
/// `name` must be a real name; generic placeholders are replaced during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Display name
    pub name: String,
    /// Narrative role (protagonist, mentor, rival, ...)
    pub role: String,
    /// Personality traits
    #[serde(default)]
    pub traits: String,
    /// Physical description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<String>,
    /// Background story
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,
}

impl Character {
    /// Create a character without appearance or backstory.
    pub fn new(name: impl Into<String>, role: impl Into<String>, traits: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            traits: traits.into(),
            appearance: None,
            backstory: None,
        }
    }
}

/// Shape of the current scene.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SceneType {
    /// Fights, chases, physical danger
    Action,
    /// Conversation-driven scenes
    Dialogue,
    /// Discovering places and things
    #[default]
    Exploration,
    /// Quiet, introspective moments
    Reflection,
    /// The decisive confrontation
    Climax,
}

/// How a completed story ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CompletionType {
    /// The protagonist achieved what they set out to do
    Success,
    /// The protagonist fell short
    Failure,
    /// An open, bittersweet resolution
    Neutral,
    /// The arc ends on an unresolved hook
    Cliffhanger,
}

/// Kind of a tracked goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// The arc's central objective
    #[default]
    Main,
    /// Optional objective
    Side,
    /// Personal growth of a character
    Character,
    /// A question the story must answer
    Mystery,
}

/// Priority of a tracked goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    /// Nice to have
    Low,
    /// Expected
    #[default]
    Medium,
    /// Required for a satisfying ending
    High,
}

/// Status of a tracked goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Still open
    #[default]
    Active,
    /// Achieved
    Completed,
    /// Lost for good
    Failed,
}

/// A narrative objective tracked independently of `story_progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryGoal {
    /// Identifier unique within the story
    pub id: String,
    /// What has to happen
    pub description: String,
    /// Goal category
    #[serde(rename = "type", default)]
    pub goal_type: GoalType,
    /// How much the goal matters
    #[serde(default)]
    pub priority: GoalPriority,
    /// Current status
    #[serde(default)]
    pub status: GoalStatus,
    /// Chapter in which the goal was completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_chapter: Option<u32>,
}

impl StoryGoal {
    /// Create an active goal.
    pub fn new(id: impl Into<String>, description: impl Into<String>, goal_type: GoalType, priority: GoalPriority) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            goal_type,
            priority,
            status: GoalStatus::Active,
            completion_chapter: None,
        }
    }
}

/// The authoritative narrative snapshot.
///
/// # Examples
///
/// ```
/// use taleweaver_core::{Genre, StoryState};
///
/// let state = StoryState::new("story-1", Genre::Mystery);
/// assert_eq!(state.chapter, 1);
/// assert!(!state.is_completed);
/// assert_eq!(state.goal_completion_ratio(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryState {
    /// Stable identifier of the session
    pub story_id: String,
    /// Genre the story was created with
    #[serde(default)]
    pub genre: Genre,
    /// Most recently generated passage
    pub current_scene: String,
    /// Ordered cast
    #[serde(default)]
    pub characters: Vec<Character>,
    /// Chapter number, starting at 1
    pub chapter: u32,
    /// Literal text of every choice taken, oldest first
    #[serde(default)]
    pub choices_made: Vec<String>,
    /// Unlocked achievement labels, oldest first
    #[serde(default)]
    pub achievements: Vec<String>,
    /// Free-form mood label
    #[serde(default)]
    pub mood: String,
    /// Tension from 1 (calm) to 10 (unbearable)
    #[serde(default = "default_tension")]
    pub tension_level: u8,
    /// Shape of the current scene
    #[serde(default)]
    pub scene_type: SceneType,
    /// Whether the caller should request choices next
    #[serde(default = "default_true")]
    pub needs_choice: bool,
    /// Terminal marker
    #[serde(default)]
    pub is_completed: bool,
    /// How the story ended, once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_type: Option<CompletionType>,
    /// Progress from 0 to 100
    #[serde(default)]
    pub story_progress: f32,
    /// Tracked objectives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_goals: Option<Vec<StoryGoal>>,
}

fn default_tension() -> u8 {
    5
}

fn default_true() -> bool {
    true
}

impl StoryState {
    /// Create the state of a story that has not produced a scene yet.
    pub fn new(story_id: impl Into<String>, genre: Genre) -> Self {
        Self {
            story_id: story_id.into(),
            genre,
            current_scene: String::new(),
            characters: Vec::new(),
            chapter: 1,
            choices_made: Vec::new(),
            achievements: Vec::new(),
            mood: "neutral".to_string(),
            tension_level: default_tension(),
            scene_type: SceneType::default(),
            needs_choice: true,
            is_completed: false,
            completion_type: None,
            story_progress: 0.0,
            story_goals: None,
        }
    }

    /// Create a state with a freshly generated story id.
    pub fn with_generated_id(genre: Genre) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), genre)
    }

    /// Raise progress, never lowering it, clamped to 0..=100.
    pub fn advance_progress(&mut self, candidate: f32) {
        let candidate = if candidate.is_finite() { candidate } else { 0.0 };
        self.story_progress = self.story_progress.max(candidate).clamp(0.0, 100.0);
    }

    /// Append an achievement unless it is already unlocked.
    pub fn unlock_achievement(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if label.trim().is_empty() || self.achievements.iter().any(|a| a == &label) {
            return false;
        }
        self.achievements.push(label);
        true
    }

    /// The most recent `count` choices, oldest first.
    pub fn recent_choices(&self, count: usize) -> &[String] {
        let start = self.choices_made.len().saturating_sub(count);
        &self.choices_made[start..]
    }

    /// Fraction of tracked goals that are completed, if any goals exist.
    pub fn goal_completion_ratio(&self) -> Option<f32> {
        let goals = self.story_goals.as_ref().filter(|goals| !goals.is_empty())?;
        let completed = goals
            .iter()
            .filter(|goal| goal.status == GoalStatus::Completed)
            .count();
        Some(completed as f32 / goals.len() as f32)
    }

    /// Mark goals as completed in the current chapter. Returns how many changed.
    pub fn complete_goals(&mut self, ids: &[String]) -> usize {
        let chapter = self.chapter;
        let Some(goals) = self.story_goals.as_mut() else {
            return 0;
        };
        let mut changed = 0;
        for goal in goals.iter_mut() {
            if goal.status == GoalStatus::Active && ids.iter().any(|id| id == &goal.id) {
                goal.status = GoalStatus::Completed;
                goal.completion_chapter = Some(chapter);
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_never_decreases() {
        let mut state = StoryState::new("s", Genre::Fantasy);
        state.advance_progress(40.0);
        state.advance_progress(10.0);
        assert_eq!(state.story_progress, 40.0);
        state.advance_progress(250.0);
        assert_eq!(state.story_progress, 100.0);
        state.advance_progress(f32::NAN);
        assert_eq!(state.story_progress, 100.0);
    }

    #[test]
    fn test_unlock_achievement_skips_duplicates() {
        let mut state = StoryState::new("s", Genre::Fantasy);
        assert!(state.unlock_achievement("First Steps"));
        assert!(!state.unlock_achievement("First Steps"));
        assert!(!state.unlock_achievement("   "));
        assert_eq!(state.achievements, vec!["First Steps".to_string()]);
    }

    #[test]
    fn test_complete_goals_stamps_chapter() {
        let mut state = StoryState::new("s", Genre::Fantasy);
        state.chapter = 4;
        state.story_goals = Some(vec![
            StoryGoal::new("g1", "Find the map", GoalType::Main, GoalPriority::High),
            StoryGoal::new("g2", "Befriend the smith", GoalType::Side, GoalPriority::Low),
        ]);

        assert_eq!(state.complete_goals(&["g1".to_string()]), 1);
        assert_eq!(state.complete_goals(&["g1".to_string()]), 0);

        let goals = state.story_goals.as_ref().unwrap();
        assert_eq!(goals[0].status, GoalStatus::Completed);
        assert_eq!(goals[0].completion_chapter, Some(4));
        assert_eq!(state.goal_completion_ratio(), Some(0.5));
    }

    #[test]
    fn test_state_round_trips_with_camel_case_fields() {
        let mut state = StoryState::new("abc", Genre::SciFi);
        state.current_scene = "The airlock hisses.".into();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["storyId"], "abc");
        assert_eq!(json["genre"], "sci-fi");
        assert_eq!(json["tensionLevel"], 5);
        assert_eq!(json["sceneType"], "exploration");

        let restored: StoryState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = serde_json::json!({
            "storyId": "legacy",
            "currentScene": "Rain.",
            "chapter": 2
        });
        let state: StoryState = serde_json::from_value(json).unwrap();
        assert_eq!(state.genre, Genre::Fantasy);
        assert_eq!(state.tension_level, 5);
        assert!(state.needs_choice);
    }
}

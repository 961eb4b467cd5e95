//! Deciding when a story arc should close.
//!
//! Hard triggers are checked first, in a fixed order; the first that fires decides.
//! Otherwise independent signals add up to a confidence score, and an ending is only
//! suggested when the score is high enough and at least two signals agree.

use crate::keywords::Keywords;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use taleweaver_core::{CompletionType, RandomSource, StoryState};

/// Confidence needed before a soft ending is suggested.
pub const SUGGESTION_THRESHOLD: i32 = 60;

const FAILURE_WORDS: &[&str] = &[
    "give up", "surrender", "flee", "run away", "abandon", "die", "sacrifice myself", "retreat",
];
const RESOLUTION_WORDS: &[&str] = &[
    "complete the mission", "return home", "finish", "fulfill", "claim victory", "end this",
    "final", "accept the reward", "say goodbye",
];
const CLIMAX_WORDS: &[&str] = &[
    "final", "confront", "showdown", "last stand", "decisive", "ultimate", "face the",
];
const REFLECTIVE_WORDS: &[&str] = &[
    "think", "reflect", "consider", "remember", "talk", "listen", "rest", "wait", "observe",
];
const GROWTH_WORDS: &[&str] = &[
    "realize", "understand", "learned", "grown", "changed", "stronger", "wiser", "accept",
    "forgive",
];
const CALM_MOODS: &[&str] = &["calm", "peaceful", "serene", "harmonious", "content", "hopeful"];
const DANGEROUS_MOODS: &[&str] = &["dangerous", "desperate", "chaotic", "terrifying", "tense"];

static FAILURE: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(FAILURE_WORDS));
static RESOLUTION: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(RESOLUTION_WORDS));
static CLIMAX: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(CLIMAX_WORDS));
static REFLECTIVE: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(REFLECTIVE_WORDS));
static GROWTH: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(GROWTH_WORDS));
static CALM: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(CALM_MOODS));
static DANGEROUS: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(DANGEROUS_MOODS));

/// One factor behind a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingSignal {
    /// What was observed
    pub label: String,
    /// Contribution to the confidence score
    pub weight: i32,
}

/// Verdict on whether the story should end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingDecision {
    /// Whether the arc should close now
    pub should_end: bool,
    /// Human readable summary
    pub reason: String,
    /// Tone the ending should take
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_type: Option<CompletionType>,
    /// 0 to 100
    pub confidence: u8,
    /// Factors considered
    #[serde(default)]
    pub signals: Vec<EndingSignal>,
}

impl EndingDecision {
    fn trigger(reason: &str, completion: CompletionType) -> Self {
        Self {
            should_end: true,
            reason: reason.to_string(),
            suggested_type: Some(completion),
            confidence: 100,
            signals: vec![EndingSignal {
                label: reason.to_string(),
                weight: 100,
            }],
        }
    }

    fn keep_going(reason: &str, confidence: i32, signals: Vec<EndingSignal>) -> Self {
        Self {
            should_end: false,
            reason: reason.to_string(),
            suggested_type: None,
            confidence: confidence.clamp(0, 100) as u8,
            signals,
        }
    }
}

fn any_choice_matches(choices: &[String], words: &Keywords) -> bool {
    choices.iter().any(|c| words.is_match(c))
}

/// Scores a state for closure.
#[derive(Clone)]
pub struct EndingDetector {
    random: Arc<dyn RandomSource>,
}

impl std::fmt::Debug for EndingDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndingDetector").finish_non_exhaustive()
    }
}

impl EndingDetector {
    /// Create a detector drawing the cliffhanger chance from `random`.
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Decide whether the story should end.
    #[tracing::instrument(skip_all, fields(chapter = state.chapter, progress = state.story_progress))]
    pub fn should_end(&self, state: &StoryState) -> EndingDecision {
        if state.is_completed {
            return EndingDecision::keep_going("Story already completed", 0, Vec::new());
        }

        if let Some(decision) = self.hard_trigger(state) {
            tracing::info!(reason = %decision.reason, suggested = ?decision.suggested_type, "Ending triggered");
            return decision;
        }

        let decision = score(state);
        tracing::debug!(
            should_end = decision.should_end,
            confidence = decision.confidence,
            signals = decision.signals.len(),
            "Ending scored"
        );
        decision
    }

    fn hard_trigger(&self, state: &StoryState) -> Option<EndingDecision> {
        let recent = state.recent_choices(5);
        let calm = CALM.is_match(&state.mood);

        if state.story_progress >= 95.0 {
            return Some(EndingDecision::trigger(
                "Story progress is essentially complete",
                CompletionType::Success,
            ));
        }
        if state.chapter >= 15 {
            let completion = if state.story_progress >= 80.0 {
                CompletionType::Success
            } else {
                CompletionType::Neutral
            };
            return Some(EndingDecision::trigger("Chapter limit reached", completion));
        }
        if state.achievements.len() >= 15 && state.chapter >= 8 {
            return Some(EndingDecision::trigger(
                "Enough achievements for a satisfying finale",
                CompletionType::Success,
            ));
        }
        if state.tension_level >= 8 && any_choice_matches(recent, &FAILURE) {
            return Some(EndingDecision::trigger(
                "Recent choices point toward defeat",
                CompletionType::Failure,
            ));
        }
        if state.chapter >= 10 && any_choice_matches(recent, &RESOLUTION) {
            return Some(EndingDecision::trigger(
                "Recent choices seek resolution",
                CompletionType::Success,
            ));
        }
        if state.tension_level <= 2 && state.chapter >= 8 && calm {
            return Some(EndingDecision::trigger(
                "The story has settled into calm",
                CompletionType::Neutral,
            ));
        }
        if state.chapter >= 10 && state.tension_level >= 7 && self.random.chance(0.3) {
            return Some(EndingDecision::trigger(
                "A dramatic moment to leave on a cliffhanger",
                CompletionType::Cliffhanger,
            ));
        }
        None
    }
}

fn score(state: &StoryState) -> EndingDecision {
    let mut signals = Vec::new();
    let mut add = |label: &str, weight: i32| {
        signals.push(EndingSignal {
            label: label.to_string(),
            weight,
        })
    };

    if state.story_progress >= 80.0 {
        add("Story progress is high", 25);
    } else if state.story_progress >= 60.0 {
        add("Story progress is well along", 15);
    }

    if state.chapter > 0 && state.achievements.len() as f32 / state.chapter as f32 >= 1.0 {
        add("Achievements keep pace with chapters", 15);
    }

    if any_choice_matches(state.recent_choices(3), &CLIMAX) {
        add("Recent choices feel climactic", 20);
    }

    match state.goal_completion_ratio() {
        Some(ratio) if ratio >= 0.8 => add("Most goals are complete", 25),
        Some(ratio) if ratio >= 0.5 => add("Half the goals are complete", 10),
        _ => {}
    }

    let reflective = state
        .recent_choices(5)
        .iter()
        .filter(|c| REFLECTIVE.is_match(c))
        .count();
    if reflective >= 3 {
        add("Choices have turned reflective", 10);
    }

    if GROWTH.is_match(&state.current_scene) {
        add("Characters show growth", 10);
    }

    let calm_bonus = CALM.is_match(&state.mood);
    if calm_bonus {
        add("The mood is calm", 10);
    }

    if state.chapter >= 12 {
        add("The story has run long", 15);
    } else if state.chapter >= 8 {
        add("The story has reached a fair length", 10);
    }

    if state.tension_level >= 8 || DANGEROUS.is_match(&state.mood) {
        add("The situation is still unresolved and dangerous", -20);
    }

    let confidence: i32 = signals.iter().map(|s| s.weight).sum();
    let reasons = signals.iter().filter(|s| s.weight > 0).count();

    if confidence >= SUGGESTION_THRESHOLD && reasons >= 2 {
        let completion = if calm_bonus && state.story_progress < 80.0 {
            CompletionType::Neutral
        } else {
            CompletionType::Success
        };
        let reason = signals
            .iter()
            .filter(|s| s.weight > 0)
            .map(|s| s.label.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return EndingDecision {
            should_end: true,
            reason,
            suggested_type: Some(completion),
            confidence: confidence.clamp(0, 100) as u8,
            signals,
        };
    }

    EndingDecision::keep_going("The story still has room to grow", confidence, signals)
}

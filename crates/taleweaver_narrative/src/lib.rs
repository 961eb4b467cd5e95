//! Narrative orchestration for Taleweaver.
//!
//! This crate turns an unreliable text-completion backend into a playable branching story:
//!
//! - [`extract_payload`] isolates and repairs JSON in raw model output and never fails
//! - [`ConversationHistory`] bounds the conversation sent on multi-turn calls
//! - [`ChoiceEngine`] decides how many options to offer and what they are
//! - [`EndingDetector`] scores whether an arc should close, and how
//! - [`FallbackContentGenerator`] writes template content when the model cannot
//! - [`ContextStore`] persists sessions with one primary record per story
//! - [`StoryEngine`] ties them together behind the caller-facing API
//!
//! # Example
//!
//! ```
//! use taleweaver_core::{Genre, ModelConfig, StoryConfig};
//! use taleweaver_narrative::{ContentSource, PacingConfig, StoryEngine, StorySession};
//!
//! # tokio_test_block(async {
//! let engine = StoryEngine::offline().with_pacing(PacingConfig::immediate());
//! let mut session = StorySession::new(ModelConfig::default());
//! let config = StoryConfig::new(Genre::Fantasy, "Aria", "the Sunken Vale");
//!
//! let story = engine.generate_initial_story(&mut session, &config, false).await;
//! assert_eq!(story.source, ContentSource::Fallback);
//! assert!(!story.state.characters.is_empty());
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod choices;
mod context_store;
mod ending;
mod engine;
mod extraction;
mod fallback;
mod history;
mod keywords;
mod pacing;
mod prompts;
mod validation;

pub use choices::{
    ChoiceBatch, ChoiceEngine, ChoiceSource, MAX_CHOICES, MIN_CHOICES, SceneCue, classify_scene,
    contextual_choices, default_choices, detect_cue, effective_progress, genre_choices,
    offers_ending, parse_model_choices, target_choice_count,
};
pub use context_store::{
    CURRENT_SCHEMA_VERSION, CleanupReport, ContextStore, STORE_KEY, SaveId, SaveOptions,
    SaveProgressOptions, SaveSummary, SavedStoryContext,
};
pub use ending::{EndingDecision, EndingDetector, EndingSignal, SUGGESTION_THRESHOLD};
pub use engine::{ChapterOutcome, ContentSource, GeneratedStory, StoryEngine, StorySession};
pub use extraction::{
    GENERIC_CONTINUATION, SCENE_KEY, extract_payload, fallback_payload, find_json_candidate,
    repair_json, strip_code_fence,
};
pub use fallback::FallbackContentGenerator;
pub use history::{ConversationHistory, DEFAULT_HISTORY_CAP};
pub use pacing::{GenerationOutcome, Pacer, PacingConfig};
pub use validation::{StoryPayload, is_placeholder_name, validate_story_payload};

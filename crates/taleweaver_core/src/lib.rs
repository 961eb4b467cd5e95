//! Core data types for the Taleweaver narrative engine.
//!
//! This crate holds the narrative snapshot ([`StoryState`]), the pieces it is made of,
//! the configuration a session carries, the provider-neutral request types, and the
//! injectable randomness source used by every heuristic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod choice;
mod config;
mod genre;
mod message;
mod random;
mod request;
mod role;
mod story;

pub use choice::{Choice, ENDING_CHOICE_ID};
pub use config::{ModelConfig, ProviderKind, StoryConfig, StoryLength};
pub use genre::Genre;
pub use message::ConversationMessage;
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom, shuffle};
pub use request::{ChatMessage, GenerateRequest, GenerateRequestBuilder, GenerateResponse};
pub use role::Role;
pub use story::{
    Character, CompletionType, GoalPriority, GoalStatus, GoalType, SceneType, StoryGoal,
    StoryState,
};

//! Caller-facing story orchestration.
//!
//! [`StoryEngine`] holds only immutable collaborators. Everything that changes during a
//! session (the model configuration and the conversation so far) lives in a
//! [`StorySession`] owned by the caller and passed to each call, so independent sessions
//! can share one engine.
//!
//! Model failures never reach the caller: every generation demotes to the deterministic
//! fallback generator and reports where its content came from.

use crate::{
    ChoiceBatch, ChoiceEngine, ConversationHistory, EndingDecision, EndingDetector,
    FallbackContentGenerator, GenerationOutcome, Pacer, PacingConfig, StoryPayload,
    extract_payload, validate_story_payload,
    prompts::{build_request, ending_messages, initial_story_messages, next_chapter_prompt, system_prompt},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taleweaver_core::{
    Character, ChatMessage, Choice, CompletionType, ModelConfig, RandomSource, Role, StoryConfig,
    StoryState, ThreadRandom,
};
use taleweaver_error::TaleweaverResult;
use taleweaver_interface::{ModelConnector, OfflineConnector, StoryDriver};

/// Where generated content came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentSource {
    /// Produced by the model
    Model,
    /// Produced by the template generator
    Fallback,
    /// Nothing was generated; the input state was returned as is
    Unchanged,
}

/// Per-session mutable data, owned by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StorySession {
    /// Model to talk to
    pub model_config: ModelConfig,
    /// Conversation the model has seen
    pub history: ConversationHistory,
}

impl StorySession {
    /// A session with an empty history of the default cap.
    pub fn new(model_config: ModelConfig) -> Self {
        Self {
            model_config,
            history: ConversationHistory::default(),
        }
    }

    /// A session resuming an existing conversation.
    pub fn with_history(model_config: ModelConfig, history: ConversationHistory) -> Self {
        Self {
            model_config,
            history,
        }
    }
}

/// A freshly generated state.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStory {
    /// The state
    pub state: StoryState,
    /// Where its content came from
    pub source: ContentSource,
}

/// Result of advancing a story by one choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterOutcome {
    /// The state after the choice
    pub state: StoryState,
    /// Whether the new state warrants an ending
    pub ending: EndingDecision,
    /// Where the chapter's content came from
    pub source: ContentSource,
}

/// Orchestrates model calls, fallbacks, choices and endings.
#[derive(Clone)]
pub struct StoryEngine {
    connector: Arc<dyn ModelConnector>,
    random: Arc<dyn RandomSource>,
    pacer: Pacer,
    choices: ChoiceEngine,
    detector: EndingDetector,
    fallback: FallbackContentGenerator,
}

impl std::fmt::Debug for StoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryEngine")
            .field("pacing", self.pacer.config())
            .finish_non_exhaustive()
    }
}

impl StoryEngine {
    /// Create an engine with thread-local randomness and default pacing.
    pub fn new(connector: Arc<dyn ModelConnector>) -> Self {
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
        Self {
            connector,
            choices: ChoiceEngine::new(random.clone()),
            detector: EndingDetector::new(random.clone()),
            random,
            pacer: Pacer::default(),
            fallback: FallbackContentGenerator::new(),
        }
    }

    /// An engine that never calls a model.
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineConnector))
    }

    /// Replace the randomness source used for choice counts, shuffles and cliffhangers.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.choices = ChoiceEngine::new(random.clone());
        self.detector = EndingDetector::new(random.clone());
        self.random = random;
        self
    }

    /// Replace the pacing.
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacer = Pacer::new(pacing);
        self
    }

    /// The randomness source in use.
    pub fn random(&self) -> &Arc<dyn RandomSource> {
        &self.random
    }

    fn driver(&self, session: &StorySession) -> Option<Arc<dyn StoryDriver>> {
        let driver = self.connector.connect(&session.model_config);
        if driver.is_none() {
            tracing::debug!(provider = %session.model_config.provider, "No model available, using templates");
        }
        driver
    }

    async fn ask(driver: &dyn StoryDriver, messages: Vec<ChatMessage>) -> TaleweaverResult<String> {
        let request = build_request(messages)?;
        let response = driver.generate(&request).await?;
        Ok(response.text)
    }

    /// Generate the opening of a new story.
    ///
    /// Resets the session history, makes one model call and seeds the history with the
    /// exchange. Without a model, or when its output is unusable, the opening comes from
    /// the templates.
    #[tracing::instrument(skip_all, fields(genre = %config.genre, advanced = advanced))]
    pub async fn generate_initial_story(
        &self,
        session: &mut StorySession,
        config: &StoryConfig,
        advanced: bool,
    ) -> GeneratedStory {
        session.history.reset();
        let messages = initial_story_messages(config, advanced);

        if let Some(driver) = self.driver(session) {
            match self.model_opening(driver.as_ref(), config, advanced, messages.clone()).await {
                Ok((state, raw)) => {
                    for message in &messages {
                        session.history.append_for_chapter(message.role, &message.content, state.chapter);
                    }
                    session.history.append_for_chapter(Role::Assistant, raw, state.chapter);
                    tracing::info!(story_id = %state.story_id, "Generated opening");
                    return GeneratedStory {
                        state,
                        source: ContentSource::Model,
                    };
                }
                Err(e) => tracing::warn!(error = %e, "Model opening unusable, using templates"),
            }
        }

        let state = self.fallback.initial_story(config);
        for message in &messages {
            session.history.append_for_chapter(message.role, &message.content, state.chapter);
        }
        session
            .history
            .append_for_chapter(Role::Assistant, &state.current_scene, state.chapter);
        tracing::info!(story_id = %state.story_id, "Generated template opening");
        GeneratedStory {
            state,
            source: ContentSource::Fallback,
        }
    }

    async fn model_opening(
        &self,
        driver: &dyn StoryDriver,
        config: &StoryConfig,
        advanced: bool,
        messages: Vec<ChatMessage>,
    ) -> TaleweaverResult<(StoryState, String)> {
        let raw = Self::ask(driver, messages).await?;
        let payload = validate_story_payload(&extract_payload(&raw), config.genre, true, &self.fallback)?;

        let mut state = StoryState::with_generated_id(config.genre);
        state.current_scene = payload.scene.clone();
        merge_characters(&mut state.characters, &payload.characters);
        apply_soft_fields(&mut state, &payload);
        if advanced && state.story_goals.is_none() {
            state.story_goals = self.fallback.initial_story(config).story_goals;
        }
        Ok((state, raw))
    }

    /// Advance the story by one choice.
    ///
    /// A completed state comes back unchanged. The ending sentinel jumps straight to the
    /// ending, in the tone the detector suggests (neutral when it has no opinion). Returns
    /// `Stuck` when the watchdog fires; the session history is then left as it was.
    #[tracing::instrument(skip_all, fields(story_id = %state.story_id, chapter = state.chapter, choice = choice.id))]
    pub async fn generate_next_chapter(
        &self,
        session: &mut StorySession,
        state: &StoryState,
        choice: &Choice,
    ) -> GenerationOutcome<ChapterOutcome> {
        if state.is_completed {
            tracing::debug!("Story already completed");
            return GenerationOutcome::Ready(ChapterOutcome {
                state: state.clone(),
                ending: self.detector.should_end(state),
                source: ContentSource::Unchanged,
            });
        }

        if choice.is_ending_offer() {
            let decision = self.detector.should_end(state);
            let completion = decision.suggested_type.unwrap_or(CompletionType::Neutral);
            tracing::info!(%completion, "Reader chose to end the story");
            return self
                .pacer
                .run(self.generate_story_ending(session, state, completion))
                .await
                .map(|ended| ChapterOutcome {
                    state: ended.state,
                    ending: EndingDecision {
                        should_end: true,
                        reason: "Reader chose to end the story".to_string(),
                        suggested_type: Some(completion),
                        ..decision
                    },
                    source: ended.source,
                });
        }

        self.pacer.run(self.next_chapter(session, state, choice)).await
    }

    async fn next_chapter(
        &self,
        session: &mut StorySession,
        state: &StoryState,
        choice: &Choice,
    ) -> ChapterOutcome {
        let prompt = next_chapter_prompt(state, choice);
        let chapter = state.chapter + 1;

        let generated = match self.driver(session) {
            Some(driver) => {
                let mut messages = session.history.to_request_messages();
                if !messages.iter().any(|m| m.role == Role::System) {
                    messages.insert(0, ChatMessage::system(system_prompt(&state.genre.to_string(), None)));
                }
                messages.push(ChatMessage::user(prompt.clone()));
                match self.model_chapter(driver.as_ref(), state, choice, messages).await {
                    Ok(generated) => Some(generated),
                    Err(e) => {
                        tracing::warn!(error = %e, "Model chapter unusable, using templates");
                        None
                    }
                }
            }
            None => None,
        };

        let (next, assistant, source) = match generated {
            Some((next, raw)) => (next, raw, ContentSource::Model),
            None => {
                let next = self.fallback.next_chapter(state, choice);
                let scene = next.current_scene.clone();
                (next, scene, ContentSource::Fallback)
            }
        };

        session.history.append_for_chapter(Role::User, prompt, chapter);
        session.history.append_for_chapter(Role::Assistant, assistant, chapter);

        let ending = self.detector.should_end(&next);
        tracing::info!(%source, chapter = next.chapter, should_end = ending.should_end, "Advanced story");
        ChapterOutcome {
            state: next,
            ending,
            source,
        }
    }

    async fn model_chapter(
        &self,
        driver: &dyn StoryDriver,
        state: &StoryState,
        choice: &Choice,
        messages: Vec<ChatMessage>,
    ) -> TaleweaverResult<(StoryState, String)> {
        let raw = Self::ask(driver, messages).await?;
        let payload = validate_story_payload(&extract_payload(&raw), state.genre, false, &self.fallback)?;
        Ok((apply_chapter(state, choice, &payload), raw))
    }

    /// Generate a batch of choices for a scene.
    pub async fn generate_choices(
        &self,
        session: &StorySession,
        scene: &str,
        characters: &[Character],
        state: &StoryState,
    ) -> GenerationOutcome<ChoiceBatch> {
        let driver = self.driver(session);
        self.pacer
            .run(self.choices.generate_choices(driver.as_deref(), scene, characters, state))
            .await
    }

    /// Whether the story should end now.
    pub fn should_story_end(&self, state: &StoryState) -> EndingDecision {
        self.detector.should_end(state)
    }

    /// Write the closing chapter and mark the story completed.
    ///
    /// A completed state comes back unchanged.
    #[tracing::instrument(skip_all, fields(story_id = %state.story_id, %completion_type))]
    pub async fn generate_story_ending(
        &self,
        session: &mut StorySession,
        state: &StoryState,
        completion_type: CompletionType,
    ) -> GeneratedStory {
        if state.is_completed {
            return GeneratedStory {
                state: state.clone(),
                source: ContentSource::Unchanged,
            };
        }

        let messages = ending_messages(state, completion_type);
        let mut ended = self.fallback.ending(state, completion_type);
        let mut source = ContentSource::Fallback;
        let mut assistant = ended.current_scene.clone();

        if let Some(driver) = self.driver(session) {
            match self.model_ending(driver.as_ref(), state, messages.clone()).await {
                Ok((payload, raw)) => {
                    ended.current_scene = payload.scene;
                    merge_characters(&mut ended.characters, &payload.characters);
                    if let Some(mood) = payload.mood {
                        ended.mood = mood;
                    }
                    for achievement in payload.achievements {
                        ended.unlock_achievement(achievement);
                    }
                    ended.complete_goals(&payload.completed_goals);
                    assistant = raw;
                    source = ContentSource::Model;
                }
                Err(e) => tracing::warn!(error = %e, "Model ending unusable, using templates"),
            }
        }

        if let Some(user) = messages.into_iter().find(|m| m.role == Role::User) {
            session.history.append_for_chapter(Role::User, user.content, ended.chapter);
        }
        session.history.append_for_chapter(Role::Assistant, assistant, ended.chapter);

        tracing::info!(%source, "Story ended");
        GeneratedStory { state: ended, source }
    }

    async fn model_ending(
        &self,
        driver: &dyn StoryDriver,
        state: &StoryState,
        messages: Vec<ChatMessage>,
    ) -> TaleweaverResult<(StoryPayload, String)> {
        let raw = Self::ask(driver, messages).await?;
        let payload = validate_story_payload(&extract_payload(&raw), state.genre, false, &self.fallback)?;
        Ok((payload, raw))
    }
}

/// The state after a model-written chapter.
fn apply_chapter(state: &StoryState, choice: &Choice, payload: &StoryPayload) -> StoryState {
    let mut next = state.clone();
    next.chapter = state.chapter + 1;
    next.choices_made.push(choice.text.clone());
    next.current_scene = payload.scene.clone();
    merge_characters(&mut next.characters, &payload.characters);
    apply_soft_fields(&mut next, payload);
    next
}

fn apply_soft_fields(state: &mut StoryState, payload: &StoryPayload) {
    if let Some(mood) = &payload.mood {
        state.mood = mood.clone();
    }
    if let Some(tension) = payload.tension {
        state.tension_level = tension;
    }
    if let Some(scene_type) = payload.scene_type {
        state.scene_type = scene_type;
    }
    if let Some(progress) = payload.progress {
        state.advance_progress(progress);
    }
    for achievement in &payload.achievements {
        state.unlock_achievement(achievement.clone());
    }
    if let Some(goals) = &payload.goals {
        let existing = state.story_goals.get_or_insert_with(Vec::new);
        for goal in goals {
            if !existing.iter().any(|g| g.id == goal.id) {
                existing.push(goal.clone());
            }
        }
    }
    state.complete_goals(&payload.completed_goals);
    state.needs_choice = payload.needs_choice.unwrap_or(true);
}

/// Merge by case-insensitive name: known characters get non-empty updates, new ones are appended.
fn merge_characters(cast: &mut Vec<Character>, incoming: &[Character]) {
    for character in incoming {
        match cast
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&character.name))
        {
            Some(known) => {
                if !character.traits.trim().is_empty() {
                    known.traits = character.traits.clone();
                }
                if character.appearance.is_some() {
                    known.appearance = character.appearance.clone();
                }
                if character.backstory.is_some() {
                    known.backstory = character.backstory.clone();
                }
            }
            None => cast.push(character.clone()),
        }
    }
}

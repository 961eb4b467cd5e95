//! Story creation and the interactive play loop.

use super::commands::NewStoryArgs;
use std::time::Instant;
use taleweaver::{
    BackendError, Choice, CompletionType, ContentSource, ContextStore, ConversationHistory,
    EndingDecision, GenerationOutcome, Genre, SaveId, SaveOptions, SaveProgressOptions,
    StoryConfig, StoryEngine, StorySession, StoryState, TaleweaverConfig, TaleweaverResult,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

fn io_error(e: std::io::Error) -> BackendError {
    BackendError::new(format!("Terminal I/O failed: {}", e))
}

async fn prompt(input: &mut Input, text: &str) -> TaleweaverResult<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await.map_err(io_error)?;
    stdout.flush().await.map_err(io_error)?;
    let line = input.next_line().await.map_err(io_error)?;
    Ok(line.map(|l| l.trim().to_string()))
}

fn print_scene(state: &StoryState) {
    println!();
    println!(
        "=== Chapter {} ({}, tension {}/10, {:.0}% told) ===",
        state.chapter, state.mood, state.tension_level, state.story_progress
    );
    println!();
    println!("{}", state.current_scene);
    println!();
}

fn print_choices(choices: &[Choice]) {
    for (index, choice) in choices.iter().enumerate() {
        println!("  {}. {} - {}", index + 1, choice.text, choice.description);
    }
    println!("  s. Save a snapshot    q. Save and quit");
}

/// Start a new story, save it, and continue into the play loop.
#[tracing::instrument(skip_all, fields(genre = %args.genre))]
pub async fn new_story(config: &TaleweaverConfig, args: NewStoryArgs) -> TaleweaverResult<()> {
    let store = config.context_store()?;
    let engine = config.story_engine();
    let mut session = config.session();

    let story_config = StoryConfig {
        genre: Genre::from_label(&args.genre),
        protagonist: args.protagonist,
        setting: args.setting,
        special_requirements: args.requirements.filter(|r| !r.trim().is_empty()),
        style: args.style.filter(|s| !s.trim().is_empty()),
        length: args.length.into(),
    };

    let generated = engine
        .generate_initial_story(&mut session, &story_config, args.advanced)
        .await;
    if generated.source == ContentSource::Fallback {
        println!("(No model answered, so this story is told from built-in templates.)");
    }

    let options = SaveOptions {
        is_auto_save: args.title.is_none(),
        title: args.title,
        ..SaveOptions::default()
    };
    let id = store
        .save(&generated.state, session.history.messages(), &session.model_config, options)
        .await?;
    println!("Saved as {}", id);

    if args.no_play {
        print_scene(&generated.state);
        return Ok(());
    }

    PlayLoop::new(&engine, &store, session, 0)
        .run(generated.state)
        .await
}

/// Resume a saved story, by default the most recently played unfinished one.
#[tracing::instrument(skip(config))]
pub async fn play_story(config: &TaleweaverConfig, id: Option<&str>) -> TaleweaverResult<()> {
    let store = config.context_store()?;

    let report = store.cleanup_duplicates().await?;
    if !report.is_noop() {
        tracing::info!(
            promoted = report.promoted.len(),
            discarded = report.discarded.len(),
            upgraded = report.upgraded.len(),
            "Reconciled saves"
        );
    }

    let id = match id {
        Some(id) => SaveId::parse(id),
        None => {
            let latest = store
                .list()
                .await?
                .into_iter()
                .find(|summary| !summary.is_completed);
            match latest {
                Some(summary) => summary.id,
                None => {
                    println!("No unfinished story to resume. Start one with `taleweaver new`.");
                    return Ok(());
                }
            }
        }
    };

    let record = store.load(&id).await?;
    let mut model_config = record.model_config.clone();
    if model_config.api_key.is_none() && model_config.provider == config.model.provider {
        model_config.api_key = config.model_config().api_key;
    }
    let history = ConversationHistory::from_messages(record.conversation_history, config.history_cap());
    let session = StorySession::with_history(model_config, history);

    println!("Resuming \"{}\"", record.title);
    let engine = config.story_engine();
    PlayLoop::new(&engine, &store, session, record.play_time)
        .run(record.story_state)
        .await
}

struct PlayLoop<'a> {
    engine: &'a StoryEngine,
    store: &'a ContextStore,
    session: StorySession,
    play_time_base: u64,
    started: Instant,
    pending_ending: Option<EndingDecision>,
}

enum Turn {
    Advance(StoryState),
    Quit,
}

impl<'a> PlayLoop<'a> {
    fn new(engine: &'a StoryEngine, store: &'a ContextStore, session: StorySession, play_time_base: u64) -> Self {
        Self {
            engine,
            store,
            session,
            play_time_base,
            started: Instant::now(),
            pending_ending: None,
        }
    }

    fn play_time(&self) -> u64 {
        self.play_time_base + self.started.elapsed().as_secs()
    }

    async fn autosave(&self, state: &StoryState) -> TaleweaverResult<SaveId> {
        let options = SaveOptions {
            play_time: Some(self.play_time()),
            ..SaveOptions::auto()
        };
        self.store
            .save(state, self.session.history.messages(), &self.session.model_config, options)
            .await
    }

    async fn run(mut self, mut state: StoryState) -> TaleweaverResult<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print_scene(&state);
            if state.is_completed {
                let ending = state
                    .completion_type
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "neutral".to_string());
                println!("~ The End ({}) ~", ending);
                if !state.achievements.is_empty() {
                    println!("Achievements: {}", state.achievements.join(", "));
                }
                self.autosave(&state).await?;
                return Ok(());
            }

            if let Some(decision) = self.pending_ending.take() {
                println!("This tale feels ready to close: {}.", decision.reason);
                let answer = prompt(&mut input, "End the story now? [y/N] ").await?;
                if answer.is_some_and(|a| a.eq_ignore_ascii_case("y")) {
                    let completion = decision.suggested_type.unwrap_or(CompletionType::Neutral);
                    state = self
                        .engine
                        .generate_story_ending(&mut self.session, &state, completion)
                        .await
                        .state;
                    continue;
                }
            }

            match self.turn(&mut input, &state).await? {
                Turn::Advance(next) => state = next,
                Turn::Quit => {
                    let id = self.autosave(&state).await?;
                    println!("Saved as {}. Until next time.", id);
                    return Ok(());
                }
            }
        }
    }

    async fn turn(&mut self, input: &mut Input, state: &StoryState) -> TaleweaverResult<Turn> {
        let batch = loop {
            let outcome = self
                .engine
                .generate_choices(&self.session, &state.current_scene, &state.characters, state)
                .await;
            match outcome {
                GenerationOutcome::Ready(batch) => break batch,
                GenerationOutcome::Stuck { elapsed } => {
                    println!("The storyteller has been silent for {}s.", elapsed.as_secs());
                    match prompt(input, "Retry? [Y/n] ").await? {
                        Some(answer) if answer.eq_ignore_ascii_case("n") => return Ok(Turn::Quit),
                        None => return Ok(Turn::Quit),
                        Some(_) => continue,
                    }
                }
            }
        };

        loop {
            print_choices(&batch.choices);
            let Some(answer) = prompt(input, "> ").await? else {
                return Ok(Turn::Quit);
            };

            match answer.to_lowercase().as_str() {
                "q" | "quit" => return Ok(Turn::Quit),
                "s" | "save" => {
                    let id = self
                        .store
                        .save_progress(
                            state,
                            self.session.history.messages(),
                            &self.session.model_config,
                            SaveProgressOptions {
                                create_snapshot: true,
                                title: None,
                            },
                        )
                        .await?;
                    println!("Snapshot saved as {}", id);
                    continue;
                }
                _ => {}
            }

            let Some(choice) = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| batch.choices.get(i))
            else {
                println!("Pick a number between 1 and {}.", batch.choices.len());
                continue;
            };

            match self.engine.generate_next_chapter(&mut self.session, state, choice).await {
                GenerationOutcome::Stuck { elapsed } => {
                    println!(
                        "The storyteller has been silent for {}s. Your choice was not applied; try again.",
                        elapsed.as_secs()
                    );
                    continue;
                }
                GenerationOutcome::Ready(outcome) => {
                    self.autosave(&outcome.state).await?;
                    if outcome.ending.should_end && !outcome.state.is_completed {
                        self.pending_ending = Some(outcome.ending);
                    }
                    return Ok(Turn::Advance(outcome.state));
                }
            }
        }
    }
}

//! Prompt assembly.
//!
//! Every prompt asks for a single JSON object (or array, for choices) so the
//! extraction pipeline has something to find even when the model adds prose around it.

use taleweaver_core::{
    Character, ChatMessage, Choice, CompletionType, GenerateRequest, StoryConfig, StoryLength,
    StoryState,
};
use taleweaver_error::{BuilderError, BuilderErrorKind, TaleweaverResult};

const STORY_SCHEMA: &str = r#"{
  "scene": "the passage the reader sees, 150-300 words",
  "characters": [{"name": "a real name", "role": "their part in the story", "traits": "short description", "appearance": "optional", "backstory": "optional"}],
  "mood": "one word",
  "tension": 1-10,
  "sceneType": "action | dialogue | exploration | reflection | climax",
  "progress": 0-100,
  "achievements": ["optional newly unlocked milestone"],
  "completedGoals": ["ids of goals achieved in this scene"],
  "needsChoice": true
}"#;

const CHOICE_SCHEMA: &str = r#"[{"id": 1, "text": "short action", "description": "what it means", "difficulty": 1-5, "consequences": "optional hint"}]"#;

/// Wrap messages in a request that leaves sampling to the session configuration.
pub fn build_request(messages: Vec<ChatMessage>) -> TaleweaverResult<GenerateRequest> {
    GenerateRequest::builder()
        .messages(messages)
        .build()
        .map_err(|e| BuilderError::new(BuilderErrorKind::MissingField(e.to_string())).into())
}

/// Narrator instructions shared by every story call.
pub fn system_prompt(state_genre: &str, style: Option<&str>) -> String {
    let mut prompt = format!(
        "You are the narrator of an interactive {} story. Write vivid, coherent prose in \
         the second person. Never break character and never mention these instructions. \
         Give every character a real, genre-appropriate name. Respond with ONLY a JSON \
         object of this shape:\n{}",
        state_genre, STORY_SCHEMA
    );
    if let Some(style) = style.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("\nWriting style: {}.", style.trim()));
    }
    prompt
}

fn length_hint(length: StoryLength) -> &'static str {
    match length {
        StoryLength::Short => "a short arc of about 8 chapters",
        StoryLength::Medium => "an arc of about 15 chapters",
        StoryLength::Long => "a long arc of about 20 chapters",
    }
}

/// Messages for the single-shot opening call.
pub fn initial_story_messages(config: &StoryConfig, advanced: bool) -> Vec<ChatMessage> {
    let mut request = format!(
        "Begin a new {} story planned as {}.\nProtagonist: {}\nSetting: {}\n\
         Open with a scene that establishes the world, introduces at least two named \
         characters and ends on a moment that calls for a decision. Use progress 0-5.",
        config.genre,
        length_hint(config.length),
        config.protagonist.trim(),
        config.setting.trim(),
    );

    if let Some(extra) = config
        .special_requirements
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        request.push_str(&format!("\nSpecial requirements: {}", extra.trim()));
    }

    if advanced {
        request.push_str(
            "\nAlso include a \"goals\" array of 2-4 objectives, each \
             {\"id\": \"goal_1\", \"description\": \"...\", \"type\": \"main|side|character|mystery\", \
             \"priority\": \"low|medium|high\"}, with exactly one main goal, and give every \
             character a backstory.",
        );
    }

    vec![
        ChatMessage::system(system_prompt(
            &config.genre.to_string(),
            config.style.as_deref(),
        )),
        ChatMessage::user(request),
    ]
}

fn cast_summary(characters: &[Character]) -> String {
    if characters.is_empty() {
        return "none yet".to_string();
    }
    characters
        .iter()
        .map(|c| format!("{} ({})", c.name, c.role))
        .collect::<Vec<_>>()
        .join(", ")
}

fn goal_summary(state: &StoryState) -> Option<String> {
    let goals = state.story_goals.as_ref().filter(|g| !g.is_empty())?;
    Some(
        goals
            .iter()
            .map(|g| format!("[{}] {} ({:?})", g.id, g.description, g.status))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// User turn asking for the next chapter after a choice.
pub fn next_chapter_prompt(state: &StoryState, choice: &Choice) -> String {
    let mut prompt = format!(
        "Chapter {} ends. The reader chose: \"{}\" ({}; difficulty {}/5).\n\
         Write chapter {}. Current mood: {}, tension {}/10, progress {:.0}/100.\n\
         Cast so far: {}.\n\
         Continue from the previous scene, show the consequences of the choice, \
         keep existing characters consistent, and raise progress by 3-8 points.",
        state.chapter,
        choice.text,
        choice.description,
        choice.difficulty,
        state.chapter + 1,
        if state.mood.is_empty() { "neutral" } else { state.mood.as_str() },
        state.tension_level,
        state.story_progress,
        cast_summary(&state.characters),
    );
    if let Some(goals) = goal_summary(state) {
        prompt.push_str(&format!("\nOpen goals: {}", goals));
    }
    prompt
}

/// Messages asking for a batch of choices.
pub fn choice_messages(
    scene: &str,
    characters: &[Character],
    state: &StoryState,
    target: usize,
) -> Vec<ChatMessage> {
    let recent = state.recent_choices(3).join(" | ");
    vec![
        ChatMessage::system(format!(
            "You design the decisions of an interactive {} story. Respond with ONLY a JSON \
             array of exactly {} choices shaped like:\n{}",
            state.genre, target, CHOICE_SCHEMA
        )),
        ChatMessage::user(format!(
            "Scene:\n{}\n\nCharacters: {}\nChapter {}, mood {}, tension {}/10.\n\
             Recent decisions: {}\n\
             Offer {} distinct choices that differ in risk and approach.",
            scene.trim(),
            cast_summary(characters),
            state.chapter,
            if state.mood.is_empty() { "neutral" } else { state.mood.as_str() },
            state.tension_level,
            if recent.is_empty() { "none" } else { recent.as_str() },
            target,
        )),
    ]
}

fn ending_direction(completion_type: CompletionType) -> &'static str {
    match completion_type {
        CompletionType::Success => {
            "a triumphant resolution where the central goal is achieved and loose threads are tied"
        }
        CompletionType::Failure => {
            "a bittersweet defeat where the goal slips away but the characters endure"
        }
        CompletionType::Neutral => {
            "a quiet, reflective close where the journey matters more than the outcome"
        }
        CompletionType::Cliffhanger => {
            "an open ending that resolves this arc but reveals a new mystery on the horizon"
        }
    }
}

/// Messages for the closing chapter.
pub fn ending_messages(state: &StoryState, completion_type: CompletionType) -> Vec<ChatMessage> {
    let journey = state.recent_choices(5).join(" | ");
    vec![
        ChatMessage::system(system_prompt(&state.genre.to_string(), None)),
        ChatMessage::user(format!(
            "Write the final chapter of this story: {}.\n\
             Previous scene:\n{}\n\nCast: {}\nKey decisions: {}\n\
             Set \"needsChoice\" to false and \"progress\" to 100.",
            ending_direction(completion_type),
            state.current_scene.trim(),
            cast_summary(&state.characters),
            if journey.is_empty() { "none" } else { journey.as_str() },
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleweaver_core::{Genre, Role};

    #[test]
    fn test_initial_messages_mention_config() {
        let mut config = StoryConfig::new(Genre::Mystery, "Inspector Vale", "fog-bound London");
        config.special_requirements = Some("no magic".to_string());

        let messages = initial_story_messages(&config, true);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("mystery"));
        assert!(messages[1].content.contains("Inspector Vale"));
        assert!(messages[1].content.contains("no magic"));
        assert!(messages[1].content.contains("\"goals\""));

        let plain = initial_story_messages(&config, false);
        assert!(!plain[1].content.contains("\"goals\""));
    }

    #[test]
    fn test_choice_prompt_requests_target_count() {
        let state = StoryState::new("s", Genre::Fantasy);
        let messages = choice_messages("A bridge.", &[], &state, 4);
        assert!(messages[0].content.contains("exactly 4 choices"));
        assert!(messages[1].content.contains("A bridge."));
    }
}

//! Deterministic content used when the model is unavailable or unusable.
//!
//! Every function here is total and template-driven: the same inputs always produce
//! the same story data.

use taleweaver_core::{
    Character, Choice, CompletionType, Genre, GoalPriority, GoalType, SceneType, StoryConfig,
    StoryGoal, StoryState,
};

struct GenreTemplate {
    opening: &'static str,
    mood: &'static str,
    tension: u8,
    cast: [(&'static str, &'static str); 2],
    beats: [&'static str; 3],
    main_goal: &'static str,
    side_goal: &'static str,
    names: [&'static str; 8],
}

fn template(genre: Genre) -> &'static GenreTemplate {
    match genre {
        Genre::Fantasy => &FANTASY,
        Genre::SciFi => &SCI_FI,
        Genre::Mystery => &MYSTERY,
        Genre::Romance => &ROMANCE,
        Genre::Thriller => &THRILLER,
        Genre::Historical => &HISTORICAL,
        Genre::Adventure => &ADVENTURE,
    }
}

static FANTASY: GenreTemplate = GenreTemplate {
    opening: "Mist curls between the ancient stones of {setting} as {protagonist} steps onto \
              the old road. A raven circles overhead, and somewhere beyond the hills a bell \
              tolls for the first time in a hundred years. The village elders say it rings \
              only when the old wards are failing. Now every eye has turned to {protagonist}.",
    mood: "mysterious",
    tension: 4,
    cast: [("Elowen Ashgrove", "mentor"), ("Garrick Thorne", "wary ally")],
    beats: [
        "Runes flare along the path, answering a power older than the kingdom itself.",
        "A hooded stranger watches from the treeline, then vanishes into the fog.",
        "The wind carries the scent of smoke and the distant beat of great wings.",
    ],
    main_goal: "Discover why the ancient bell has begun to ring",
    side_goal: "Earn the trust of the wary villagers",
    names: [
        "Elowen Ashgrove", "Garrick Thorne", "Seren Vale", "Tamsin Reed", "Aldric Moor",
        "Isolde Fenn", "Corwin Blackwood", "Maelis Dunmore",
    ],
};

static SCI_FI: GenreTemplate = GenreTemplate {
    opening: "Warning lights pulse across the bridge as {protagonist} wakes from cryosleep \
              above {setting}. The ship's AI reports a signal that should not exist, repeating \
              on a frequency abandoned two centuries ago. Half the crew is still frozen, and \
              the navigation logs for the last six months have been wiped clean.",
    mood: "tense",
    tension: 6,
    cast: [("Dr. Mara Okafor", "chief scientist"), ("Kade Renner", "pilot")],
    beats: [
        "Static floods the comms, and beneath it a voice repeats coordinates no one recognises.",
        "A sensor sweep reveals a second heat signature aboard where none should be.",
        "The reactor hum shifts pitch, and every console flickers at once.",
    ],
    main_goal: "Trace the impossible signal to its source",
    side_goal: "Restore the missing navigation logs",
    names: [
        "Mara Okafor", "Kade Renner", "Juno Vasquez", "Tobias Lin", "Anya Petrova",
        "Rhys Calder", "Imani Sato", "Orin Halvorsen",
    ],
};

static MYSTERY: GenreTemplate = GenreTemplate {
    opening: "Rain streaks the windows of {setting} as {protagonist} studies the note left on \
              the desk: three words, no signature, and a key that fits no lock in the building. \
              By morning the caretaker is missing and the police have already decided it was \
              an accident. {protagonist} is not so sure.",
    mood: "suspenseful",
    tension: 5,
    cast: [("Inspector Hollis Grey", "reluctant ally"), ("Agnes Whitlow", "nervous witness")],
    beats: [
        "A second note appears, written in the same careful hand.",
        "Someone has been through the files, and they did not bother to hide it.",
        "The key turns out to fit a door that was bricked over decades ago.",
    ],
    main_goal: "Uncover what happened to the missing caretaker",
    side_goal: "Find the lock that the mysterious key opens",
    names: [
        "Hollis Grey", "Agnes Whitlow", "Edmund Pryce", "Clara Voss", "Felix Marlowe",
        "Rosalind Hale", "Victor Crane", "Nora Ashby",
    ],
};

static ROMANCE: GenreTemplate = GenreTemplate {
    opening: "Lanterns sway above the crowded square of {setting} as {protagonist} collides \
              with a stranger and sends a basket of letters scattering across the cobbles. \
              One of them bears {protagonist}'s own name, in handwriting that feels strangely \
              familiar.",
    mood: "hopeful",
    tension: 3,
    cast: [("Julian Ashford", "the stranger"), ("Rosa Bellamy", "loyal friend")],
    beats: [
        "A shared glance lingers a moment longer than it should.",
        "An old letter surfaces, its ink faded but its words still burning.",
        "Music drifts from an open window, and the evening feels full of possibility.",
    ],
    main_goal: "Learn who wrote the letter and why",
    side_goal: "Keep a promise made to an old friend",
    names: [
        "Julian Ashford", "Rosa Bellamy", "Theo Marchetti", "Lena Hartley", "Adrian Cole",
        "Sofia Lind", "Gabriel Moreau", "Clara Whitmore",
    ],
};

static THRILLER: GenreTemplate = GenreTemplate {
    opening: "The phone rings once at 3 a.m. and {protagonist} answers to silence, then a \
              single sentence: they know what you found in {setting}. Outside, a car idles with \
              its headlights off. The drive with the files is still in {protagonist}'s pocket.",
    mood: "tense",
    tension: 7,
    cast: [("Nadia Kerr", "former handler"), ("Marcus Vale", "unknown pursuer")],
    beats: [
        "Footsteps echo a beat behind, stopping whenever you stop.",
        "A message arrives from a number that was disconnected years ago.",
        "The safe house is not as empty as it should be.",
    ],
    main_goal: "Expose the people hunting the stolen files",
    side_goal: "Find out who can still be trusted",
    names: [
        "Nadia Kerr", "Marcus Vale", "Daniel Reyes", "Elena Brandt", "Victor Hale",
        "Sasha Morrow", "Owen Pike", "Lydia Crane",
    ],
};

static HISTORICAL: GenreTemplate = GenreTemplate {
    opening: "Drums sound from the walls of {setting} as {protagonist} arrives with a sealed \
              letter meant for the governor's hands alone. The city is restless, the harvest \
              has failed, and rumours of rebellion pass from tavern to tavern faster than any \
              rider.",
    mood: "uneasy",
    tension: 5,
    cast: [("Lady Catherine Ashby", "noble patron"), ("Thomas Wren", "street-wise scribe")],
    beats: [
        "A proclamation is nailed to the church door, and the crowd grows angry.",
        "A messenger arrives breathless, carrying news from the frontier.",
        "The great hall falls silent as an unexpected guest is announced.",
    ],
    main_goal: "Deliver the sealed letter before the city erupts",
    side_goal: "Learn who stands behind the rumours of rebellion",
    names: [
        "Catherine Ashby", "Thomas Wren", "Eleanor Vance", "William Hale", "Margaret Lyle",
        "Henry Caldwell", "Beatrice Moore", "Edward Thorne",
    ],
};

static ADVENTURE: GenreTemplate = GenreTemplate {
    opening: "Sun beats down on the harbour of {setting} as {protagonist} unrolls a map that \
              should not exist, its coastline drawn in a hand three centuries old. A captain \
              with a scarred smile offers passage, for a share of whatever lies at the X.",
    mood: "adventurous",
    tension: 4,
    cast: [("Captain Ines Marlowe", "ship's captain"), ("Pip Calloway", "eager deckhand")],
    beats: [
        "The horizon darkens with an approaching storm.",
        "A rival crew's sails appear on the horizon, closing fast.",
        "The map reveals a hidden mark when held to the lantern light.",
    ],
    main_goal: "Find what the old map leads to",
    side_goal: "Keep the crew together through the voyage",
    names: [
        "Ines Marlowe", "Pip Calloway", "Rafael Ortega", "Willa Finch", "Jonah Creed",
        "Amara Quinn", "Silas Dunne", "Tess Harrow",
    ],
};

fn fill(text: &str, protagonist: &str, setting: &str) -> String {
    text.replace("{protagonist}", protagonist)
        .replace("{setting}", setting)
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { default } else { trimmed }
}

/// Template-driven stand-in for the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackContentGenerator;

impl FallbackContentGenerator {
    /// Create a generator.
    pub fn new() -> Self {
        Self
    }

    /// Opening state for a new story.
    pub fn initial_story(&self, config: &StoryConfig) -> StoryState {
        let template = template(config.genre);
        let protagonist = or_default(&config.protagonist, "the traveller");
        let setting = or_default(&config.setting, "a land at the edge of the map");

        let mut state = StoryState::with_generated_id(config.genre);
        state.current_scene = fill(template.opening, protagonist, setting);
        state.characters = std::iter::once(Character::new(
            protagonist,
            "protagonist",
            "determined and curious",
        ))
        .chain(
            template
                .cast
                .iter()
                .map(|(name, role)| Character::new(*name, *role, "keeps their own counsel")),
        )
        .collect();
        state.mood = template.mood.to_string();
        state.tension_level = template.tension;
        state.scene_type = SceneType::Exploration;
        state.story_progress = 0.0;
        state.story_goals = Some(vec![
            StoryGoal::new("goal_1", template.main_goal, GoalType::Main, GoalPriority::High),
            StoryGoal::new("goal_2", template.side_goal, GoalType::Side, GoalPriority::Medium),
        ]);

        tracing::debug!(genre = %config.genre, story_id = %state.story_id, "Built fallback opening");
        state
    }

    /// The state after taking `choice`.
    pub fn next_chapter(&self, state: &StoryState, choice: &Choice) -> StoryState {
        let template = template(state.genre);
        let prefix = match choice.difficulty {
            1 | 2 => "You proceed with care.",
            3 => "You commit to your decision.",
            _ => "You throw caution aside.",
        };
        let beat = template.beats[state.chapter as usize % template.beats.len()];

        let mut next = state.clone();
        next.chapter = state.chapter + 1;
        next.choices_made.push(choice.text.clone());
        let description = choice.description.trim().trim_end_matches('.');
        next.current_scene = if description.is_empty() {
            format!(
                "{} You choose to {}. {}",
                prefix,
                lowercase_first(choice.text.trim().trim_end_matches('.')),
                beat
            )
        } else {
            format!(
                "{} You choose to {}. {}. {}",
                prefix,
                lowercase_first(choice.text.trim().trim_end_matches('.')),
                description,
                beat
            )
        };
        next.tension_level = match choice.difficulty {
            4 | 5 => state.tension_level.saturating_add(1).min(10),
            1 | 2 => state.tension_level.saturating_sub(1).max(1),
            _ => state.tension_level,
        };
        next.scene_type = match choice.difficulty {
            4 | 5 => SceneType::Action,
            1 => SceneType::Reflection,
            _ => SceneType::Exploration,
        };
        next.advance_progress(state.story_progress + 5.0 + f32::from(choice.difficulty));
        next.needs_choice = true;
        next
    }

    /// The closing state for a story.
    pub fn ending(&self, state: &StoryState, completion_type: CompletionType) -> StoryState {
        let hero = state
            .characters
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or("you");
        let scene = match completion_type {
            CompletionType::Success => format!(
                "Against every odd, {} sees it through. The long road ends in light, old debts \
                 are settled, and the people who stood beside you will tell this story for years.",
                hero
            ),
            CompletionType::Failure => format!(
                "It is not enough. {} watches the last chance slip away, yet survives to carry \
                 the lesson forward. Some stories end in loss, and this one leaves its mark.",
                hero
            ),
            CompletionType::Neutral => format!(
                "The journey winds down quietly. {} looks back over the road travelled, not \
                 everything is resolved, but what was learned along the way will endure.",
                hero
            ),
            CompletionType::Cliffhanger => format!(
                "Just as the dust settles, {} notices something that changes everything: a \
                 sign that this was only the beginning. The next chapter waits in the dark.",
                hero
            ),
        };

        let mut ended = state.clone();
        ended.current_scene = scene;
        ended.is_completed = true;
        ended.completion_type = Some(completion_type);
        ended.needs_choice = false;
        ended.scene_type = SceneType::Climax;
        ended.advance_progress(100.0);
        ended.mood = match completion_type {
            CompletionType::Success => "triumphant",
            CompletionType::Failure => "somber",
            CompletionType::Neutral => "reflective",
            CompletionType::Cliffhanger => "suspenseful",
        }
        .to_string();
        ended
    }

    /// A genre-appropriate name, cycling through the genre's list.
    pub fn replacement_name(&self, genre: Genre, index: usize) -> String {
        let names = &template(genre).names;
        let base = names[index % names.len()];
        match index / names.len() {
            0 => base.to_string(),
            round => format!("{} {}", base, roman(round + 1)),
        }
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn roman(n: usize) -> &'static str {
    match n {
        2 => "II",
        3 => "III",
        4 => "IV",
        5 => "V",
        _ => "the Younger",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_story_uses_config() {
        let config = StoryConfig::new(Genre::Fantasy, "Aria", "the Sunken Vale");
        let state = FallbackContentGenerator::new().initial_story(&config);

        assert!(state.current_scene.contains("Aria"));
        assert!(state.current_scene.contains("the Sunken Vale"));
        assert_eq!(state.characters[0].name, "Aria");
        assert_eq!(state.characters.len(), 3);
        assert_eq!(state.genre, Genre::Fantasy);
        assert_eq!(state.chapter, 1);
        assert_eq!(state.story_goals.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_blank_config_still_complete() {
        let config = StoryConfig::new(Genre::SciFi, "  ", "");
        let state = FallbackContentGenerator::new().initial_story(&config);
        assert!(!state.current_scene.contains("{protagonist}"));
        assert!(state.characters.iter().all(|c| !c.name.trim().is_empty()));
    }

    #[test]
    fn test_next_chapter_tiers() {
        let generator = FallbackContentGenerator::new();
        let config = StoryConfig::new(Genre::Mystery, "Vale", "the archive");
        let state = generator.initial_story(&config);

        let bold = generator.next_chapter(&state, &Choice::new(1, "Kick the door in", "Loudly", 5));
        assert_eq!(bold.chapter, 2);
        assert_eq!(bold.tension_level, state.tension_level + 1);
        assert!(bold.current_scene.starts_with("You throw caution aside."));
        assert_eq!(bold.choices_made, vec!["Kick the door in".to_string()]);
        assert_eq!(bold.story_progress, 10.0);

        let careful = generator.next_chapter(&state, &Choice::new(2, "Listen", "Quietly", 1));
        assert_eq!(careful.tension_level, state.tension_level - 1);
        assert!(careful.current_scene.contains("You choose to listen. Quietly."));
    }

    #[test]
    fn test_ending_marks_completed() {
        let generator = FallbackContentGenerator::new();
        let state = generator.initial_story(&StoryConfig::new(Genre::Romance, "June", "Lisbon"));
        let ended = generator.ending(&state, CompletionType::Failure);

        assert!(ended.is_completed);
        assert_eq!(ended.completion_type, Some(CompletionType::Failure));
        assert!(!ended.needs_choice);
        assert_eq!(ended.story_progress, 100.0);
        assert!(ended.current_scene.contains("June"));
    }

    #[test]
    fn test_replacement_names_cycle() {
        let generator = FallbackContentGenerator::new();
        assert_eq!(generator.replacement_name(Genre::SciFi, 0), "Mara Okafor");
        assert_eq!(generator.replacement_name(Genre::SciFi, 8), "Mara Okafor II");
        assert_ne!(
            generator.replacement_name(Genre::Fantasy, 1),
            generator.replacement_name(Genre::Fantasy, 2)
        );
    }
}

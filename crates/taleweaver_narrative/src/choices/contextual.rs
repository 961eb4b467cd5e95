//! Choices derived from cues in the scene text.

use crate::keywords::Keywords;
use std::sync::LazyLock;
use taleweaver_core::{Character, Choice, RandomSource, shuffle};

/// The scene feature a contextual template responds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCue {
    /// Threats, weapons, pursuit
    Danger,
    /// Spells, artifacts, rituals
    Magic,
    /// A named character is present in the scene
    Character(String),
    /// Secrets and clues
    Mystery,
    /// Paths, doors, uncharted ground
    Exploration,
    /// A settlement or landmark
    Location,
}

const DANGER: &[&str] = &[
    "danger", "enemy", "enemies", "attack", "threat", "monster", "blood", "weapon", "ambush",
    "fight", "trap", "hunted", "scream",
];
const MAGIC: &[&str] = &[
    "magic", "spell", "rune", "enchant", "enchanted", "enchantment", "arcane", "potion",
    "sorcerer", "sorceress", "sorcery", "ritual", "wand", "amulet",
];
const MYSTERY: &[&str] = &[
    "mystery", "clue", "secret", "strange", "hidden", "puzzle", "riddle", "whisper", "missing",
];
const EXPLORATION: &[&str] = &[
    "path", "door", "corridor", "forest", "cave", "passage", "road", "map", "tunnel", "stairs",
];
const LOCATION: &[&str] = &[
    "village", "city", "town", "castle", "temple", "tavern", "market", "ship", "station",
    "house", "palace",
];

static DANGER_CUES: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(DANGER));
static MAGIC_CUES: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(MAGIC));
static MYSTERY_CUES: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(MYSTERY));
static EXPLORATION_CUES: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(EXPLORATION));
static LOCATION_CUES: LazyLock<Keywords> = LazyLock::new(|| Keywords::new(LOCATION));

/// The highest-precedence cue in the scene: danger, magic, a character's name, mystery,
/// exploration, then location.
pub fn detect_cue(scene: &str, characters: &[Character]) -> Option<SceneCue> {
    if DANGER_CUES.is_match(scene) {
        return Some(SceneCue::Danger);
    }
    if MAGIC_CUES.is_match(scene) {
        return Some(SceneCue::Magic);
    }
    if let Some(character) = characters.iter().find(|c| {
        let name = c.name.trim();
        name.chars().count() >= 2 && Keywords::new(&[name]).is_match(scene)
    }) {
        return Some(SceneCue::Character(character.name.trim().to_string()));
    }
    if MYSTERY_CUES.is_match(scene) {
        return Some(SceneCue::Mystery);
    }
    if EXPLORATION_CUES.is_match(scene) {
        return Some(SceneCue::Exploration);
    }
    if LOCATION_CUES.is_match(scene) {
        return Some(SceneCue::Location);
    }
    None
}

type Template = (String, String, u8);

fn owned(items: &[(&str, &str, u8)]) -> Vec<Template> {
    items
        .iter()
        .map(|(t, d, k)| (t.to_string(), d.to_string(), *k))
        .collect()
}

fn template(cue: &SceneCue) -> Vec<Template> {
    match cue {
        SceneCue::Danger => owned(&[
            ("Stand and fight", "Meet the threat head-on before it grows", 4),
            ("Find cover and watch", "Stay hidden and learn what you are facing", 2),
            ("Create a distraction", "Turn the danger against itself", 3),
            ("Retreat to safer ground", "Live to face this another day", 2),
        ]),
        SceneCue::Magic => owned(&[
            ("Study the magic", "Look closely at how the power works", 2),
            ("Channel the power", "Reach out and try to wield it yourself", 4),
            ("Seek someone who understands it", "Find a guide before meddling further", 1),
            ("Break the enchantment", "End the spell, whatever it costs", 5),
        ]),
        SceneCue::Character(name) => vec![
            (
                format!("Talk with {}", name),
                format!("Ask {} what they know and what they want", name),
                1,
            ),
            (
                format!("Ask {} for help", name),
                format!("Trust {} with part of the burden", name),
                2,
            ),
            (
                format!("Keep an eye on {}", name),
                format!("Something about {} does not add up", name),
                3,
            ),
        ],
        SceneCue::Mystery => owned(&[
            ("Examine the clues", "Piece together what the details reveal", 2),
            ("Follow the strongest lead", "Act on your best guess before it goes cold", 3),
            ("Question a witness", "Someone nearby knows more than they say", 2),
        ]),
        SceneCue::Exploration => owned(&[
            ("Take the unexplored path", "See where the unknown way leads", 3),
            ("Scout ahead carefully", "Move slowly and map what you find", 2),
            ("Search the surroundings", "Look for anything useful before moving on", 1),
        ]),
        SceneCue::Location => owned(&[
            ("Look around the area", "Get a feel for the place and its people", 1),
            ("Ask the locals", "Gather rumours from those who live here", 2),
            ("Find somewhere to regroup", "Rest and plan the next move", 1),
        ]),
    }
}

const EXTRAS: &[(&str, &str, u8)] = &[
    ("Wait and observe", "Let events unfold a little before acting", 1),
    ("Trust your instincts", "Act on the feeling you cannot quite name", 3),
    ("Take a bold risk", "Gamble on a daring move", 5),
    ("Consider the options", "Weigh what you know before committing", 1),
    ("Look for another way", "There may be a path nobody has noticed", 3),
    ("Rally your companions", "Bring everyone together before the next step", 2),
];

/// Choices built from the scene's strongest cue, sized to `target`.
///
/// Returns `None` when the scene has no recognisable cue.
pub fn contextual_choices(
    scene: &str,
    characters: &[Character],
    target: usize,
    random: &dyn RandomSource,
) -> Option<Vec<Choice>> {
    let cue = detect_cue(scene, characters)?;
    tracing::debug!(?cue, "Building contextual choices");

    let mut items = template(&cue);
    if items.len() < target {
        let mut extras = owned(EXTRAS);
        shuffle(&mut extras, random);
        for extra in extras {
            if items.len() >= target {
                break;
            }
            if !items.iter().any(|(text, _, _)| text == &extra.0) {
                items.push(extra);
            }
        }
    }
    items.truncate(target);

    Some(
        items
            .into_iter()
            .enumerate()
            .map(|(i, (text, description, difficulty))| {
                Choice::new(i as u32 + 1, text, description, difficulty)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleweaver_core::SeededRandom;

    #[test]
    fn test_cue_precedence() {
        let cast = vec![Character::new("Mira", "guide", "wry")];

        assert_eq!(
            detect_cue("Mira draws a weapon as the rune glows", &cast),
            Some(SceneCue::Danger)
        );
        assert_eq!(
            detect_cue("Mira traces a rune in the dust", &cast),
            Some(SceneCue::Magic)
        );
        assert_eq!(
            detect_cue("Mira studies a secret door", &cast),
            Some(SceneCue::Character("Mira".to_string()))
        );
        assert_eq!(
            detect_cue("A secret door in the tavern", &cast),
            Some(SceneCue::Mystery)
        );
        assert_eq!(detect_cue("A door in the tavern", &cast), Some(SceneCue::Exploration));
        assert_eq!(detect_cue("The tavern is warm", &cast), Some(SceneCue::Location));
        assert_eq!(detect_cue("Nothing at all", &cast), None);
    }

    #[test]
    fn test_cues_need_whole_words() {
        let cast = vec![Character::new("Al", "porter", "gruff")];

        assert_eq!(
            detect_cue("All the towns folk gather, a pathos in their faces", &cast),
            Some(SceneCue::Location)
        );
        assert_eq!(
            detect_cue("Everyone has fought in the roadside ditch before", &cast),
            None
        );
        assert_eq!(
            detect_cue("Al waves from the cart", &cast),
            Some(SceneCue::Character("Al".to_string()))
        );
        assert_eq!(detect_cue("The sorcerer waits", &cast), Some(SceneCue::Magic));
    }

    #[test]
    fn test_padded_to_target_with_sequential_ids() {
        let random = SeededRandom::new(5);
        let choices = contextual_choices("A secret waits", &[], 5, &random).unwrap();

        assert_eq!(choices.len(), 5);
        assert_eq!(choices[0].text, "Examine the clues");
        let ids: Vec<_> = choices.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        let mut texts: Vec<_> = choices.iter().map(|c| c.text.clone()).collect();
        texts.dedup();
        assert_eq!(texts.len(), 5);
    }

    #[test]
    fn test_truncated_to_target() {
        let random = SeededRandom::new(5);
        let choices = contextual_choices("An ambush!", &[], 2, &random).unwrap();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[1].id, 2);
    }

    #[test]
    fn test_character_template_uses_name() {
        let random = SeededRandom::new(1);
        let cast = vec![Character::new("Tomas Reed", "smuggler", "nervous")];
        let choices =
            contextual_choices("Tomas Reed counts his coins.", &cast, 3, &random).unwrap();
        assert_eq!(choices[0].text, "Talk with Tomas Reed");
    }
}

//! Genre-flavoured choice sets and the last-resort triple.

use crate::keywords::Keywords;
use std::sync::LazyLock;
use taleweaver_core::{Choice, Genre, RandomSource, shuffle};

type Entry = (&'static str, &'static str, u8);

/// Scene buckets in tie-break order.
const BUCKETS: &[(Genre, &[&str], &[Entry])] = &[
    (
        Genre::SciFi,
        &[
            "ship", "station", "space", "planet", "robot", "android", "laser", "console",
            "signal", "orbit", "reactor", "hologram", "colony",
        ],
        &[
            ("Scan the area", "Run a full sensor sweep before moving", 1),
            ("Hack the system", "Slip past the security layer", 3),
            ("Contact the crew", "Coordinate before anyone acts alone", 2),
            ("Reroute the power", "Divert energy where it is needed most", 4),
            ("Analyze the data", "Look for the pattern hidden in the logs", 2),
        ],
    ),
    (
        Genre::Mystery,
        &[
            "clue", "detective", "murder", "suspect", "evidence", "witness", "alibi", "crime",
            "victim", "motive", "case",
        ],
        &[
            ("Inspect the evidence", "Every detail might matter", 2),
            ("Interview a suspect", "Press them until the story cracks", 3),
            ("Revisit the scene", "Something was missed the first time", 2),
            ("Check the alibis", "Find out who was really where", 3),
            ("Set a trap for the culprit", "Let them reveal themselves", 4),
        ],
    ),
    (
        Genre::Fantasy,
        &[
            "magic", "dragon", "sword", "spell", "kingdom", "wizard", "elf", "dwarf", "castle",
            "enchanted", "prophecy", "quest", "rune",
        ],
        &[
            ("Cast a spell", "Call on the old power", 3),
            ("Consult the ancient texts", "The answer may already be written", 1),
            ("Draw your blade", "Steel settles what words cannot", 4),
            ("Seek the oracle", "Ask what fate has in store", 2),
            ("Follow the prophecy", "Trust the path laid out long ago", 3),
        ],
    ),
    (
        Genre::Romance,
        &[
            "heart", "love", "kiss", "gaze", "smile", "blush", "embrace", "dance", "letter",
            "feelings", "date",
        ],
        &[
            ("Speak from the heart", "Say what you have been holding back", 3),
            ("Share a quiet moment", "Let the silence say enough", 1),
            ("Write a letter", "Some things are easier on paper", 2),
            ("Ask for a dance", "Close the distance, one step at a time", 2),
            ("Keep your distance", "Protect your heart for now", 1),
        ],
    ),
    (
        Genre::Thriller,
        &[
            "chase", "gun", "bomb", "escape", "agent", "conspiracy", "hostage", "countdown",
            "sniper", "pursuit", "panic",
        ],
        &[
            ("Make a run for it", "Move now, think later", 4),
            ("Hide and wait", "Let them pass and regroup", 2),
            ("Call for backup", "You cannot do this alone", 2),
            ("Confront them directly", "End this face to face", 5),
            ("Follow them covertly", "Learn where they are going", 3),
        ],
    ),
    (
        Genre::Historical,
        &[
            "king", "queen", "empire", "war", "revolution", "century", "court", "noble",
            "peasant", "knight", "merchant", "soldier",
        ],
        &[
            ("Petition the court", "Seek an audience with those in power", 2),
            ("Join the cause", "Stand with those fighting for change", 4),
            ("Consult the archives", "History has answers for those who read it", 1),
            ("Forge an alliance", "Find common ground with an unlikely ally", 3),
            ("Travel to the capital", "Events there will decide everything", 3),
        ],
    ),
];

static BUCKET_KEYWORDS: LazyLock<Vec<Keywords>> = LazyLock::new(|| {
    BUCKETS
        .iter()
        .map(|(_, keywords, _)| Keywords::new(keywords))
        .collect()
});

const DEFAULT_TRIPLE: [Entry; 3] = [
    ("Press on", "Keep moving forward and see what comes next", 3),
    ("Pause and think", "Take a moment to weigh the situation", 1),
    ("Consult a companion", "Ask someone you trust for their view", 2),
];

/// The bucket with the most keyword hits in the scene, ties by bucket order.
pub fn classify_scene(scene: &str) -> Option<Genre> {
    let mut best: Option<(Genre, usize)> = None;

    for ((genre, _, _), keywords) in BUCKETS.iter().zip(BUCKET_KEYWORDS.iter()) {
        let hits = keywords.distinct_hits(scene);
        if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
            best = Some((*genre, hits));
        }
    }

    best.map(|(genre, _)| genre)
}

/// Shuffled slice of the matching genre set, or `None` when no keyword matches.
pub fn genre_choices(scene: &str, target: usize, random: &dyn RandomSource) -> Option<Vec<Choice>> {
    let genre = classify_scene(scene)?;
    let (_, _, entries) = BUCKETS.iter().find(|(g, _, _)| *g == genre)?;
    tracing::debug!(%genre, "Building genre choices");

    let mut entries = entries.to_vec();
    shuffle(&mut entries, random);
    entries.truncate(target);

    Some(numbered(&entries))
}

/// The fixed last-resort batch.
pub fn default_choices() -> Vec<Choice> {
    numbered(&DEFAULT_TRIPLE)
}

fn numbered(entries: &[Entry]) -> Vec<Choice> {
    entries
        .iter()
        .enumerate()
        .map(|(i, (text, description, difficulty))| {
            Choice::new(i as u32 + 1, *text, *description, *difficulty)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleweaver_core::SeededRandom;

    #[test]
    fn test_classification_by_hit_count() {
        assert_eq!(
            classify_scene("The dragon guards the castle gate"),
            Some(Genre::Fantasy)
        );
        assert_eq!(
            classify_scene("The detective weighs the evidence from the ship"),
            Some(Genre::Mystery)
        );
        assert_eq!(classify_scene("Rain on grey stones"), None);
    }

    #[test]
    fn test_keywords_inside_other_words_do_not_count() {
        assert_eq!(
            classify_scene("She keeps walking toward the gate, looking for answers."),
            None
        );
        assert_eq!(
            classify_scene("He climbs the staircase by himself while the hearth burns"),
            None
        );
        assert_eq!(
            classify_scene("The kings went to war"),
            Some(Genre::Historical)
        );
    }

    #[test]
    fn test_ties_follow_bucket_order() {
        // one sci-fi hit, one fantasy hit
        assert_eq!(classify_scene("A robot and a sword"), Some(Genre::SciFi));
    }

    #[test]
    fn test_genre_choices_sliced_and_numbered() {
        let random = SeededRandom::new(9);
        let choices = genre_choices("the station reactor hums", 4, &random).unwrap();
        assert_eq!(choices.len(), 4);
        assert_eq!(
            choices.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(genre_choices("quiet rain", 3, &random).is_none());
    }

    #[test]
    fn test_default_triple() {
        let choices = default_choices();
        assert_eq!(choices.len(), 3);
        assert_eq!(choices[0].text, "Press on");
        assert_eq!(choices[2].id, 3);
    }
}

//! Whole-word keyword matching for the scene and choice heuristics.

use regex::Regex;
use std::collections::HashSet;

/// A keyword list compiled into one case-insensitive alternation.
///
/// Keywords match on word boundaries, with an optional plural `s`, so `"die"` finds
/// "die" and "dies" but not "soldier".
#[derive(Debug, Clone)]
pub(crate) struct Keywords {
    pattern: Regex,
}

impl Keywords {
    pub(crate) fn new(words: &[&str]) -> Self {
        let alternation = words
            .iter()
            .map(|w| regex::escape(w.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern =
            Regex::new(&format!(r"(?i)\b(?:{})s?\b", alternation)).expect("valid regex");
        Self { pattern }
    }

    /// Whether any keyword appears in `text`.
    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Number of distinct keywords found in `text`.
    pub(crate) fn distinct_hits(&self, text: &str) -> usize {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_words_only() {
        let words = Keywords::new(&["die", "final", "rest", "give up"]);
        assert!(words.is_match("I would rather die"));
        assert!(words.is_match("The FINAL door"));
        assert!(words.is_match("Give up the chase"));
        assert!(words.is_match("Everyone dies in the end"));
        assert!(!words.is_match("Ask the soldier about the road"));
        assert!(!words.is_match("We finally arrive"));
        assert!(!words.is_match("An arrest in the forest"));
    }

    #[test]
    fn test_distinct_hits_ignore_repeats() {
        let words = Keywords::new(&["ship", "station"]);
        assert_eq!(words.distinct_hits("ship, ship, the station"), 2);
        assert_eq!(words.distinct_hits("friendship"), 0);
    }
}

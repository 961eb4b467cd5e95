//! How many choices to offer, and when to offer the ending.

use taleweaver_core::{RandomSource, StoryState};

/// Fewest regular choices in a batch.
pub const MIN_CHOICES: usize = 2;
/// Most regular choices in a batch.
pub const MAX_CHOICES: usize = 5;

const TENSE_MOODS: [&str; 3] = ["tense", "intense", "suspenseful"];
const CALM_MOODS: [&str; 2] = ["calm", "harmonious"];

/// Number of regular choices for the next batch.
///
/// Early chapters offer fewer options; high tension and tense moods widen the field,
/// calm stretches narrow it, and a small random perturbation keeps batches from feeling
/// mechanical.
pub fn target_choice_count(state: &StoryState, random: &dyn RandomSource) -> usize {
    let base_high = match state.chapter {
        0..=2 => 3,
        3..=5 => 4,
        _ => 5,
    };
    let mut count = random.range_inclusive(MIN_CHOICES as u32, base_high) as usize;

    match state.tension_level {
        t if t >= 8 => count = (count + 1).min(MAX_CHOICES),
        6 | 7 => {
            if random.chance(0.5) && count < 4 {
                count += 1;
            }
        }
        t if t <= 3 => count = count.saturating_sub(1).max(MIN_CHOICES),
        _ => {}
    }

    let mood = state.mood.to_lowercase();
    if TENSE_MOODS.iter().any(|m| mood.contains(m)) {
        count = (count + 1).min(MAX_CHOICES);
    } else if CALM_MOODS.iter().any(|m| mood.contains(m)) {
        count = count.saturating_sub(1).max(MIN_CHOICES);
    }

    if random.chance(0.15) {
        count += 1;
    } else if random.chance(0.15) {
        count = count.saturating_sub(1);
    }

    count.clamp(MIN_CHOICES, MAX_CHOICES)
}

/// Progress estimate that also credits long stories for their length.
pub fn effective_progress(state: &StoryState) -> f32 {
    let by_chapter = (state.chapter as f32 / 18.0 * 85.0).min(85.0);
    state.story_progress.max(by_chapter)
}

/// Whether the next batch should carry the ending sentinel.
pub fn offers_ending(state: &StoryState) -> bool {
    if state.is_completed {
        return false;
    }
    let progress = effective_progress(state);
    (80.0..95.0).contains(&progress) || (15..20).contains(&state.chapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleweaver_core::{FixedRandom, Genre, SeededRandom};

    fn state(chapter: u32, tension: u8, mood: &str) -> StoryState {
        let mut state = StoryState::new("s", Genre::Fantasy);
        state.chapter = chapter;
        state.tension_level = tension;
        state.mood = mood.to_string();
        state
    }

    #[test]
    fn test_count_always_within_bounds() {
        let random = SeededRandom::new(11);
        for chapter in 1..25 {
            for tension in 1..=10 {
                for mood in ["calm", "tense", "neutral", "harmonious", "intense"] {
                    let count = target_choice_count(&state(chapter, tension, mood), &random);
                    assert!((MIN_CHOICES..=MAX_CHOICES).contains(&count));
                }
            }
        }
    }

    #[test]
    fn test_low_draws_stay_at_floor() {
        // 0.0 picks the low end of every range; chance(0.5) and chance(0.15) both fire
        let random = FixedRandom::new(0.0);
        assert_eq!(target_choice_count(&state(1, 5, "neutral"), &random), 3);
        assert_eq!(target_choice_count(&state(1, 2, "calm"), &random), 3);
    }

    #[test]
    fn test_high_draws_without_perturbation() {
        let random = FixedRandom::new(0.99);
        assert_eq!(target_choice_count(&state(1, 5, "neutral"), &random), 3);
        assert_eq!(target_choice_count(&state(4, 5, "neutral"), &random), 4);
        assert_eq!(target_choice_count(&state(9, 9, "tense"), &random), 5);
        assert_eq!(target_choice_count(&state(9, 2, "calm"), &random), 3);
        assert_eq!(target_choice_count(&state(2, 9, "neutral"), &random), 4);
    }

    #[test]
    fn test_ending_window() {
        let mut s = state(3, 5, "neutral");
        assert!(!offers_ending(&s));

        s.story_progress = 82.0;
        assert!(offers_ending(&s));

        s.story_progress = 96.0;
        assert!(!offers_ending(&s));

        let late = state(16, 5, "neutral");
        assert!(offers_ending(&late));

        // chapter 17 alone yields 80.3 effective progress
        let mut by_length = state(17, 5, "neutral");
        by_length.story_progress = 10.0;
        assert!(effective_progress(&by_length) > 80.0);
        assert!(offers_ending(&by_length));

        let mut done = state(16, 5, "neutral");
        done.is_completed = true;
        assert!(!offers_ending(&done));
    }
}

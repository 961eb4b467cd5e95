//! Injectable randomness.
//!
//! Choice counts, template shuffles and the cliffhanger draw are all random by design.
//! They draw from a [`RandomSource`] handed in by the caller so that tests can pin the
//! outcome with [`SeededRandom`] or a scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of random draws.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `low..=high`. Implementations return `low` when `high < low`.
    fn range_inclusive(&self, low: u32, high: u32) -> u32;

    /// Uniform float in `[0, 1)`.
    fn unit(&self) -> f64;

    /// `true` with the given probability.
    fn chance(&self, probability: f64) -> bool {
        self.unit() < probability
    }
}

/// Randomness from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn range_inclusive(&self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }

    fn unit(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Reproducible randomness from a fixed seed.
///
/// # Examples
///
/// ```
/// use taleweaver_core::{RandomSource, SeededRandom};
///
/// let a = SeededRandom::new(7);
/// let b = SeededRandom::new(7);
/// assert_eq!(a.range_inclusive(1, 100), b.range_inclusive(1, 100));
/// ```
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn range_inclusive(&self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(low..=high),
            Err(poisoned) => poisoned.into_inner().gen_range(low..=high),
        }
    }

    fn unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0..1.0),
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..1.0),
        }
    }
}

/// Deterministic source returning the same fraction on every draw.
///
/// `range_inclusive` maps the fraction onto the range, so `FixedRandom::new(0.0)` always
/// picks the low end and `chance` is then always true for positive probabilities.
///
/// # Examples
///
/// ```
/// use taleweaver_core::{FixedRandom, RandomSource};
///
/// let low = FixedRandom::new(0.0);
/// assert_eq!(low.range_inclusive(2, 5), 2);
/// assert!(low.chance(0.3));
///
/// let high = FixedRandom::new(0.99);
/// assert_eq!(high.range_inclusive(2, 5), 5);
/// assert!(!high.chance(0.3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom {
    fraction: f64,
}

impl FixedRandom {
    /// Source that always draws `fraction`, clamped into `[0, 1)`.
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 0.999_999),
        }
    }
}

impl RandomSource for FixedRandom {
    fn range_inclusive(&self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        let span = f64::from(high - low + 1);
        low + ((self.fraction * span) as u32).min(high - low)
    }

    fn unit(&self) -> f64 {
        self.fraction
    }
}

/// Fisher-Yates shuffle driven by a [`RandomSource`].
pub fn shuffle<T>(items: &mut [T], random: &dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = random.range_inclusive(0, i as u32) as usize;
        items.swap(i, j.min(i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_inclusive_stays_in_bounds() {
        let random = SeededRandom::new(42);
        for _ in 0..500 {
            let value = random.range_inclusive(2, 5);
            assert!((2..=5).contains(&value));
        }
        assert_eq!(random.range_inclusive(4, 4), 4);
        assert_eq!(random.range_inclusive(9, 3), 9);
    }

    #[test]
    fn test_unit_is_half_open() {
        let random = ThreadRandom;
        for _ in 0..500 {
            let value = random.unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let random = SeededRandom::new(3);
        let mut items: Vec<u32> = (0..20).collect();
        shuffle(&mut items, &random);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }
}

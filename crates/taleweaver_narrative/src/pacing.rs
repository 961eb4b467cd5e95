//! Perceived pacing and the stuck-generation watchdog.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Timing applied around interactive generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PacingConfig {
    /// Pause before the work starts
    #[serde(with = "millis")]
    pub thinking_delay: Duration,
    /// Floor on the total time from start to result
    #[serde(with = "millis")]
    pub minimum_display: Duration,
    /// Time after which the generation is reported as stuck
    #[serde(with = "millis")]
    pub watchdog: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            thinking_delay: Duration::from_millis(400),
            minimum_display: Duration::from_millis(1600),
            watchdog: Duration::from_secs(40),
        }
    }
}

impl PacingConfig {
    /// No artificial waits. The watchdog still applies.
    pub fn immediate() -> Self {
        Self {
            thinking_delay: Duration::ZERO,
            minimum_display: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Build from millisecond values.
    pub fn from_millis(thinking_delay: u64, minimum_display: u64, watchdog: u64) -> Self {
        Self {
            thinking_delay: Duration::from_millis(thinking_delay),
            minimum_display: Duration::from_millis(minimum_display),
            watchdog: Duration::from_millis(watchdog),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Result of a paced generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome<T> {
    /// The work finished in time
    Ready(T),
    /// The watchdog fired first; the work was abandoned
    Stuck {
        /// Time since the generation started
        elapsed: Duration,
    },
}

impl<T> GenerationOutcome<T> {
    /// The value, if the work finished.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Stuck { .. } => None,
        }
    }

    /// Whether the watchdog fired.
    pub fn is_stuck(&self) -> bool {
        matches!(self, Self::Stuck { .. })
    }

    /// Map the ready value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GenerationOutcome<U> {
        match self {
            Self::Ready(value) => GenerationOutcome::Ready(f(value)),
            Self::Stuck { elapsed } => GenerationOutcome::Stuck { elapsed },
        }
    }
}

/// Applies a [`PacingConfig`] around a unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    /// Create a pacer.
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// The timing in use.
    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Run `work` with the thinking delay, the watchdog and the display floor.
    ///
    /// The watchdog covers the thinking delay and the work. When it fires, the work
    /// future is dropped and its eventual result ignored.
    pub async fn run<T, F>(&self, work: F) -> GenerationOutcome<T>
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        let thinking_delay = self.config.thinking_delay;

        let paced = async {
            if !thinking_delay.is_zero() {
                tokio::time::sleep(thinking_delay).await;
            }
            work.await
        };

        let value = match tokio::time::timeout(self.config.watchdog, paced).await {
            Ok(value) => value,
            Err(_) => {
                let elapsed = started.elapsed();
                tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "Generation stuck");
                return GenerationOutcome::Stuck { elapsed };
            }
        };

        let elapsed = started.elapsed();
        if elapsed < self.config.minimum_display {
            tokio::time::sleep(self.config.minimum_display - elapsed).await;
        }
        GenerationOutcome::Ready(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fast_work_waits_for_display_floor() {
        let pacer = Pacer::new(PacingConfig::default());
        let started = Instant::now();

        let outcome = pacer.run(async { 7 }).await;

        assert_eq!(outcome, GenerationOutcome::Ready(7));
        assert!(started.elapsed() >= Duration::from_millis(1600));
        assert!(started.elapsed() < Duration::from_millis(1700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_work_is_not_padded() {
        let pacer = Pacer::new(PacingConfig::default());
        let started = Instant::now();

        let outcome = pacer
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            })
            .await;

        assert_eq!(outcome.ready(), Some("done"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(5400));
        assert!(elapsed < Duration::from_millis(5500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_reports_stuck() {
        let pacer = Pacer::new(PacingConfig::from_millis(0, 0, 1_000));

        let outcome = pacer
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                1
            })
            .await;

        match outcome {
            GenerationOutcome::Stuck { elapsed } => assert!(elapsed >= Duration::from_secs(1)),
            GenerationOutcome::Ready(_) => panic!("expected stuck"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_has_no_waits() {
        let pacer = Pacer::new(PacingConfig::immediate());
        let started = Instant::now();
        assert_eq!(pacer.run(async { 'x' }).await.ready(), Some('x'));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_config_serializes_millis() {
        let json = serde_json::to_value(PacingConfig::default()).unwrap();
        assert_eq!(json["thinking_delay"], 400);
        assert_eq!(json["watchdog"], 40_000);
    }
}

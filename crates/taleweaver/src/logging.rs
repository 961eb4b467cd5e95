//! Structured logging setup.

use std::env;
use taleweaver_error::{ConfigError, TaleweaverResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// How log output is filtered and shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit one JSON object per event
    pub json_logs: bool,
}

impl LoggingConfig {
    /// Quiet by default, `debug` when verbose.
    pub fn new(verbose: bool) -> Self {
        Self {
            log_level: if verbose { "debug" } else { "warn" }.to_string(),
            json_logs: false,
        }
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// The filter in effect: `RUST_LOG` when set, the configured level otherwise.
    pub fn filter_directive(&self) -> String {
        env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.log_level.clone())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Install the global subscriber. Logs go to stderr so story text on stdout stays clean.
///
/// # Errors
///
/// A `ConfigError` when the filter does not parse or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> TaleweaverResult<()> {
    let env_filter = EnvFilter::try_new(config.filter_directive())
        .map_err(|e| ConfigError::new(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_levels() {
        assert_eq!(LoggingConfig::new(true).log_level, "debug");
        assert_eq!(LoggingConfig::default().log_level, "warn");
        assert!(LoggingConfig::new(false).with_json_logs(true).json_logs);
    }
}

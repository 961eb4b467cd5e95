//! Layered configuration.
//!
//! Precedence, lowest first:
//! 1. Bundled defaults (`taleweaver.toml` compiled into the binary)
//! 2. `<config dir>/taleweaver/taleweaver.toml`
//! 3. `./taleweaver.toml`
//! 4. `TALEWEAVER__SECTION__KEY` environment variables

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taleweaver_core::{ModelConfig, ProviderKind};
use taleweaver_error::{ConfigError, TaleweaverError, TaleweaverResult};
use taleweaver_models::HttpConnector;
use taleweaver_narrative::{
    ContextStore, ConversationHistory, PacingConfig, StoryEngine, StorySession,
};
use taleweaver_storage::FileSystemBlobStore;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../taleweaver.toml");

/// Model section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider family
    pub provider: ProviderKind,
    /// Model name; the provider default when absent
    #[serde(default)]
    pub model: Option<String>,
    /// Endpoint override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Credential; environment variables are preferred
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion length limit
    pub max_tokens: u32,
}

/// Storage section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding saved stories
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Pacing section, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingSettings {
    /// Pause before generation starts
    pub thinking_delay_ms: u64,
    /// Floor on the time from start to result
    pub minimum_display_ms: u64,
    /// Time after which a generation is reported stuck
    pub watchdog_ms: u64,
}

/// History section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Most messages kept in a conversation
    pub cap: usize,
}

/// Application configuration.
///
/// # Examples
///
/// ```
/// use taleweaver::TaleweaverConfig;
///
/// let config = TaleweaverConfig::defaults().unwrap();
/// assert_eq!(config.history.cap, 20);
/// assert_eq!(config.pacing.watchdog_ms, 40_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaleweaverConfig {
    /// Model to talk to
    pub model: ModelSettings,
    /// Where saves live
    #[serde(default)]
    pub storage: StorageSettings,
    /// Interactive timing
    pub pacing: PacingSettings,
    /// Conversation bounds
    pub history: HistorySettings,
}

fn config_error(context: &str, e: config::ConfigError) -> TaleweaverError {
    ConfigError::new(format!("{}: {}", context, e)).into()
}

impl TaleweaverConfig {
    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> TaleweaverResult<Self> {
        builder
            .build()
            .map_err(|e| config_error("Failed to build configuration", e))?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))
    }

    fn base() -> config::ConfigBuilder<config::builder::DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// The bundled defaults alone.
    pub fn defaults() -> TaleweaverResult<Self> {
        Self::build(Self::base())
    }

    /// Defaults overlaid with one TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> TaleweaverResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration file");
        Self::build(Self::base().add_source(File::from(path).format(FileFormat::Toml)))
    }

    /// Load with the full precedence chain.
    #[instrument]
    pub fn load() -> TaleweaverResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > config dir > bundled defaults");

        let mut builder = Self::base();
        if let Some(dir) = dirs::config_dir() {
            let user_config = dir.join("taleweaver").join("taleweaver.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }
        builder = builder
            .add_source(File::with_name("taleweaver").required(false))
            .add_source(
                Environment::with_prefix("TALEWEAVER")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    /// Model configuration for new sessions.
    pub fn model_config(&self) -> ModelConfig {
        let settings = &self.model;
        let mut config = ModelConfig::new(settings.provider);
        if let Some(model) = settings.model.as_ref().filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        config.base_url = settings.base_url.clone().filter(|u| !u.trim().is_empty());
        config.api_key = settings.api_key.clone().filter(|k| !k.trim().is_empty());
        config.temperature = settings.temperature;
        config.max_tokens = settings.max_tokens;
        config
    }

    /// Pacing for interactive play.
    pub fn pacing_config(&self) -> PacingConfig {
        PacingConfig::from_millis(
            self.pacing.thinking_delay_ms,
            self.pacing.minimum_display_ms,
            self.pacing.watchdog_ms,
        )
    }

    /// Directory holding saved stories.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("taleweaver"))
                .unwrap_or_else(|| PathBuf::from(".taleweaver"))
        })
    }

    /// Most messages kept per conversation.
    pub fn history_cap(&self) -> usize {
        self.history.cap
    }

    /// A fresh session with this configuration's model and history cap.
    pub fn session(&self) -> StorySession {
        StorySession::with_history(self.model_config(), ConversationHistory::new(self.history_cap()))
    }

    /// An engine connecting to real providers.
    pub fn story_engine(&self) -> StoryEngine {
        StoryEngine::new(Arc::new(HttpConnector::new())).with_pacing(self.pacing_config())
    }

    /// A saved-story store in the data directory.
    pub fn context_store(&self) -> TaleweaverResult<ContextStore> {
        let blob = FileSystemBlobStore::new(self.data_dir())?;
        Ok(ContextStore::new(Arc::new(blob)))
    }
}

//! Session configuration: which model to call and what story to start.

use crate::Genre;
use serde::{Deserialize, Serialize};

/// Model provider family.
///
/// OpenAI, DeepSeek, Ollama and custom endpoints all speak the OpenAI chat-completions
/// dialect; Anthropic has its own request shape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    /// api.openai.com
    #[default]
    OpenAi,
    /// api.deepseek.com
    DeepSeek,
    /// api.anthropic.com
    Anthropic,
    /// A local Ollama server
    Ollama,
    /// Any other OpenAI-compatible endpoint (requires `base_url`)
    Custom,
}

impl ProviderKind {
    /// Base URL used when the configuration does not override it.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::DeepSeek => Some("https://api.deepseek.com/v1"),
            Self::Anthropic => Some("https://api.anthropic.com/v1"),
            Self::Ollama => Some("http://localhost:11434/v1"),
            Self::Custom => None,
        }
    }

    /// Model used when the configuration leaves it empty.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Ollama => "llama3.1",
            Self::Custom => "default",
        }
    }

    /// Whether calls must carry an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Environment variable consulted for the provider's key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Ollama | Self::Custom => "TALEWEAVER_API_KEY",
        }
    }
}

/// Which model to call and how.
///
/// The API key is never serialized, so persisted sessions do not leak credentials.
///
/// # Examples
///
/// ```
/// use taleweaver_core::{ModelConfig, ProviderKind};
///
/// let config = ModelConfig::new(ProviderKind::Anthropic).with_api_key("sk-test");
/// assert_eq!(config.model, "claude-3-5-haiku-latest");
///
/// let json = serde_json::to_value(&config).unwrap();
/// assert!(json.get("apiKey").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Provider family
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model identifier
    #[serde(default)]
    pub model: String,
    /// Credential, never persisted
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Endpoint base overriding the provider default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion length limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ProviderKind::default())
    }
}

impl ModelConfig {
    /// Configuration for a provider with its default model.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Model name, falling back to the provider default when blank.
    pub fn effective_model(&self) -> &str {
        if self.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    /// Endpoint base with any trailing slash removed.
    pub fn effective_base_url(&self) -> Option<String> {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.provider.default_base_url())
            .map(|url| url.trim_end_matches('/').to_string())
    }
}

/// Intended length of a story arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryLength {
    /// A handful of chapters
    Short,
    /// The default arc
    #[default]
    Medium,
    /// An extended arc
    Long,
}

/// The reader's request for a new story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryConfig {
    /// Genre bucket
    #[serde(default)]
    pub genre: Genre,
    /// Name of the protagonist
    pub protagonist: String,
    /// Where the story takes place
    pub setting: String,
    /// Extra wishes passed to the model verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<String>,
    /// Prose style hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Intended arc length
    #[serde(default)]
    pub length: StoryLength,
}

impl StoryConfig {
    /// Minimal configuration.
    pub fn new(genre: Genre, protagonist: impl Into<String>, setting: impl Into<String>) -> Self {
        Self {
            genre,
            protagonist: protagonist.into(),
            setting: setting.into(),
            special_requirements: None,
            style: None,
            length: StoryLength::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_base_url() {
        let mut config = ModelConfig::new(ProviderKind::Custom);
        assert_eq!(config.effective_base_url(), None);

        config.base_url = Some("http://my-host:8080/v1/".into());
        assert_eq!(
            config.effective_base_url().as_deref(),
            Some("http://my-host:8080/v1")
        );

        let openai = ModelConfig::new(ProviderKind::OpenAi);
        assert_eq!(
            openai.effective_base_url().as_deref(),
            Some("https://api.openai.com/v1")
        );
    }

    #[test]
    fn test_effective_model_falls_back_to_provider_default() {
        let mut config = ModelConfig::new(ProviderKind::DeepSeek);
        config.model = "  ".into();
        assert_eq!(config.effective_model(), "deepseek-chat");
    }

    #[test]
    fn test_api_key_is_read_but_never_written() {
        let json = serde_json::json!({"provider": "openai", "model": "gpt-4o", "apiKey": "sk-1"});
        let config: ModelConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-1"));
        assert_eq!(config.max_tokens, 2000);

        let written = serde_json::to_string(&config).unwrap();
        assert!(!written.contains("sk-1"));
    }
}

//! Credential resolution and driver construction.

use crate::{HttpStoryDriver, RetryPolicy};
use std::sync::Arc;
use taleweaver_core::ModelConfig;
use taleweaver_interface::{ModelConnector, StoryDriver};
use tracing::{debug, warn};

/// Environment variable consulted when the provider-specific one is unset.
pub const FALLBACK_API_KEY_ENV: &str = "TALEWEAVER_API_KEY";

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Connects sessions to HTTP providers.
///
/// Credentials come from the session's [`ModelConfig`] first, then from the provider's
/// environment variable (`OPENAI_API_KEY`, `DEEPSEEK_API_KEY`, `ANTHROPIC_API_KEY`), then
/// from [`FALLBACK_API_KEY_ENV`].
#[derive(Clone)]
pub struct HttpConnector {
    env: Arc<EnvLookup>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for HttpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnector")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpConnector {
    /// Connector reading credentials from the process environment.
    pub fn new() -> Self {
        Self::with_env(|name| std::env::var(name).ok())
    }

    /// Connector reading credentials through a custom lookup.
    pub fn with_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            env: Arc::new(lookup),
            retry: RetryPolicy::default(),
        }
    }

    /// Retry schedule handed to every driver this connector builds.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// API key for the configuration, if any source provides one.
    pub fn resolve_api_key(&self, config: &ModelConfig) -> Option<String> {
        let non_blank = |key: String| (!key.trim().is_empty()).then(|| key.trim().to_string());

        config
            .api_key
            .clone()
            .and_then(non_blank)
            .or_else(|| (self.env)(config.provider.api_key_env()).and_then(non_blank))
            .or_else(|| (self.env)(FALLBACK_API_KEY_ENV).and_then(non_blank))
    }
}

impl ModelConnector for HttpConnector {
    fn connect(&self, config: &ModelConfig) -> Option<Arc<dyn StoryDriver>> {
        let api_key = self.resolve_api_key(config);
        if api_key.is_none() && config.provider.requires_api_key() {
            debug!(provider = %config.provider, "No API key configured, model unavailable");
            return None;
        }

        match HttpStoryDriver::new(config.clone(), api_key) {
            Ok(driver) => Some(Arc::new(driver.with_retry(self.retry))),
            Err(e) => {
                warn!(error = %e, provider = %config.provider, "Cannot build model driver");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleweaver_core::ProviderKind;

    fn empty_env() -> HttpConnector {
        HttpConnector::with_env(|_| None)
    }

    #[test]
    fn test_no_key_means_no_driver() {
        let connector = empty_env();
        assert!(
            connector
                .connect(&ModelConfig::new(ProviderKind::OpenAi))
                .is_none()
        );
        assert!(
            connector
                .connect(&ModelConfig::new(ProviderKind::OpenAi).with_api_key("   "))
                .is_none()
        );
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let driver = empty_env()
            .connect(&ModelConfig::new(ProviderKind::Ollama))
            .unwrap();
        assert_eq!(driver.provider_name(), "ollama");
    }

    #[test]
    fn test_key_resolution_order() {
        let connector = HttpConnector::with_env(|name| match name {
            "ANTHROPIC_API_KEY" => Some("from-provider-env".to_string()),
            FALLBACK_API_KEY_ENV => Some("from-fallback-env".to_string()),
            _ => None,
        });

        let configured = ModelConfig::new(ProviderKind::Anthropic).with_api_key("from-config");
        assert_eq!(
            connector.resolve_api_key(&configured).as_deref(),
            Some("from-config")
        );

        let anthropic = ModelConfig::new(ProviderKind::Anthropic);
        assert_eq!(
            connector.resolve_api_key(&anthropic).as_deref(),
            Some("from-provider-env")
        );

        let deepseek = ModelConfig::new(ProviderKind::DeepSeek);
        assert_eq!(
            connector.resolve_api_key(&deepseek).as_deref(),
            Some("from-fallback-env")
        );
        assert!(connector.connect(&deepseek).is_some());
    }

    #[test]
    fn test_custom_provider_without_base_url_is_unavailable() {
        let config = ModelConfig::new(ProviderKind::Custom).with_api_key("k");
        assert!(empty_env().connect(&config).is_none());
    }
}

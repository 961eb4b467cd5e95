//! HTTP driver shared by every provider.

use crate::provider::{ANTHROPIC_VERSION, ProviderRequest, parse_completion};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use taleweaver_core::{GenerateRequest, GenerateResponse, ModelConfig, ProviderKind};
use taleweaver_error::{ModelsError, ModelsErrorKind, ModelsResult, TaleweaverResult};
use taleweaver_interface::StoryDriver;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, instrument, warn};

/// Bounded retry schedule for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: usize,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> {
        let initial_ms = self.initial_backoff.as_millis().max(1) as u64;
        ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1))
    }
}

/// Story driver speaking HTTP to an OpenAI-compatible or Anthropic endpoint.
#[derive(Debug, Clone)]
pub struct HttpStoryDriver {
    client: Client,
    config: ModelConfig,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl HttpStoryDriver {
    /// Create a driver for a configuration whose credentials are already resolved.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when no base URL is known for the provider, or when the HTTP client
    /// cannot be constructed. `MissingCredentials` when the provider needs a key and none
    /// was given.
    pub fn new(config: ModelConfig, api_key: Option<String>) -> ModelsResult<Self> {
        let base_url = config.effective_base_url().ok_or_else(|| {
            ModelsError::new(ModelsErrorKind::InvalidConfig(format!(
                "provider {} needs a baseUrl",
                config.provider
            )))
        })?;

        let api_key = api_key.filter(|key| !key.trim().is_empty());
        if api_key.is_none() && config.provider.requires_api_key() {
            return Err(ModelsError::new(ModelsErrorKind::MissingCredentials(
                config.provider.to_string(),
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ModelsError::new(ModelsErrorKind::InvalidConfig(e.to_string())))?;

        debug!(provider = %config.provider, base_url = %base_url, "Creating HTTP story driver");
        Ok(Self {
            client,
            config,
            base_url,
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry schedule.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One HTTP round trip, classified into transient and permanent failures.
    async fn send_once(
        &self,
        url: &str,
        body: &ProviderRequest,
    ) -> Result<String, RetryError<ModelsError>> {
        let mut builder = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(body);

        builder = match (self.config.provider, self.api_key.as_deref()) {
            (ProviderKind::Anthropic, Some(key)) => builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            (ProviderKind::Anthropic, None) => {
                builder.header("anthropic-version", ANTHROPIC_VERSION)
            }
            (_, Some(key)) => builder.bearer_auth(key),
            (_, None) => builder,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Model request failed in transport");
                return Err(RetryError::Transient {
                    err: ModelsError::new(ModelsErrorKind::Http(e.to_string())),
                    retry_after: None,
                });
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .map(|d| d.min(self.retry.max_delay));
            warn!(?retry_after, "Model provider rate limited the request");
            return Err(RetryError::Transient {
                err: ModelsError::new(ModelsErrorKind::RateLimited),
                retry_after,
            });
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return Err(RetryError::Transient {
                    err: ModelsError::new(ModelsErrorKind::Http(e.to_string())),
                    retry_after: None,
                });
            }
        };

        if !status.is_success() {
            let err = ModelsError::new(ModelsErrorKind::Api {
                status: status.as_u16(),
                message: text,
            });
            return if err.kind.is_retryable() {
                warn!(status = status.as_u16(), "Model provider returned server error");
                Err(RetryError::Transient {
                    err,
                    retry_after: None,
                })
            } else {
                error!(status = status.as_u16(), "Model provider rejected the request");
                Err(RetryError::Permanent(err))
            };
        }

        parse_completion(self.config.provider, &text).map_err(|err| {
            if err.kind.is_retryable() {
                warn!(error = %err, "Model returned no usable text");
                RetryError::Transient {
                    err,
                    retry_after: None,
                }
            } else {
                RetryError::Permanent(err)
            }
        })
    }
}

#[async_trait::async_trait]
impl StoryDriver for HttpStoryDriver {
    #[instrument(skip(self, req), fields(provider = %self.config.provider, prompt_chars = req.prompt_chars()))]
    async fn generate(&self, req: &GenerateRequest) -> TaleweaverResult<GenerateResponse> {
        let body = ProviderRequest::build(&self.config, req);
        let url = body.endpoint(&self.base_url);
        debug!(url = %url, model = body.model(), "Sending model request");

        let text = Retry::spawn(self.retry.strategy(), || self.send_once(&url, &body)).await?;

        debug!(chars = text.len(), "Received model completion");
        Ok(GenerateResponse::new(text))
    }

    fn provider_name(&self) -> &'static str {
        match self.config.provider {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Custom => "custom",
        }
    }

    fn model_name(&self) -> &str {
        self.config.effective_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_allows_three_attempts() {
        let delays: Vec<_> = RetryPolicy::default().strategy().collect();
        assert_eq!(delays.len(), 2);
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(8)));
    }

    #[test]
    fn test_none_policy_never_retries() {
        assert_eq!(RetryPolicy::none().strategy().count(), 0);
    }

    #[test]
    fn test_custom_provider_without_base_url_is_rejected() {
        let err = HttpStoryDriver::new(ModelConfig::new(ProviderKind::Custom), None).unwrap_err();
        assert!(matches!(err.kind, ModelsErrorKind::InvalidConfig(_)));
    }

    #[test]
    fn test_keyed_provider_without_key_is_rejected() {
        let err = HttpStoryDriver::new(ModelConfig::new(ProviderKind::OpenAi), Some("  ".into()))
            .unwrap_err();
        assert!(matches!(err.kind, ModelsErrorKind::MissingCredentials(_)));
    }

    #[test]
    fn test_driver_reports_provider_and_model() {
        let driver =
            HttpStoryDriver::new(ModelConfig::new(ProviderKind::DeepSeek), Some("k".into()))
                .unwrap();
        assert_eq!(driver.provider_name(), "deepseek");
        assert_eq!(driver.model_name(), "deepseek-chat");
        assert_eq!(driver.base_url(), "https://api.deepseek.com/v1");
    }
}

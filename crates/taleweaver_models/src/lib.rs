//! LLM provider integrations for Taleweaver.
//!
//! Two wire dialects cover every supported provider:
//!
//! - **OpenAI chat completions**: OpenAI, DeepSeek, Ollama and custom compatible endpoints
//! - **Anthropic messages**: Anthropic
//!
//! [`ProviderRequest`] is the tagged union over both shapes, [`HttpStoryDriver`] sends it
//! with bounded retry, and [`HttpConnector`] resolves credentials and decides whether a
//! session can reach a model at all.
//!
//! # Example
//!
//! ```rust,no_run
//! use taleweaver_core::{ChatMessage, GenerateRequest, ModelConfig, ProviderKind};
//! use taleweaver_interface::ModelConnector;
//! use taleweaver_models::HttpConnector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ModelConfig::new(ProviderKind::OpenAi);
//! if let Some(driver) = HttpConnector::new().connect(&config) {
//!     let request = GenerateRequest::builder()
//!         .messages(vec![ChatMessage::user("Begin the tale")])
//!         .build()?;
//!     let response = driver.generate(&request).await?;
//!     println!("{}", response.text);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod connector;
mod provider;

pub use client::{HttpStoryDriver, RetryPolicy};
pub use connector::{FALLBACK_API_KEY_ENV, HttpConnector};
pub use provider::{
    ANTHROPIC_VERSION, AnthropicContentBlock, AnthropicMessage, AnthropicRequest,
    AnthropicResponse, OpenAiChoice, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiResponseMessage,
    ProviderRequest, build_anthropic_request, build_openai_request, parse_completion,
};

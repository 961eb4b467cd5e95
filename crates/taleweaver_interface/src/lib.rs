//! Trait definitions for the Taleweaver narrative engine.
//!
//! The narrative core needs exactly two capabilities from the outside world:
//!
//! - **Model access**: "send these messages, get text back" ([`StoryDriver`]), plus a
//!   [`ModelConnector`] that turns a session's [`ModelConfig`] into a driver, or into
//!   nothing when the session has no usable credentials.
//! - **Durable storage**: "read/write a named blob" ([`BlobStore`]).
//!
//! Everything else (which vendor, which disk, which UI) stays outside the core.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use std::sync::Arc;
use taleweaver_core::{GenerateRequest, GenerateResponse, ModelConfig};
use taleweaver_error::TaleweaverResult;

/// A model backend able to complete a conversation.
#[async_trait]
pub trait StoryDriver: Send + Sync {
    /// Send the request and return the completion text.
    async fn generate(&self, req: &GenerateRequest) -> TaleweaverResult<GenerateResponse>;

    /// Provider name (e.g., "openai", "anthropic").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Builds drivers from per-session model configuration.
pub trait ModelConnector: Send + Sync {
    /// A driver for `config`, or `None` when the configuration cannot reach a model
    /// (for example because no API key is available).
    fn connect(&self, config: &ModelConfig) -> Option<Arc<dyn StoryDriver>>;
}

/// A connector that never yields a driver; every generation uses the fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineConnector;

impl ModelConnector for OfflineConnector {
    fn connect(&self, _config: &ModelConfig) -> Option<Arc<dyn StoryDriver>> {
        None
    }
}

/// Durable storage of named text blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob, `None` when it was never written.
    async fn read(&self, key: &str) -> TaleweaverResult<Option<String>>;

    /// Replace a blob's contents.
    async fn write(&self, key: &str, contents: &str) -> TaleweaverResult<()>;

    /// Delete a blob. Removing a missing blob is not an error.
    async fn remove(&self, key: &str) -> TaleweaverResult<()>;
}

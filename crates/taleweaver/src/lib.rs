//! Taleweaver - interactive branching stories driven by pluggable language models.
//!
//! This crate re-exports the workspace and adds the ambient pieces an application
//! needs: layered configuration and logging setup.
//!
//! # Quick Start
//!
//! ```
//! use taleweaver::{ContentSource, Genre, StoryConfig, StoryEngine, StorySession};
//!
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()
//!     .unwrap();
//! runtime.block_on(async {
//!     let engine = StoryEngine::offline();
//!     let mut session = StorySession::default();
//!     let config = StoryConfig::new(Genre::Mystery, "Ada", "a fogbound harbour");
//!
//!     let story = engine.generate_initial_story(&mut session, &config, false).await;
//!     assert_eq!(story.source, ContentSource::Fallback);
//!     assert_eq!(story.state.chapter, 1);
//! });
//! ```
//!
//! # Configuration
//!
//! [`TaleweaverConfig::load`] merges bundled defaults, a user config file,
//! `./taleweaver.toml` and `TALEWEAVER__*` environment variables.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod logging;

pub use config::{
    HistorySettings, ModelSettings, PacingSettings, StorageSettings, TaleweaverConfig,
};
pub use logging::{LoggingConfig, init_logging};

pub use taleweaver_core::*;
pub use taleweaver_error::*;
pub use taleweaver_interface::*;
pub use taleweaver_models::{HttpConnector, HttpStoryDriver, RetryPolicy};
pub use taleweaver_narrative::*;
pub use taleweaver_storage::{FileSystemBlobStore, InMemoryBlobStore};

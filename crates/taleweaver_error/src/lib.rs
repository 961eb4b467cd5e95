//! Error types for the Taleweaver narrative engine.
//!
//! Every crate in the workspace reports failures through the types defined here.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum names the specific condition
//! - `*Error` struct wraps the kind together with the source location
//! - constructors use `#[track_caller]` so the location is captured automatically
//!
//! Only persistence and version problems are meant to reach a user. Model transport
//! failures are demoted to deterministic fallbacks by the narrative layer and malformed
//! model output never becomes an error at all.
//!
//! # Examples
//!
//! ```
//! use taleweaver_error::{StorageError, StorageErrorKind, TaleweaverResult};
//!
//! fn load() -> TaleweaverResult<String> {
//!     Err(StorageError::new(StorageErrorKind::NotFound("story_42".to_string())))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod builder;
mod config;
mod error;
mod json;
mod models;
mod narrative;
mod storage;

pub use backend::BackendError;
pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{TaleweaverError, TaleweaverErrorKind, TaleweaverResult};
pub use json::JsonError;
pub use models::{ModelsError, ModelsErrorKind, ModelsResult};
pub use narrative::{NarrativeError, NarrativeErrorKind};
pub use storage::{StorageError, StorageErrorKind};

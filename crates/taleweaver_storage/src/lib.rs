//! Durable blob storage for Taleweaver.
//!
//! The save layer keeps its whole collection in a single named blob. This crate provides
//! the backends behind the [`BlobStore`] trait:
//!
//! - [`FileSystemBlobStore`]: one JSON file per key, written atomically
//! - [`InMemoryBlobStore`]: process-local map for tests and throwaway sessions
//!
//! # Example
//!
//! ```rust
//! use taleweaver_storage::{BlobStore, InMemoryBlobStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryBlobStore::new();
//! store.write("story_contexts", "{}").await?;
//! assert_eq!(store.read("story_contexts").await?.as_deref(), Some("{}"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod memory;

pub use filesystem::FileSystemBlobStore;
pub use memory::InMemoryBlobStore;
pub use taleweaver_error::{StorageError, StorageErrorKind};
pub use taleweaver_interface::BlobStore;

/// Reject keys that could escape the storage directory or are not portable file names.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::new(StorageErrorKind::InvalidKey(key.to_string())))
    }
}

//! Filesystem-based blob storage implementation.
//!
//! Each blob lives in its own file, `{base_path}/{key}.json`. Writes go through a
//! uniquely named temp file followed by a rename, so a crash mid-write leaves either the
//! previous contents or the new contents on disk, never a torn file.

use crate::validate_key;
use std::path::{Path, PathBuf};
use taleweaver_error::{StorageError, StorageErrorKind, TaleweaverResult};
use taleweaver_interface::BlobStore;
use uuid::Uuid;

/// Filesystem storage backend.
///
/// # Example Structure
///
/// ```text
/// ~/.local/share/taleweaver/
/// └── story_contexts.json
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemBlobStore {
    base_path: PathBuf,
}

impl FileSystemBlobStore {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> TaleweaverResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Opened filesystem blob store");
        Ok(Self { base_path })
    }

    /// Root directory of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait::async_trait]
impl BlobStore for FileSystemBlobStore {
    #[tracing::instrument(skip(self))]
    async fn read(&self, key: &str) -> TaleweaverResult<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), size = contents.len(), "Read blob");
                Ok(Some(contents))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Blob does not exist yet");
                Ok(None)
            }
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    #[tracing::instrument(skip(self, contents), fields(size = contents.len()))]
    async fn write(&self, key: &str, contents: &str) -> TaleweaverResult<()> {
        validate_key(key)?;
        let path = self.path_for(key);

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    self.base_path.display(),
                    e
                )))
            })?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self
            .base_path
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, contents).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
            .into());
        }

        tracing::info!(path = %path.display(), size = contents.len(), "Stored blob");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, key: &str) -> TaleweaverResult<()> {
        validate_key(key)?;
        let path = self.path_for(key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Removed blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "remove {}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }
}

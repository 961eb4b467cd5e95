//! In-memory blob storage.

use crate::validate_key;
use std::collections::HashMap;
use taleweaver_error::TaleweaverResult;
use taleweaver_interface::BlobStore;
use tokio::sync::RwLock;

/// Blob store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether no blob has been written.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn read(&self, key: &str) -> TaleweaverResult<Option<String>> {
        validate_key(key)?;
        Ok(self.blobs.read().await.get(key).cloned())
    }

    #[tracing::instrument(skip(self, contents), fields(size = contents.len()))]
    async fn write(&self, key: &str, contents: &str) -> TaleweaverResult<()> {
        validate_key(key)?;
        self.blobs
            .write()
            .await
            .insert(key.to_string(), contents.to_string());
        tracing::debug!("Stored blob in memory");
        Ok(())
    }

    async fn remove(&self, key: &str) -> TaleweaverResult<()> {
        validate_key(key)?;
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_remove() {
        let store = InMemoryBlobStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.read("contexts").await.unwrap(), None);

        store.write("contexts", "{\"a\":1}").await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.read("contexts").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.remove("contexts").await.unwrap();
        store.remove("contexts").await.unwrap();
        assert_eq!(store.read("contexts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let store = InMemoryBlobStore::new();
        assert!(store.write("../escape", "x").await.is_err());
        assert!(store.read("").await.is_err());
    }
}

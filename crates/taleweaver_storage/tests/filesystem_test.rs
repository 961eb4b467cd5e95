//! Tests for the filesystem blob store.

use taleweaver_storage::{BlobStore, FileSystemBlobStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_missing_blob_reads_as_none() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path()).unwrap();

    assert_eq!(store.read("story_contexts").await.unwrap(), None);
}

#[tokio::test]
async fn test_write_then_read() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path()).unwrap();

    store.write("story_contexts", "{\"a\":1}").await.unwrap();
    let contents = store.read("story_contexts").await.unwrap();

    assert_eq!(contents.as_deref(), Some("{\"a\":1}"));
    assert!(dir.path().join("story_contexts.json").exists());
}

#[tokio::test]
async fn test_overwrite_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path()).unwrap();

    store.write("story_contexts", "first").await.unwrap();
    store.write("story_contexts", "second").await.unwrap();

    assert_eq!(
        store.read("story_contexts").await.unwrap().as_deref(),
        Some("second")
    );
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["story_contexts.json".to_string()]);
}

#[tokio::test]
async fn test_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    {
        let store = FileSystemBlobStore::new(dir.path()).unwrap();
        store.write("story_contexts", "kept").await.unwrap();
    }

    let reopened = FileSystemBlobStore::new(dir.path()).unwrap();
    assert_eq!(
        reopened.read("story_contexts").await.unwrap().as_deref(),
        Some("kept")
    );
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path()).unwrap();

    store.write("story_contexts", "x").await.unwrap();
    store.remove("story_contexts").await.unwrap();
    store.remove("story_contexts").await.unwrap();

    assert_eq!(store.read("story_contexts").await.unwrap(), None);
}

#[tokio::test]
async fn test_creates_nested_base_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileSystemBlobStore::new(&nested).unwrap();

    assert!(nested.is_dir());
    assert_eq!(store.base_path(), nested.as_path());
}

#[tokio::test]
async fn test_rejects_traversal_keys() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path()).unwrap();

    let err = store.write("../outside", "x").await.unwrap_err();
    assert!(err.storage_kind().is_some());
}

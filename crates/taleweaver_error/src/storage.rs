//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Blob key contains characters that cannot be used as a file name
    #[display("Invalid blob key: {}", _0)]
    InvalidKey(String),
    /// No saved story exists under the requested id
    #[display("Saved story not found: {}", _0)]
    NotFound(String),
    /// The stored record was written by an incompatible schema version
    #[display("Incompatible save version {} (expected {})", found, expected)]
    VersionMismatch {
        /// Version found in the stored record
        found: u32,
        /// Version this build reads and writes
        expected: u32,
    },
    /// Snapshots are written once and never overwritten
    #[display("Snapshot {} cannot be overwritten", _0)]
    ImmutableSnapshot(String),
    /// Failed to serialize or deserialize the stored collection
    #[display("Serialization failed: {}", _0)]
    Serialization(String),
    /// A stored record exists but cannot be decoded
    #[display("Invalid record {}: {}", id, reason)]
    InvalidRecord {
        /// Record id
        id: String,
        /// Decoder message
        reason: String,
    },
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("story_1".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Top-level error wrapper types.

use crate::{
    BackendError, BuilderError, ConfigError, JsonError, ModelsError, NarrativeError, StorageError,
};

/// Every error condition the workspace can report.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{TaleweaverError, JsonError};
///
/// let json_err = JsonError::new("Unexpected end of input");
/// let err: TaleweaverError = json_err.into();
/// assert!(format!("{}", err).contains("JSON Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TaleweaverErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Generic backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Model provider error
    #[from(ModelsError)]
    Models(ModelsError),
    /// Narrative error
    #[from(NarrativeError)]
    Narrative(NarrativeError),
}

/// Taleweaver error with kind discrimination.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{ConfigError, TaleweaverResult};
///
/// fn might_fail() -> TaleweaverResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Taleweaver Error: {}", _0)]
pub struct TaleweaverError(Box<TaleweaverErrorKind>);

impl TaleweaverError {
    /// Create a new error from a kind.
    pub fn new(kind: TaleweaverErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TaleweaverErrorKind {
        &self.0
    }

    /// The storage error kind, when this is a persistence failure.
    pub fn storage_kind(&self) -> Option<&crate::StorageErrorKind> {
        match self.kind() {
            TaleweaverErrorKind::Storage(err) => Some(&err.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to TaleweaverErrorKind
impl<T> From<T> for TaleweaverError
where
    T: Into<TaleweaverErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Taleweaver operations.
pub type TaleweaverResult<T> = std::result::Result<T, TaleweaverError>;

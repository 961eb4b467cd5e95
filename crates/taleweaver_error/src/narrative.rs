//! Narrative error types.

/// Specific error conditions for narrative operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum NarrativeErrorKind {
    /// Model output was parsed but lacks fields the call site needs
    #[display("Model payload missing required field: {}", _0)]
    MissingField(String),
    /// Model output contained a field with an unusable value
    #[display("Model payload field '{}' is invalid: {}", field, reason)]
    InvalidField {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Error type for narrative operations.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{NarrativeError, NarrativeErrorKind};
///
/// let err = NarrativeError::new(NarrativeErrorKind::MissingField("scene".into()));
/// assert!(format!("{}", err).contains("scene"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Narrative Error: {} at line {} in {}", kind, line, file)]
pub struct NarrativeError {
    /// The specific error condition
    pub kind: NarrativeErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl NarrativeError {
    /// Create a new NarrativeError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NarrativeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Generic backend error.

/// Catch-all error for backend failures that have no dedicated kind.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Backend Error: {} at line {} in {}", message, line, file)]
pub struct BackendError {
    /// Description of the failure
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl BackendError {
    /// Create a new BackendError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Model provider errors.

/// Model provider error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ModelsErrorKind {
    /// The provider requires an API key and none was configured
    #[display("Missing credentials for provider {}", _0)]
    MissingCredentials(String),

    /// The request never produced an HTTP response
    #[display("HTTP transport failed: {}", _0)]
    Http(String),

    /// The provider answered with a non-success status
    #[display("API error {}: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The provider rejected the call because of rate limiting
    #[display("Rate limited by provider")]
    RateLimited,

    /// The provider answered successfully but without any text
    #[display("Provider returned an empty completion")]
    EmptyResponse,

    /// The response body did not have the expected shape
    #[display("Failed to parse provider response: {}", _0)]
    Parse(String),

    /// The model configuration cannot be used
    #[display("Invalid model configuration: {}", _0)]
    InvalidConfig(String),
}

impl ModelsErrorKind {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited | Self::EmptyResponse => true,
            Self::Api { status, .. } => *status >= 500,
            Self::MissingCredentials(_) | Self::Parse(_) | Self::InvalidConfig(_) => false,
        }
    }
}

/// Model provider error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Models Error: {} at {}:{}", kind, file, line)]
pub struct ModelsError {
    /// The specific error kind
    pub kind: ModelsErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// Source file where error occurred
    pub file: &'static str,
}

impl ModelsError {
    /// Create a new models error.
    #[track_caller]
    pub fn new(kind: ModelsErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Result type for model operations.
pub type ModelsResult<T> = Result<T, ModelsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ModelsErrorKind::RateLimited.is_retryable());
        assert!(ModelsErrorKind::Http("reset".into()).is_retryable());
        assert!(
            ModelsErrorKind::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_retryable()
        );
        assert!(
            !ModelsErrorKind::Api {
                status: 401,
                message: "bad key".into()
            }
            .is_retryable()
        );
        assert!(!ModelsErrorKind::MissingCredentials("openai".into()).is_retryable());
    }
}

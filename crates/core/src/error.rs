//! Error types for liftrag.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application, including configuration, I/O, external Bedrock calls,
//! payload validation, knowledge and prompt errors.

use thiserror::Error;

/// Unified error type for liftrag.
///
/// All fallible functions return `Result<T, AppError>`.
/// Recoverable conditions (no extracted entity, filter outside the allow-list)
/// are not errors: they degrade to an absent filter and are logged.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport or service failure of an external capability
    #[error("External service error: {0}")]
    ExternalService(String),

    /// An external service refused the request itself (bad input, auth)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// An external call did not complete within its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A structured payload did not match the expected schema
    #[error("Validation error: {0}")]
    Validation(String),

    /// Knowledge base, corpus and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether retrying the same idempotent call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::ExternalService(_) | AppError::Timeout(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(AppError::ExternalService("503".to_string()).is_transient());
        assert!(AppError::Timeout("converse".to_string()).is_transient());
        assert!(!AppError::Rejected("400 Bad Request".to_string()).is_transient());
        assert!(!AppError::Validation("bad shape".to_string()).is_transient());
        assert!(!AppError::Config("missing".to_string()).is_transient());
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Serialization(_)));
    }
}

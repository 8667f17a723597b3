//! Error types for the askgate workspace.
//!
//! This module defines a unified error enum covering every error category
//! a request can hit: credentials, input validation, rate limiting,
//! upstream backends, and configuration.

use thiserror::Error;

/// Unified error type for the askgate workspace.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
///
/// Every variant is terminal for the request that produced it; nothing in
/// the pipeline retries. The HTTP layer maps each variant onto a stable
/// status code so callers can tell "fix your request" from "try again
/// later" from "backend is down".
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad or missing credential material (static key or bearer token)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Empty or malformed caller input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Request budget exceeded for the caller
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Embedding, retrieval, or generation backend failure
    /// (network, timeout, non-success status, malformed payload)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Required settings absent or invalid at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
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
    fn test_error_display() {
        let err = AppError::Auth("unauthorized".to_string());
        assert_eq!(err.to_string(), "Authentication failed: unauthorized");

        let err = AppError::RateLimited;
        assert_eq!(err.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}

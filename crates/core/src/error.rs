//! Error types for the Clawlet domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator of the agent loop has its own error enum.

use std::time::Duration;
use thiserror::Error;

/// The top-level error type for all Clawlet operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Failures of the text-generation backend.
///
/// A backend that produced no text returns `Ok(String::new())`; every
/// variant here means the call itself failed.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("I/O failure on {location}: {reason}")]
    Io { location: String, reason: String },

    #[error("Corrupt value under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn timeout_mentions_duration() {
        let err = ProviderError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Request timed out after 30s");

        let err = ProviderError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Request timed out after 250ms");
    }

    #[test]
    fn storage_error_names_key() {
        let err = Error::Storage(StorageError::Corrupt {
            key: "messages".into(),
            reason: "expected array".into(),
        });
        assert!(err.to_string().contains("messages"));
        assert!(err.to_string().contains("expected array"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "list_dir".into(),
            reason: "permission denied".into(),
        });
        assert!(err.to_string().contains("list_dir"));
        assert!(err.to_string().contains("permission denied"));
    }
}

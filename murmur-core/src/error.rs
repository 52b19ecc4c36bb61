//! Error types for the murmuration adapters

use thiserror::Error;

/// Result type alias using murmuration's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the murmuration adapters
#[derive(Debug, Error)]
pub enum Error {
    // ============ Configuration Errors ============
    /// Adapter is not properly configured (e.g. model not in the allow-list)
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ Provider Errors ============
    /// Provider API returned a non-success status or an API-level failure
    #[error("Provider API error: {0}")]
    ProviderApi(String),

    /// Provider authentication failed
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Response document is missing fields the adapter requires
    #[error("Response shape error: {0}")]
    ResponseShape(String),

    /// Token-usage metadata failed validation
    #[error("Usage validation error: {0}")]
    UsageValidation(String),

    // ============ Streaming Errors ============
    /// Stream interrupted (framing buffer overflow, invalid UTF-8 payload)
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    // ============ Message Errors ============
    /// Message serialization failed
    #[error("Message serialization error: {0}")]
    MessageSerialize(#[from] serde_json::Error),

    // ============ Network Errors ============
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ============ System Errors ============
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============ Generic Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new response shape error
    pub fn response_shape(msg: impl Into<String>) -> Self {
        Self::ResponseShape(msg.into())
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderApi(_) | Self::StreamInterrupted(_) | Self::Http(_)
        )
    }
}

//! # Murmur Providers
//!
//! LLM chat and embedding provider adapters for Murmuration.

#![warn(missing_docs)]

// Re-export core types for convenience
pub use murmur_core::conversation::Conversation;
pub use murmur_core::embedding::{Embedding, Vector};
pub use murmur_core::error::{Error, Result};
pub use murmur_core::message::{Message, UsageData};
pub use murmur_core::streaming::{Frame, LineStream};

pub mod mock;
pub mod transport;
pub mod utils;

#[cfg(feature = "groq")]
pub mod groq;

#[cfg(feature = "voyage")]
pub mod voyage;

#[cfg(test)]
mod provider_tests;

/// HTTP client configuration
#[derive(Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection pool idle timeout
    pub pool_idle_timeout_secs: u64,
    /// Max idle connections per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
        }
    }
}

impl HttpConfig {
    /// Build a reqwest client
    pub fn build_client(&self) -> Result<reqwest::Client> {
        use std::time::Duration;

        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))
    }
}

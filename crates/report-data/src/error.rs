//! Error types for data providers

use thiserror::Error;

/// Data provider errors
#[derive(Debug, Error)]
pub enum DataError {
    /// Provider returned an error payload
    #[error("API error: {0}")]
    Api(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rate limit exceeded for a provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimited {
        provider: String,
    },

    /// The target site rejected the request as a bot
    #[error("Blocked by bot detection: {url}")]
    BotDetection {
        url: String,
    },

    /// Extraction service failed or returned unusable content
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for data operations
pub type Result<T> = std::result::Result<T, DataError>;

//! Error types for LLM operations

use thiserror::Error;

/// LLM provider errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider returned an error payload
    #[error("API error: {0}")]
    Api(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider response carried no usable content
    #[error("Empty completion response")]
    EmptyResponse,

    /// JSON-mode output could not be parsed
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid agent-team configuration
    #[error("Invalid agent config: {0}")]
    InvalidAgentConfig(String),
}

/// Result type alias for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

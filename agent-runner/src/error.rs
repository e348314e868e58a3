//! Error types for agent-runner

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors that can occur while building or running an agent
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Session store or other core failure
    #[error(transparent)]
    Core(#[from] sa_core::Error),

    /// Invalid agent, tool or runner configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A required credential was not provided
    #[error("Missing credential: {name}")]
    MissingCredential { name: String },

    /// Transport failure talking to the model API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API answered with an error status
    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// A response payload could not be decoded
    #[error("Failed to decode model response: {message}")]
    Decode { message: String },

    /// The prompt was rejected by the model's safety filters
    #[error("Prompt blocked: {reason}")]
    Blocked { reason: String },

    /// Event channel closed
    #[error("Event channel closed")]
    ChannelClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

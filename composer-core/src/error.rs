//! Error types for composer-core

use thiserror::Error;

/// Error type for composition and its persistence collaborators
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Missing or empty request fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Template renderer or smoother failed
    #[error("Render error: {0}")]
    Render(String),

    /// Enhancement stage failed (always recovered from)
    #[error("Enhancement error: {0}")]
    Enhancement(String),

    /// Policy snapshot, trace or feedback storage failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(String),

    /// No trace recorded under the given id
    #[error("Trace not found: {0}")]
    TraceNotFound(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ComposerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for composer operations
pub type Result<T> = std::result::Result<T, ComposerError>;

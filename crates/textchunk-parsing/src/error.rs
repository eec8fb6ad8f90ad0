//! Error types for the parsing crate

use textchunk_common::{CommonError, ErrorKind};
use textchunk_config::ConfigError;
use thiserror::Error;

/// Errors returned by chunking calls
#[derive(Error, Debug)]
pub enum ParsingError {
    /// Settings that cannot be used, such as an overlap not below the chunk size
    #[error("Invalid settings: {0}")]
    Validation(String),

    /// The tokenizer for the requested model could not be built
    #[error("Tokenizer error: {0}")]
    Tokenization(String),

    /// The input contains a special token the settings do not allow
    #[error("Input contains disallowed special token {0}")]
    DisallowedSpecialToken(String),

    /// Structured input that could not be turned into text
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// Other error (fallback)
    #[error("Other error: {0}")]
    Other(String),
}

impl ParsingError {
    /// Create a validation error
    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a tokenization error
    pub fn tokenization_error(msg: impl Into<String>) -> Self {
        Self::Tokenization(msg.into())
    }

    /// Create a chunking error
    pub fn chunking_error(msg: impl Into<String>) -> Self {
        Self::ChunkingError(msg.into())
    }
}

impl From<ConfigError> for ParsingError {
    fn from(e: ConfigError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl CommonError for ParsingError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Other(_) => ErrorKind::Internal,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Result type alias for parsing operations
pub type ParsingResult<T> = Result<T, ParsingError>;

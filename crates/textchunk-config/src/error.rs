//! Configuration error types

use textchunk_common::{CommonError, ErrorKind};
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Invalid range value
    #[error("Value {value} is out of range for {field} (expected {min}-{max})")]
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },

    /// Overlap is not smaller than the chunk size for a method that requires it
    #[error("chunk-overlap ({overlap}) must be smaller than chunk-size ({size}) for the {method} method")]
    OverlapTooLarge {
        overlap: usize,
        size: usize,
        method: String,
    },

    /// Unknown chunking method name
    #[error("Unknown chunk method: {0} (expected Token, Recursive or Markdown)")]
    UnknownMethod(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error message
    #[error("Configuration error: {message}")]
    Generic { message: String },
}

impl CommonError for ConfigError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

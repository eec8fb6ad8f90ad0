//! Shared error classification
//!
//! Every crate keeps its own `thiserror` enum. This module only gives them a
//! common vocabulary so the binary can decide how to report a failure without
//! knowing which crate produced it.

/// Broad category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied settings or text that cannot be processed
    InvalidInput,
    /// Reading or writing a file or stream failed
    Io,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Process exit code conventionally used for this kind of failure
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::InvalidInput => 2,
            Self::Io => 74,
            Self::Internal => 1,
        }
    }
}

/// Implemented by the error enums of every textchunk crate
pub trait CommonError: std::error::Error + Send + Sync + 'static {
    /// Classify this error
    fn kind(&self) -> ErrorKind;

    /// True when the caller's settings or text caused the failure
    fn is_caller_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("bad input: {0}")]
        Bad(String),
        #[error("disk: {0}")]
        Disk(String),
    }

    impl CommonError for TestError {
        fn kind(&self) -> ErrorKind {
            match self {
                Self::Bad(_) => ErrorKind::InvalidInput,
                Self::Disk(_) => ErrorKind::Io,
            }
        }
    }

    #[test]
    fn test_caller_errors_are_flagged() {
        assert!(TestError::Bad("chunk size".into()).is_caller_error());
        assert!(!TestError::Disk("full".into()).is_caller_error());
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            ErrorKind::InvalidInput.exit_code(),
            ErrorKind::Io.exit_code(),
            ErrorKind::Internal.exit_code(),
        ];
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
        assert_ne!(codes[0], codes[2]);
    }
}

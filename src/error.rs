//! Error types for the seqlog CLI.
//!
//! Uses thiserror for derive macros. Every failure kind the log engine can
//! report is a distinct variant so callers can branch on it, and each
//! variant maps to its own process exit code.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for seqlog operations.
#[derive(Error, Debug)]
pub enum SeqLogError {
    /// User provided invalid arguments, or a log/config file is malformed.
    #[error("{0}")]
    UserError(String),

    /// Target directory does not exist on add/update.
    #[error("target directory not found: {0}")]
    TargetNotFound(String),

    /// Add attempted against a directory already recorded in the log.
    #[error("directory already logged: {0}")]
    DuplicateEntry(String),

    /// The log lock is held by another process.
    #[error("lock acquisition failed: {0}")]
    LockUnavailable(String),

    /// Filesystem failure during read, temp-file write, or atomic replace.
    #[error("{0}")]
    IoFailure(String),
}

impl SeqLogError {
    /// Returns the appropriate exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            SeqLogError::UserError(_) => exit_codes::USER_ERROR,
            SeqLogError::TargetNotFound(_) => exit_codes::TARGET_NOT_FOUND,
            SeqLogError::DuplicateEntry(_) => exit_codes::DUPLICATE_ENTRY,
            SeqLogError::LockUnavailable(_) => exit_codes::LOCK_FAILURE,
            SeqLogError::IoFailure(_) => exit_codes::IO_FAILURE,
        }
    }
}

/// Result type alias for seqlog operations.
pub type Result<T> = std::result::Result<T, SeqLogError>;

//! Error types for game input and solver invariants.

use thiserror::Error;

/// The error type for parsing and solving.
#[derive(Debug, Error)]
pub enum Error {
    /// The input game description is malformed. The run is aborted at the
    /// parse boundary; no partial game or template is produced.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// An internal consistency check failed. This is a programmer error.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// An I/O error from reading the input or writing the output.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// A malformed-input error with the one-based input line on which the
    /// problem was detected.
    pub(crate) fn malformed_at(line: usize, message: impl std::fmt::Display) -> Self {
        Self::MalformedInput(format!("line {}: {}", line, message))
    }
}

/// A specialized result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

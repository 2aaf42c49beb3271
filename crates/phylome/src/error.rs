//! Error types for the phylome library.

use thiserror::Error;

/// Result type alias for phylome operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while processing sequence families.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed file, unknown field, or a value that could not be parsed.
    #[error("input error: {0}")]
    Input(String),

    /// Mutually incompatible options or an option used in the wrong mode.
    #[error("argument error: {0}")]
    Argument(String),

    /// An operation was asked to work on data that is not there.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// An external binary failed, timed out, or produced unusable output.
    ///
    /// Carries everything the process left behind so the caller can report
    /// the failure without re-running the tool.
    #[error("tool failure: {tool} ({status}): {stderr}")]
    ToolFailure {
        /// Name of the external program.
        tool: String,
        /// Exit status, or a description when the process did not exit.
        status: String,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// An internal invariant was broken. Fatal.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::Input`] with a formatted message.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        Self::Input(msg.into())
    }

    /// Shorthand for an [`Error::Argument`] with a formatted message.
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        Self::Argument(msg.into())
    }

    /// Shorthand for an [`Error::EmptyInput`] with a formatted message.
    pub fn empty<S: Into<String>>(msg: S) -> Self {
        Self::EmptyInput(msg.into())
    }
}

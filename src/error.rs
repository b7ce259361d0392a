//! Error types shared by the analysis and generation pipeline.
//!
//! Every core operation returns a [`Result`] so callers always receive either a
//! value or a structured description of what went wrong.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A source file, report file or root directory does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    /// A document was malformed or lacked a required structure.
    #[error("Failed to parse {format}: {message}")]
    ParseFailure { format: &'static str, message: String },

    /// A driven external tool could not be started or exited unsuccessfully.
    #[error("`{command}` failed (exit code {exit_code:?}): {stderr}")]
    ExternalProcessFailure {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A driven external tool exceeded its time bound.
    #[error("`{command}` timed out after {seconds} seconds")]
    Timeout { command: String, seconds: u64 },

    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            format,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

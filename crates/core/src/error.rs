//! Error types for presentation text extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting and writing presentation text.
///
/// Every variant is fatal for the run: nothing is written once an error
/// has been raised.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not exist or cannot be opened.
    #[error("Input file '{}' not found or not readable", .0.display())]
    InputNotFound(PathBuf),

    /// The input could not be parsed as a presentation package.
    #[error("Invalid or corrupted presentation: {0}")]
    InvalidContainer(String),

    /// The requested output format is not one of docx, md, rtf.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The external converter was explicitly requested but is not installed.
    #[error("External converter '{0}' is not available")]
    ExternalToolUnavailable(String),

    /// The external converter ran but did not produce the output.
    #[error("External converter failed: {0}")]
    ExternalToolFailed(String),

    /// The destination could not be written.
    #[error("Failed to write '{}': {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidContainer`] with a formatted message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidContainer(message.into())
    }
}

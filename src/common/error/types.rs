//! Error kinds raised while opening templates and building presentations.
use thiserror::Error;

/// Main error type for longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Template is not a readable package, or lacks a required part
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// A plan names a slide type the template structure does not describe
    #[error("Unknown slide type: {0}")]
    UnknownSlideType(String),

    /// A slide fragment could not be parsed or rewritten
    #[error("Cannot resolve {path}: {reason}")]
    ResolutionError { path: String, reason: String },

    /// The synchronized manifests disagree, or reference a missing part
    #[error("Manifest mismatch: {0}")]
    ManifestMismatch(String),

    /// Malformed structure, plan, roster or options document
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(String),
}

impl Error {
    /// Build a [`Error::ResolutionError`] for a part.
    pub fn resolution(path: impl Into<String>, reason: impl ToString) -> Self {
        Error::ResolutionError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for longan operations.
pub type Result<T> = std::result::Result<T, Error>;

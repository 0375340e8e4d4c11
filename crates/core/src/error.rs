//! Error types for embedded object extraction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting embedded objects.
#[derive(Error, Debug)]
pub enum Error {
    /// The input container does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input is not a container this tool understands.
    #[error("Unsupported or unrecognized container format: {0}")]
    UnsupportedFormat(String),

    /// An archive entry could not be read.
    #[error("Corrupted part '{part}': {reason}")]
    PartCorrupted { part: String, reason: String },

    /// A part was written but the written file does not match the source.
    #[error("Failed to save '{}': {reason}", path.display())]
    SaveFailed { path: PathBuf, reason: String },

    /// The output directory cannot be created or written.
    #[error("Output directory '{}' is not usable: {reason}", path.display())]
    OutputDirectory { path: PathBuf, reason: String },

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// OLE/CFB container error.
    #[error("OLE/CFB error: {0}")]
    CfbError(String),

    /// A user-supplied name mapping could not be loaded.
    #[error("Name mapping error: {0}")]
    MappingError(String),
}

impl Error {
    /// Stable category of this error, used in failure records.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputNotFound(_) => ErrorKind::InputNotFound,
            Error::UnsupportedFormat(_) => ErrorKind::InputFormatUnsupported,
            Error::PartCorrupted { .. } | Error::ZipError(_) => ErrorKind::PartCorrupted,
            Error::SaveFailed { .. } => ErrorKind::PartSaveFailed,
            Error::OutputDirectory { .. } => ErrorKind::OutputUnavailable,
            Error::XmlError(_) | Error::CfbError(_) | Error::MappingError(_) => {
                ErrorKind::MetadataMalformed
            }
            Error::IoError(_) => ErrorKind::Io,
        }
    }

    /// Whether this error must abort the whole run rather than a single part.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InputNotFound
                | ErrorKind::InputFormatUnsupported
                | ErrorKind::OutputUnavailable
        )
    }
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InputNotFound,
    InputFormatUnsupported,
    PartCorrupted,
    PartSaveFailed,
    OutputUnavailable,
    MetadataMalformed,
    Io,
}

//! The data-access layer's error taxonomy. Every variant carries the
//! offending path so a caller can identify exactly which file failed,
//! without leaking the underlying I/O error's internal details upward.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    /// I/O failure (missing permissions, device error, ...). A file simply
    /// not existing is NOT an error at this layer. Callers that need
    /// "file not found" as a hard failure (e.g. [`crate::FileStatCache`])
    /// construct this variant explicitly; `OhlcvStore::load_day` instead
    /// treats a missing day file as empty data.
    #[error("file system error for `{path}`: {message}")]
    FileSystem { path: PathBuf, message: String },

    /// Malformed CSV content (wrong column count, unparsable numeric
    /// field, ...).
    #[error("parse error for `{path}` at row {row:?}: {message}")]
    Parse {
        path: PathBuf,
        row: Option<usize>,
        message: String,
    },

    /// The file is not valid UTF-8.
    #[error("encoding error for `{path}`: {message}")]
    Encoding { path: PathBuf, message: String },

    /// The file parsed as CSV but violates a structural expectation (bad
    /// header, OHLC invariant violation, ...).
    #[error("structure error for `{path}`: {message}")]
    Structure { path: PathBuf, message: String },
}

impl DataError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::FileSystem { path, .. }
            | Self::Parse { path, .. }
            | Self::Encoding { path, .. }
            | Self::Structure { path, .. } => path,
        }
    }
}

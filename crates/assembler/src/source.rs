//! Loading assembly source from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to obtain source text.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not UTF-8.
    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 {
        /// File that failed.
        path: PathBuf,
    },
}

/// Reads a whole source file.
///
/// # Errors
///
/// Returns [`SourceError`] when the file cannot be read or is not UTF-8.
pub fn read_source(path: &Path) -> Result<String, SourceError> {
    let bytes = fs::read(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| SourceError::NotUtf8 {
        path: path.to_path_buf(),
    })
}

//! Error types for scanning operations.

use thiserror::Error;

/// Errors that can occur while filtering or scanning trees.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// A glob pattern could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern {
        /// The offending pattern (or comma-joined set).
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// IO error while reading a directory.
    #[error("IO error at {path}: {source}")]
    IoError {
        /// Path being accessed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl FileSystemError {
    /// Create an IoError for a path.
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.display().to_string(),
            source,
        }
    }
}

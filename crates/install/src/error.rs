//! Error types for install operations.

use installkit_filesystem::FileSystemError;
use thiserror::Error;

/// Errors that can occur while configuring or executing installs.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Arguments to an operation cannot be reconciled, or a package is unknown.
    ///
    /// Expected to abort the build's configuration phase.
    #[error("{operation} {message}")]
    Usage {
        /// Name of the operation that was misused.
        operation: &'static str,
        /// What was wrong.
        message: String,
    },

    /// Pattern compilation or directory scanning failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// Copying a file failed while executing an install action.
    #[error("Failed to install {path}: {source}")]
    Io {
        /// Destination being written.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    /// Create a usage error for an operation.
    pub fn usage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Usage {
            operation,
            message: message.into(),
        }
    }

    /// Whether this is a usage error.
    pub fn is_usage(&self) -> bool {
        matches!(self, InstallError::Usage { .. })
    }
}

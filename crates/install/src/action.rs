//! Copy-install actions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InstallError;

/// One file copy, queued at configuration time and run at build time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallAction {
    /// Destination file path.
    pub dest: PathBuf,
    /// File to copy.
    pub source: PathBuf,
}

impl InstallAction {
    /// Create a new install action.
    pub fn new(dest: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            source: source.into(),
        }
    }

    /// Copy the source to the destination.
    ///
    /// Missing parent directories are created. Permissions are copied along
    /// with the content.
    ///
    /// # Returns
    /// Number of bytes copied.
    ///
    /// # Errors
    /// Returns error if the source cannot be read or the destination written.
    pub fn execute(&self) -> Result<u64, InstallError> {
        if let Some(parent) = self.dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
            }
        }

        let bytes: u64 =
            std::fs::copy(&self.source, &self.dest).map_err(|e| io_error(&self.dest, e))?;
        log::debug!(
            "Installed {} -> {} ({} bytes)",
            self.source.display(),
            self.dest.display(),
            bytes
        );
        Ok(bytes)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> InstallError {
    InstallError::Io {
        path: path.display().to_string(),
        source,
    }
}

//! Per-call scan options shared by `install_files` and `install_package_accum`.

use installkit_filesystem::ScanMode;
use serde::{Deserialize, Serialize};

use crate::args::Nested;

/// Options controlling which files an install operation picks up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallOptions {
    /// Name patterns to exclude (files and directories).
    pub exclude: Vec<String>,
    /// Name patterns files must match (empty = all files).
    pub glob: Vec<String>,
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Which trees to scan.
    pub scan: ScanMode,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            glob: Vec::new(),
            recursive: true,
            scan: ScanMode::Both,
        }
    }
}

impl InstallOptions {
    /// Create options with defaults (recursive, both trees, no patterns).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exclude patterns.
    pub fn with_exclude(mut self, patterns: impl Into<Nested<String>>) -> Self {
        self.exclude = patterns.into().flatten();
        self
    }

    /// Set the include patterns.
    pub fn with_glob(mut self, patterns: impl Into<Nested<String>>) -> Self {
        self.glob = patterns.into().flatten();
        self
    }

    /// Set whether to scan recursively.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the scan mode.
    pub fn scan(mut self, scan: ScanMode) -> Self {
        self.scan = scan;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options: InstallOptions = InstallOptions::default();
        assert!(options.exclude.is_empty());
        assert!(options.glob.is_empty());
        assert!(options.recursive);
        assert_eq!(options.scan, ScanMode::Both);
    }

    #[test]
    fn test_builder_flattens_patterns() {
        let options: InstallOptions = InstallOptions::new()
            .with_exclude(vec![
                Nested::<String>::from("*.bak"),
                Nested::<String>::from(vec![".git", "CVS"]),
            ])
            .with_glob("*.h")
            .recursive(false)
            .scan(ScanMode::Source);

        assert_eq!(options.exclude, vec!["*.bak", ".git", "CVS"]);
        assert_eq!(options.glob, vec!["*.h"]);
        assert!(!options.recursive);
        assert_eq!(options.scan, ScanMode::Source);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let options: InstallOptions =
            serde_json::from_str(r#"{"glob": ["*.txt"], "scan": "built"}"#).unwrap();
        assert_eq!(options.glob, vec!["*.txt"]);
        assert!(options.recursive);
        assert_eq!(options.scan, ScanMode::Built);
    }
}

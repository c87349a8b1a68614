//! Named packages of files accumulated for later installation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A file recorded under a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Destination relative to wherever the package is installed.
    pub dest: PathBuf,
    /// File to copy.
    pub source: PathBuf,
}

impl PackageEntry {
    /// Create a new package entry.
    pub fn new(dest: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            source: source.into(),
        }
    }
}

/// Package name to accumulated entries, in insertion order per package.
///
/// Entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageTable {
    packages: BTreeMap<String, Vec<PackageEntry>>,
}

impl PackageTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries to a package, creating it if absent.
    pub fn accumulate(&mut self, name: &str, entries: impl IntoIterator<Item = PackageEntry>) {
        self.packages
            .entry(name.to_string())
            .or_default()
            .extend(entries);
    }

    /// Entries of a package, if it exists.
    pub fn get(&self, name: &str) -> Option<&[PackageEntry]> {
        self.packages.get(name).map(Vec::as_slice)
    }

    /// Whether a package exists.
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Package names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether there are no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

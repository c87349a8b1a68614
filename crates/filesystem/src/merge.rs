//! Combining built and on-disk source files into one install list.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use installkit_common::lexical_normalize;
use serde::{Deserialize, Serialize};

use crate::disk::scan_disk;
use crate::error::FileSystemError;
use crate::glob::GlobFilter;
use crate::graph::{scan_built, BuildGraph, NodeId};
use crate::tree::ScanEntry;

/// Which trees a scan enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Derived files from the build graph only.
    Built,
    /// Files already on disk in the source tree only.
    Source,
    /// Both, with a built file replacing its on-disk source counterpart.
    #[default]
    Both,
}

impl ScanMode {
    /// Whether this mode scans the build graph.
    pub fn includes_built(self) -> bool {
        matches!(self, ScanMode::Built | ScanMode::Both)
    }

    /// Whether this mode scans the source tree on disk.
    pub fn includes_source(self) -> bool {
        matches!(self, ScanMode::Source | ScanMode::Both)
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            ScanMode::Built => "built",
            ScanMode::Source => "source",
            ScanMode::Both => "both",
        };
        f.write_str(name)
    }
}

/// Error for an unrecognized scan mode selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid scan mode '{0}': expected 0/built, 1/source or 2/both")]
pub struct InvalidScanMode(pub String);

impl TryFrom<u8> for ScanMode {
    type Error = InvalidScanMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ScanMode::Built),
            1 => Ok(ScanMode::Source),
            2 => Ok(ScanMode::Both),
            other => Err(InvalidScanMode(other.to_string())),
        }
    }
}

impl FromStr for ScanMode {
    type Err = InvalidScanMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "built" | "0" => Ok(ScanMode::Built),
            "source" | "1" => Ok(ScanMode::Source),
            "both" | "2" => Ok(ScanMode::Both),
            _ => Err(InvalidScanMode(s.to_string())),
        }
    }
}

/// Collect the files to install for one source node.
///
/// In [`ScanMode::Both`], built files are scanned first and each one's source
/// counterpart is remembered; on-disk files with a remembered counterpart are
/// then dropped, so a pending build output always wins over a stale source
/// file of the same relative path.
///
/// # Arguments
/// * `graph` - Build graph holding `source`
/// * `source` - File or directory node to install from
/// * `filter` - Include/exclude patterns
/// * `recursive` - Whether to descend into subdirectories
/// * `mode` - Which trees to enumerate
///
/// # Errors
/// Returns error if an existing source directory cannot be listed.
pub fn collect_files<G: BuildGraph + ?Sized>(
    graph: &G,
    source: NodeId,
    filter: &GlobFilter,
    recursive: bool,
    mode: ScanMode,
) -> Result<Vec<ScanEntry>, FileSystemError> {
    let mut results: Vec<ScanEntry> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    if mode.includes_built() {
        results = scan_built(graph, source, filter, recursive)?;
        seen.extend(
            results
                .iter()
                .map(|entry: &ScanEntry| graph.srcnode_path(&entry.source)),
        );
    }

    if mode.includes_source() {
        let root: PathBuf = graph.srcnode(source);
        for entry in scan_disk(&root, filter, recursive)? {
            if seen.contains(&lexical_normalize(&entry.source)) {
                log::trace!("{} superseded by a built file", entry.source.display());
                continue;
            }
            results.push(entry);
        }
    }

    log::debug!(
        "Collected {} file(s) from {} ({})",
        results.len(),
        graph.abspath(source).display(),
        mode
    );
    Ok(results)
}

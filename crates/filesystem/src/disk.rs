//! Scanner for source files that already exist on disk.

use std::fs::{FileType, Metadata};
use std::path::{Path, PathBuf};

use installkit_common::file_name_string;
use walkdir::WalkDir;

use crate::error::FileSystemError;
use crate::glob::GlobFilter;
use crate::tree::{scan_tree, EntryKind, ScanEntry, ScanTree};

/// The real filesystem as a [`ScanTree`].
///
/// Symbolic links are never followed or reported, which also rules out
/// traversal cycles. Directory children are visited in file-name order so
/// that install actions come out the same on every platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskTree;

impl ScanTree for DiskTree {
    type Node = PathBuf;

    fn classify(&self, node: &PathBuf) -> EntryKind {
        let metadata: Metadata = match std::fs::symlink_metadata(node) {
            Ok(m) => m,
            Err(_) => return EntryKind::Skip, // Missing or inaccessible
        };

        let file_type: FileType = metadata.file_type();
        if file_type.is_symlink() {
            EntryKind::Skip
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::Skip
        }
    }

    fn name(&self, node: &PathBuf) -> Option<String> {
        file_name_string(node)
    }

    fn path(&self, node: &PathBuf) -> PathBuf {
        node.clone()
    }

    fn children(&self, node: &PathBuf) -> Result<Vec<PathBuf>, FileSystemError> {
        let walker: WalkDir = WalkDir::new(node)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut children: Vec<PathBuf> = Vec::new();
        for entry in walker {
            let entry: walkdir::DirEntry = entry.map_err(|e| {
                log::warn!("Cannot list directory {}: {}", node.display(), e);
                FileSystemError::IoError {
                    path: e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| node.display().to_string()),
                    source: e.into(),
                }
            })?;
            children.push(entry.into_path());
        }
        Ok(children)
    }
}

/// Find files on disk under `path`.
///
/// A missing path or a symlink yields no entries. A plain file yields a
/// single `./<basename>` entry regardless of filters.
///
/// # Arguments
/// * `path` - Absolute file or directory path
/// * `filter` - Include/exclude patterns for directory children
/// * `recursive` - Whether to descend into subdirectories
///
/// # Errors
/// Returns error if an existing directory cannot be listed.
pub fn scan_disk(
    path: &Path,
    filter: &GlobFilter,
    recursive: bool,
) -> Result<Vec<ScanEntry>, FileSystemError> {
    log::debug!("Scanning source tree {}", path.display());
    scan_tree(&DiskTree, &path.to_path_buf(), filter, recursive)
}

//! Backend-independent tree walk shared by the disk and build-graph scanners.
//!
//! Both scanners follow the same contract:
//! - A root that is a file yields exactly one entry (`./<basename>`), with no
//!   filtering applied.
//! - A root that is a directory is walked child by child. Excluded names are
//!   skipped (files and directories alike), included files are reported, and
//!   directories are descended into when `recursive` is set, depth-first with
//!   the parent's prefix first.
//! - Anything the backend classifies as [`EntryKind::Skip`] is never reported
//!   and never traversed.
//!
//! Relative paths always start from `./`, the prefix every install operation
//! scans with. Nested directories extend it inside the walk, so callers never
//! pass a prefix themselves.

use std::path::{Path, PathBuf};

use installkit_common::{CURRENT_DIR, PARENT_DIR};
use serde::{Deserialize, Serialize};

use crate::error::FileSystemError;
use crate::glob::GlobFilter;

/// A file found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanEntry {
    /// Path relative to the scan root, starting with `./`.
    pub relative: PathBuf,
    /// Absolute path of the file to install.
    pub source: PathBuf,
}

impl ScanEntry {
    /// Create a new scan entry.
    pub fn new(relative: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            relative: relative.into(),
            source: source.into(),
        }
    }
}

/// Classification of a node after disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A file that may be reported.
    File,
    /// A directory that may be traversed.
    Dir,
    /// Never reported or traversed (symlinks, missing paths, source-only nodes).
    Skip,
}

/// A tree of files and directories that can be scanned.
pub trait ScanTree {
    /// Handle to a node in the tree.
    type Node;

    /// Resolve a node to its concrete kind.
    fn classify(&self, node: &Self::Node) -> EntryKind;

    /// Final path component of a node, if it has one.
    fn name(&self, node: &Self::Node) -> Option<String>;

    /// Absolute path of a node.
    fn path(&self, node: &Self::Node) -> PathBuf;

    /// Immediate children of a directory node, in traversal order.
    ///
    /// # Errors
    /// Returns error if the directory cannot be listed.
    fn children(&self, node: &Self::Node) -> Result<Vec<Self::Node>, FileSystemError>;
}

/// Scan a tree from `root`, collecting files that pass `filter`.
///
/// # Arguments
/// * `tree` - Backend to walk
/// * `root` - File or directory to start from
/// * `filter` - Include/exclude patterns
/// * `recursive` - Whether to descend into subdirectories
///
/// # Returns
/// Matching entries, relative paths rooted at `./`.
///
/// # Errors
/// Returns error if a directory cannot be listed.
pub fn scan_tree<T: ScanTree>(
    tree: &T,
    root: &T::Node,
    filter: &GlobFilter,
    recursive: bool,
) -> Result<Vec<ScanEntry>, FileSystemError> {
    let prefix: &Path = Path::new(CURRENT_DIR);

    match tree.classify(root) {
        EntryKind::File => Ok(tree
            .name(root)
            .map(|name: String| vec![ScanEntry::new(prefix.join(name), tree.path(root))])
            .unwrap_or_default()),
        EntryKind::Dir => {
            let mut results: Vec<ScanEntry> = Vec::new();
            walk(tree, root, filter, recursive, prefix, &mut results)?;
            Ok(results)
        }
        EntryKind::Skip => Ok(Vec::new()),
    }
}

fn walk<T: ScanTree>(
    tree: &T,
    dir: &T::Node,
    filter: &GlobFilter,
    recursive: bool,
    reldir: &Path,
    results: &mut Vec<ScanEntry>,
) -> Result<(), FileSystemError> {
    for child in tree.children(dir)? {
        let name: String = match tree.name(&child) {
            Some(name) if name != CURRENT_DIR && name != PARENT_DIR => name,
            _ => continue,
        };

        if filter.is_excluded(&name) {
            log::trace!("Excluded {}", tree.path(&child).display());
            continue;
        }

        match tree.classify(&child) {
            EntryKind::File => {
                if filter.is_included(&name) {
                    results.push(ScanEntry::new(reldir.join(&name), tree.path(&child)));
                }
            }
            EntryKind::Dir => {
                if recursive {
                    walk(tree, &child, filter, recursive, &reldir.join(&name), results)?;
                }
            }
            EntryKind::Skip => {
                log::trace!("Skipping {}", tree.path(&child).display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Minimal in-memory tree keyed by absolute path string.
    #[derive(Default)]
    struct FakeTree {
        kinds: HashMap<String, EntryKind>,
        children: HashMap<String, Vec<String>>,
    }

    impl FakeTree {
        fn add(&mut self, path: &str, kind: EntryKind) {
            if let Some((parent, _)) = path.rsplit_once('/') {
                self.children
                    .entry(parent.to_string())
                    .or_default()
                    .push(path.to_string());
            }
            self.kinds.insert(path.to_string(), kind);
        }
    }

    impl ScanTree for FakeTree {
        type Node = String;

        fn classify(&self, node: &String) -> EntryKind {
            self.kinds.get(node).copied().unwrap_or(EntryKind::Skip)
        }

        fn name(&self, node: &String) -> Option<String> {
            node.rsplit('/').next().map(str::to_string)
        }

        fn path(&self, node: &String) -> PathBuf {
            PathBuf::from(node)
        }

        fn children(&self, node: &String) -> Result<Vec<String>, FileSystemError> {
            let mut children: Vec<String> = vec![format!("{node}/."), format!("{node}/..")];
            children.extend(self.children.get(node).cloned().unwrap_or_default());
            Ok(children)
        }
    }

    fn sample() -> FakeTree {
        let mut tree: FakeTree = FakeTree::default();
        tree.add("/r", EntryKind::Dir);
        tree.add("/r/a.txt", EntryKind::File);
        tree.add("/r/b.bak", EntryKind::File);
        tree.add("/r/link", EntryKind::Skip);
        tree.add("/r/sub", EntryKind::Dir);
        tree.add("/r/sub/c.txt", EntryKind::File);
        tree.add("/r/sub/deeper", EntryKind::Dir);
        tree.add("/r/sub/deeper/d.txt", EntryKind::File);
        tree
    }

    fn relatives(entries: &[ScanEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.relative.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_recursive_depth_first() {
        let tree: FakeTree = sample();
        let entries: Vec<ScanEntry> =
            scan_tree(&tree, &"/r".to_string(), &GlobFilter::new(), true).unwrap();
        assert_eq!(
            relatives(&entries),
            vec!["./a.txt", "./b.bak", "./sub/c.txt", "./sub/deeper/d.txt"]
        );
        assert_eq!(entries[3].source, PathBuf::from("/r/sub/deeper/d.txt"));
    }

    #[test]
    fn test_non_recursive_only_top_level() {
        let tree: FakeTree = sample();
        let entries: Vec<ScanEntry> =
            scan_tree(&tree, &"/r".to_string(), &GlobFilter::new(), false).unwrap();
        assert_eq!(relatives(&entries), vec!["./a.txt", "./b.bak"]);
    }

    #[test]
    fn test_pseudo_entries_never_reported() {
        let mut tree: FakeTree = sample();
        // Even if a backend claims the pseudo-entries are files, they are dropped
        tree.kinds.insert("/r/.".to_string(), EntryKind::File);
        tree.kinds.insert("/r/..".to_string(), EntryKind::File);
        let entries: Vec<ScanEntry> =
            scan_tree(&tree, &"/r".to_string(), &GlobFilter::new(), true).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries
            .iter()
            .all(|e| e.source != PathBuf::from("/r/..") && e.relative != PathBuf::from("./..")));
    }

    #[test]
    fn test_exclude_prunes_directories() {
        let tree: FakeTree = sample();
        let filter: GlobFilter = GlobFilter::exclude(vec!["sub".to_string()]).unwrap();
        let entries: Vec<ScanEntry> =
            scan_tree(&tree, &"/r".to_string(), &filter, true).unwrap();
        assert_eq!(relatives(&entries), vec!["./a.txt", "./b.bak"]);
    }

    #[test]
    fn test_include_applies_to_files_only() {
        let tree: FakeTree = sample();
        // "sub" does not match *.txt but must still be traversed
        let filter: GlobFilter = GlobFilter::include(vec!["*.txt".to_string()]).unwrap();
        let entries: Vec<ScanEntry> =
            scan_tree(&tree, &"/r".to_string(), &filter, true).unwrap();
        assert_eq!(
            relatives(&entries),
            vec!["./a.txt", "./sub/c.txt", "./sub/deeper/d.txt"]
        );
    }

    #[test]
    fn test_file_root_ignores_filters() {
        let tree: FakeTree = sample();
        let filter: GlobFilter = GlobFilter::exclude(vec!["*.bak".to_string()]).unwrap();
        let entries: Vec<ScanEntry> =
            scan_tree(&tree, &"/r/b.bak".to_string(), &filter, true).unwrap();
        assert_eq!(entries, vec![ScanEntry::new("./b.bak", "/r/b.bak")]);
    }

    #[test]
    fn test_skip_root_is_empty() {
        let tree: FakeTree = sample();
        let entries: Vec<ScanEntry> =
            scan_tree(&tree, &"/r/link".to_string(), &GlobFilter::new(), true).unwrap();
        assert!(entries.is_empty());
    }
}

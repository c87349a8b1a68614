//! File discovery for installkit.
//!
//! This crate finds the files an install operation should copy:
//! - `GlobFilter` - Include/exclude name matching
//! - `scan_disk()` - Source files already on disk (`DiskTree`)
//! - `scan_built()` - Derived files known to a build graph (`GraphTree`)
//! - `collect_files()` - Both, with built files taking precedence
//!
//! Both scanners share one walk (`tree::scan_tree`) over the `ScanTree`
//! trait, so filtering and recursion behave identically on either backend.

pub mod disk;
pub mod error;
pub mod glob;
pub mod graph;
pub mod merge;
pub mod tree;

// Re-export main types
pub use disk::{scan_disk, DiskTree};
pub use error::FileSystemError;
pub use glob::{is_excluded, is_included, GlobFilter};
pub use graph::{scan_built, BuildGraph, GraphTree, MemoryGraph, NodeId, NodeKind};
pub use merge::{collect_files, InvalidScanMode, ScanMode};
pub use tree::{scan_tree, EntryKind, ScanEntry, ScanTree};

//! Shared constants used across installkit crates.

/// Relative-path prefix for entries found directly under a scan root.
pub const CURRENT_DIR: &str = ".";

/// Parent directory marker, never reported as a scan entry.
pub const PARENT_DIR: &str = "..";

//! Shared path utilities for installkit.
//!
//! This crate provides functionality used across the installkit crates:
//! - Lexical path normalization (the `normpath` used for install destinations)
//! - Re-rooting paths between build and source directories
//! - Path component constants

pub mod constants;
pub mod path_utils;

// Re-export commonly used items at crate root
pub use constants::*;
pub use path_utils::{file_name_string, join_normalized, lexical_normalize, rebase};

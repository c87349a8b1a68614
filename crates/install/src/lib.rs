//! Install operations for build environments.
//!
//! Four operations are registered on an [`Environment`]:
//! - `install_files()` - Copy files from sources into target directories
//! - `install_package_accum()` - Record files under a named package
//! - `install_package()` - Install everything recorded for a package
//! - `install_exclude()` - Set patterns every later scan excludes
//!
//! Operations only queue [`InstallAction`]s and declare their destinations
//! in the build graph. Copies happen when the actions are executed.

pub mod action;
pub mod args;
pub mod environment;
pub mod error;
pub mod options;
pub mod package;

// Re-export main types
pub use action::InstallAction;
pub use args::{Nested, NodeSpec};
pub use environment::Environment;
pub use error::InstallError;
pub use options::InstallOptions;
pub use package::{PackageEntry, PackageTable};

pub use installkit_filesystem::{BuildGraph, MemoryGraph, NodeId, ScanEntry, ScanMode};

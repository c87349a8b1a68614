//! Path normalization utilities for computing install destinations.

use std::path::{Component, Path, PathBuf};

/// Lexical path normalization without filesystem access.
///
/// Removes `.` components and resolves `..` components lexically.
/// Does not access the filesystem or resolve symlinks.
///
/// # Arguments
/// * `path` - Path to normalize
///
/// # Returns
/// Normalized path with `.` and `..` resolved lexically. A path that
/// normalizes to nothing (e.g. `.` or `a/..`) becomes `.`.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => { /* skip . */ }
            Component::ParentDir => {
                match components.last() {
                    // `..` directly under the root stays at the root
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    Some(Component::ParentDir) | None => components.push(component),
                    Some(_) => {
                        components.pop();
                    }
                }
            }
            _ => components.push(component),
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }
    components.iter().collect()
}

/// Join a relative path onto a base directory and normalize the result.
///
/// This is the destination computation for every install action:
/// `normpath(base / relative)`.
///
/// # Arguments
/// * `base` - Target directory (absolute, or relative for package destinations)
/// * `relative` - Path relative to `base`, possibly starting with `./`
pub fn join_normalized(base: &Path, relative: &Path) -> PathBuf {
    lexical_normalize(&base.join(relative))
}

/// Re-root a path from one directory to another.
///
/// Returns `None` if `path` is not lexically within `from`.
///
/// # Arguments
/// * `path` - Path to re-root
/// * `from` - Directory `path` currently lives under
/// * `to` - Directory to move it under
pub fn rebase(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    let norm_path: PathBuf = lexical_normalize(path);
    let norm_from: PathBuf = lexical_normalize(from);
    let rest: &Path = norm_path.strip_prefix(&norm_from).ok()?;
    Some(join_normalized(to, rest))
}

/// Final component of a path as an owned string.
///
/// Returns `None` for paths ending in `..` or the root.
pub fn file_name_string(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

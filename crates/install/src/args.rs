//! Argument shapes accepted by install operations.
//!
//! Targets, sources, package names and pattern lists may be given as a single
//! value or as arbitrarily nested lists; every operation flattens them first.

use std::path::{Path, PathBuf};

use installkit_filesystem::NodeId;

use crate::error::InstallError;

/// A single value or a nested list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested<T> {
    /// One value.
    One(T),
    /// A list whose items may themselves be lists.
    Many(Vec<Nested<T>>),
}

impl<T> Nested<T> {
    /// Flatten into a single list, depth-first, preserving order.
    pub fn flatten(self) -> Vec<T> {
        let mut out: Vec<T> = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<T>) {
        match self {
            Nested::One(value) => out.push(value),
            Nested::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl<T> Default for Nested<T> {
    fn default() -> Self {
        Nested::Many(Vec::new())
    }
}

impl<T, U: Into<Nested<T>>> From<Vec<U>> for Nested<T> {
    fn from(items: Vec<U>) -> Self {
        Nested::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T, U: Into<Nested<T>>, const N: usize> From<[U; N]> for Nested<T> {
    fn from(items: [U; N]) -> Self {
        Nested::Many(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Nested<String> {
    fn from(value: &str) -> Self {
        Nested::One(value.to_string())
    }
}

impl From<String> for Nested<String> {
    fn from(value: String) -> Self {
        Nested::One(value)
    }
}

/// A target or source: a path string or an existing graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    /// Path, resolved through the build graph (relative to its top directory).
    Path(PathBuf),
    /// A node already in the build graph.
    Node(NodeId),
}

impl From<&str> for Nested<NodeSpec> {
    fn from(value: &str) -> Self {
        Nested::One(NodeSpec::Path(PathBuf::from(value)))
    }
}

impl From<String> for Nested<NodeSpec> {
    fn from(value: String) -> Self {
        Nested::One(NodeSpec::Path(PathBuf::from(value)))
    }
}

impl From<&Path> for Nested<NodeSpec> {
    fn from(value: &Path) -> Self {
        Nested::One(NodeSpec::Path(value.to_path_buf()))
    }
}

impl From<PathBuf> for Nested<NodeSpec> {
    fn from(value: PathBuf) -> Self {
        Nested::One(NodeSpec::Path(value))
    }
}

impl From<NodeId> for Nested<NodeSpec> {
    fn from(value: NodeId) -> Self {
        Nested::One(NodeSpec::Node(value))
    }
}

impl From<NodeSpec> for Nested<NodeSpec> {
    fn from(value: NodeSpec) -> Self {
        Nested::One(value)
    }
}

/// Pair targets with sources.
///
/// Equal lengths pair up element-wise; a single target is reused for every
/// source. Anything else is a usage error for `operation`.
pub(crate) fn broadcast<T: Clone, S>(
    operation: &'static str,
    message: &str,
    targets: Vec<T>,
    sources: Vec<S>,
) -> Result<Vec<(T, S)>, InstallError> {
    if targets.len() == sources.len() {
        return Ok(targets.into_iter().zip(sources).collect());
    }

    match targets.as_slice() {
        [target] => Ok(sources
            .into_iter()
            .map(|source: S| (target.clone(), source))
            .collect()),
        _ => Err(InstallError::usage(operation, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_single() {
        let nested: Nested<String> = Nested::<String>::from("a");
        assert_eq!(nested.flatten(), vec!["a".to_string()]);
    }

    #[test]
    fn test_flatten_deep_preserves_order() {
        let inner: Vec<Nested<String>> = vec![
            Nested::<String>::from("b"),
            Nested::<String>::from(vec!["c", "d"]),
        ];
        let nested: Nested<String> = Nested::Many(vec![
            Nested::<String>::from("a"),
            Nested::<String>::from(inner),
            Nested::<String>::from("e"),
        ]);
        assert_eq!(nested.flatten(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_flatten_empty() {
        let nested: Nested<String> = Nested::default();
        assert!(nested.flatten().is_empty());
    }

    #[test]
    fn test_node_spec_from_values() {
        let items: Vec<Nested<NodeSpec>> = vec![
            Nested::<NodeSpec>::from("docs"),
            Nested::<NodeSpec>::from(NodeId(3)),
        ];
        let specs: Vec<NodeSpec> = Nested::<NodeSpec>::from(items).flatten();
        assert_eq!(
            specs,
            vec![NodeSpec::Path(PathBuf::from("docs")), NodeSpec::Node(NodeId(3))]
        );
    }

    #[test]
    fn test_broadcast_equal_lengths() {
        let pairs: Vec<(&str, &str)> =
            broadcast("Op", "bad", vec!["t1", "t2"], vec!["s1", "s2"]).unwrap();
        assert_eq!(pairs, vec![("t1", "s1"), ("t2", "s2")]);
    }

    #[test]
    fn test_broadcast_single_target() {
        let pairs: Vec<(&str, &str)> =
            broadcast("Op", "bad", vec!["t"], vec!["s1", "s2", "s3"]).unwrap();
        assert_eq!(pairs, vec![("t", "s1"), ("t", "s2"), ("t", "s3")]);
    }

    #[test]
    fn test_broadcast_mismatch_is_usage_error() {
        let err: InstallError =
            broadcast("InstallFiles", "expects one", vec!["a", "b"], vec!["s1"]).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "InstallFiles expects one");
    }

    #[test]
    fn test_broadcast_no_targets() {
        let result: Result<Vec<(&str, &str)>, InstallError> =
            broadcast("Op", "bad", Vec::new(), vec!["s1"]);
        assert!(result.is_err());
    }
}

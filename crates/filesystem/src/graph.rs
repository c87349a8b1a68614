//! Build-graph abstraction and the scanner for derived (built) files.
//!
//! A build tool tracks files that do not exist yet: outputs of build steps
//! that will be produced later. [`BuildGraph`] is the narrow interface this
//! crate needs from such a graph, and [`MemoryGraph`] is a self-contained
//! implementation of it.
//!
//! # Variant directories
//!
//! Build outputs often live in a separate tree (`build/`) that mirrors the
//! source tree (`src/`). The *source node* of a path is its counterpart in the
//! source tree; for paths outside any variant directory it is the path itself.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use installkit_common::{file_name_string, join_normalized, lexical_normalize, rebase};
use serde::{Deserialize, Serialize};

use crate::error::FileSystemError;
use crate::glob::GlobFilter;
use crate::tree::{scan_tree, EntryKind, ScanEntry, ScanTree};

/// Handle to a node in a [`BuildGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Concrete type of a node after disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A file node.
    File,
    /// A directory node.
    Dir,
    /// Neither (e.g. an alias or value node).
    Other,
}

/// Host build-graph introspection.
pub trait BuildGraph {
    /// Look up (or create) a node for a path whose type is not yet known.
    ///
    /// Relative paths are resolved against the graph's top directory.
    fn entry(&mut self, path: &Path) -> NodeId;

    /// Look up (or create) a directory node.
    fn dir(&mut self, path: &Path) -> NodeId;

    /// Declare a file that a build step will produce.
    fn declare_output(&mut self, path: &Path) -> NodeId;

    /// Whether `node` was issued by this graph.
    fn contains(&self, node: NodeId) -> bool;

    /// Collapse a file-or-directory node to its concrete type.
    fn disambiguate(&self, node: NodeId) -> NodeKind;

    /// Whether a node is produced by a build step.
    fn is_derived(&self, node: NodeId) -> bool;

    /// Immediate children of a directory node.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Absolute path of a node.
    fn abspath(&self, node: NodeId) -> PathBuf;

    /// Source-tree counterpart of an absolute path.
    fn srcnode_path(&self, path: &Path) -> PathBuf;

    /// Source-tree counterpart of a node.
    fn srcnode(&self, node: NodeId) -> PathBuf {
        self.srcnode_path(&self.abspath(node))
    }
}

/// Adapts a [`BuildGraph`] to [`ScanTree`], reporting derived files only.
///
/// Non-derived files are skipped entirely: the disk scanner picks them up.
pub struct GraphTree<'a, G: BuildGraph + ?Sized> {
    graph: &'a G,
}

impl<'a, G: BuildGraph + ?Sized> GraphTree<'a, G> {
    /// Wrap a graph for scanning.
    pub fn new(graph: &'a G) -> Self {
        Self { graph }
    }
}

impl<G: BuildGraph + ?Sized> ScanTree for GraphTree<'_, G> {
    type Node = NodeId;

    fn classify(&self, node: &NodeId) -> EntryKind {
        match self.graph.disambiguate(*node) {
            NodeKind::File if self.graph.is_derived(*node) => EntryKind::File,
            NodeKind::File => EntryKind::Skip,
            NodeKind::Dir => EntryKind::Dir,
            NodeKind::Other => EntryKind::Skip,
        }
    }

    fn name(&self, node: &NodeId) -> Option<String> {
        file_name_string(&self.graph.abspath(*node))
    }

    fn path(&self, node: &NodeId) -> PathBuf {
        self.graph.abspath(*node)
    }

    fn children(&self, node: &NodeId) -> Result<Vec<NodeId>, FileSystemError> {
        Ok(self.graph.children(*node))
    }
}

/// Find derived files under a build-graph node.
///
/// # Arguments
/// * `graph` - Build graph to walk
/// * `node` - File or directory node to start from
/// * `filter` - Include/exclude patterns for directory children
/// * `recursive` - Whether to descend into subdirectories
pub fn scan_built<G: BuildGraph + ?Sized>(
    graph: &G,
    node: NodeId,
    filter: &GlobFilter,
    recursive: bool,
) -> Result<Vec<ScanEntry>, FileSystemError> {
    log::debug!("Scanning build graph at {}", graph.abspath(node).display());
    scan_tree(&GraphTree::new(graph), &node, filter, recursive)
}

/// How a node was declared to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    /// Type not known yet.
    Entry,
    File,
    Dir,
}

#[derive(Debug, Clone)]
struct GraphNode {
    path: PathBuf,
    declared: Declared,
    derived: bool,
    children: BTreeMap<String, NodeId>,
}

/// A build-to-source directory mapping.
#[derive(Debug, Clone)]
struct VariantDir {
    build: PathBuf,
    src: PathBuf,
}

/// In-memory [`BuildGraph`].
///
/// Nodes are keyed by normalized absolute path. Declaring a node declares its
/// parent directories too.
#[derive(Debug, Clone)]
pub struct MemoryGraph {
    top: PathBuf,
    nodes: Vec<GraphNode>,
    index: HashMap<PathBuf, NodeId>,
    variants: Vec<VariantDir>,
}

impl MemoryGraph {
    /// Create a graph whose relative paths resolve against `top`.
    pub fn new(top: impl Into<PathBuf>) -> Self {
        Self {
            top: lexical_normalize(&top.into()),
            nodes: Vec::new(),
            index: HashMap::new(),
            variants: Vec::new(),
        }
    }

    /// Top directory of the graph.
    pub fn top(&self) -> &Path {
        &self.top
    }

    /// Look up (or create) a file node.
    pub fn file(&mut self, path: impl AsRef<Path>) -> NodeId {
        let path: PathBuf = self.resolve(path.as_ref());
        self.intern(path, Declared::File)
    }

    /// Register a file produced by a build step.
    pub fn add_derived(&mut self, path: impl AsRef<Path>) -> NodeId {
        let id: NodeId = self.file(path);
        self.nodes[id.0].derived = true;
        id
    }

    /// Map a build directory onto the source directory it mirrors.
    pub fn add_variant_dir(&mut self, build: impl AsRef<Path>, src: impl AsRef<Path>) {
        let build: PathBuf = self.resolve(build.as_ref());
        let src: PathBuf = self.resolve(src.as_ref());
        self.intern(build.clone(), Declared::Dir);
        self.variants.push(VariantDir { build, src });
        // Longest build prefix wins for nested variants
        self.variants
            .sort_by(|a: &VariantDir, b: &VariantDir| {
                b.build.components().count().cmp(&a.build.components().count())
            });
    }

    /// Find an existing node without creating it.
    pub fn lookup(&self, path: impl AsRef<Path>) -> Option<NodeId> {
        self.index.get(&self.resolve(path.as_ref())).copied()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            lexical_normalize(path)
        } else {
            join_normalized(&self.top, path)
        }
    }

    fn intern(&mut self, path: PathBuf, declared: Declared) -> NodeId {
        if let Some(&id) = self.index.get(&path) {
            let node: &mut GraphNode = &mut self.nodes[id.0];
            if node.declared == Declared::Entry {
                node.declared = declared;
            }
            return id;
        }

        let parent: Option<NodeId> = match path.parent() {
            Some(parent) if parent != path && !parent.as_os_str().is_empty() => {
                Some(self.intern(parent.to_path_buf(), Declared::Dir))
            }
            _ => None,
        };

        let id: NodeId = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            path: path.clone(),
            declared,
            derived: false,
            children: BTreeMap::new(),
        });
        self.index.insert(path.clone(), id);

        if let (Some(parent), Some(name)) = (parent, file_name_string(&path)) {
            let parent_node: &mut GraphNode = &mut self.nodes[parent.0];
            if parent_node.declared == Declared::Entry {
                parent_node.declared = Declared::Dir;
            }
            parent_node.children.insert(name, id);
        }

        id
    }
}

impl BuildGraph for MemoryGraph {
    fn entry(&mut self, path: &Path) -> NodeId {
        let path: PathBuf = self.resolve(path);
        self.intern(path, Declared::Entry)
    }

    fn dir(&mut self, path: &Path) -> NodeId {
        let path: PathBuf = self.resolve(path);
        self.intern(path, Declared::Dir)
    }

    fn declare_output(&mut self, path: &Path) -> NodeId {
        self.add_derived(path)
    }

    fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn disambiguate(&self, node: NodeId) -> NodeKind {
        let graph_node: &GraphNode = match self.nodes.get(node.0) {
            Some(n) => n,
            None => return NodeKind::Other,
        };

        match graph_node.declared {
            Declared::File => NodeKind::File,
            Declared::Dir => NodeKind::Dir,
            Declared::Entry => {
                let on_disk_dir: bool = graph_node.path.is_dir()
                    || self.srcnode_path(&graph_node.path).is_dir();
                if !graph_node.children.is_empty() || on_disk_dir {
                    NodeKind::Dir
                } else {
                    NodeKind::File
                }
            }
        }
    }

    fn is_derived(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).map(|n| n.derived).unwrap_or(false)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.values().copied().collect())
            .unwrap_or_default()
    }

    fn abspath(&self, node: NodeId) -> PathBuf {
        self.nodes
            .get(node.0)
            .map(|n| n.path.clone())
            .unwrap_or_default()
    }

    fn srcnode_path(&self, path: &Path) -> PathBuf {
        self.variants
            .iter()
            .find_map(|v: &VariantDir| rebase(path, &v.build, &v.src))
            .unwrap_or_else(|| lexical_normalize(path))
    }
}

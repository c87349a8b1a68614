//! The build environment that install operations are registered on.
//!
//! An [`Environment`] owns everything the operations share: the build graph,
//! the variable context used for substitution, the global exclusion list, the
//! package table and the queue of install actions. It starts out empty, and
//! separate environments never see each other's packages or exclusions.
//!
//! # Example
//!
//! ```no_run
//! use installkit::{Environment, InstallOptions, MemoryGraph};
//!
//! # fn main() -> Result<(), installkit::InstallError> {
//! let mut env = Environment::new(MemoryGraph::new("/project"));
//! env.install_exclude(vec![".git", "*~"])?;
//!
//! // Headers straight into the install tree
//! env.install_files("/stage/include", "include", &InstallOptions::new().with_glob("*.h"))?;
//!
//! // Docs collected now, placed later
//! env.set_var("DOCDIR", "share/doc");
//! env.install_package_accum("docs", "$DOCDIR", "docs", &InstallOptions::default())?;
//! env.install_package("/stage", "docs")?;
//!
//! env.execute_all()?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use installkit_common::join_normalized;
use installkit_filesystem::{collect_files, BuildGraph, GlobFilter, MemoryGraph, NodeId, ScanEntry};

use crate::action::InstallAction;
use crate::args::{broadcast, Nested, NodeSpec};
use crate::error::InstallError;
use crate::options::InstallOptions;
use crate::package::{PackageEntry, PackageTable};

const INSTALL_FILES: &str = "InstallFiles";
const INSTALL_PACKAGE_ACCUM: &str = "InstallPackageAccum";
const INSTALL_PACKAGE: &str = "InstallPackage";

/// Build environment carrying install state.
pub struct Environment<G: BuildGraph = MemoryGraph> {
    graph: G,
    vars: BTreeMap<String, String>,
    exclusions: Vec<String>,
    packages: PackageTable,
    actions: Vec<InstallAction>,
}

impl<G: BuildGraph> Environment<G> {
    /// Create an environment over a build graph, with empty install state.
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            vars: BTreeMap::new(),
            exclusions: Vec::new(),
            packages: PackageTable::new(),
            actions: Vec::new(),
        }
    }

    /// The build graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// The build graph, mutably (to register derived files).
    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// Set a substitution variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up a substitution variable.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// The global exclusion list.
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// The package table.
    pub fn packages(&self) -> &PackageTable {
        &self.packages
    }

    /// Install actions queued so far, in issue order.
    pub fn actions(&self) -> &[InstallAction] {
        &self.actions
    }

    /// Remove and return all queued install actions.
    pub fn take_actions(&mut self) -> Vec<InstallAction> {
        std::mem::take(&mut self.actions)
    }

    /// Run every queued install action in order, draining the queue.
    ///
    /// # Returns
    /// Number of actions executed.
    ///
    /// # Errors
    /// Stops at the first failed copy, which stays queued along with the rest.
    pub fn execute_all(&mut self) -> Result<usize, InstallError> {
        let mut done: usize = 0;
        let mut result: Result<(), InstallError> = Ok(());

        for action in &self.actions {
            if let Err(e) = action.execute() {
                result = Err(e);
                break;
            }
            done += 1;
        }
        self.actions.drain(..done);
        result?;

        log::info!("Executed {} install action(s)", done);
        Ok(done)
    }

    /// Substitute `$NAME` and `${NAME}` references from the variable context.
    ///
    /// Unknown variables expand to nothing and `$$` is a literal `$`.
    pub fn subst(&self, input: &str) -> String {
        let mut out: String = String::with_capacity(input.len());
        let mut chars = input.char_indices().peekable();

        while let Some((_, ch)) = chars.next() {
            if ch != '$' {
                out.push(ch);
                continue;
            }

            match chars.peek().copied() {
                Some((_, '$')) => {
                    chars.next();
                    out.push('$');
                }
                Some((start, '{')) => {
                    chars.next();
                    let rest: &str = &input[start + 1..];
                    match rest.find('}') {
                        Some(len) => {
                            out.push_str(self.var(&rest[..len]).unwrap_or_default());
                            for _ in 0..rest[..=len].chars().count() {
                                chars.next();
                            }
                        }
                        None => {
                            // Unterminated, keep as written
                            out.push_str("${");
                        }
                    }
                }
                Some((start, c)) if c == '_' || c.is_ascii_alphabetic() => {
                    let rest: &str = &input[start..];
                    let len: usize = rest
                        .find(|c: char| c != '_' && !c.is_ascii_alphanumeric())
                        .unwrap_or(rest.len());
                    out.push_str(self.var(&rest[..len]).unwrap_or_default());
                    for _ in 0..len {
                        chars.next();
                    }
                }
                _ => out.push('$'),
            }
        }

        out
    }

    /// Replace the global exclusion list.
    ///
    /// The patterns are added to every exclude list used by later scans.
    ///
    /// # Errors
    /// Returns error (leaving the list unchanged) if a pattern cannot be
    /// compiled.
    pub fn install_exclude(
        &mut self,
        patterns: impl Into<Nested<String>>,
    ) -> Result<(), InstallError> {
        let patterns: Vec<String> = patterns.into().flatten();
        GlobFilter::exclude(patterns.clone())?;
        log::debug!("Global install exclusions: {:?}", patterns);
        self.exclusions = patterns;
        Ok(())
    }

    /// Install files from each source into its target directory.
    ///
    /// # Arguments
    /// * `target` - One target directory, or one per source
    /// * `source` - Files or directories to install from
    /// * `options` - Patterns, recursion and scan mode
    ///
    /// # Returns
    /// The install actions queued by this call.
    ///
    /// # Errors
    /// Usage error if targets and sources cannot be paired; scan errors.
    pub fn install_files(
        &mut self,
        target: impl Into<Nested<NodeSpec>>,
        source: impl Into<Nested<NodeSpec>>,
        options: &InstallOptions,
    ) -> Result<Vec<InstallAction>, InstallError> {
        let filter: GlobFilter = self.filter(options)?;
        let pairs: Vec<(NodeSpec, NodeSpec)> = broadcast(
            INSTALL_FILES,
            "expects only one target directory or one for each source",
            target.into().flatten(),
            source.into().flatten(),
        )?;

        let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (target, source) in pairs {
            let target_dir: PathBuf = self.target_dir(INSTALL_FILES, target)?;
            for entry in self.scan(INSTALL_FILES, source, &filter, options)? {
                files.push((join_normalized(&target_dir, &entry.relative), entry.source));
            }
        }

        let actions: Vec<InstallAction> = files
            .into_iter()
            .map(|(dest, source)| self.install_as(dest, source))
            .collect();
        log::debug!("{} queued {} action(s)", INSTALL_FILES, actions.len());
        Ok(actions)
    }

    /// Record files from each source under a named package.
    ///
    /// Nothing is installed until [`install_package`](Self::install_package).
    ///
    /// # Arguments
    /// * `name` - Package to add to (created if absent)
    /// * `target` - Sub-path within the package (e.g. `"."` or `"$DOCDIR"`),
    ///   one for all sources or one per source; variables are substituted
    /// * `source` - Files or directories to install from
    /// * `options` - Patterns, recursion and scan mode
    ///
    /// # Returns
    /// Number of entries added to the package.
    ///
    /// # Errors
    /// Usage error if targets and sources cannot be paired; scan errors.
    pub fn install_package_accum(
        &mut self,
        name: &str,
        target: impl Into<Nested<String>>,
        source: impl Into<Nested<NodeSpec>>,
        options: &InstallOptions,
    ) -> Result<usize, InstallError> {
        let filter: GlobFilter = self.filter(options)?;
        let pairs: Vec<(String, NodeSpec)> = broadcast(
            INSTALL_PACKAGE_ACCUM,
            "expects only one target directory or one for each source",
            target.into().flatten(),
            source.into().flatten(),
        )?;

        let mut entries: Vec<PackageEntry> = Vec::new();
        for (target, source) in pairs {
            let subdir: PathBuf = PathBuf::from(self.subst(&target));
            for entry in self.scan(INSTALL_PACKAGE_ACCUM, source, &filter, options)? {
                entries.push(PackageEntry::new(
                    join_normalized(&subdir, &entry.relative),
                    entry.source,
                ));
            }
        }

        let added: usize = entries.len();
        self.packages.accumulate(name, entries);
        log::debug!("{} added {} file(s) to package '{}'", INSTALL_PACKAGE_ACCUM, added, name);
        Ok(added)
    }

    /// Install the accumulated files of each package into its target directory.
    ///
    /// # Arguments
    /// * `target` - One target directory, or one per package
    /// * `name` - Package names
    ///
    /// # Returns
    /// The install actions queued by this call.
    ///
    /// # Errors
    /// Usage error if targets and names cannot be paired or a package does not
    /// exist. Nothing is queued in either case.
    pub fn install_package(
        &mut self,
        target: impl Into<Nested<NodeSpec>>,
        name: impl Into<Nested<String>>,
    ) -> Result<Vec<InstallAction>, InstallError> {
        let pairs: Vec<(NodeSpec, String)> = broadcast(
            INSTALL_PACKAGE,
            "expects only one target directory or one for each package",
            target.into().flatten(),
            name.into().flatten(),
        )?;

        if let Some((_, missing)) = pairs.iter().find(|(_, name)| !self.packages.contains(name)) {
            return Err(InstallError::usage(
                INSTALL_PACKAGE,
                format!("package name does not exist: {}", missing),
            ));
        }

        let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (target, name) in pairs {
            let target_dir: PathBuf = self.target_dir(INSTALL_PACKAGE, target)?;
            for entry in self.packages.get(&name).unwrap_or_default() {
                files.push((join_normalized(&target_dir, &entry.dest), entry.source.clone()));
            }
        }

        let actions: Vec<InstallAction> = files
            .into_iter()
            .map(|(dest, source)| self.install_as(dest, source))
            .collect();
        log::debug!("{} queued {} action(s)", INSTALL_PACKAGE, actions.len());
        Ok(actions)
    }

    /// Caller patterns plus the global exclusion list.
    fn filter(&self, options: &InstallOptions) -> Result<GlobFilter, InstallError> {
        let mut exclude: Vec<String> = options.exclude.clone();
        exclude.extend(self.exclusions.iter().cloned());
        Ok(GlobFilter::with_patterns(options.glob.clone(), exclude)?)
    }

    fn scan(
        &mut self,
        operation: &'static str,
        source: NodeSpec,
        filter: &GlobFilter,
        options: &InstallOptions,
    ) -> Result<Vec<ScanEntry>, InstallError> {
        let node: NodeId = match source {
            NodeSpec::Path(path) => self.graph.entry(&path),
            NodeSpec::Node(node) => self.known(operation, node)?,
        };
        Ok(collect_files(&self.graph, node, filter, options.recursive, options.scan)?)
    }

    fn target_dir(
        &mut self,
        operation: &'static str,
        target: NodeSpec,
    ) -> Result<PathBuf, InstallError> {
        let node: NodeId = match target {
            NodeSpec::Path(path) => self.graph.dir(&path),
            NodeSpec::Node(node) => self.known(operation, node)?,
        };
        Ok(self.graph.abspath(node))
    }

    /// Reject node handles this environment's graph never issued.
    fn known(&self, operation: &'static str, node: NodeId) -> Result<NodeId, InstallError> {
        if self.graph.contains(node) {
            Ok(node)
        } else {
            Err(InstallError::usage(
                operation,
                format!("node is not in the build graph: {:?}", node),
            ))
        }
    }

    /// Queue a copy and declare its destination as a build output.
    fn install_as(&mut self, dest: PathBuf, source: PathBuf) -> InstallAction {
        self.graph.declare_output(&dest);
        let action: InstallAction = InstallAction::new(dest, source);
        self.actions.push(action.clone());
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn env() -> Environment {
        Environment::new(MemoryGraph::new("/proj"))
    }

    #[test]
    fn test_new_environment_is_empty() {
        let env: Environment = env();
        assert!(env.exclusions().is_empty());
        assert!(env.packages().is_empty());
        assert!(env.actions().is_empty());
    }

    #[test]
    fn test_subst_variables() {
        let mut env: Environment = env();
        env.set_var("PREFIX", "/usr/local");
        env.set_var("DOC_DIR", "share/doc");

        assert_eq!(env.subst("$PREFIX/bin"), "/usr/local/bin");
        assert_eq!(env.subst("${DOC_DIR}/pkg"), "share/doc/pkg");
        assert_eq!(env.subst("$DOC_DIR.txt"), "share/doc.txt");
        assert_eq!(env.subst("a$UNKNOWN/b"), "a/b");
        assert_eq!(env.subst("cost: $$5"), "cost: $5");
        assert_eq!(env.subst("plain"), "plain");
        assert_eq!(env.subst("."), ".");
    }

    #[test]
    fn test_subst_edge_cases() {
        let mut env: Environment = env();
        env.set_var("X", "x");
        assert_eq!(env.subst("$"), "$");
        assert_eq!(env.subst("$1"), "$1");
        assert_eq!(env.subst("${X"), "${X");
        assert_eq!(env.subst("${X}${X}"), "xx");
    }

    #[test]
    fn test_install_exclude_replaces() {
        let mut env: Environment = env();
        env.install_exclude(vec!["*.tmp", "*.bak"]).unwrap();
        env.install_exclude(vec![Nested::<String>::from(".git"), Nested::<String>::from(vec!["CVS"])])
            .unwrap();
        assert_eq!(env.exclusions(), &[".git".to_string(), "CVS".to_string()]);
    }

    #[test]
    fn test_install_exclude_accepts_literal_brackets() {
        let mut env: Environment = env();
        env.install_exclude("*.tmp").unwrap();
        env.install_exclude(vec!["[draft", "notes{old}"]).unwrap();
        assert_eq!(
            env.exclusions(),
            &["[draft".to_string(), "notes{old}".to_string()]
        );
    }

    #[test]
    fn test_unknown_target_node_is_usage_error() {
        let mut env: Environment = env();
        env.graph_mut().add_derived("build/app");

        let err: InstallError = env
            .install_files(NodeId(999), "build", &InstallOptions::new())
            .unwrap_err();

        assert!(err.is_usage());
        assert_eq!(
            err.to_string(),
            "InstallFiles node is not in the build graph: NodeId(999)"
        );
        assert!(env.actions().is_empty());
    }

    #[test]
    fn test_unknown_source_node_is_usage_error() {
        let mut env: Environment = env();
        let err: InstallError = env
            .install_package_accum("pkg", ".", NodeId(42), &InstallOptions::new())
            .unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().starts_with("InstallPackageAccum "));
        assert!(!env.packages().contains("pkg"));
    }

    #[test]
    fn test_known_node_target() {
        let mut env: Environment = env();
        env.graph_mut().add_derived("build/app");
        let stage: NodeId = env.graph_mut().dir(Path::new("stage"));

        let actions: Vec<InstallAction> = env
            .install_files(stage, "build", &InstallOptions::new())
            .unwrap();

        assert_eq!(actions, vec![InstallAction::new("/proj/stage/app", "/proj/build/app")]);
    }

    #[test]
    fn test_install_package_unknown_target_node() {
        let mut env: Environment = env();
        env.graph_mut().add_derived("build/a");
        env.install_package_accum("lib", ".", "build", &InstallOptions::new())
            .unwrap();

        let err: InstallError = env.install_package(NodeId(77), "lib").unwrap_err();
        assert!(err.is_usage());
        assert!(env.actions().is_empty());
    }

    #[test]
    fn test_install_files_from_built_nodes() {
        let mut env: Environment = env();
        env.graph_mut().add_derived("build/bin/app");
        env.graph_mut().add_derived("build/lib/libapp.so");

        let actions: Vec<InstallAction> = env
            .install_files("stage", "build", &InstallOptions::new())
            .unwrap();

        assert_eq!(
            actions,
            vec![
                InstallAction::new("/proj/stage/bin/app", "/proj/build/bin/app"),
                InstallAction::new("/proj/stage/lib/libapp.so", "/proj/build/lib/libapp.so"),
            ]
        );
        assert_eq!(env.actions(), actions.as_slice());
    }

    #[test]
    fn test_install_files_declares_outputs() {
        let mut env: Environment = env();
        env.graph_mut().add_derived("build/app");
        env.install_files("stage", "build", &InstallOptions::new())
            .unwrap();

        let staged: NodeId = env.graph().lookup("stage/app").unwrap();
        assert!(env.graph().is_derived(staged));
    }

    #[test]
    fn test_install_files_mismatch() {
        let mut env: Environment = env();
        let err: InstallError = env
            .install_files(vec!["a", "b"], vec!["s1"], &InstallOptions::new())
            .unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().starts_with("InstallFiles "));
        assert!(env.actions().is_empty());
    }

    #[test]
    fn test_install_package_accum_substitutes_target() {
        let mut env: Environment = env();
        env.set_var("LIBDIR", "lib64");
        env.graph_mut().add_derived("build/libz.so");

        let added: usize = env
            .install_package_accum("runtime", "$LIBDIR", "build", &InstallOptions::new())
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(
            env.packages().get("runtime").unwrap(),
            &[PackageEntry::new("lib64/libz.so", "/proj/build/libz.so")]
        );
        assert!(env.actions().is_empty());
    }

    #[test]
    fn test_install_package_unknown_queues_nothing() {
        let mut env: Environment = env();
        env.graph_mut().add_derived("build/a");
        env.install_package_accum("known", ".", "build", &InstallOptions::new())
            .unwrap();

        let err: InstallError = env
            .install_package("out", vec!["known", "missing_pkg"])
            .unwrap_err();

        assert!(err.is_usage());
        assert_eq!(
            err.to_string(),
            "InstallPackage package name does not exist: missing_pkg"
        );
        assert!(env.actions().is_empty());
    }

    #[test]
    fn test_install_package_per_target() {
        let mut env: Environment = env();
        env.graph_mut().add_derived("build/a.so");
        env.graph_mut().add_derived("docs/a.html");
        env.install_package_accum("lib", ".", "build", &InstallOptions::new())
            .unwrap();
        env.install_package_accum("doc", "html", "docs", &InstallOptions::new())
            .unwrap();

        let actions: Vec<InstallAction> = env
            .install_package(vec!["/opt/lib", "/opt/share"], vec!["lib", "doc"])
            .unwrap();

        assert_eq!(
            actions,
            vec![
                InstallAction::new("/opt/lib/a.so", "/proj/build/a.so"),
                InstallAction::new("/opt/share/html/a.html", "/proj/docs/a.html"),
            ]
        );
    }

    #[test]
    fn test_install_package_mismatch() {
        let mut env: Environment = env();
        let err: InstallError = env
            .install_package(vec!["a", "b"], vec!["x", "y", "z"])
            .unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().starts_with("InstallPackage "));
    }
}

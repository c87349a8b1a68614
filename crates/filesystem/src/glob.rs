//! Glob pattern matching for file and directory names.
//!
//! Two pattern lists drive every scan:
//! - **exclude** patterns apply to both files and directories; an empty list
//!   excludes nothing.
//! - **include** ("glob") patterns apply to files only; an empty list includes
//!   everything.
//!
//! Patterns are matched case-sensitively against a single name (not a path)
//! with `fnmatch` rules: `*`, `?`, `[...]` and `[!...]` are special and every
//! other character is literal. That includes `{`, `}` and `\`, and a `[`
//! with no closing `]`.
//!
//! ```
//! use installkit_filesystem::glob::GlobFilter;
//!
//! let filter = GlobFilter::with_patterns(
//!     vec!["*.txt".to_string()],
//!     vec!["*.bak".to_string()],
//! ).unwrap();
//!
//! assert!(filter.is_included("readme.txt"));
//! assert!(filter.is_excluded("notes.bak"));
//! ```

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::FileSystemError;

/// Compiled include/exclude patterns for name filtering.
#[derive(Debug, Clone, Default)]
pub struct GlobFilter {
    /// Compiled include patterns (`None` = include all).
    include_set: Option<GlobSet>,
    /// Compiled exclude patterns.
    exclude_set: Option<GlobSet>,
}

impl GlobFilter {
    /// Create a new filter with no patterns (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with include patterns only.
    ///
    /// # Errors
    /// Returns error if any pattern is invalid.
    pub fn include(patterns: Vec<String>) -> Result<Self, FileSystemError> {
        Self::with_patterns(patterns, vec![])
    }

    /// Create a filter with exclude patterns only.
    ///
    /// # Errors
    /// Returns error if any pattern is invalid.
    pub fn exclude(patterns: Vec<String>) -> Result<Self, FileSystemError> {
        Self::with_patterns(vec![], patterns)
    }

    /// Create a filter with both include and exclude patterns.
    ///
    /// # Arguments
    /// * `include` - Glob patterns for files to include
    /// * `exclude` - Glob patterns for files and directories to exclude
    ///
    /// # Errors
    /// Returns error if any pattern is invalid.
    pub fn with_patterns(
        include: Vec<String>,
        exclude: Vec<String>,
    ) -> Result<Self, FileSystemError> {
        let include_set: Option<GlobSet> = compile(&include)?;
        let exclude_set: Option<GlobSet> = compile(&exclude)?;
        Ok(Self {
            include_set,
            exclude_set,
        })
    }

    /// Check whether a name matches any exclude pattern.
    ///
    /// Always `false` when there are no exclude patterns.
    pub fn is_excluded(&self, name: &str) -> bool {
        match &self.exclude_set {
            Some(set) => set.is_match(name),
            None => false,
        }
    }

    /// Check whether a file name matches any include pattern.
    ///
    /// Always `true` when there are no include patterns.
    pub fn is_included(&self, name: &str) -> bool {
        match &self.include_set {
            Some(set) => set.is_match(name),
            None => true,
        }
    }
}

/// Check a name against a list of exclude patterns.
///
/// # Errors
/// Returns error if any pattern is invalid.
pub fn is_excluded(name: &str, patterns: &[String]) -> Result<bool, FileSystemError> {
    Ok(GlobFilter::exclude(patterns.to_vec())?.is_excluded(name))
}

/// Check a name against a list of include patterns.
///
/// # Errors
/// Returns error if any pattern is invalid.
pub fn is_included(name: &str, patterns: &[String]) -> Result<bool, FileSystemError> {
    Ok(GlobFilter::include(patterns.to_vec())?.is_included(name))
}

/// Compile patterns into a GlobSet, or `None` for an empty list.
fn compile(patterns: &[String]) -> Result<Option<GlobSet>, FileSystemError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder: GlobSetBuilder = GlobSetBuilder::new();
    for pattern in patterns {
        let translated: String = match translate(pattern) {
            Some(t) => t,
            None => {
                log::trace!("Pattern '{}' can never match", pattern);
                continue;
            }
        };
        let glob: Glob = GlobBuilder::new(&translated)
            .backslash_escape(true)
            .build()
            .map_err(|e| FileSystemError::InvalidGlobPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }

    let set: GlobSet = builder
        .build()
        .map_err(|e| FileSystemError::InvalidGlobPattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;
    Ok(Some(set))
}

/// Rewrite an `fnmatch` pattern in `globset` syntax.
///
/// Returns `None` for a pattern that can never match (a class left empty once
/// reversed ranges such as `z-a` are dropped).
fn translate(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out: String = String::with_capacity(pattern.len() * 2);
    let mut i: usize = 0;

    while i < chars.len() {
        match chars[i] {
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&translate_class(&chars[i + 1..end])?);
                    i = end + 1;
                    continue;
                }
                None => out.push_str("\\["),
            },
            // `globset` only accepts `**` as a whole path component
            '*' if i > 0 && chars[i - 1] == '*' => {}
            c @ ('{' | '}' | ']' | '\\') => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
        i += 1;
    }

    Some(out)
}

/// Index of the `]` closing the class opened at `start`.
///
/// A `]` right after `[` or `[!` is a member, not the end.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j: usize = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() && chars[j] != ']' {
        j += 1;
    }
    (j < chars.len()).then_some(j)
}

/// Rebuild a class body so `globset` reads it the way `fnmatch` does.
///
/// `]` goes first and `-` last so both stay literal.
fn translate_class(body: &[char]) -> Option<String> {
    let (negate, body): (bool, &[char]) = match body.split_first() {
        Some((&'!', rest)) => (true, rest),
        _ => (false, body),
    };

    let mut close: bool = false;
    let mut dash: bool = false;
    let mut members: String = String::new();
    let mut k: usize = 0;

    while k < body.len() {
        if k + 2 < body.len() && body[k + 1] == '-' {
            let (lo, hi): (char, char) = (body[k], body[k + 2]);
            if lo <= hi {
                push_member(&mut members, lo);
                members.push('-');
                push_member(&mut members, hi);
            }
            k += 3;
            continue;
        }
        match body[k] {
            ']' => close = true,
            '-' => dash = true,
            c => push_member(&mut members, c),
        }
        k += 1;
    }

    if !close && !dash && members.is_empty() {
        return negate.then(|| "?".to_string());
    }
    if !negate && !close && !dash && (members == "!" || members == "^") {
        return Some(members);
    }

    let mut out: String = String::from(if negate { "[!" } else { "[" });
    if close {
        out.push(']');
    }
    out.push_str(&members);
    if dash {
        out.push('-');
    }
    out.push(']');
    Some(out)
}

fn push_member(out: &mut String, c: char) {
    if c == '\\' {
        out.push('\\');
    }
    out.push(c);
}

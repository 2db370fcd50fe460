//! Sparse path filters
//!
//! A [`SparseFilter`] is the allow/deny form of a resolved path set. It is
//! consumed by the snapshot provider to restrict what it reads from upstream,
//! by the working tree to restrict what it reads locally, and it can render
//! itself as sparse-checkout patterns.

use wax::{CandidatePath, Glob, Pattern};

use crate::path_utils::{is_glob, is_within, literal_prefix};

/// Project-local control files that are never synchronised
pub const RESERVED_PATHS: &[&str] = &[".stencil/template.yml", ".stencil/template.lock"];

/// A single normalised path entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(String);

impl PathPattern {
    pub fn new(entry: impl Into<String>) -> Self {
        Self(entry.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the pattern selects `path`
    ///
    /// Plain entries select themselves and everything beneath them. Glob
    /// entries select any path that matches, or whose ancestor directory
    /// matches.
    pub fn covers(&self, path: &str) -> bool {
        if !is_glob(&self.0) {
            return is_within(path, &self.0);
        }
        let Ok(glob) = Glob::new(&self.0) else {
            return false;
        };
        let mut end = path.len();
        loop {
            let candidate = CandidatePath::from(&path[..end]);
            if glob.matched(&candidate).is_some() {
                return true;
            }
            match path[..end].rfind('/') {
                Some(slash) => end = slash,
                None => return false,
            }
        }
    }

    /// Whether files selected by this pattern may live under `dir`
    pub fn reaches_into(&self, dir: &str) -> bool {
        let prefix = literal_prefix(&self.0);
        is_within(dir, prefix) || is_within(prefix, dir)
    }
}

/// Allow/deny path filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseFilter {
    allow_all: bool,
    allow: Vec<PathPattern>,
    deny: Vec<PathPattern>,
}

impl SparseFilter {
    /// Filter selecting exactly the given include entries, minus excludes
    pub fn allow_list(include: &[String], exclude: &[String]) -> Self {
        Self {
            allow_all: false,
            allow: include.iter().map(PathPattern::new).collect(),
            deny: Self::deny_list(exclude),
        }
    }

    /// Filter selecting everything except the given excludes
    pub fn deny_only(exclude: &[String]) -> Self {
        Self {
            allow_all: true,
            allow: Vec::new(),
            deny: Self::deny_list(exclude),
        }
    }

    fn deny_list(exclude: &[String]) -> Vec<PathPattern> {
        exclude
            .iter()
            .map(PathPattern::new)
            .chain(RESERVED_PATHS.iter().map(|p| PathPattern::new(*p)))
            .collect()
    }

    /// Whether the filter admits everything not explicitly denied
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Whether a file path passes the filter
    pub fn matches(&self, path: &str) -> bool {
        let allowed = self.allow_all || self.allow.iter().any(|p| p.covers(path));
        allowed && !self.deny.iter().any(|p| p.covers(path))
    }

    /// Whether a directory may contain paths that pass the filter
    ///
    /// Used to prune tree walks. Errs on the side of `true`.
    pub fn may_contain(&self, dir: &str) -> bool {
        if self
            .deny
            .iter()
            .any(|p| !is_glob(p.as_str()) && is_within(dir, p.as_str()))
        {
            return false;
        }
        self.allow_all || self.allow.iter().any(|p| p.reaches_into(dir))
    }

    /// Render as sparse-checkout patterns
    ///
    /// Deny-only filters become a universal include followed by negations,
    /// so the fetch can stay partial rather than pulling the whole tree.
    pub fn patterns(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.allow_all {
            lines.push("/*".to_string());
        }
        lines.extend(self.allow.iter().map(|p| format!("/{}", p.as_str())));
        lines.extend(self.deny.iter().map(|p| format!("!/{}", p.as_str())));
        lines
    }
}

//! Version control capabilities
//!
//! The sync coordinator only talks to upstream through the traits in this
//! module:
//!
//! - [`VersionControlClient`]: resolve a branch head, read a filtered snapshot
//! - [`BundleManifestLoader`]: read the bundle manifest at a commit
//!
//! [`git::GitClient`] implements both on top of libgit2.

pub mod git;

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::BundleManifest;
use crate::error::{Result, git as git_error};
use crate::selector::SparseFilter;
use crate::snapshot::Snapshot;

pub use git::GitClient;

/// An upstream template repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Display name, usually `owner/repo`
    pub name: String,
    /// Clone URL
    pub url: String,
}

impl RepoRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Overall time limit for one operation
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    /// A deadline that never expires
    pub fn none() -> Self {
        Self {
            started: Instant::now(),
            limit: None,
        }
    }

    /// A deadline `limit` from now
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit: Some(limit),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed() >= limit)
    }

    /// Fail with `Timeout` if the deadline has passed
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_expired() {
            return Err(git_error::timeout(operation, self.elapsed()));
        }
        Ok(())
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

/// Read access to upstream revisions
pub trait VersionControlClient {
    /// Commit id at the tip of `branch`
    fn resolve_head(&self, repo: &RepoRef, branch: &str, deadline: &Deadline) -> Result<String>;

    /// Files admitted by `filter` at `commit`
    ///
    /// Returns `RevisionNotFound` when the commit does not exist upstream.
    fn fetch_snapshot(
        &self,
        repo: &RepoRef,
        commit: &str,
        filter: &SparseFilter,
        deadline: &Deadline,
    ) -> Result<Snapshot>;
}

/// Read access to the upstream bundle manifest
pub trait BundleManifestLoader {
    /// The manifest at `commit`, or `None` when the template defines no bundles
    fn load_manifest(
        &self,
        repo: &RepoRef,
        commit: &str,
        deadline: &Deadline,
    ) -> Result<Option<BundleManifest>>;
}

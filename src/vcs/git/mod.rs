//! libgit2-backed version control client
//!
//! Each upstream URL is cloned once, bare, into a scratch directory owned by
//! the client. Later calls reuse the clone and only fetch when they need a
//! newer ref or a commit the clone does not have yet. Snapshots are read
//! straight from commit trees, so nothing is ever checked out.
//!
//! Authentication is delegated to git's native credential system (see
//! [`auth`]). Transfers honour the caller's [`Deadline`] through libgit2's
//! transfer-progress callback.

pub mod auth;
pub mod error;
pub mod tree;
pub mod url;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use git2::{Commit, FetchOptions, Oid, RemoteCallbacks, Repository, build::RepoBuilder};
use tempfile::TempDir;
use tracing::{debug, info};

use super::{BundleManifestLoader, Deadline, RepoRef, VersionControlClient};
use crate::config::{BundleManifest, MANIFEST_PATH};
use crate::error::{Result, git as git_error};
use crate::selector::SparseFilter;
use crate::snapshot::Snapshot;

/// Version control client using libgit2
#[derive(Debug)]
pub struct GitClient {
    scratch: TempDir,
    clones: RefCell<HashMap<String, PathBuf>>,
}

impl GitClient {
    /// Create a client with its own scratch directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            scratch: crate::temp::scratch_dir("clones")?,
            clones: RefCell::new(HashMap::new()),
        })
    }

    /// Open the clone of `repo`, cloning it first if needed
    ///
    /// The flag is true when the clone was created by this call.
    fn open(&self, repo: &RepoRef, deadline: &Deadline) -> Result<(Repository, bool)> {
        let cached = self.clones.borrow().get(&repo.url).cloned();
        if let Some(path) = cached {
            let repository =
                Repository::open_bare(&path).map_err(|e| error::read_failed(&repo.url, &e))?;
            return Ok((repository, false));
        }

        let target = self
            .scratch
            .path()
            .join(format!("repo-{}", self.clones.borrow().len()));
        let repository = clone_bare(&repo.url, &target, deadline)?;
        self.clones.borrow_mut().insert(repo.url.clone(), target);
        Ok((repository, true))
    }

    /// Open the clone of `repo` with refs no older than this call
    fn open_fresh(&self, repo: &RepoRef, deadline: &Deadline) -> Result<Repository> {
        let (repository, fresh) = self.open(repo, deadline)?;
        if !fresh {
            fetch(&repository, &repo.url, deadline)?;
        }
        Ok(repository)
    }

    /// Look up a commit, fetching once if the clone predates it
    fn with_commit<T>(
        &self,
        repo: &RepoRef,
        commit: &str,
        deadline: &Deadline,
        read: impl FnOnce(&Repository, &Commit<'_>) -> Result<T>,
    ) -> Result<T> {
        let oid = Oid::from_str(commit)
            .map_err(|_| git_error::revision_not_found(&repo.url, commit))?;

        let (repository, fresh) = self.open(repo, deadline)?;
        if repository.find_commit(oid).is_err() && !fresh {
            debug!(commit, "Commit not in clone, fetching");
            fetch(&repository, &repo.url, deadline)?;
        }
        let found = repository
            .find_commit(oid)
            .map_err(|_| git_error::revision_not_found(&repo.url, commit))?;
        read(&repository, &found)
    }
}

impl VersionControlClient for GitClient {
    fn resolve_head(&self, repo: &RepoRef, branch: &str, deadline: &Deadline) -> Result<String> {
        let repository = self.open_fresh(repo, deadline)?;
        let commit = resolve_branch(&repository, branch)
            .ok_or_else(|| git_error::revision_not_found(&repo.url, branch))?;
        let sha = commit.id().to_string();
        info!(repository = %repo, branch, commit = %sha, "Resolved upstream head");
        Ok(sha)
    }

    fn fetch_snapshot(
        &self,
        repo: &RepoRef,
        commit: &str,
        filter: &SparseFilter,
        deadline: &Deadline,
    ) -> Result<Snapshot> {
        self.with_commit(repo, commit, deadline, |repository, found| {
            let root = found
                .tree()
                .map_err(|e| error::read_failed(&repo.url, &e))?;
            let snapshot = tree::read_filtered(repository, &repo.url, &root, filter, deadline)?;
            debug!(commit, files = snapshot.len(), "Read upstream snapshot");
            Ok(snapshot)
        })
    }
}

impl BundleManifestLoader for GitClient {
    fn load_manifest(
        &self,
        repo: &RepoRef,
        commit: &str,
        deadline: &Deadline,
    ) -> Result<Option<BundleManifest>> {
        self.with_commit(repo, commit, deadline, |repository, found| {
            let read_error = |e: git2::Error| error::read_failed(&repo.url, &e);
            let root = found.tree().map_err(read_error)?;
            let manifest = tree::read_file(repository, &root, MANIFEST_PATH).map_err(read_error)?;
            let Some(content) = manifest else {
                debug!(commit, "No bundle manifest upstream");
                return Ok(None);
            };
            let text = String::from_utf8_lossy(&content);
            BundleManifest::from_yaml(&text).map(Some)
        })
    }
}

/// Fetch options wired to git credentials and the deadline
fn fetch_options(deadline: &Deadline) -> FetchOptions<'_> {
    let mut callbacks = RemoteCallbacks::new();
    auth::install(&mut callbacks);
    callbacks.transfer_progress(move |_| !deadline.is_expired());

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

fn clone_bare(url: &str, target: &std::path::Path, deadline: &Deadline) -> Result<Repository> {
    deadline.check(&format!("cloning {url}"))?;
    info!(url, "Cloning template repository");

    let mut builder = RepoBuilder::new();
    builder.bare(true);
    builder.fetch_options(fetch_options(deadline));
    builder
        .clone(&self::url::normalize(url), target)
        .map_err(|e| error::transfer_failed(url, &e, deadline))
}

fn fetch(repository: &Repository, url: &str, deadline: &Deadline) -> Result<()> {
    deadline.check(&format!("fetching {url}"))?;
    debug!(url, "Fetching template repository");

    let mut remote = repository
        .find_remote("origin")
        .map_err(|e| error::read_failed(url, &e))?;
    remote
        .fetch(&[] as &[&str], Some(&mut fetch_options(deadline)), None)
        .map_err(|e| error::transfer_failed(url, &e, deadline))
}

/// Resolve a branch (or tag, or SHA) name to a commit
///
/// Remote-tracking refs come first: a bare clone's local branches are only
/// written at clone time and go stale after later fetches.
fn resolve_branch<'r>(repository: &'r Repository, name: &str) -> Option<Commit<'r>> {
    let candidates = [
        format!("refs/remotes/origin/{name}"),
        format!("refs/heads/{name}"),
        format!("refs/tags/{name}"),
        name.to_string(),
    ];
    for candidate in &candidates {
        if let Ok(reference) = repository.find_reference(candidate) {
            if let Ok(commit) = reference.peel_to_commit() {
                return Some(commit);
            }
        }
    }

    if let Ok(oid) = Oid::from_str(name) {
        if let Ok(commit) = repository.find_commit(oid) {
            return Some(commit);
        }
    }

    repository
        .revparse_single(name)
        .ok()
        .and_then(|object| object.peel_to_commit().ok())
}

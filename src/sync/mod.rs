//! Sync coordinator
//!
//! Drives one synchronisation of a project against its template:
//!
//! 1. load the configuration and the previous lock record
//! 2. resolve the upstream head, expand bundles and resolve the path set
//! 3. fetch the remote snapshot at the head and the base snapshot at the
//!    locked commit, and read the local working tree
//! 4. reconcile with the requested [`Strategy`] and apply the changes
//! 5. record the new lock
//!
//! Configuration and bundle errors stop the run before anything is fetched;
//! fetch errors and timeouts stop it before the working tree is touched.
//! Per-file problems never stop a run: they are reported as conflicts and the
//! lock still advances.

pub mod state;

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{ConfigurationProvider, TemplateConfig};
use crate::error::{Result, StencilError};
use crate::lock::{self, LockRecord};
use crate::merge::{
    Change, Conflict, ConflictKind, MergeEngine, Preview, Reconciliation, SyncResult,
};
use crate::resolver;
use crate::selector::ResolvedPathSet;
use crate::snapshot::{LocalFiles, Snapshot, WorkingTree};
use crate::vcs::{BundleManifestLoader, Deadline, RepoRef, VersionControlClient};

pub use state::{StateTrail, Strategy, SyncState};

/// Directory whose files need extra push permissions on GitHub
const WORKFLOWS_DIR: &str = ".github/workflows/";

/// Options for one sync run
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub strategy: Strategy,
    /// Overwrite differing files on a first sync instead of skipping them
    pub force: bool,
    /// Overall limit for upstream access
    pub timeout: Option<Duration>,
}

/// Outcome of a successful sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub repository: String,
    pub branch: String,
    /// Upstream commit the project was synced to (or previewed against)
    pub commit: String,
    /// Commit recorded by the previous lock, if any
    pub previous_commit: Option<String>,
    /// Whether a base snapshot was available for a three-way merge
    pub had_base: bool,
    pub strategy: Strategy,
    pub paths: ResolvedPathSet,
    pub result: SyncResult,
    pub previews: Vec<Preview>,
    pub trail: StateTrail,
}

impl SyncReport {
    pub fn state(&self) -> &SyncState {
        self.trail.current()
    }

    /// Whether the commit did not move since the last sync
    pub fn is_up_to_date(&self) -> bool {
        self.previous_commit.as_deref() == Some(self.commit.as_str())
    }
}

/// Orchestrates selection, snapshots, merging and locking
#[derive(Debug)]
pub struct SyncCoordinator<'c, C> {
    client: &'c C,
    engine: MergeEngine,
}

impl<'c, C> SyncCoordinator<'c, C>
where
    C: VersionControlClient + BundleManifestLoader,
{
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            engine: MergeEngine::new(),
        }
    }

    /// Synchronise the project at `project_root`
    ///
    /// # Errors
    ///
    /// Configuration, bundle, fetch and timeout errors, and a failure to save
    /// the lock. The lock is never updated when an error is returned.
    pub fn run(
        &self,
        project_root: &Path,
        config: &impl ConfigurationProvider,
        request: &SyncRequest,
    ) -> Result<SyncReport> {
        self.run_traced(project_root, config, request).0
    }

    /// Like [`run`](Self::run), also returning the states the run went
    /// through. A failed run's trail ends in [`SyncState::Failed`].
    pub fn run_traced(
        &self,
        project_root: &Path,
        config: &impl ConfigurationProvider,
        request: &SyncRequest,
    ) -> (Result<SyncReport>, StateTrail) {
        let mut trail = StateTrail::new();
        let outcome = config
            .load()
            .and_then(|config| self.execute(project_root, &config, request, &mut trail));
        if let Err(err) = &outcome {
            trail.advance(SyncState::Failed(err.to_string()));
            warn!(error = %err, "Sync failed");
        }
        (outcome, trail)
    }

    fn execute(
        &self,
        project_root: &Path,
        config: &TemplateConfig,
        request: &SyncRequest,
        trail: &mut StateTrail,
    ) -> Result<SyncReport> {
        let deadline = request.timeout.map_or_else(Deadline::none, Deadline::after);
        let repo = config.repo_ref()?;
        let branch = config.template_branch.as_str();
        let previous = lock::load(project_root);

        // Selection
        deadline.check("resolving upstream head")?;
        let head = self.client.resolve_head(&repo, branch, &deadline)?;
        let spec = config.path_spec();
        let manifest = if spec.bundles.is_empty() {
            None
        } else {
            deadline.check("loading bundle manifest")?;
            self.client.load_manifest(&repo, &head, &deadline)?
        };
        let paths = resolver::expand(&spec, manifest.as_ref())?;
        trail.advance(SyncState::PathsResolved);
        info!(
            mode = %paths.mode,
            include = ?paths.include,
            exclude = ?paths.exclude,
            "Resolved paths"
        );

        // Snapshots
        let remote_filter = paths.filter();
        deadline.check("fetching upstream snapshot")?;
        let remote = self
            .client
            .fetch_snapshot(&repo, &head, &remote_filter, &deadline)?;

        let base = match (request.strategy, previous.as_ref()) {
            (Strategy::Overwrite, _) | (_, None) => None,
            (_, Some(record)) => {
                self.base_snapshot(&repo, config, record, &head, &paths, &remote, &deadline)?
            }
        };

        let tree = WorkingTree::new(project_root);
        let local = if request.strategy == Strategy::Diff {
            LocalFiles::default()
        } else {
            read_local(&tree, base.as_ref(), &remote)
        };
        trail.advance(SyncState::SnapshotsFetched);

        // Reconciliation
        let Reconciliation {
            mut result,
            changes,
            previews,
        } = self.reconcile(request, base.as_ref(), &local, &remote);

        let report = |result, previews, trail: &mut StateTrail| SyncReport {
            repository: config.template_repository.clone(),
            branch: branch.to_string(),
            commit: head.clone(),
            previous_commit: previous.as_ref().map(|r| r.commit.clone()),
            had_base: base.is_some(),
            strategy: request.strategy,
            paths: paths.clone(),
            result,
            previews,
            trail: trail.clone(),
        };

        if request.strategy == Strategy::Diff {
            trail.advance(SyncState::Previewed);
            return Ok(report(result, previews, trail));
        }

        apply_changes(&tree, &changes, &mut result);
        trail.advance(SyncState::MergeApplied);
        warn_on_workflow_changes(&result);

        lock::save(
            project_root,
            &LockRecord {
                repository: config.template_repository.clone(),
                branch: branch.to_string(),
                commit: head.clone(),
                paths: paths.clone(),
                files: remote.paths().map(str::to_string).collect(),
                synced_at: Utc::now(),
            },
        )?;
        trail.advance(SyncState::LockUpdated);

        info!(
            added = result.added.len(),
            updated = result.updated.len(),
            removed = result.removed.len(),
            conflicted = result.conflicted.len(),
            "Sync complete"
        );
        Ok(report(result, previews, trail))
    }

    /// Reconcile, leaving unreadable local paths out as conflicts
    fn reconcile(
        &self,
        request: &SyncRequest,
        base: Option<&Snapshot>,
        local: &LocalFiles,
        remote: &Snapshot,
    ) -> Reconciliation {
        if local.unreadable.is_empty() {
            return self.reconcile_snapshots(request, base, &local.snapshot, remote);
        }
        let (base, remote) = without_paths(base, remote, &local.unreadable);
        let mut out = self.reconcile_snapshots(request, base.as_ref(), &local.snapshot, &remote);
        for path in &local.unreadable {
            out.result
                .conflicted
                .push(Conflict::new(path.as_str(), ConflictKind::ReadFailed));
        }
        out
    }

    fn reconcile_snapshots(
        &self,
        request: &SyncRequest,
        base: Option<&Snapshot>,
        local: &Snapshot,
        remote: &Snapshot,
    ) -> Reconciliation {
        match (request.strategy, base) {
            (Strategy::Merge, Some(base)) => self.engine.merge(base, local, remote),
            (Strategy::Merge, None) => {
                info!("No usable lock, syncing as a first sync");
                self.engine.first_sync(local, remote, request.force)
            }
            (Strategy::Overwrite, _) => self.engine.overwrite(local, remote),
            (Strategy::Diff, Some(base)) => self.engine.diff(base, remote),
            (Strategy::Diff, None) => self.engine.diff(&Snapshot::new(), remote),
        }
    }

    /// Snapshot of the previously synced revision, when it can be used
    #[allow(clippy::too_many_arguments)]
    fn base_snapshot(
        &self,
        repo: &RepoRef,
        config: &TemplateConfig,
        record: &LockRecord,
        head: &str,
        paths: &ResolvedPathSet,
        remote: &Snapshot,
        deadline: &Deadline,
    ) -> Result<Option<Snapshot>> {
        if record.repository != config.template_repository {
            warn!(
                locked = %record.repository,
                configured = %config.template_repository,
                "Lock belongs to a different template repository, ignoring it"
            );
            return Ok(None);
        }
        if record.commit == head && record.paths == *paths {
            return Ok(Some(remote.clone()));
        }

        deadline.check("fetching base snapshot")?;
        match self
            .client
            .fetch_snapshot(repo, &record.commit, &record.paths.filter(), deadline)
        {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(StencilError::RevisionNotFound { revision, .. }) => {
                warn!(
                    commit = %revision,
                    "Locked commit no longer exists upstream, falling back to first sync"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Local files at every path the base or remote snapshot knows about
fn read_local(tree: &WorkingTree, base: Option<&Snapshot>, remote: &Snapshot) -> LocalFiles {
    let known: BTreeSet<&str> = base
        .into_iter()
        .chain([remote])
        .flat_map(Snapshot::paths)
        .collect();
    tree.read_paths(known)
}

/// Copies of the upstream snapshots with `paths` left out
fn without_paths(
    base: Option<&Snapshot>,
    remote: &Snapshot,
    paths: &BTreeSet<String>,
) -> (Option<Snapshot>, Snapshot) {
    let strip = |snapshot: &Snapshot| {
        let mut snapshot = snapshot.clone();
        for path in paths {
            snapshot.remove(path);
        }
        snapshot
    };
    (base.map(strip), strip(remote))
}

/// Apply merge changes, turning write failures into conflicts
fn apply_changes(tree: &WorkingTree, changes: &[Change], result: &mut SyncResult) {
    for change in changes {
        let Err(err) = tree.apply(change) else {
            continue;
        };
        warn!(path = change.path(), error = %err, "Could not apply change");
        match change {
            Change::Reject { path, .. } => {
                for conflict in result.conflicted.iter_mut().filter(|c| &c.path == path) {
                    conflict.artifact = None;
                }
            }
            Change::Write { path, .. } | Change::Remove { path } => {
                result.demote(Conflict::new(path.as_str(), ConflictKind::WriteFailed));
            }
        }
    }
}

fn warn_on_workflow_changes(result: &SyncResult) {
    let workflows: Vec<&str> = result
        .changed_paths()
        .into_iter()
        .filter(|path| path.starts_with(WORKFLOWS_DIR))
        .collect();
    if !workflows.is_empty() {
        warn!(
            files = ?workflows,
            "Workflow files changed; pushing them requires a token with the 'workflow' scope"
        );
    }
}

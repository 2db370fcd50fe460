//! Three-way merge engine
//!
//! Reconciles the upstream base, the local working tree and the upstream
//! remote snapshot. The engine never touches the filesystem: it decides the
//! outcome per path and returns the [`Change`]s the caller has to apply.
//!
//! ## Three-way table
//!
//! | base    | remote  | local        | outcome                                   |
//! |---------|---------|--------------|-------------------------------------------|
//! | absent  | present | absent       | added                                     |
//! | absent  | present | == remote    | unchanged                                 |
//! | absent  | present | != remote    | conflict (added on both sides)            |
//! | present | == base | present      | unchanged                                 |
//! | present | == base | absent       | removed (local deletion kept)             |
//! | present | != base | == base      | updated                                   |
//! | present | != base | == remote    | unchanged                                 |
//! | present | != base | diverged     | patched, or conflict (patch rejected)     |
//! | present | != base | absent       | conflict (deleted locally)                |
//! | present | absent  | == base      | removed                                   |
//! | present | absent  | absent       | removed                                   |
//! | present | absent  | diverged     | conflict (modified locally)               |
//! | absent  | absent  | present      | unchanged                                 |

pub mod patch;
pub mod result;

use tracing::{debug, warn};

use crate::snapshot::{Snapshot, union_paths};

pub use result::{Change, Conflict, ConflictKind, Preview, Reconciliation, SyncResult};

/// Line-based reconciliation of snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine;

impl MergeEngine {
    pub fn new() -> Self {
        Self
    }

    /// Three-way merge of upstream changes since `base` into `local`
    pub fn merge(&self, base: &Snapshot, local: &Snapshot, remote: &Snapshot) -> Reconciliation {
        let mut out = Reconciliation::default();

        for path in union_paths(&[base, local, remote]) {
            let b = base.get(path);
            let l = local.get(path);
            let r = remote.get(path);

            match (b, r, l) {
                (None, Some(r), None) => out.write_added(path, r),
                (None, Some(r), Some(l)) if l == r => out.keep(path),
                (None, Some(r), Some(l)) => {
                    out.reject(path, ConflictKind::AddedOnBothSides, l, r);
                }
                (Some(b), Some(r), l) if b == r => {
                    if l.is_some() {
                        out.keep(path);
                    } else {
                        debug!(path, "Kept local deletion");
                        out.note_absent(path);
                    }
                }
                (Some(b), Some(r), Some(l)) if l == b => out.write_updated(path, r),
                (Some(_), Some(r), Some(l)) if l == r => out.keep(path),
                (Some(b), Some(r), Some(l)) => out.three_way(path, b, l, r),
                (Some(b), Some(r), None) => out.reject(path, ConflictKind::DeletedLocally, b, r),
                (Some(b), None, Some(l)) if l == b => {
                    debug!(path, "Removed upstream");
                    out.result.removed.insert(path.to_string());
                    out.changes.push(Change::Remove {
                        path: path.to_string(),
                    });
                }
                (Some(_), None, None) => out.note_absent(path),
                (Some(_), None, Some(_)) => {
                    warn!(path, "Deleted upstream but modified locally, keeping local file");
                    out.result
                        .conflicted
                        .push(Conflict::new(path, ConflictKind::ModifiedLocally));
                }
                (None, None, Some(_)) => out.keep(path),
                (None, None, None) => {}
            }
        }

        out
    }

    /// Replace local content with the remote snapshot; nothing is removed
    pub fn overwrite(&self, local: &Snapshot, remote: &Snapshot) -> Reconciliation {
        let mut out = Reconciliation::default();
        for (path, r) in remote.iter() {
            match local.get(path) {
                None => out.write_added(path, r),
                Some(l) if l == r => out.keep(path),
                Some(_) => out.write_updated(path, r),
            }
        }
        out
    }

    /// Report upstream changes between two revisions without consulting the
    /// working tree
    pub fn diff(&self, base: &Snapshot, remote: &Snapshot) -> Reconciliation {
        let mut out = Reconciliation::default();
        for path in union_paths(&[base, remote]) {
            let (from, to) = match (base.get(path), remote.get(path)) {
                (Some(b), Some(r)) if b == r => {
                    out.keep(path);
                    continue;
                }
                (None, Some(r)) => {
                    out.result.added.insert(path.to_string());
                    (&[][..], r)
                }
                (Some(b), None) => {
                    out.result.removed.insert(path.to_string());
                    (b, &[][..])
                }
                (Some(b), Some(r)) => {
                    out.result.updated.insert(path.to_string());
                    (b, r)
                }
                (None, None) => continue,
            };
            let diff = patch::render(path, &diffy::create_patch_bytes(from, to));
            out.previews.push(Preview {
                path: path.to_string(),
                diff,
            });
        }
        out
    }

    /// Reconcile without a known base
    ///
    /// Remote files are written where the project has none. Files that
    /// already exist with different content are skipped unless `force`.
    pub fn first_sync(&self, local: &Snapshot, remote: &Snapshot, force: bool) -> Reconciliation {
        let mut out = Reconciliation::default();
        for (path, r) in remote.iter() {
            match local.get(path) {
                None => out.write_added(path, r),
                Some(l) if l == r => out.keep(path),
                Some(_) if force => out.write_updated(path, r),
                Some(_) => {
                    debug!(path, "Skipped existing file");
                    out.result.skipped.insert(path.to_string());
                }
            }
        }
        out
    }
}

impl Reconciliation {
    fn keep(&mut self, path: &str) {
        self.result.unchanged.insert(path.to_string());
    }

    /// Removed upstream or locally with no local file left to delete
    fn note_absent(&mut self, path: &str) {
        self.result.removed.insert(path.to_string());
        self.result.already_absent.insert(path.to_string());
    }

    fn write_added(&mut self, path: &str, content: &[u8]) {
        debug!(path, "Added");
        self.result.added.insert(path.to_string());
        self.push_write(path, content.to_vec());
    }

    fn write_updated(&mut self, path: &str, content: &[u8]) {
        debug!(path, "Updated");
        self.result.updated.insert(path.to_string());
        self.push_write(path, content.to_vec());
    }

    fn push_write(&mut self, path: &str, content: Vec<u8>) {
        self.changes.push(Change::Write {
            path: path.to_string(),
            content,
        });
    }

    /// Apply the upstream patch to a locally diverged file
    fn three_way(&mut self, path: &str, base: &[u8], local: &[u8], remote: &[u8]) {
        let upstream = diffy::create_patch_bytes(base, remote);
        match diffy::apply_bytes(local, &upstream) {
            Ok(merged) if merged == local => self.keep(path),
            Ok(merged) => {
                debug!(path, "Merged upstream changes into local edits");
                self.result.updated.insert(path.to_string());
                self.push_write(path, merged);
            }
            Err(err) => {
                let line = patch::rejected_line(&upstream, &err)
                    .map(|base_line| patch::local_line(base, local, base_line));
                self.record_reject(path, ConflictKind::PatchRejected, line, &upstream);
            }
        }
    }

    /// Conflict with a reject artifact holding the patch `from` -> `to`
    fn reject(&mut self, path: &str, kind: ConflictKind, from: &[u8], to: &[u8]) {
        let rejected = diffy::create_patch_bytes(from, to);
        let line = patch::first_hunk_line(&rejected);
        self.record_reject(path, kind, line, &rejected);
    }

    fn record_reject(
        &mut self,
        path: &str,
        kind: ConflictKind,
        line: Option<usize>,
        rejected: &diffy::Patch<'_, [u8]>,
    ) {
        let artifact = patch::reject_path(path);
        warn!(path, %kind, line = ?line, "Conflict, wrote {}", artifact);
        self.changes.push(Change::Reject {
            path: path.to_string(),
            artifact: artifact.clone(),
            patch: patch::render(path, rejected),
        });
        self.result.conflicted.push(Conflict {
            path: path.to_string(),
            kind,
            line,
            artifact: Some(artifact),
        });
    }
}

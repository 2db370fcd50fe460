//! Outcome types produced by the merge engine

use std::collections::BTreeSet;
use std::fmt;

/// Why a path could not be reconciled automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Created upstream and locally with different content
    AddedOnBothSides,
    /// The upstream change did not apply to the locally edited file
    PatchRejected,
    /// Changed upstream but deleted locally
    DeletedLocally,
    /// Deleted upstream but edited locally
    ModifiedLocally,
    /// The merged content could not be written
    WriteFailed,
    /// The local file exists but could not be read, or is not a regular file
    ReadFailed,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::AddedOnBothSides => "added upstream and locally with different content",
            Self::PatchRejected => "upstream changes do not apply to local edits",
            Self::DeletedLocally => "changed upstream but deleted locally",
            Self::ModifiedLocally => "deleted upstream but modified locally",
            Self::WriteFailed => "could not write merged content",
            Self::ReadFailed => "could not read local file",
        };
        f.write_str(reason)
    }
}

/// A path left for manual resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub path: String,
    pub kind: ConflictKind,
    /// 1-based line of the first rejected hunk, when known
    pub line: Option<usize>,
    /// Relative path of the reject artifact written next to the file
    pub artifact: Option<String>,
}

impl Conflict {
    pub fn new(path: impl Into<String>, kind: ConflictKind) -> Self {
        Self {
            path: path.into(),
            kind,
            line: None,
            artifact: None,
        }
    }
}

/// Per-path outcome of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub added: BTreeSet<String>,
    pub updated: BTreeSet<String>,
    pub unchanged: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    /// Removed paths that were already gone locally; nothing was deleted
    pub already_absent: BTreeSet<String>,
    pub skipped: BTreeSet<String>,
    pub conflicted: Vec<Conflict>,
}

impl SyncResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicted.is_empty()
    }

    /// Whether the run touched anything in the working tree
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.updated.is_empty()) || self.deleted().next().is_some()
    }

    /// Removed paths whose local file was actually deleted
    pub fn deleted(&self) -> impl Iterator<Item = &String> {
        self.removed
            .iter()
            .filter(|path| !self.already_absent.contains(*path))
    }

    /// Added, updated and deleted paths in lexical order
    pub fn changed_paths(&self) -> BTreeSet<&str> {
        self.added
            .iter()
            .chain(&self.updated)
            .chain(self.deleted())
            .map(String::as_str)
            .collect()
    }

    /// Move a path out of the success sets into the conflict list
    pub fn demote(&mut self, conflict: Conflict) {
        self.added.remove(&conflict.path);
        self.updated.remove(&conflict.path);
        self.removed.remove(&conflict.path);
        self.already_absent.remove(&conflict.path);
        self.conflicted.push(conflict);
    }
}

/// A working-tree mutation decided by the merge engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Create or replace a file
    Write { path: String, content: Vec<u8> },
    /// Delete a file
    Remove { path: String },
    /// Leave the file alone and write the rejected patch next to it
    Reject {
        path: String,
        artifact: String,
        patch: String,
    },
}

impl Change {
    /// The path the change is about
    pub fn path(&self) -> &str {
        match self {
            Self::Write { path, .. } | Self::Remove { path } | Self::Reject { path, .. } => path,
        }
    }
}

/// Unified diff of one changed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub path: String,
    pub diff: String,
}

/// Result of reconciling snapshots: what happened and what to apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub result: SyncResult,
    pub changes: Vec<Change>,
    /// Only filled in by previews
    pub previews: Vec<Preview>,
}

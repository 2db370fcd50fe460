//! Lock file (.stencil/template.lock)
//!
//! Records the upstream commit and path selection of the last successful
//! sync. It is the base for the next three-way merge.
//!
//! ```json
//! {
//!   "repository": "acme/python-template",
//!   "branch": "main",
//!   "commit": "4b825dc642cb6eb9a060e54bf8d69288fbee4904",
//!   "paths": { "mode": "include-only", "include": [".github"], "exclude": [] },
//!   "files": [".github/workflows/ci.yml"],
//!   "synced_at": "2026-01-12T09:30:00Z"
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, StencilError, fs as fs_error};
use crate::selector::ResolvedPathSet;

/// Lock file location inside the downstream project
pub const LOCK_PATH: &str = ".stencil/template.lock";

/// State of the last successful sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Upstream repository as configured
    pub repository: String,
    pub branch: String,
    /// Full upstream commit id
    pub commit: String,
    /// Path selection the commit was synced with
    pub paths: ResolvedPathSet,
    /// Upstream files under template control at `commit`, in lexical order
    #[serde(default)]
    pub files: Vec<String>,
    pub synced_at: DateTime<Utc>,
}

impl LockRecord {
    /// Parse a lock record from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Absolute lock file path for a project
pub fn lock_path(project_root: &Path) -> PathBuf {
    project_root.join(LOCK_PATH)
}

/// Load the lock record of a project
///
/// A missing lock means the project has never been synced. An unreadable or
/// corrupted lock is reported and treated the same way.
pub fn load(project_root: &Path) -> Option<LockRecord> {
    let path = lock_path(project_root);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No lock file");
            return None;
        }
        Err(e) => {
            warn!("{}", corrupted(&path, e.to_string()));
            return None;
        }
    };

    match LockRecord::from_json(&content) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("{}", corrupted(&path, e.to_string()));
            None
        }
    }
}

fn corrupted(path: &Path, reason: String) -> StencilError {
    StencilError::LockCorrupted {
        path: path.display().to_string(),
        reason,
    }
}

/// Atomically replace the lock record of a project
///
/// The record is written to a temporary file next to the lock, flushed to
/// disk, then renamed over the old record so readers never observe a
/// partial file.
pub fn save(project_root: &Path, record: &LockRecord) -> Result<()> {
    let path = lock_path(project_root);
    let dir = path.parent().unwrap_or(project_root);
    fs::create_dir_all(dir).map_err(|e| fs_error::write_failed(dir, e))?;

    let content = record.to_json()?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".template.lock.")
        .tempfile_in(dir)
        .map_err(|e| fs_error::write_failed(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| fs_error::write_failed(tmp.path(), e))?;
    tmp.persist(&path)
        .map_err(|e| fs_error::write_failed(&path, e.error))?;

    debug!(path = %path.display(), commit = %record.commit, "Saved lock file");
    Ok(())
}

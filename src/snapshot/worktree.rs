//! The downstream project's working tree
//!
//! Reads the local side of a sync and applies merge changes. Only paths the
//! template knows about are read; untracked project files are never opened.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Snapshot;
use crate::error::{Result, fs as fs_error};
use crate::merge::Change;

/// A project directory on disk
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a relative path
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Read the given paths from disk
    ///
    /// Only these paths are ever opened. Symlinks are followed; a path that
    /// does not exist (or a dangling link) is absent from the snapshot.
    /// Anything that is not a regular file, and any file that cannot be read,
    /// is listed in [`LocalFiles::unreadable`] instead.
    pub fn read_paths<'p>(&self, paths: impl IntoIterator<Item = &'p str>) -> LocalFiles {
        let mut local = LocalFiles::default();
        for path in paths {
            let target = self.resolve(path);
            match read_regular(&target) {
                Ok(Some(content)) => local.snapshot.insert(path, content),
                Ok(None) => {}
                Err(err) => {
                    warn!(path, error = %err, "Could not read local file");
                    local.unreadable.insert(path.to_string());
                }
            }
        }
        debug!(
            root = %self.root.display(),
            files = local.snapshot.len(),
            unreadable = local.unreadable.len(),
            "Read local snapshot"
        );
        local
    }

    /// Create or replace a file, creating parent directories as needed
    pub fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| fs_error::write_failed(parent, e))?;
        }
        fs::write(&target, content).map_err(|e| fs_error::write_failed(&target, e))
    }

    /// Delete a file and any directories left empty by it
    pub fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path);
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(fs_error::write_failed(&target, e)),
        }

        let mut dir = target.parent();
        while let Some(current) = dir {
            if current == self.root.as_path() || fs::remove_dir(current).is_err() {
                break;
            }
            dir = current.parent();
        }
        Ok(())
    }

    /// Apply one merge decision
    pub fn apply(&self, change: &Change) -> Result<()> {
        match change {
            Change::Write { path, content } => self.write(path, content),
            Change::Remove { path } => self.remove(path),
            Change::Reject {
                artifact, patch, ..
            } => self.write(artifact, patch.as_bytes()),
        }
    }
}

/// Local side of a sync: readable files plus paths that could not be read
#[derive(Debug, Clone, Default)]
pub struct LocalFiles {
    pub snapshot: Snapshot,
    pub unreadable: BTreeSet<String>,
}

/// Contents of a regular file, `None` when nothing exists at `path`
fn read_regular(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if !metadata.is_file() {
        return Err(io::Error::other("not a regular file"));
    }
    fs::read(path).map(Some)
}

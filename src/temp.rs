//! Scratch directories for upstream clones
//!
//! Scratch space is always created under an absolute temp base so that a
//! relative `TMPDIR` (e.g. `TMPDIR=tmp`) never puts clones inside the project
//! being synchronised.

use std::env;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::{Result, fs as fs_error};

/// Absolute directory under which scratch directories are created
pub fn temp_dir_base() -> PathBuf {
    let base = env::temp_dir();
    if base.is_absolute() {
        return base;
    }
    #[cfg(windows)]
    {
        env::var("TEMP")
            .or_else(|_| env::var("TMP"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/tmp")
    }
}

/// A fresh scratch directory, removed when the returned value is dropped
pub fn scratch_dir(purpose: &str) -> Result<TempDir> {
    let base = temp_dir_base();
    tempfile::Builder::new()
        .prefix(&format!("stencil-{purpose}-"))
        .tempdir_in(&base)
        .map_err(|e| fs_error::write_failed(&base, e))
}

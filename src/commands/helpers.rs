//! Command helper utilities

use std::path::PathBuf;

use stencil::error::{Result, fs as fs_error};

/// Resolve the project root from an optional argument
///
/// Defaults to the current directory. The result is canonical, without a
/// `\\?\` prefix on Windows.
pub fn resolve_project_root(workspace: Option<PathBuf>) -> Result<PathBuf> {
    let path = match workspace {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    dunce::canonicalize(&path).map_err(|e| fs_error::read_failed(&path, e))
}

/// First characters of a commit id
pub fn short_commit(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

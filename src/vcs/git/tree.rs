//! Reading files straight out of commit trees
//!
//! Nothing is checked out: blobs are read from the object database, and
//! directories the filter cannot match are never descended into.

use std::path::Path;

use git2::{ObjectType, Oid, Repository, Tree};
use tracing::debug;

use super::error::read_failed;
use crate::error::Result;
use crate::selector::SparseFilter;
use crate::snapshot::Snapshot;
use crate::vcs::Deadline;

/// File mode git records for symbolic links
const SYMLINK_MODE: i32 = 0o120_000;

/// Links followed before giving up on a chain
const MAX_LINK_HOPS: usize = 8;

/// Collect every blob admitted by `filter` into a snapshot
///
/// Symlinks resolving to a file inside the tree contribute the target's
/// content; links leaving the tree or pointing at directories are skipped.
pub fn read_filtered(
    repo: &Repository,
    url: &str,
    root: &Tree<'_>,
    filter: &SparseFilter,
    deadline: &Deadline,
) -> Result<Snapshot> {
    let git = |e: git2::Error| read_failed(url, &e);
    let mut snapshot = Snapshot::new();
    let mut pending: Vec<(String, Oid)> = vec![(String::new(), root.id())];

    while let Some((prefix, tree_id)) = pending.pop() {
        deadline.check("reading template files")?;
        let tree = repo.find_tree(tree_id).map_err(git)?;

        for entry in &tree {
            let Some(name) = entry.name() else {
                continue;
            };
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}/{name}")
            };

            match entry.kind() {
                Some(ObjectType::Tree) if filter.may_contain(&path) => {
                    pending.push((path, entry.id()));
                }
                Some(ObjectType::Blob) if filter.matches(&path) => {
                    let blob = repo.find_blob(entry.id()).map_err(git)?;
                    if entry.filemode() == SYMLINK_MODE {
                        match follow_link(repo, root, &path, blob.content()) {
                            Some(content) => snapshot.insert(path, content),
                            None => debug!(path, "Skipped symlink without a file target"),
                        }
                    } else {
                        snapshot.insert(path, blob.content());
                    }
                }
                _ => {}
            }
        }
    }

    Ok(snapshot)
}

/// Content of the file at `path` in the tree, if present
pub fn read_file(
    repo: &Repository,
    root: &Tree<'_>,
    path: &str,
) -> std::result::Result<Option<Vec<u8>>, git2::Error> {
    let entry = match root.get_path(Path::new(path)) {
        Ok(entry) => entry,
        Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if entry.kind() != Some(ObjectType::Blob) {
        return Ok(None);
    }
    Ok(Some(repo.find_blob(entry.id())?.content().to_vec()))
}

/// Resolve a symlink blob to the content of the file it points at
fn follow_link(repo: &Repository, root: &Tree<'_>, link: &str, target: &[u8]) -> Option<Vec<u8>> {
    let mut link = link.to_string();
    let mut target = std::str::from_utf8(target).ok()?.to_string();

    for _ in 0..MAX_LINK_HOPS {
        let dir = link.rsplit_once('/').map_or("", |(dir, _)| dir);
        let resolved = join_within(dir, &target)?;
        let entry = root.get_path(Path::new(&resolved)).ok()?;
        if entry.kind() != Some(ObjectType::Blob) {
            return None;
        }
        let blob = repo.find_blob(entry.id()).ok()?;
        if entry.filemode() != SYMLINK_MODE {
            return Some(blob.content().to_vec());
        }
        target = std::str::from_utf8(blob.content()).ok()?.to_string();
        link = resolved;
    }
    None
}

/// Join a relative link target onto a directory, refusing to leave the tree
fn join_within(dir: &str, target: &str) -> Option<String> {
    if target.starts_with('/') {
        return None;
    }
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for part in target.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

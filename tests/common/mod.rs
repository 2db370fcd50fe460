//! Common test utilities for stencil integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryInitOptions, Signature};
use stencil::config::{BundleManifest, CONFIG_PATH};
use stencil::error::{Result, git as git_error};
use stencil::selector::SparseFilter;
use stencil::{BundleManifestLoader, Deadline, RepoRef, Snapshot, VersionControlClient};
use tempfile::TempDir;

/// A downstream project for integration tests
pub struct TestWorkspace {
    pub temp: TempDir,
    /// Path to project root
    pub path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write `.stencil/template.yml`
    pub fn write_config(&self, yaml: &str) {
        self.write_file(CONFIG_PATH, yaml);
    }

    /// Write a file in the project
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from the project
    pub fn read_file(&self, path: &str) -> String {
        fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    pub fn remove_file(&self, path: &str) {
        fs::remove_file(self.path.join(path)).expect("Failed to remove file");
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A real git repository acting as the upstream template
pub struct TemplateRepo {
    pub temp: TempDir,
    pub repo: Repository,
}

impl TemplateRepo {
    /// Empty repository with `main` as its initial branch
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        let repo = Repository::init_opts(temp.path(), &options).expect("Failed to init repository");
        Self { temp, repo }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Clone URL usable as `template-url`
    pub fn url(&self) -> String {
        self.path().display().to_string()
    }

    /// Commit written and removed files on top of HEAD, returning the commit id
    pub fn commit(&self, files: &[(&str, &str)], removed: &[&str]) -> String {
        let mut index = self.repo.index().expect("index");
        for (path, content) in files {
            let full = self.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent directory");
            }
            fs::write(&full, content).expect("Failed to write file");
            index.add_path(Path::new(path)).expect("add path");
        }
        for path in removed {
            fs::remove_file(self.path().join(path)).expect("Failed to remove file");
            index.remove_path(Path::new(path)).expect("remove path");
        }
        self.write_commit(&mut index)
    }

    /// Commit a symbolic link
    #[cfg(unix)]
    pub fn commit_symlink(&self, link: &str, target: &str) -> String {
        let full = self.path().join(link);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::os::unix::fs::symlink(target, &full).expect("Failed to create symlink");
        let mut index = self.repo.index().expect("index");
        index.add_path(Path::new(link)).expect("add path");
        self.write_commit(&mut index)
    }

    fn write_commit(&self, index: &mut git2::Index) -> String {
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let signature = Signature::now("Template", "template@example.com").expect("signature");
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, "update template", &tree, &parents)
            .expect("commit")
            .to_string()
    }
}

impl Default for TemplateRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory upstream with per-commit snapshots
#[derive(Default)]
pub struct FakeUpstream {
    head: RefCell<String>,
    commits: RefCell<HashMap<String, Snapshot>>,
    pub manifest: Option<BundleManifest>,
    fetches: Cell<usize>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest(manifest: BundleManifest) -> Self {
        Self {
            manifest: Some(manifest),
            ..Self::default()
        }
    }

    /// Publish `files` as `commit` and move the head to it
    pub fn publish(&self, commit: &str, files: &[(&str, &str)]) {
        let snapshot: Snapshot = files.iter().map(|(path, content)| (*path, *content)).collect();
        self.commits.borrow_mut().insert(commit.to_string(), snapshot);
        *self.head.borrow_mut() = commit.to_string();
    }

    /// Forget a commit, as after a force push
    pub fn forget(&self, commit: &str) {
        self.commits.borrow_mut().remove(commit);
    }

    /// Number of snapshot fetches served so far
    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl VersionControlClient for FakeUpstream {
    fn resolve_head(&self, _: &RepoRef, _: &str, _: &Deadline) -> Result<String> {
        Ok(self.head.borrow().clone())
    }

    fn fetch_snapshot(
        &self,
        repo: &RepoRef,
        commit: &str,
        filter: &SparseFilter,
        _: &Deadline,
    ) -> Result<Snapshot> {
        self.fetches.set(self.fetches.get() + 1);
        let commits = self.commits.borrow();
        let snapshot = commits
            .get(commit)
            .ok_or_else(|| git_error::revision_not_found(&repo.url, commit))?;
        Ok(snapshot
            .iter()
            .filter(|(path, _)| filter.matches(path))
            .collect())
    }
}

impl BundleManifestLoader for FakeUpstream {
    fn load_manifest(&self, _: &RepoRef, _: &str, _: &Deadline) -> Result<Option<BundleManifest>> {
        Ok(self.manifest.clone())
    }
}

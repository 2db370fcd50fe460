//! End-to-end sync behaviour against an in-memory upstream

mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use common::{FakeUpstream, TestWorkspace};
use stencil::config::{BundleDefinition, BundleManifest};
use stencil::{
    ConflictKind, SelectionMode, StencilError, Strategy, SyncCoordinator, SyncRequest, SyncState,
    TemplateConfig, YamlConfigProvider, lock,
};

const CONFIG: &str = "template-repository: acme/template\ninclude:\n  - .github\n  - Makefile\n";

fn sync(upstream: &FakeUpstream, workspace: &TestWorkspace) -> stencil::SyncReport {
    sync_with(upstream, workspace, &SyncRequest::default())
}

fn sync_with(
    upstream: &FakeUpstream,
    workspace: &TestWorkspace,
    request: &SyncRequest,
) -> stencil::SyncReport {
    SyncCoordinator::new(upstream)
        .run(
            &workspace.path,
            &YamlConfigProvider::for_project(&workspace.path),
            request,
        )
        .expect("sync should succeed")
}

fn bundle(files: &[&str], depends_on: &[&str]) -> BundleDefinition {
    BundleDefinition {
        files: files.iter().map(ToString::to_string).collect(),
        depends_on: depends_on.iter().map(ToString::to_string).collect(),
        ..BundleDefinition::default()
    }
}

fn manifest(bundles: Vec<(&str, BundleDefinition)>) -> BundleManifest {
    BundleManifest {
        version: "1".to_string(),
        bundles: bundles
            .into_iter()
            .map(|(name, def)| (name.to_string(), def))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn test_first_sync_adds_missing_and_skips_existing() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    workspace.write_file("Makefile", "local:\n");
    let upstream = FakeUpstream::new();
    upstream.publish(
        "c1",
        &[
            ("Makefile", "all:\n"),
            (".github/workflows/ci.yml", "on: push\n"),
            ("src/main.rs", "fn main() {}\n"),
        ],
    );

    let report = sync(&upstream, &workspace);

    assert_eq!(report.state(), &SyncState::LockUpdated);
    assert!(report.result.added.contains(".github/workflows/ci.yml"));
    assert!(report.result.skipped.contains("Makefile"));
    assert_eq!(workspace.read_file("Makefile"), "local:\n");
    assert!(!workspace.file_exists("src/main.rs"));
    assert_eq!(lock::load(&workspace.path).expect("lock").commit, "c1");
}

#[test]
fn test_first_sync_force_overwrites_existing() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    workspace.write_file("Makefile", "local:\n");
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n")]);

    let report = sync_with(
        &upstream,
        &workspace,
        &SyncRequest {
            force: true,
            ..SyncRequest::default()
        },
    );

    assert!(report.result.updated.contains("Makefile"));
    assert_eq!(workspace.read_file("Makefile"), "all:\n");
}

#[test]
fn test_resync_without_changes_is_idempotent() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n"), (".github/CODEOWNERS", "* @acme\n")]);
    sync(&upstream, &workspace);
    let first_lock = lock::load(&workspace.path).expect("lock");

    let report = sync(&upstream, &workspace);

    assert!(report.is_up_to_date());
    assert!(!report.result.has_changes());
    assert!(!report.result.has_conflicts());
    let second_lock = lock::load(&workspace.path).expect("lock");
    assert_eq!(second_lock.commit, first_lock.commit);
    assert_eq!(second_lock.paths, first_lock.paths);
}

#[test]
fn test_unmodified_file_fast_forwards() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n")]);
    sync(&upstream, &workspace);

    upstream.publish("c2", &[("Makefile", "all: test\n")]);
    let report = sync(&upstream, &workspace);

    assert!(report.result.updated.contains("Makefile"));
    assert_eq!(workspace.read_file("Makefile"), "all: test\n");
    assert_eq!(report.previous_commit.as_deref(), Some("c1"));
    assert_eq!(lock::load(&workspace.path).expect("lock").commit, "c2");
}

#[test]
fn test_local_edit_preserved_when_upstream_unchanged() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n"), (".github/a.yml", "a\n")]);
    sync(&upstream, &workspace);
    workspace.write_file("Makefile", "all: lint\n");

    upstream.publish("c2", &[("Makefile", "all:\n"), (".github/a.yml", "b\n")]);
    let report = sync(&upstream, &workspace);

    assert!(report.result.unchanged.contains("Makefile"));
    assert!(report.result.updated.contains(".github/a.yml"));
    assert_eq!(workspace.read_file("Makefile"), "all: lint\n");
}

#[test]
fn test_diverging_edits_conflict_with_reject_artifact() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "a\nb\nc\n")]);
    sync(&upstream, &workspace);
    workspace.write_file("Makefile", "a\nlocal\nc\n");

    upstream.publish("c2", &[("Makefile", "a\nupstream\nc\n")]);
    let report = sync(&upstream, &workspace);

    let conflict = &report.result.conflicted[0];
    assert_eq!(conflict.path, "Makefile");
    assert_eq!(conflict.kind, ConflictKind::PatchRejected);
    assert_eq!(conflict.artifact.as_deref(), Some("Makefile.rej"));
    assert_eq!(workspace.read_file("Makefile"), "a\nlocal\nc\n");
    let reject = workspace.read_file("Makefile.rej");
    assert!(reject.contains("+upstream"));
    // the lock still advances; the conflict is left for manual resolution
    assert_eq!(lock::load(&workspace.path).expect("lock").commit, "c2");
}

#[test]
fn test_upstream_deletion_removes_unmodified_file() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n"), (".github/old/x.yml", "x\n")]);
    sync(&upstream, &workspace);

    upstream.publish("c2", &[("Makefile", "all:\n")]);
    let report = sync(&upstream, &workspace);

    assert!(report.result.removed.contains(".github/old/x.yml"));
    assert!(!workspace.file_exists(".github/old/x.yml"));
    assert!(!workspace.file_exists(".github/old"));
}

#[test]
fn test_upstream_deletion_keeps_modified_file() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n"), (".github/x.yml", "x\n")]);
    sync(&upstream, &workspace);
    workspace.write_file(".github/x.yml", "mine\n");

    upstream.publish("c2", &[("Makefile", "all:\n")]);
    let report = sync(&upstream, &workspace);

    assert_eq!(report.result.conflicted[0].kind, ConflictKind::ModifiedLocally);
    assert_eq!(workspace.read_file(".github/x.yml"), "mine\n");
}

#[test]
fn test_paths_dropped_from_selection_are_removed() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n"), (".github/x.yml", "x\n")]);
    sync(&upstream, &workspace);

    workspace.write_config("template-repository: acme/template\ninclude: [Makefile]\n");
    let report = sync(&upstream, &workspace);

    assert!(report.result.removed.contains(".github/x.yml"));
    assert!(!workspace.file_exists(".github/x.yml"));
    assert_eq!(
        lock::load(&workspace.path).expect("lock").paths.include,
        vec!["Makefile".to_string()]
    );
}

#[test]
fn test_exclude_only_mode_skips_reserved_and_excluded_paths() {
    let workspace = TestWorkspace::new();
    workspace.write_config("template-repository: acme/template\nexclude: [src]\n");
    let upstream = FakeUpstream::new();
    upstream.publish(
        "c1",
        &[
            ("Makefile", "all:\n"),
            ("src/lib.rs", "\n"),
            (".stencil/template.yml", "template-repository: acme/other\n"),
        ],
    );

    let report = sync(&upstream, &workspace);

    assert_eq!(report.paths.mode, SelectionMode::ExcludeOnly);
    assert!(workspace.file_exists("Makefile"));
    assert!(!workspace.file_exists("src/lib.rs"));
    assert!(workspace.read_file(".stencil/template.yml").contains("acme/template"));
}

#[cfg(unix)]
#[test]
fn test_exclude_only_mode_ignores_untracked_special_files() {
    let workspace = TestWorkspace::new();
    workspace.write_config("template-repository: acme/template\nexclude: [src]\n");
    workspace.write_file("target/debug/build.log", "log\n");
    workspace.write_file("node_modules/x/index.js", "module.exports = 1;\n");
    let _socket = std::os::unix::net::UnixListener::bind(workspace.path.join("tool.sock"))
        .expect("bind socket");
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n")]);
    sync(&upstream, &workspace);

    let report = sync(&upstream, &workspace);

    assert_eq!(report.state(), &SyncState::LockUpdated);
    assert!(!report.result.has_conflicts());
    let unchanged: Vec<&str> = report.result.unchanged.iter().map(String::as_str).collect();
    assert_eq!(unchanged, vec!["Makefile"]);
    assert_eq!(lock::load(&workspace.path).expect("lock").files, vec!["Makefile"]);
}

#[cfg(unix)]
#[test]
fn test_special_file_at_template_path_is_a_read_conflict() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let _socket = std::os::unix::net::UnixListener::bind(workspace.path.join("Makefile"))
        .expect("bind socket");
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n"), (".github/CODEOWNERS", "* @acme\n")]);

    let report = sync(&upstream, &workspace);

    assert!(report.result.added.contains(".github/CODEOWNERS"));
    assert_eq!(report.result.conflicted.len(), 1);
    assert_eq!(report.result.conflicted[0].path, "Makefile");
    assert_eq!(report.result.conflicted[0].kind, ConflictKind::ReadFailed);
    assert!(!workspace.path.join("Makefile").is_file());
}

#[test]
fn test_resync_after_local_deletion_reports_no_changes() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n"), (".github/CODEOWNERS", "* @acme\n")]);
    sync(&upstream, &workspace);

    workspace.remove_file(".github/CODEOWNERS");
    let report = sync(&upstream, &workspace);

    assert!(report.result.removed.contains(".github/CODEOWNERS"));
    assert!(!report.result.has_changes());
    assert!(!workspace.file_exists(".github/CODEOWNERS"));
}

#[test]
fn test_overwrite_strategy_replaces_local_edits() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "a\nb\nc\n")]);
    sync(&upstream, &workspace);
    workspace.write_file("Makefile", "a\nlocal\nc\n");

    upstream.publish("c2", &[("Makefile", "a\nupstream\nc\n")]);
    let report = sync_with(
        &upstream,
        &workspace,
        &SyncRequest {
            strategy: Strategy::Overwrite,
            ..SyncRequest::default()
        },
    );

    assert!(!report.result.has_conflicts());
    assert_eq!(workspace.read_file("Makefile"), "a\nupstream\nc\n");
}

#[test]
fn test_diff_strategy_leaves_project_untouched() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n")]);
    sync(&upstream, &workspace);

    upstream.publish("c2", &[("Makefile", "all: test\n")]);
    let report = sync_with(
        &upstream,
        &workspace,
        &SyncRequest {
            strategy: Strategy::Diff,
            ..SyncRequest::default()
        },
    );

    assert_eq!(report.state(), &SyncState::Previewed);
    assert_eq!(report.previews[0].path, "Makefile");
    assert!(report.previews[0].diff.contains("+all: test"));
    assert_eq!(workspace.read_file("Makefile"), "all:\n");
    assert_eq!(lock::load(&workspace.path).expect("lock").commit, "c1");
}

#[test]
fn test_missing_locked_commit_falls_back_to_first_sync() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n")]);
    sync(&upstream, &workspace);
    upstream.forget("c1");
    workspace.write_file("Makefile", "local\n");

    upstream.publish("c2", &[("Makefile", "all: test\n"), (".github/new.yml", "n\n")]);
    let report = sync(&upstream, &workspace);

    assert!(!report.had_base);
    assert!(report.result.skipped.contains("Makefile"));
    assert!(report.result.added.contains(".github/new.yml"));
    assert_eq!(lock::load(&workspace.path).expect("lock").commit, "c2");
}

#[test]
fn test_timeout_leaves_lock_and_files_alone() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n")]);

    let err = SyncCoordinator::new(&upstream)
        .run(
            &workspace.path,
            &YamlConfigProvider::for_project(&workspace.path),
            &SyncRequest {
                timeout: Some(Duration::ZERO),
                ..SyncRequest::default()
            },
        )
        .expect_err("should time out");

    assert!(matches!(err, StencilError::Timeout { .. }));
    assert!(err.is_retryable());
    assert!(!workspace.file_exists("Makefile"));
    assert!(lock::load(&workspace.path).is_none());
}

#[test]
fn test_invalid_config_fails_before_fetching() {
    let workspace = TestWorkspace::new();
    workspace.write_config("template-repository: acme/template\ninclude: [src]\nexclude: [docs]\n");
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("src/a.rs", "\n")]);

    let err = SyncCoordinator::new(&upstream)
        .run(
            &workspace.path,
            &YamlConfigProvider::for_project(&workspace.path),
            &SyncRequest::default(),
        )
        .expect_err("exclude outside include");

    assert!(err.is_configuration_error());
    assert_eq!(upstream.fetches(), 0);
}

#[test]
fn test_bundles_expand_dependencies_first() {
    let workspace = TestWorkspace::new();
    workspace.write_config("template-repository: acme/template\nbundles: [python]\n");
    let upstream = FakeUpstream::with_manifest(manifest(vec![
        ("base", bundle(&[".editorconfig"], &[])),
        ("python", bundle(&["pyproject.toml"], &["base"])),
    ]));
    upstream.publish(
        "c1",
        &[
            (".editorconfig", "root = true\n"),
            ("pyproject.toml", "[project]\n"),
            ("README.md", "readme\n"),
        ],
    );

    let report = sync(&upstream, &workspace);

    assert_eq!(report.paths.mode, SelectionMode::Hybrid);
    assert_eq!(
        report.paths.include,
        vec![".editorconfig".to_string(), "pyproject.toml".to_string()]
    );
    assert!(workspace.file_exists(".editorconfig"));
    assert!(workspace.file_exists("pyproject.toml"));
    assert!(!workspace.file_exists("README.md"));
}

#[test]
fn test_unknown_bundle_fails_before_fetching() {
    let workspace = TestWorkspace::new();
    workspace.write_config("template-repository: acme/template\nbundles: [rust]\n");
    let upstream = FakeUpstream::with_manifest(manifest(vec![("base", bundle(&["a"], &[]))]));
    upstream.publish("c1", &[("a", "a\n")]);

    let err = SyncCoordinator::new(&upstream)
        .run(
            &workspace.path,
            &YamlConfigProvider::for_project(&workspace.path),
            &SyncRequest::default(),
        )
        .expect_err("unknown bundle");

    assert!(matches!(err, StencilError::UnknownBundle { .. }));
    assert_eq!(upstream.fetches(), 0);
    assert!(lock::load(&workspace.path).is_none());
}

#[test]
fn test_lock_for_other_repository_is_ignored() {
    let workspace = TestWorkspace::new();
    workspace.write_config(CONFIG);
    let upstream = FakeUpstream::new();
    upstream.publish("c1", &[("Makefile", "all:\n")]);
    sync(&upstream, &workspace);

    let mut config = TemplateConfig::new("acme/other-template");
    config.include = vec!["Makefile".to_string()];
    let report = SyncCoordinator::new(&upstream)
        .run(&workspace.path, &config, &SyncRequest::default())
        .expect("sync");

    assert!(!report.had_base);
    assert!(report.result.unchanged.contains("Makefile"));
    assert_eq!(
        lock::load(&workspace.path).expect("lock").repository,
        "acme/other-template"
    );
}

//! Sync command implementation
//!
//! Runs the sync coordinator against the libgit2 client and prints what
//! happened to each selected file.

use std::path::PathBuf;

use console::Style;
use stencil::error::{Result, StencilError};
use stencil::merge::Preview;
use stencil::{GitClient, Strategy, SyncCoordinator, SyncReport, SyncRequest, YamlConfigProvider};

use super::helpers::{resolve_project_root, short_commit};
use crate::cli::SyncArgs;

/// Run sync command
pub fn run(workspace: Option<PathBuf>, args: &SyncArgs) -> Result<()> {
    let root = resolve_project_root(workspace)?;
    let provider = YamlConfigProvider::for_project(&root);
    let client = GitClient::new()?;
    let request = SyncRequest {
        strategy: args.strategy,
        force: args.force,
        timeout: args.timeout(),
    };

    let report = SyncCoordinator::new(&client).run(&root, &provider, &request)?;
    print_report(&report);

    let conflicts = report.result.conflicted.len();
    if conflicts > 0 {
        return Err(StencilError::UnresolvedConflicts { count: conflicts });
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    let target = format!(
        "{}@{} ({})",
        report.repository,
        short_commit(&report.commit),
        report.branch
    );

    if report.strategy == Strategy::Diff {
        print_previews(&target, &report.previews);
        return;
    }

    if !report.result.has_changes() && !report.result.has_conflicts() {
        println!("Already up to date with {target}");
        return;
    }

    match report.previous_commit.as_deref() {
        Some(previous) if !report.is_up_to_date() => println!(
            "Synced {target}, was {}",
            short_commit(previous)
        ),
        _ => println!("Synced {target}"),
    }
    println!();

    let result = &report.result;
    print_paths("+", &Style::new().green(), &result.added);
    print_paths("~", &Style::new().yellow(), &result.updated);
    print_paths("-", &Style::new().red(), result.deleted());
    if !result.skipped.is_empty() {
        println!();
        println!(
            "{} (already present, use --force to overwrite):",
            Style::new().bold().apply_to("Skipped")
        );
        print_paths(" ", &Style::new().dim(), &result.skipped);
    }

    if result.has_conflicts() {
        println!();
        println!("{}", Style::new().bold().red().apply_to("Conflicts:"));
        for conflict in &result.conflicted {
            let location = conflict
                .line
                .map_or_else(|| conflict.path.clone(), |line| format!("{}:{line}", conflict.path));
            println!("  {} {}", Style::new().red().apply_to("!"), location);
            println!("      {}", conflict.kind);
            if let Some(artifact) = &conflict.artifact {
                println!("      {} {artifact}", Style::new().dim().apply_to("see"));
            }
        }
    }
}

fn print_paths<'a>(marker: &str, style: &Style, paths: impl IntoIterator<Item = &'a String>) {
    for path in paths {
        println!("  {} {path}", style.apply_to(marker));
    }
}

fn print_previews(target: &str, previews: &[Preview]) {
    if previews.is_empty() {
        println!("No upstream changes in {target}");
        return;
    }
    println!("Upstream changes in {target}:");
    println!();
    for preview in previews {
        for line in preview.diff.lines() {
            let style = if line.starts_with("+++") || line.starts_with("---") {
                Style::new().bold()
            } else if line.starts_with('+') {
                Style::new().green()
            } else if line.starts_with('-') {
                Style::new().red()
            } else if line.starts_with("@@") {
                Style::new().cyan()
            } else {
                Style::new()
            };
            println!("{}", style.apply_to(line));
        }
    }
}

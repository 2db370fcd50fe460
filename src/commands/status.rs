//! Status command implementation
//!
//! Shows the template configuration and the last synced revision.

use std::path::PathBuf;

use console::Style;
use stencil::error::Result;
use stencil::{ConfigurationProvider, YamlConfigProvider, lock};

use super::helpers::{resolve_project_root, short_commit};
use crate::cli::StatusArgs;

/// Run status command
pub fn run(workspace: Option<PathBuf>, args: &StatusArgs) -> Result<()> {
    let root = resolve_project_root(workspace)?;
    let config = YamlConfigProvider::for_project(&root).load()?;
    let label = |text: &str| Style::new().bold().apply_to(text.to_string());

    println!(
        "{} {}",
        label("Template:"),
        Style::new().yellow().apply_to(&config.template_repository)
    );
    println!("{} {}", label("Branch:"), config.template_branch);
    println!("{} {}", label("URL:"), config.clone_url()?);

    let Some(record) = lock::load(&root) else {
        println!("{} never synced", label("Last sync:"));
        return Ok(());
    };

    println!(
        "{} {} at {}",
        label("Last sync:"),
        Style::new().cyan().apply_to(short_commit(&record.commit)),
        record.synced_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if record.repository != config.template_repository {
        println!(
            "  {} lock was recorded for {}",
            Style::new().red().apply_to("!"),
            record.repository
        );
    }

    if args.detailed {
        println!("{} {}", label("Mode:"), record.paths.mode);
        for include in &record.paths.include {
            println!("  {} {include}", Style::new().green().apply_to("include"));
        }
        for exclude in &record.paths.exclude {
            println!("  {} {exclude}", Style::new().red().apply_to("exclude"));
        }
        println!("{} {}", label("Files:"), record.files.len());
        for file in &record.files {
            println!("  {file}");
        }
    }
    Ok(())
}

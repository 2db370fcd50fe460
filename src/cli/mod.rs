//! CLI definitions using clap derive API
//!
//! Argument types for each command live in their own submodule:
//! - sync: Sync command arguments
//! - status: Status command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod status;
pub mod sync;

pub use status::StatusArgs;
pub use sync::SyncArgs;

/// Stencil - template synchronization
///
/// Keep project configuration files in sync with an upstream template repository.
#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Keep project configuration files in sync with upstream templates",
    long_about = "Stencil brings upstream template changes into a project with a three-way \
                  merge against the last synced revision, so local edits are preserved. \
                  Configuration lives in .stencil/template.yml.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  stencil sync                      \x1b[90m# Merge upstream\x1b[0m\n   \
                  stencil sync --strategy diff      \x1b[90m# Preview upstream\x1b[0m\n   \
                  stencil sync --strategy overwrite \x1b[90m# Take upstream as-is\x1b[0m\n   \
                  stencil status                    \x1b[90m# Last synced revision\x1b[0m\n"
)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(long, short = 'w', global = true, env = "STENCIL_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronise the project with its template
    Sync(SyncArgs),

    /// Show configuration and last sync
    Status(StatusArgs),
}

use clap::Parser;

/// Arguments for the status command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show the last synced revision:\n    stencil status\n\n\
                  Include the resolved path selection:\n    stencil status --detailed")]
pub struct StatusArgs {
    /// Show the locked path selection
    #[arg(long)]
    pub detailed: bool,
}

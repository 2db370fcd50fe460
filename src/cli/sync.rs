use std::time::Duration;

use clap::Parser;
use stencil::Strategy;

/// Arguments for the sync command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Merge upstream changes:\n    stencil sync\n\n\
                  Preview without touching files:\n    stencil sync --strategy diff\n\n\
                  Replace differing files on a first sync:\n    stencil sync --force\n\n\
                  Give up after two minutes:\n    stencil sync --timeout 120")]
pub struct SyncArgs {
    /// How upstream changes are applied
    #[arg(long, value_enum, default_value_t = Strategy::Merge)]
    pub strategy: Strategy,

    /// On a first sync, overwrite existing files that differ from upstream
    #[arg(long)]
    pub force: bool,

    /// Abort upstream access after this many seconds
    #[arg(long = "timeout", value_name = "SECS", env = "STENCIL_TIMEOUT")]
    pub timeout_secs: Option<u64>,
}

impl SyncArgs {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

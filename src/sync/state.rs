//! Sync strategies and lifecycle states

use std::fmt;

use tracing::debug;

/// How upstream changes are brought into the project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Three-way merge against the last synced revision
    #[default]
    Merge,
    /// Replace local content with upstream content
    Overwrite,
    /// Report upstream changes without touching the project
    Diff,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merge => "merge",
            Self::Overwrite => "overwrite",
            Self::Diff => "diff",
        })
    }
}

/// Where a sync run is in its lifecycle
///
/// ```text
/// Start -> PathsResolved -> SnapshotsFetched -> MergeApplied -> LockUpdated
///                                            \-> Previewed
/// (any) -> Failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Start,
    PathsResolved,
    SnapshotsFetched,
    MergeApplied,
    LockUpdated,
    Previewed,
    Failed(String),
}

impl SyncState {
    /// Whether the run ended successfully in this state
    pub fn is_success(&self) -> bool {
        matches!(self, Self::LockUpdated | Self::Previewed)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::PathsResolved => f.write_str("paths resolved"),
            Self::SnapshotsFetched => f.write_str("snapshots fetched"),
            Self::MergeApplied => f.write_str("merge applied"),
            Self::LockUpdated => f.write_str("lock updated"),
            Self::Previewed => f.write_str("previewed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Ordered record of the states a run went through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrail {
    states: Vec<SyncState>,
}

impl StateTrail {
    pub fn new() -> Self {
        Self {
            states: vec![SyncState::Start],
        }
    }

    pub fn advance(&mut self, state: SyncState) {
        debug!(state = %state, "Sync state changed");
        self.states.push(state);
    }

    pub fn current(&self) -> &SyncState {
        self.states.last().unwrap_or(&SyncState::Start)
    }

    pub fn states(&self) -> &[SyncState] {
        &self.states
    }
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}

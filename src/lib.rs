//! Stencil - template synchronization engine
//!
//! Keeps selected files of a downstream project in sync with an upstream
//! template repository. Upstream changes are brought in with a three-way
//! merge against the last synced revision, so local edits survive.
//!
//! The entry point is [`sync::SyncCoordinator`]; upstream access goes through
//! the traits in [`vcs`].

pub mod config;
pub mod error;
pub mod lock;
pub mod merge;
pub mod path_utils;
pub mod resolver;
pub mod selector;
pub mod snapshot;
pub mod sync;
pub mod temp;
pub mod vcs;

pub use config::{ConfigurationProvider, TemplateConfig, YamlConfigProvider};
pub use error::{Result, StencilError};
pub use lock::LockRecord;
pub use merge::{Conflict, ConflictKind, MergeEngine, SyncResult};
pub use selector::{ResolvedPathSet, SelectionMode};
pub use snapshot::Snapshot;
pub use sync::{Strategy, SyncCoordinator, SyncReport, SyncRequest, SyncState};
pub use vcs::{BundleManifestLoader, Deadline, GitClient, RepoRef, VersionControlClient};

//! Error types and handling for stencil
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Constructors are grouped in sub-modules by error domain:
//! - [`bundle`]: Bundle manifest and dependency errors
//! - [`config`]: Template configuration errors
//! - [`fs`]: File system errors
//! - [`git`]: Upstream fetch errors

pub mod bundle;
pub mod config;
pub mod fs;
pub mod git;

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for stencil operations
#[derive(Error, Diagnostic, Debug)]
pub enum StencilError {
    // Configuration errors
    #[error("Invalid configuration for '{field}': {message}")]
    #[diagnostic(
        code(stencil::config::invalid),
        help("Fix the '{field}' entry in .stencil/template.yml")
    )]
    ConfigInvalid { field: String, message: String },

    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(stencil::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(stencil::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // Bundle errors
    #[error("{}", unknown_bundle_message(name, referenced_by.as_deref()))]
    #[diagnostic(
        code(stencil::bundle::unknown),
        help("Check the bundle names against the upstream .stencil/bundles.yml")
    )]
    UnknownBundle {
        name: String,
        referenced_by: Option<String>,
    },

    #[error("Circular dependency detected: {chain}")]
    #[diagnostic(
        code(stencil::bundle::circular),
        help("Remove the circular dependency from the upstream bundle manifest")
    )]
    CircularDependency { chain: String, members: Vec<String> },

    #[error("Invalid bundle manifest: {reason}")]
    #[diagnostic(code(stencil::bundle::manifest_invalid))]
    BundleManifestInvalid { reason: String },

    // Fetch errors
    #[error("Failed to fetch from {url}: {reason}")]
    #[diagnostic(
        code(stencil::fetch::failed),
        help("Check that the URL is correct and you have access to the repository")
    )]
    FetchFailed { url: String, reason: String },

    #[error("Revision '{revision}' not found in {url}")]
    #[diagnostic(code(stencil::fetch::revision_not_found))]
    RevisionNotFound { url: String, revision: String },

    #[error("Timed out after {}s while {operation}", elapsed.as_secs())]
    #[diagnostic(
        code(stencil::fetch::timeout),
        help("Retry, or raise the limit with --timeout")
    )]
    Timeout { operation: String, elapsed: Duration },

    // Lock errors
    #[error("Lock file is corrupted: {path}: {reason}")]
    #[diagnostic(
        code(stencil::lock::corrupted),
        help("The lock is ignored and the next sync behaves like a first sync")
    )]
    LockCorrupted { path: String, reason: String },

    #[error("Invalid lock record: {reason}")]
    #[diagnostic(code(stencil::lock::invalid))]
    LockInvalid { reason: String },

    // Sync errors
    #[error("{count} file(s) need manual resolution")]
    #[diagnostic(
        code(stencil::sync::conflicts),
        help("Resolve the files listed above; rejected hunks are kept in .rej files next to them")
    )]
    UnresolvedConflicts { count: usize },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(stencil::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(stencil::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(stencil::fs::io_error))]
    IoError { message: String },
}

fn unknown_bundle_message(name: &str, referenced_by: Option<&str>) -> String {
    match referenced_by {
        Some(parent) => format!("Bundle '{parent}' depends on unknown bundle '{name}'"),
        None => format!("Bundle '{name}' not found"),
    }
}

impl StencilError {
    /// Whether the caller may retry the whole operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::RevisionNotFound { .. } | Self::Timeout { .. }
        )
    }

    /// Whether the error was raised before any snapshot was fetched
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid { .. }
                | Self::ConfigReadFailed { .. }
                | Self::ConfigParseFailed { .. }
                | Self::UnknownBundle { .. }
                | Self::CircularDependency { .. }
                | Self::BundleManifestInvalid { .. }
        )
    }
}

impl From<std::io::Error> for StencilError {
    fn from(err: std::io::Error) -> Self {
        StencilError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for StencilError {
    fn from(err: serde_yaml::Error) -> Self {
        StencilError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StencilError {
    fn from(err: serde_json::Error) -> Self {
        StencilError::LockInvalid {
            reason: err.to_string(),
        }
    }
}

impl From<git2::Error> for StencilError {
    fn from(err: git2::Error) -> Self {
        StencilError::FetchFailed {
            url: "unknown".to_string(),
            reason: err.message().to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, StencilError>;

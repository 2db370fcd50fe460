//! Upstream bundle manifest (.stencil/bundles.yml)
//!
//! ```yaml
//! version: "1.0"
//! bundles:
//!   core:
//!     description: Core files
//!     files: [Makefile, .editorconfig]
//!   tests:
//!     files: [tests]
//!     workflows: [.github/workflows/ci.yml]
//!     depends-on: [core]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, bundle};

/// Location of the manifest inside the template repository
pub const MANIFEST_PATH: &str = ".stencil/bundles.yml";

/// All bundles published by a template repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Manifest format version
    pub version: String,

    /// Bundle definitions keyed by name
    #[serde(default)]
    pub bundles: BTreeMap<String, BundleDefinition>,
}

/// A named, composable group of template paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BundleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub files: Vec<String>,

    /// Workflow files, kept apart because they need elevated push rights
    #[serde(default)]
    pub workflows: Vec<String>,

    /// Names of bundles that must be materialized first
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl BundleDefinition {
    /// Paths contributed by this bundle: files, then workflows
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.files.iter().chain(self.workflows.iter())
    }
}

impl BundleManifest {
    /// Parse a manifest from YAML
    ///
    /// # Errors
    ///
    /// Returns `BundleManifestInvalid` for empty or malformed content and for
    /// a missing `version`.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(bundle::manifest_invalid("bundle manifest is empty"));
        }
        let manifest: Self = serde_yaml::from_str(content)
            .map_err(|e| bundle::manifest_invalid(e.to_string()))?;
        if manifest.version.trim().is_empty() {
            return Err(bundle::manifest_invalid("missing required field: version"));
        }
        Ok(manifest)
    }
}

//! Configuration file handling for stencil
//!
//! This module contains data structures for:
//! - `.stencil/template.yml` - Downstream template configuration
//! - `.stencil/bundles.yml` - Upstream bundle manifest

pub mod manifest;
pub mod template;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, config};

// Re-export commonly used types
pub use manifest::{BundleDefinition, BundleManifest, MANIFEST_PATH};
pub use template::{CONFIG_PATH, TemplateConfig};

/// Source of a validated template configuration
pub trait ConfigurationProvider {
    /// Load and validate the configuration
    fn load(&self) -> Result<TemplateConfig>;
}

/// Reads the configuration from a YAML file on disk
#[derive(Debug, Clone)]
pub struct YamlConfigProvider {
    path: PathBuf,
}

impl YamlConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Provider for the configuration file of a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(CONFIG_PATH))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigurationProvider for YamlConfigProvider {
    fn load(&self) -> Result<TemplateConfig> {
        let path_str = self.path.display().to_string();
        let content = fs::read_to_string(&self.path)
            .map_err(|e| config::read_failed(&path_str, e.to_string()))?;
        let loaded = TemplateConfig::from_yaml(&content, &path_str)?;
        debug!(
            path = %path_str,
            repository = %loaded.template_repository,
            "Loaded template configuration"
        );
        Ok(loaded)
    }
}

/// An in-memory configuration is its own provider
impl ConfigurationProvider for TemplateConfig {
    fn load(&self) -> Result<TemplateConfig> {
        self.validate()?;
        Ok(self.clone())
    }
}

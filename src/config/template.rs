//! Template configuration (.stencil/template.yml) data structures
//!
//! Declares which upstream repository a project follows and which of its
//! paths the project receives.

use serde::{Deserialize, Serialize};

use crate::error::{Result, config};
use crate::selector::{PathSpec, SelectionMode};
use crate::vcs::RepoRef;

/// Location of the configuration inside the downstream project
pub const CONFIG_PATH: &str = ".stencil/template.yml";

const DEFAULT_BRANCH: &str = "main";
const DEFAULT_HOST: &str = "github";

/// Template configuration (.stencil/template.yml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateConfig {
    /// Upstream repository as `owner/repo`
    pub template_repository: String,

    #[serde(default = "default_branch")]
    pub template_branch: String,

    /// Hosting service used to build the clone URL
    #[serde(default = "default_host")]
    pub template_host: String,

    /// Explicit clone URL, overriding the host-derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SelectionMode>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl TemplateConfig {
    /// Create a configuration following `repository` with default settings
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            template_repository: repository.into(),
            template_branch: default_branch(),
            template_host: default_host(),
            template_url: None,
            include: Vec::new(),
            exclude: Vec::new(),
            bundles: Vec::new(),
            mode: None,
        }
    }

    /// Parse and validate configuration from a YAML string
    ///
    /// `source` names the file in error messages.
    pub fn from_yaml(yaml: &str, source: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Err(config::parse_failed(source, "configuration file is empty"));
        }
        let parsed: Self =
            serde_yaml::from_str(yaml).map_err(|e| config::parse_failed(source, e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Serialize configuration to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check repository format, host and path selection
    pub fn validate(&self) -> Result<()> {
        let mut parts = self.template_repository.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(repo), None) if !owner.trim().is_empty() && !repo.trim().is_empty()
        );
        if !well_formed {
            return Err(config::invalid(
                "template-repository",
                format!(
                    "'{}' must be in the form 'owner/repo'",
                    self.template_repository
                ),
            ));
        }

        if self.template_branch.trim().is_empty() {
            return Err(config::invalid("template-branch", "branch must not be empty"));
        }

        if self.template_url.is_none() {
            self.host_url()?;
        }

        self.path_spec().mode()?;
        Ok(())
    }

    /// The configured path selection
    pub fn path_spec(&self) -> PathSpec {
        PathSpec {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            bundles: self.bundles.clone(),
            mode: self.mode,
        }
    }

    /// Clone URL for the template repository
    pub fn clone_url(&self) -> Result<String> {
        match &self.template_url {
            Some(url) => Ok(url.clone()),
            None => self.host_url(),
        }
    }

    /// Reference to the upstream repository
    pub fn repo_ref(&self) -> Result<RepoRef> {
        Ok(RepoRef::new(
            self.template_repository.clone(),
            self.clone_url()?,
        ))
    }

    fn host_url(&self) -> Result<String> {
        let repo = &self.template_repository;
        match self.template_host.to_ascii_lowercase().as_str() {
            "github" => Ok(format!("https://github.com/{repo}.git")),
            "gitlab" => Ok(format!("https://gitlab.com/{repo}.git")),
            other => Err(config::invalid(
                "template-host",
                format!("unsupported host '{other}', expected 'github' or 'gitlab'"),
            )),
        }
    }
}

//! Path selection
//!
//! Turns configured include/exclude entries (plus any bundle-derived paths)
//! into a [`ResolvedPathSet`], validating that excludes narrow includes
//! rather than pointing somewhere unrelated.
//!
//! ## Modes
//!
//! - **include-only**: only the listed includes, minus excludes
//! - **exclude-only**: everything upstream, minus excludes
//! - **hybrid**: bundle paths and explicit includes together, minus excludes
//!
//! Resolution is a pure function of its inputs.

pub mod filter;

use serde::{Deserialize, Serialize};
use wax::Glob;

use crate::error::{Result, config};
use crate::path_utils::{is_glob, is_within, literal_prefix, normalize_entry};

pub use filter::SparseFilter;

/// How include and exclude entries combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    IncludeOnly,
    ExcludeOnly,
    Hybrid,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::IncludeOnly => "include-only",
            Self::ExcludeOnly => "exclude-only",
            Self::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Path selection as configured, before bundle expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSpec {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub bundles: Vec<String>,
    /// Explicitly declared mode; inferred when absent
    pub mode: Option<SelectionMode>,
}

impl PathSpec {
    /// The effective selection mode
    ///
    /// Bundles imply hybrid, includes imply include-only, excludes alone imply
    /// exclude-only. A spec selecting nothing at all is rejected.
    pub fn mode(&self) -> Result<SelectionMode> {
        if let Some(mode) = self.mode {
            return Ok(mode);
        }
        if !self.bundles.is_empty() {
            Ok(SelectionMode::Hybrid)
        } else if !self.include.is_empty() {
            Ok(SelectionMode::IncludeOnly)
        } else if !self.exclude.is_empty() {
            Ok(SelectionMode::ExcludeOnly)
        } else {
            Err(config::invalid(
                "include",
                "configuration must specify 'bundles', 'include' or 'exclude'",
            ))
        }
    }

    /// Resolve against already-expanded bundle paths
    ///
    /// Bundle paths come first so that foundational files keep their
    /// position ahead of explicit includes.
    pub fn resolve(&self, bundle_paths: &[String]) -> Result<ResolvedPathSet> {
        let mode = self.mode()?;
        let mut include = bundle_paths.to_vec();
        include.extend(self.include.iter().cloned());
        resolve(mode, &include, &self.exclude)
    }
}

/// The concrete path selection used for a sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPathSet {
    pub mode: SelectionMode,
    /// Deduplicated include entries in first-seen order
    #[serde(default)]
    pub include: Vec<String>,
    /// Deduplicated exclude entries
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ResolvedPathSet {
    /// The allow/deny filter for this selection
    pub fn filter(&self) -> SparseFilter {
        match self.mode {
            SelectionMode::ExcludeOnly => SparseFilter::deny_only(&self.exclude),
            SelectionMode::IncludeOnly | SelectionMode::Hybrid => {
                SparseFilter::allow_list(&self.include, &self.exclude)
            }
        }
    }

    /// Sparse-checkout patterns for this selection
    pub fn patterns(&self) -> Vec<String> {
        self.filter().patterns()
    }
}

/// Resolve include and exclude entries under a mode
///
/// # Errors
///
/// Returns `ConfigInvalid` when an entry is not a valid relative path or
/// glob, when an include-based mode has nothing to include, when
/// exclude-only is combined with includes, or when an exclude is not nested
/// under any include.
pub fn resolve(
    mode: SelectionMode,
    include: &[String],
    exclude: &[String],
) -> Result<ResolvedPathSet> {
    let include = normalize_all("include", include)?;
    let exclude = normalize_all("exclude", exclude)?;

    if mode == SelectionMode::ExcludeOnly {
        if !include.is_empty() {
            return Err(config::invalid(
                "mode",
                "exclude-only mode cannot be combined with include paths",
            ));
        }
        return Ok(ResolvedPathSet {
            mode,
            include,
            exclude,
        });
    }

    if include.is_empty() {
        return Err(config::invalid(
            "include",
            format!("{mode} mode requires at least one path to include"),
        ));
    }

    for entry in &exclude {
        let nested = include
            .iter()
            .any(|inc| is_within(literal_prefix(entry), literal_prefix(inc)));
        if !nested {
            return Err(config::invalid(
                "exclude",
                format!("'{entry}' is not under any include path"),
            ));
        }
    }

    let retained: Vec<String> = include
        .into_iter()
        .filter(|inc| {
            is_glob(inc)
                || !exclude
                    .iter()
                    .any(|exc| !is_glob(exc) && is_within(inc, exc))
        })
        .collect();
    if retained.is_empty() {
        return Err(config::invalid(
            "exclude",
            "excludes remove every include path",
        ));
    }

    Ok(ResolvedPathSet {
        mode,
        include: retained,
        exclude,
    })
}

fn normalize_all(field: &str, entries: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(entries.len());
    for raw in entries {
        let Some(entry) = normalize_entry(raw) else {
            return Err(config::invalid(
                field,
                format!("'{raw}' is not a valid relative path"),
            ));
        };
        if is_glob(&entry) && Glob::new(&entry).is_err() {
            return Err(config::invalid(
                field,
                format!("'{raw}' is not a valid glob pattern"),
            ));
        }
        if !out.contains(&entry) {
            out.push(entry);
        }
    }
    Ok(out)
}

//! Bundle resolution
//!
//! Expands requested bundle names into an ordered list of template paths,
//! pulling in transitive dependencies so that every bundle's paths follow
//! the paths of the bundles it depends on.
//!
//! - [`graph`]: arena-backed dependency graph over a manifest
//! - [`sort`]: dependency ordering with cycle detection

pub mod graph;
pub mod sort;

use tracing::debug;

use crate::config::BundleManifest;
use crate::error::{Result, bundle, config};
use crate::selector::{PathSpec, ResolvedPathSet};

use graph::BundleGraph;

/// Expand bundle names into template paths in dependency order
///
/// Paths are deduplicated keeping the first occurrence. An empty request
/// yields an empty list.
///
/// # Errors
///
/// Returns `UnknownBundle` for a requested or depended-upon name the manifest
/// does not define, and `CircularDependency` for a reachable cycle.
pub fn expand_bundles(requested: &[String], manifest: &BundleManifest) -> Result<Vec<String>> {
    let graph = BundleGraph::build(manifest);
    let roots = requested
        .iter()
        .map(|name| graph.lookup(name).ok_or_else(|| bundle::unknown(name.as_str())))
        .collect::<Result<Vec<_>>>()?;

    let order = sort::dependency_order(&graph, &roots)?;
    debug!(
        bundles = ?order.iter().map(|&n| graph.name(n)).collect::<Vec<_>>(),
        "Resolved bundle order"
    );

    let mut paths: Vec<String> = Vec::new();
    for node in order {
        for path in graph.definition(node).paths() {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
    }
    Ok(paths)
}

/// Resolve a configured path spec, expanding its bundles first
///
/// The manifest is only consulted when bundles are requested.
///
/// # Errors
///
/// Returns `ConfigInvalid` when bundles are requested but the template
/// publishes no manifest, plus any bundle or selection error.
pub fn expand(spec: &PathSpec, manifest: Option<&BundleManifest>) -> Result<ResolvedPathSet> {
    let bundle_paths = if spec.bundles.is_empty() {
        Vec::new()
    } else {
        let manifest = manifest.ok_or_else(|| {
            config::invalid(
                "bundles",
                "bundles are configured but the template repository has no .stencil/bundles.yml",
            )
        })?;
        expand_bundles(&spec.bundles, manifest)?
    };
    spec.resolve(&bundle_paths)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::StencilError;
    use crate::selector::SelectionMode;

    const MANIFEST: &str = r#"
version: "1.0"
bundles:
  core:
    files: [Makefile, .editorconfig]
  tests:
    files: [tests, pytest.ini]
    workflows: [.github/workflows/ci.yml]
    depends-on: [core]
  docs:
    files: [docs, Makefile]
    depends-on: [core]
"#;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn manifest() -> BundleManifest {
        BundleManifest::from_yaml(MANIFEST).expect("manifest should parse")
    }

    #[test]
    fn test_expand_bundles_dependencies_first() {
        let paths = expand_bundles(&strings(&["tests"]), &manifest()).expect("expand");
        assert_eq!(
            paths,
            strings(&[
                "Makefile",
                ".editorconfig",
                "tests",
                "pytest.ini",
                ".github/workflows/ci.yml"
            ])
        );
    }

    #[test]
    fn test_expand_bundles_dedups_shared_paths() {
        let paths = expand_bundles(&strings(&["docs", "tests"]), &manifest()).expect("expand");
        assert_eq!(paths.iter().filter(|p| *p == "Makefile").count(), 1);
        assert_eq!(paths[0], "Makefile");
    }

    #[test]
    fn test_expand_bundles_unknown_requested() {
        let err = expand_bundles(&strings(&["nope"]), &manifest()).expect_err("unknown");
        assert_eq!(err.to_string(), "Bundle 'nope' not found");
    }

    #[test]
    fn test_expand_without_manifest_fails() {
        let spec = PathSpec {
            bundles: strings(&["core"]),
            ..PathSpec::default()
        };
        let err = expand(&spec, None).expect_err("manifest required");
        assert!(matches!(err, StencilError::ConfigInvalid { ref field, .. } if field == "bundles"));
    }

    #[test]
    fn test_expand_combines_bundles_and_includes() {
        let spec = PathSpec {
            include: strings(&["README.md"]),
            bundles: strings(&["core"]),
            ..PathSpec::default()
        };
        let resolved = expand(&spec, Some(&manifest())).expect("expand");
        assert_eq!(resolved.mode, SelectionMode::Hybrid);
        assert_eq!(resolved.include, strings(&["Makefile", ".editorconfig", "README.md"]));
    }

    #[test]
    fn test_expand_plain_includes_ignore_manifest() {
        let spec = PathSpec {
            include: strings(&["docs"]),
            ..PathSpec::default()
        };
        let resolved = expand(&spec, None).expect("no manifest needed");
        assert_eq!(resolved.include, strings(&["docs"]));
    }
}

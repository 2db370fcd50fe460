//! Arena-backed bundle dependency graph
//!
//! Bundles are stored in a `Vec` and referenced by index; edges are index
//! lists. Dependency names that do not resolve to a bundle are kept as
//! dangling edges so that only bundles actually reached by a walk can fail
//! on them.
//!
//! ```text
//! nodes:  [core, tests, docs]
//! edges:  core  -> []
//!         tests -> [Known(0)]
//!         docs  -> [Known(0), Unknown("book")]
//! ```

use std::collections::HashMap;

use crate::config::{BundleDefinition, BundleManifest};

/// An outgoing dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge<'m> {
    /// Index of an existing bundle
    Known(usize),
    /// Name that the manifest does not define
    Unknown(&'m str),
}

#[derive(Debug)]
struct Node<'m> {
    name: &'m str,
    definition: &'m BundleDefinition,
    edges: Vec<Edge<'m>>,
}

/// Dependency graph over the bundles of one manifest
#[derive(Debug)]
pub struct BundleGraph<'m> {
    nodes: Vec<Node<'m>>,
    index: HashMap<&'m str, usize>,
}

impl<'m> BundleGraph<'m> {
    /// Build the graph for every bundle in the manifest
    pub fn build(manifest: &'m BundleManifest) -> Self {
        let index: HashMap<&'m str, usize> = manifest
            .bundles
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let nodes = manifest
            .bundles
            .iter()
            .map(|(name, definition)| Node {
                name: name.as_str(),
                definition,
                edges: definition
                    .depends_on
                    .iter()
                    .map(|dep| match index.get(dep.as_str()) {
                        Some(&i) => Edge::Known(i),
                        None => Edge::Unknown(dep.as_str()),
                    })
                    .collect(),
            })
            .collect();

        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the bundle with the given name
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn name(&self, node: usize) -> &'m str {
        self.nodes[node].name
    }

    pub fn definition(&self, node: usize) -> &'m BundleDefinition {
        self.nodes[node].definition
    }

    /// Outgoing edges in declaration order
    pub fn edges(&self, node: usize) -> &[Edge<'m>] {
        &self.nodes[node].edges
    }
}

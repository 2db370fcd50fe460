//! Dependency ordering for bundles
//!
//! Iterative depth-first search with three-state marking:
//!
//! 1. **Unvisited**: node hasn't been reached
//! 2. **InProgress**: node is on the current walk stack
//! 3. **Done**: node and all its dependencies are emitted
//!
//! Reaching an `InProgress` node means a cycle; the cycle is read straight
//! off the walk stack. Nodes are emitted post-order, so dependencies always
//! precede their dependents.

use super::graph::{BundleGraph, Edge};
use crate::error::{Result, bundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// Order the bundles reachable from `roots`, dependencies first
///
/// Roots are walked in the given order, so independent bundles keep the
/// order they were requested in. Each bundle appears once.
///
/// # Errors
///
/// Returns `CircularDependency` when a cycle is reachable from the roots and
/// `UnknownBundle` when a reachable bundle depends on an undefined name.
///
/// # Example
///
/// ```text
/// tests depends on core
/// docs  depends on core
///
/// roots: [tests, docs]  ->  [core, tests, docs]
/// ```
pub fn dependency_order(graph: &BundleGraph<'_>, roots: &[usize]) -> Result<Vec<usize>> {
    let mut state = vec![VisitState::Unvisited; graph.len()];
    let mut order = Vec::with_capacity(graph.len());
    // (node, index of the next edge to follow)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for &root in roots {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        state[root] = VisitState::InProgress;
        stack.push((root, 0));

        while let Some(&(node, next)) = stack.last() {
            let Some(edge) = graph.edges(node).get(next) else {
                state[node] = VisitState::Done;
                order.push(node);
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let dep = match *edge {
                Edge::Known(dep) => dep,
                Edge::Unknown(name) => {
                    return Err(bundle::unknown_dependency(name, graph.name(node)));
                }
            };

            match state[dep] {
                VisitState::Unvisited => {
                    state[dep] = VisitState::InProgress;
                    stack.push((dep, 0));
                }
                VisitState::InProgress => {
                    let start = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                    let mut members: Vec<String> = stack[start..]
                        .iter()
                        .map(|&(n, _)| graph.name(n).to_string())
                        .collect();
                    members.push(graph.name(dep).to_string());
                    return Err(bundle::circular(members));
                }
                VisitState::Done => {}
            }
        }
    }

    Ok(order)
}

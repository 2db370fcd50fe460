//! Bundle manifest and dependency errors

use super::StencilError;

/// Creates an unknown bundle error for a requested bundle
pub fn unknown(name: impl Into<String>) -> StencilError {
    StencilError::UnknownBundle {
        name: name.into(),
        referenced_by: None,
    }
}

/// Creates an unknown bundle error for a dependency edge
pub fn unknown_dependency(name: impl Into<String>, parent: impl Into<String>) -> StencilError {
    StencilError::UnknownBundle {
        name: name.into(),
        referenced_by: Some(parent.into()),
    }
}

/// Creates a circular dependency error from the cycle members in walk order
///
/// The first member is repeated at the end so the chain reads as a loop.
pub fn circular(members: Vec<String>) -> StencilError {
    StencilError::CircularDependency {
        chain: members.join(" -> "),
        members,
    }
}

/// Creates an invalid manifest error
pub fn manifest_invalid(reason: impl Into<String>) -> StencilError {
    StencilError::BundleManifestInvalid {
        reason: reason.into(),
    }
}

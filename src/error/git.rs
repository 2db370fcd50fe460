//! Upstream fetch errors

use super::StencilError;

/// Creates a fetch failed error
pub fn fetch_failed(url: impl Into<String>, reason: impl Into<String>) -> StencilError {
    StencilError::FetchFailed {
        url: url.into(),
        reason: reason.into(),
    }
}

/// Creates a revision not found error
pub fn revision_not_found(url: impl Into<String>, revision: impl Into<String>) -> StencilError {
    StencilError::RevisionNotFound {
        url: url.into(),
        revision: revision.into(),
    }
}

/// Creates a timeout error for an operation that ran past its deadline
pub fn timeout(operation: impl Into<String>, elapsed: std::time::Duration) -> StencilError {
    StencilError::Timeout {
        operation: operation.into(),
        elapsed,
    }
}

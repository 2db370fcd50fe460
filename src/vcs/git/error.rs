//! Translating libgit2 failures into stencil errors

use git2::ErrorClass;

use crate::error::{StencilError, git as git_error};
use crate::vcs::Deadline;

type Check = fn(&str, ErrorClass) -> bool;

/// Message patterns and the summary reported for them
const SUMMARIES: &[(Check, &str)] = &[
    (
        |msg, _| {
            msg.contains("not found") || msg.contains("404") || msg.contains("too many redirects")
        },
        "repository not found",
    ),
    (
        |msg, _| msg.contains("authentication") || msg.contains("credentials"),
        "authentication failed",
    ),
    (
        |msg, _| msg.contains("permission denied") || msg.contains("access denied"),
        "permission denied",
    ),
    (
        |msg, class| {
            class == ErrorClass::Http && (msg.contains("certificate") || msg.contains("ssl"))
        },
        "TLS error",
    ),
    (
        |msg, class| {
            class == ErrorClass::Net || msg.contains("connection") || msg.contains("network")
        },
        "network error",
    ),
];

/// Human-readable reason for a libgit2 error
pub fn describe(err: &git2::Error) -> String {
    let message = err.message().to_lowercase();
    match SUMMARIES.iter().find(|(check, _)| check(&message, err.class())) {
        Some((_, summary)) => format!("{summary}: {}", err.message()),
        None => err.message().to_string(),
    }
}

/// Error for a failed clone or fetch of `url`
///
/// Transfers aborted by the progress callback surface as libgit2 user
/// errors; once the deadline has passed they are reported as timeouts.
pub fn transfer_failed(url: &str, err: &git2::Error, deadline: &Deadline) -> StencilError {
    if deadline.is_expired() {
        return git_error::timeout(format!("fetching {url}"), deadline.elapsed());
    }
    git_error::fetch_failed(url, describe(err))
}

/// Error for a local repository operation on an already fetched clone
pub fn read_failed(url: &str, err: &git2::Error) -> StencilError {
    git_error::fetch_failed(url, describe(err))
}

//! Clone URL normalization for libgit2

use std::borrow::Cow;

/// Rewrite a clone URL into a form libgit2 accepts
///
/// - SCP-style `git@host:owner/repo.git` becomes `ssh://git@host/owner/repo.git`
/// - `file://` URLs without an absolute path get the third slash back
pub fn normalize(url: &str) -> Cow<'_, str> {
    if let Some(rest) = url.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            let path = path.trim_start_matches('/');
            return Cow::Owned(format!("ssh://git@{host}/{path}"));
        }
        return Cow::Borrowed(url);
    }

    if let Some(after) = url.strip_prefix("file://") {
        let after = after.replace('\\', "/");
        if !after.starts_with('/') {
            return Cow::Owned(format!("file:///{after}"));
        }
        if after != url["file://".len()..] {
            return Cow::Owned(format!("file://{after}"));
        }
    }

    Cow::Borrowed(url)
}

//! Relative path handling for the selector and the path filter
//!
//! All paths that cross module boundaries are relative, use forward slashes,
//! and never contain `.` or `..` components.

/// Characters that turn a path entry into a glob pattern
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Normalise a configured path entry
///
/// Strips leading `./` and `/`, trailing `/`, collapses duplicate separators
/// and converts backslashes. Returns `None` when the entry is empty after
/// normalisation or climbs out of the root with `..`.
///
/// ```
/// use stencil::path_utils::normalize_entry;
///
/// assert_eq!(normalize_entry("./.github//workflows/").as_deref(), Some(".github/workflows"));
/// assert_eq!(normalize_entry("../outside"), None);
/// ```
pub fn normalize_entry(entry: &str) -> Option<String> {
    let unified = entry.trim().replace('\\', "/");
    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Whether the entry contains glob metacharacters
pub fn is_glob(entry: &str) -> bool {
    entry.contains(GLOB_META)
}

/// The literal directory prefix of an entry
///
/// For plain paths this is the path itself. For globs it is the leading
/// components before the first component containing a metacharacter
/// (`docs/**/*.md` -> `docs`, `*.md` -> empty).
pub fn literal_prefix(entry: &str) -> &str {
    if !is_glob(entry) {
        return entry;
    }
    let mut end = 0;
    for (index, component) in entry.split('/').enumerate() {
        if is_glob(component) {
            break;
        }
        end += component.len() + usize::from(index > 0);
    }
    &entry[..end]
}

/// Whether `path` equals `ancestor` or lies beneath it
///
/// An empty ancestor contains everything.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    ancestor.is_empty()
        || path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

//! Unified-diff helpers on top of `diffy`

use diffy::{ApplyError, Patch};

/// Suffix of the artifact written next to a file whose patch was rejected
pub const REJECT_SUFFIX: &str = ".rej";

/// Render a patch with `a/` and `b/` headers for `path`
pub fn render(path: &str, patch: &Patch<'_, [u8]>) -> String {
    let text = String::from_utf8_lossy(&patch.to_bytes()).into_owned();
    let body = text
        .strip_prefix("--- original\n+++ modified\n")
        .unwrap_or(&text);
    format!("--- a/{path}\n+++ b/{path}\n{body}")
}

/// Artifact path for a rejected patch
pub fn reject_path(path: &str) -> String {
    format!("{path}{REJECT_SUFFIX}")
}

/// 1-based line where the first hunk starts
pub fn first_hunk_line(patch: &Patch<'_, [u8]>) -> Option<usize> {
    patch.hunks().first().map(|h| h.old_range().start().max(1))
}

/// 1-based line of the hunk that failed to apply
///
/// `diffy` reports the failing hunk only through its message
/// (`error applying hunk #N`).
pub fn rejected_line(patch: &Patch<'_, [u8]>, err: &ApplyError) -> Option<usize> {
    let message = err.to_string();
    let number: usize = message.rsplit('#').next()?.trim().parse().ok()?;
    let hunk = patch.hunks().get(number.checked_sub(1)?)?;
    Some(hunk.old_range().start().max(1))
}

/// Map a 1-based `base` line to the matching line in `local`
///
/// Lines inside a locally edited hunk map to the start of its replacement.
pub fn local_line(base: &[u8], local: &[u8], base_line: usize) -> usize {
    let edits = diffy::create_patch_bytes(base, local);
    let mut shift: isize = 0;
    for hunk in edits.hunks() {
        let old = hunk.old_range();
        let new = hunk.new_range();
        if old.start() + old.len() <= base_line {
            shift += signed(new.len()) - signed(old.len());
            continue;
        }
        if old.start() <= base_line {
            let within = (base_line - old.start()).min(new.len().saturating_sub(1));
            return (new.start() + within).max(1);
        }
        break;
    }
    base_line.saturating_add_signed(shift).max(1)
}

fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

use crate::config::Palette;
use crate::diff::{Decision, DiffText, FileDiff, Hunk, render_header};

/// Render a hunk for display or for a patch.
///
/// The header is renumbered by `delta`. With a palette, colored views are
/// used where the text has them; patches are always rendered without one.
pub fn render_hunk(
    text: &DiffText,
    hunk: &Hunk,
    delta: i64,
    palette: Option<&Palette>,
    out: &mut Vec<u8>,
) {
    render_header(text, &hunk.header, delta, palette, out);

    let colored_body = palette
        .and(hunk.colored_body())
        .and_then(|range| text.colored_slice(&range));

    match colored_body {
        Some(body) => out.extend_from_slice(body),
        None => out.extend_from_slice(text.slice(&hunk.body())),
    }
}

/// Build a patch containing only the hunks marked [`Decision::Use`].
///
/// The head is copied verbatim. Every hunk left out (skipped, or still
/// undecided because input ran out) shifts the new offsets of the hunks
/// after it by its `old_count - new_count`.
///
/// The patch is bytes, like the diff it comes from. Returns `None` when no
/// hunk is used, so there is nothing to apply.
pub fn reassemble(text: &DiffText, file: &FileDiff) -> Option<Vec<u8>> {
    if !file.has_use() {
        return None;
    }

    let mut patch = text.slice(&file.head).to_vec();
    let mut cumulative_delta: i64 = 0;

    for hunk in &file.hunks {
        match hunk.decision {
            Decision::Use => render_hunk(text, hunk, cumulative_delta, None, &mut patch),
            Decision::Skip | Decision::Undecided => cumulative_delta += hunk.delta(),
        }
    }

    Some(patch)
}

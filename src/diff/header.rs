//! Hunk header decoding and renumbering.
//!
//! A header line has the form `@@ -O[,C] +O2[,C2] @@<extra>`. The numbers are
//! decoded into a [`HunkHeader`]; the trailing `<extra>` (usually a function
//! signature) is kept as a view and never reinterpreted.

use super::text::DiffText;
use super::HeaderParseError;
use crate::config::{Palette, RESET};
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u64 as number},
    combinator::opt,
    sequence::{delimited, preceded},
};
use std::ops::Range;

/// Decoded `@@ ... @@` line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_offset: u64,
    pub old_count: u64,
    pub new_offset: u64,
    pub new_count: u64,
    /// Text after ` @@` in the plain diff, without the line terminator
    pub extra: Range<usize>,
    /// Text after ` @@` in the colored diff, without the line terminator
    pub colored_extra: Option<Range<usize>>,
}

/// `O` or `O,C`; a missing count means 1
fn line_range(input: &[u8]) -> IResult<&[u8], (u64, u64)> {
    (number, opt(preceded(char(','), number)))
        .map(|(offset, count)| (offset, count.unwrap_or(1)))
        .parse(input)
}

fn header_ranges(input: &[u8]) -> IResult<&[u8], ((u64, u64), (u64, u64))> {
    (
        preceded(tag("@@ -"), line_range),
        delimited(tag(" +"), line_range, tag(" @@")),
    )
        .parse(input)
}

/// End of a line's content, excluding its `\n`
fn content_end(text: &[u8], line: &Range<usize>) -> usize {
    if text[line.clone()].ends_with(b"\n") {
        line.end - 1
    } else {
        line.end
    }
}

/// Decode the hunk header occupying `line` in `text`.
///
/// # Errors
///
/// Returns [`HeaderParseError::InvalidHeader`] quoting the line when the
/// literal markers or either leading number are missing.
pub fn parse_hunk_header(text: &[u8], line: Range<usize>) -> Result<HunkHeader, HeaderParseError> {
    let end = content_end(text, &line);
    let content = &text[line.start..end];

    let (rest, ((old_offset, old_count), (new_offset, new_count))) = header_ranges(content)
        .map_err(|_| HeaderParseError::InvalidHeader {
            line: String::from_utf8_lossy(content).into_owned(),
        })?;

    Ok(HunkHeader {
        old_offset,
        old_count,
        new_offset,
        new_count,
        extra: end - rest.len()..end,
        colored_extra: None,
    })
}

/// Find the extra text of a colored header line.
///
/// Color escapes may surround the markers, so offsets are searched for
/// independently of the plain line. Returns `None` if either marker is
/// missing.
pub fn locate_colored_extra(colored: &[u8], line: Range<usize>) -> Option<Range<usize>> {
    let end = content_end(colored, &line);
    let content = &colored[line.start..end];

    let open = find(content, b"@@ -")? + 4;
    let close = find(&content[open..], b" @@")? + open + 3;

    Some(line.start + close..end)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn push_range(out: &mut Vec<u8>, sign: u8, offset: u64, count: u64) {
    out.push(sign);
    out.extend_from_slice(offset.to_string().as_bytes());
    if count != 1 {
        out.push(b',');
        out.extend_from_slice(count.to_string().as_bytes());
    }
}

/// Render `header` with its new offset shifted by `delta`.
///
/// Counts equal to 1 are omitted, which is how git writes them, so a `delta`
/// of 0 reproduces a git-generated header byte for byte. With a palette the
/// colored extra text is used and a reset is written before the terminator
/// when there is no extra text to carry one.
pub fn render_header(
    text: &DiffText,
    header: &HunkHeader,
    delta: i64,
    palette: Option<&Palette>,
    out: &mut Vec<u8>,
) {
    if let Some(palette) = palette {
        out.extend_from_slice(palette.fraginfo.as_bytes());
    }

    out.extend_from_slice(b"@@ ");
    push_range(out, b'-', header.old_offset, header.old_count);
    out.push(b' ');
    push_range(
        out,
        b'+',
        header.new_offset.saturating_add_signed(delta),
        header.new_count,
    );
    out.extend_from_slice(b" @@");

    match palette {
        None => out.extend_from_slice(text.slice(&header.extra)),
        Some(_) => match header
            .colored_extra
            .as_ref()
            .and_then(|range| text.colored_slice(range))
        {
            Some(extra) if !extra.is_empty() => out.extend_from_slice(extra),
            _ => {
                out.extend_from_slice(RESET.as_bytes());
                out.extend_from_slice(text.slice(&header.extra));
            }
        },
    }

    out.push(b'\n');
}

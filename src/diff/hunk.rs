use super::header::HunkHeader;
use std::ops::Range;

/// What the operator decided to do with a hunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decision {
    #[default]
    Undecided,
    /// Leave the hunk out of the patch
    Skip,
    /// Stage the hunk
    Use,
}

/// A single hunk from a git diff.
///
/// The hunk covers its header line and every body line up to the next hunk
/// or the end of the file section. All ranges are views into the
/// [`DiffText`](super::DiffText) the hunk was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub range: Range<usize>,
    pub colored_range: Option<Range<usize>>,
    pub header: HunkHeader,
    pub decision: Decision,
}

impl Hunk {
    /// Everything after the header line, in the plain text
    pub fn body(&self) -> Range<usize> {
        // The header line always ends in `\n` because DiffText completes lines
        (self.header.extra.end + 1).min(self.range.end)..self.range.end
    }

    /// Everything after the header line, in the colored text
    pub fn colored_body(&self) -> Option<Range<usize>> {
        let range = self.colored_range.as_ref()?;
        let extra = self.header.colored_extra.as_ref()?;
        Some((extra.end + 1).min(range.end)..range.end)
    }

    /// Lines removed minus lines added; what leaving this hunk out shifts
    /// later new offsets by
    pub fn delta(&self) -> i64 {
        self.header.old_count as i64 - self.header.new_count as i64
    }

    pub fn is_undecided(&self) -> bool {
        self.decision == Decision::Undecided
    }
}

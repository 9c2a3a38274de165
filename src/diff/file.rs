use super::header::{locate_colored_extra, parse_hunk_header};
use super::hunk::{Decision, Hunk};
use super::text::DiffText;
use super::DiffError;
use std::ops::Range;

/// Where one file's `diff ` section lives in the plain and colored text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    pub range: Range<usize>,
    pub colored_range: Option<Range<usize>>,
}

/// A complete diff for a single file.
///
/// `head` covers everything from the `diff ` line up to the first hunk.
/// `head` and the hunk ranges partition the file's section of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// File path (from the `+++ b/`, `--- a/` or `diff --git` line)
    pub path: String,
    pub head: Range<usize>,
    pub colored_head: Option<Range<usize>>,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Parse one file section into its head and hunks.
    ///
    /// Every line after the first that starts with `@@ ` opens a hunk; all
    /// other lines extend whichever region is open. When the text carries a
    /// colored twin, its lines are walked in lockstep and each colored hunk
    /// header is located on its own.
    ///
    /// # Errors
    ///
    /// Fails on the first hunk header that does not parse, or on a colored
    /// header line without `@@` markers. Nothing of the file is returned in
    /// that case.
    pub fn parse(text: &DiffText, section: &FileSection) -> Result<Self, DiffError> {
        let mut colored_lines = section
            .colored_range
            .clone()
            .and_then(|range| text.colored_lines(range));

        let mut head = section.range.start..section.range.start;
        let mut colored_head = section.colored_range.as_ref().map(|r| r.start..r.start);
        let mut hunks: Vec<Hunk> = Vec::new();

        for (i, line) in text.lines(section.range.clone()).enumerate() {
            let colored_line = colored_lines.as_mut().and_then(Iterator::next);

            if i > 0 && text.slice(&line).starts_with(b"@@ ") {
                let mut header = parse_hunk_header(text.plain(), line.clone())?;

                if let (Some(colored), Some(colored_line)) = (text.colored(), &colored_line) {
                    let extra = locate_colored_extra(colored, colored_line.clone()).ok_or_else(
                        || DiffError::ColorHeaderMissing {
                            line: String::from_utf8_lossy(&colored[colored_line.clone()])
                                .trim_end()
                                .to_string(),
                        },
                    )?;
                    header.colored_extra = Some(extra);
                }

                hunks.push(Hunk {
                    range: line,
                    colored_range: colored_line,
                    header,
                    decision: Decision::Undecided,
                });
                continue;
            }

            let (end, colored_end) = match hunks.last_mut() {
                Some(hunk) => (&mut hunk.range.end, hunk.colored_range.as_mut()),
                None => (&mut head.end, colored_head.as_mut()),
            };
            *end = line.end;
            if let (Some(colored_end), Some(colored_line)) = (colored_end, colored_line) {
                colored_end.end = colored_line.end;
            }
        }

        Ok(FileDiff {
            path: extract_path(&String::from_utf8_lossy(text.slice(&head))),
            head,
            colored_head,
            hunks,
        })
    }

    /// True if at least one hunk is marked [`Decision::Use`]
    pub fn has_use(&self) -> bool {
        self.hunks.iter().any(|hunk| hunk.decision == Decision::Use)
    }
}

/// Pick a display path out of a file head
fn extract_path(head: &str) -> String {
    head.lines()
        .find_map(|line| line.strip_prefix("+++ b/"))
        .or_else(|| head.lines().find_map(|line| line.strip_prefix("--- a/")))
        .or_else(|| {
            head.lines()
                .next()
                .and_then(|line| line.strip_prefix("diff --git a/"))
                .and_then(|rest| rest.split_once(" b/"))
                .map(|(_, new)| new)
        })
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

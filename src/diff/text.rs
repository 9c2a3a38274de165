//! Immutable storage for one diff-engine invocation.
//!
//! Everything downstream of the parser refers back into a [`DiffText`] with
//! plain `Range<usize>` views instead of owning copies of the text. The text
//! is kept as bytes: file contents in a diff carry whatever encoding the
//! files have.

use crate::ColorDiffEngineError;
use std::ops::Range;

/// The raw diff output, plain and optionally colored.
///
/// Both buffers always end with `\n`. When a colored buffer is present it has
/// exactly as many lines as the plain one, although byte offsets differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffText {
    plain: Vec<u8>,
    colored: Option<Vec<u8>>,
}

impl DiffText {
    /// Wrap plain diff output, completing a missing final line terminator.
    pub fn new(plain: impl Into<Vec<u8>>) -> Self {
        Self {
            plain: complete_line(plain.into()),
            colored: None,
        }
    }

    /// Wrap plain diff output together with its colored rendering.
    ///
    /// # Errors
    ///
    /// Returns [`ColorDiffEngineError::ColorLineMismatch`] when the two
    /// renderings do not have the same number of lines.
    pub fn with_colored(
        plain: impl Into<Vec<u8>>,
        colored: impl Into<Vec<u8>>,
    ) -> Result<Self, ColorDiffEngineError> {
        let plain = complete_line(plain.into());
        let colored = complete_line(colored.into());

        let plain_lines = count_lines(&plain);
        let colored_lines = count_lines(&colored);
        if plain_lines != colored_lines {
            return Err(ColorDiffEngineError::ColorLineMismatch {
                plain: plain_lines,
                colored: colored_lines,
            });
        }

        Ok(Self {
            plain,
            colored: Some(colored),
        })
    }

    pub fn plain(&self) -> &[u8] {
        &self.plain
    }

    pub fn colored(&self) -> Option<&[u8]> {
        self.colored.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    /// Resolve a view into the plain text
    pub fn slice(&self, range: &Range<usize>) -> &[u8] {
        &self.plain[range.clone()]
    }

    /// Resolve a view into the colored text, if there is one
    pub fn colored_slice(&self, range: &Range<usize>) -> Option<&[u8]> {
        self.colored.as_deref().map(|colored| &colored[range.clone()])
    }

    /// Iterate over the lines of the plain text within `range`
    pub fn lines(&self, range: Range<usize>) -> LineSpans<'_> {
        line_spans(&self.plain, range)
    }

    /// Iterate over the lines of the colored text within `range`
    pub fn colored_lines(&self, range: Range<usize>) -> Option<LineSpans<'_>> {
        self.colored
            .as_deref()
            .map(|colored| line_spans(colored, range))
    }
}

/// Append `\n` unless the text is empty or already ends with one
fn complete_line(mut text: Vec<u8>) -> Vec<u8> {
    if text.last().is_some_and(|&b| b != b'\n') {
        text.push(b'\n');
    }
    text
}

fn count_lines(text: &[u8]) -> usize {
    text.iter().filter(|&&b| b == b'\n').count()
}

/// Iterator over the line spans of a text.
///
/// Each item is the absolute byte range of one line, including its `\n`
/// terminator when present. The iterator is single-pass.
#[derive(Debug, Clone)]
pub struct LineSpans<'a> {
    text: &'a [u8],
    pos: usize,
    end: usize,
}

/// Split `text[range]` into line spans
pub fn line_spans(text: &[u8], range: Range<usize>) -> LineSpans<'_> {
    LineSpans {
        text,
        pos: range.start,
        end: range.end.min(text.len()),
    }
}

impl Iterator for LineSpans<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }

        let start = self.pos;
        let stop = self.text[start..self.end]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.end, |i| start + i + 1);

        self.pos = stop;
        Some(start..stop)
    }
}

impl std::iter::FusedIterator for LineSpans<'_> {}

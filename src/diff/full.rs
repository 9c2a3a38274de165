use super::DiffError;
use super::file::{FileDiff, FileSection};
use super::text::DiffText;
use tracing::debug;

/// A complete git diff containing changes for multiple files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub files: Vec<FileDiff>,
}

impl Diff {
    /// Split diff text into per-file sections.
    ///
    /// Each line starting with `diff ` opens a section that runs until the
    /// next one. Colored lines are walked in lockstep so each section also
    /// knows its colored range.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::UnexpectedLine`] if the text does not start with
    /// a `diff ` line.
    pub fn split(text: &DiffText) -> Result<Vec<FileSection>, DiffError> {
        let mut sections: Vec<FileSection> = Vec::new();
        let mut colored_lines = text
            .colored()
            .and_then(|colored| text.colored_lines(0..colored.len()));

        for line in text.lines(0..text.plain().len()) {
            let colored_line = colored_lines.as_mut().and_then(Iterator::next);

            if text.slice(&line).starts_with(b"diff ") {
                sections.push(FileSection {
                    range: line,
                    colored_range: colored_line,
                });
                continue;
            }

            let Some(section) = sections.last_mut() else {
                return Err(DiffError::UnexpectedLine {
                    line: String::from_utf8_lossy(text.slice(&line))
                        .trim_end()
                        .to_string(),
                });
            };
            section.range.end = line.end;
            if let (Some(range), Some(colored_line)) =
                (section.colored_range.as_mut(), colored_line)
            {
                range.end = colored_line.end;
            }
        }

        Ok(sections)
    }

    /// Parse a complete git diff output into file diffs.
    ///
    /// An empty diff parses to no files.
    ///
    /// # Errors
    ///
    /// Fails on the first file that does not parse.
    pub fn parse(text: &DiffText) -> Result<Self, DiffError> {
        let files = Self::split(text)?
            .iter()
            .map(|section| FileDiff::parse(text, section))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            files = files.len(),
            hunks = files.iter().map(|file| file.hunks.len()).sum::<usize>(),
            colored = text.colored().is_some(),
            "parsed diff"
        );

        Ok(Diff { files })
    }

    /// Parse a diff that must cover at most one file.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::MultiFileUnsupported`] when a second `diff `
    /// line shows up, otherwise as [`Diff::parse`].
    pub fn parse_single_file(text: &DiffText) -> Result<Self, DiffError> {
        let sections = Self::split(text)?;
        if sections.len() > 1 {
            return Err(DiffError::MultiFileUnsupported);
        }

        let files = sections
            .iter()
            .map(|section| FileDiff::parse(text, section))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Diff { files })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

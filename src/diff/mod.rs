//! Decoding unified diff text into files and hunks.
//!
//! The parser never copies diff text: a [`DiffText`] owns the bytes and the
//! [`FileDiff`]/[`Hunk`] tree holds byte ranges into it.

pub mod file;
pub mod full;
pub mod header;
pub mod hunk;
pub mod text;

pub use file::{FileDiff, FileSection};
pub use full::Diff;
pub use header::{HunkHeader, parse_hunk_header, render_header};
pub use hunk::{Decision, Hunk};
pub use text::DiffText;

use error_set::error_set;

error_set! {
    /// Errors from splitting diff text into files and hunks
    DiffError := {
        /// The text does not open with a `diff ` line
        #[display("diff starts with unexpected line:\n{line}")]
        UnexpectedLine { line: String },
        /// More than one `diff ` section where only one is accepted
        #[display("multi-file diff not yet supported")]
        MultiFileUnsupported,
        /// The colored twin has no `@@ -` / ` @@` markers on a header line
        #[display("could not find hunk header markers in colored line '{line}'")]
        ColorHeaderMissing { line: String },
    } || HeaderParseError

    /// A hunk header does not match `@@ -O[,C] +O[,C] @@`
    HeaderParseError := {
        #[display("could not parse hunk header '{line}'")]
        InvalidHeader { line: String },
    }
}

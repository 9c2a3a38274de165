//! Hunk-by-hunk decisions driven by single-character commands.
//!
//! The state is a file's hunk list plus a cursor. [`step`] is the whole
//! transition function and does no I/O; [`Selector`] wraps it in the
//! prompt/read loop.

use crate::config::{Config, Palette};
use crate::diff::{Decision, DiffText, FileDiff, Hunk};
use crate::patch::render_hunk;
use error_set::error_set;
use std::io::{self, BufRead, Write};
use tracing::debug;

error_set! {
    /// A navigation command whose target does not exist
    NavigationError := {
        #[display("No previous hunk")]
        NoPreviousHunk,
        #[display("No next hunk")]
        NoNextHunk,
    }
}

/// The command legend, shown for `?` and any unrecognized input
pub const HELP_TEXT: &str = "\
y - stage this hunk
n - do not stage this hunk
a - stage this and all the remaining hunks
d - do not stage this hunk nor any of the remaining hunks
j - leave this hunk undecided, see next undecided hunk
J - leave this hunk undecided, see next hunk
k - leave this hunk undecided, see previous undecided hunk
K - leave this hunk undecided, see previous hunk
? - print help
";

/// An operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `y`
    Use,
    /// `n`
    Skip,
    /// `a`
    UseRest,
    /// `d`
    SkipRest,
    /// `K`
    PreviousHunk,
    /// `J`
    NextHunk,
    /// `k`
    PreviousUndecided,
    /// `j`
    NextUndecided,
}

/// One line of operator input, classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Blank,
    Command(Command),
    Unknown,
}

impl Input {
    /// Classify a line by its first non-blank character.
    ///
    /// `y`, `n`, `a` and `d` ignore case; `j`, `J`, `k` and `K` mean
    /// different things per case.
    pub fn parse(line: &str) -> Self {
        let Some(ch) = line.trim_start().chars().next() else {
            return Input::Blank;
        };

        let command = match ch {
            'y' | 'Y' => Command::Use,
            'n' | 'N' => Command::Skip,
            'a' | 'A' => Command::UseRest,
            'd' | 'D' => Command::SkipRest,
            'K' => Command::PreviousHunk,
            'J' => Command::NextHunk,
            'k' => Command::PreviousUndecided,
            'j' => Command::NextUndecided,
            _ => return Input::Unknown,
        };

        Input::Command(command)
    }
}

/// Nearest undecided hunks on either side of the cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub undecided_previous: Option<usize>,
    pub undecided_next: Option<usize>,
}

pub fn neighbors(hunks: &[Hunk], cursor: usize) -> Neighbors {
    Neighbors {
        undecided_previous: (0..cursor.min(hunks.len()))
            .rev()
            .find(|&i| hunks[i].is_undecided()),
        undecided_next: (cursor + 1..hunks.len()).find(|&i| hunks[i].is_undecided()),
    }
}

/// The file is done once the current hunk is decided and nothing around it
/// is still undecided
pub fn is_finished(hunks: &[Hunk], cursor: usize) -> bool {
    let Some(current) = hunks.get(cursor) else {
        return true;
    };
    let around = neighbors(hunks, cursor);
    !current.is_undecided() && around.undecided_previous.is_none() && around.undecided_next.is_none()
}

/// Cursor after a decision: the next undecided hunk after `cursor`, wrapping
/// around to the first undecided one, or `cursor` itself if none is left
fn advance(hunks: &[Hunk], cursor: usize) -> usize {
    (cursor + 1..hunks.len())
        .chain(0..cursor.min(hunks.len()))
        .find(|&i| hunks[i].is_undecided())
        .unwrap_or(cursor)
}

/// Apply `command` at `cursor`, returning the new cursor.
///
/// Decisions are overwritten in place. `a`/`d` only touch hunks from the
/// cursor on that are still undecided, so a revisited hunk keeps its earlier
/// decision.
///
/// # Errors
///
/// Navigation to a hunk that does not exist fails without changing anything.
pub fn step(hunks: &mut [Hunk], cursor: usize, command: Command) -> Result<usize, NavigationError> {
    let around = neighbors(hunks, cursor);

    let mark_rest = |hunks: &mut [Hunk], decision: Decision| {
        for hunk in hunks.iter_mut().skip(cursor) {
            if hunk.is_undecided() {
                hunk.decision = decision;
            }
        }
    };

    match command {
        Command::Use | Command::Skip => {
            if let Some(current) = hunks.get_mut(cursor) {
                current.decision = if command == Command::Use {
                    Decision::Use
                } else {
                    Decision::Skip
                };
            }
            Ok(advance(hunks, cursor))
        }
        Command::UseRest => {
            mark_rest(hunks, Decision::Use);
            Ok(advance(hunks, cursor))
        }
        Command::SkipRest => {
            mark_rest(hunks, Decision::Skip);
            Ok(advance(hunks, cursor))
        }
        Command::PreviousHunk if cursor > 0 => Ok(cursor - 1),
        Command::NextHunk if cursor + 1 < hunks.len() => Ok(cursor + 1),
        Command::PreviousUndecided => around
            .undecided_previous
            .ok_or(NavigationError::NoPreviousHunk),
        Command::NextUndecided => around.undecided_next.ok_or(NavigationError::NoNextHunk),
        Command::PreviousHunk => Err(NavigationError::NoPreviousHunk),
        Command::NextHunk => Err(NavigationError::NoNextHunk),
    }
}

/// The question asked for the hunk at `cursor`, offering only the
/// navigation letters that currently lead somewhere
pub fn prompt(hunks: &[Hunk], cursor: usize) -> String {
    let around = neighbors(hunks, cursor);
    let mut letters = String::new();

    if around.undecided_previous.is_some() {
        letters.push_str(",k");
    }
    if cursor > 0 {
        letters.push_str(",K");
    }
    if around.undecided_next.is_some() {
        letters.push_str(",j");
    }
    if cursor + 1 < hunks.len() {
        letters.push_str(",J");
    }

    format!("Stage this hunk [y,n,a,d{letters},?]? ")
}

/// How a file's decision loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every hunk has a decision
    Finished,
    /// Input ran out first; decisions made so far are kept
    Aborted,
}

/// Runs the decision loop against an operator's input and output
pub struct Selector<'c, R, W> {
    config: &'c Config,
    input: R,
    output: W,
}

impl<'c, R: BufRead, W: Write> Selector<'c, R, W> {
    pub fn new(config: &'c Config, input: R, output: W) -> Self {
        Self {
            config,
            input,
            output,
        }
    }

    /// Hand back the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    /// Write a line to the operator, painted with `color` when coloring
    pub fn say(&mut self, color: impl Fn(&Palette) -> &str, text: &str) -> io::Result<()> {
        match self.config.palette() {
            Some(palette) => writeln!(self.output, "{}", Palette::paint(color(palette), text)),
            None => writeln!(self.output, "{text}"),
        }
    }

    /// Walk the hunks of `file` until all are decided or input runs out.
    ///
    /// # Errors
    ///
    /// Only I/O errors on the operator streams.
    pub fn select_file(&mut self, text: &DiffText, file: &mut FileDiff) -> io::Result<Outcome> {
        if file.hunks.is_empty() {
            return Ok(Outcome::Finished);
        }

        self.show_head(text, file)?;

        let mut cursor = 0;
        let mut answer = Vec::new();
        loop {
            if cursor >= file.hunks.len() {
                cursor = 0;
            }
            if is_finished(&file.hunks, cursor) {
                return Ok(Outcome::Finished);
            }

            let mut rendered = Vec::new();
            render_hunk(
                text,
                &file.hunks[cursor],
                0,
                self.config.palette(),
                &mut rendered,
            );
            self.output.write_all(&rendered)?;

            let question = prompt(&file.hunks, cursor);
            match self.config.palette() {
                Some(palette) => write!(self.output, "{}", Palette::paint(&palette.prompt, &question))?,
                None => write!(self.output, "{question}")?,
            }
            self.output.flush()?;

            answer.clear();
            if self.input.read_until(b'\n', &mut answer)? == 0 {
                debug!(path = %file.path, cursor, "input closed, leaving file");
                writeln!(self.output)?;
                return Ok(Outcome::Aborted);
            }

            match Input::parse(&String::from_utf8_lossy(&answer)) {
                Input::Blank => {}
                Input::Unknown => self.say(|p| p.help.as_str(), HELP_TEXT.trim_end())?,
                Input::Command(command) => match step(&mut file.hunks, cursor, command) {
                    Ok(next) => {
                        debug!(path = %file.path, ?command, from = cursor, to = next, "hunk step");
                        cursor = next;
                    }
                    Err(err) => self.say(|p| p.error.as_str(), &err.to_string())?,
                },
            }
        }
    }

    fn show_head(&mut self, text: &DiffText, file: &FileDiff) -> io::Result<()> {
        let colored_head = self
            .config
            .palette()
            .and(file.colored_head.as_ref())
            .and_then(|range| text.colored_slice(range));

        match colored_head {
            Some(head) => self.output.write_all(head),
            None => self.output.write_all(text.slice(&file.head)),
        }
    }
}

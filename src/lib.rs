use error_set::error_set;
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

pub mod config;
pub mod diff;
pub mod git;
pub mod patch;
pub mod select;

pub use config::{ColorChoice, Config, ConfigSource, Palette};
pub use diff::{Decision, Diff, DiffError, DiffText, FileDiff, HeaderParseError, Hunk};
pub use git::{DiffEngine, GitRepo, PatchApplier};
pub use patch::reassemble;
pub use select::{Command, NavigationError, Outcome, Selector};

error_set! {
    /// Top-level error for a staging run
    GitAddpError := {
        DiffError(DiffError),
        /// Reading commands or writing hunks to the operator failed
        Io(std::io::Error),
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := DiffEngineError || ColorDiffEngineError || PatchApplyError || RefreshIndexError

    /// The plain diff could not be produced
    DiffEngineError := {
        #[display("Failed to run git diff-files: {message}")]
        DiffFailed { message: String },
        #[display("git diff-files failed: {stderr}")]
        DiffExitError { stderr: String },
    }

    /// The colored diff could not be produced or does not match the plain one
    ColorDiffEngineError := {
        #[display("Failed to run git diff-files --color: {message}")]
        ColorDiffFailed { message: String },
        #[display("git diff-files --color failed: {stderr}")]
        ColorDiffExitError { stderr: String },
        #[display("colored diff has {colored} lines, plain diff has {plain}")]
        ColorLineMismatch { plain: usize, colored: usize },
    }

    /// A reassembled patch was not applied
    PatchApplyError := {
        #[display("Failed to spawn git apply: {message}")]
        ApplySpawnFailed { message: String },
        #[display("Failed to get stdin handle for git apply")]
        ApplyStdinFailed,
        #[display("Failed to write patch to git apply: {message}")]
        ApplyWriteFailed { message: String },
        #[display("Failed to wait for git apply: {message}")]
        ApplyWaitFailed { message: String },
        #[display("git apply failed: {stderr}")]
        ApplyExitError { stderr: String },
    }

    /// Cached stat information in the index could not be refreshed
    RefreshIndexError := {
        #[display("Failed to run git update-index: {message}")]
        RefreshFailed { message: String },
        #[display("git update-index --refresh failed: {stderr}")]
        RefreshExitError { stderr: String },
    }
}

/// What happened to one file's changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A patch with this many hunks was applied to the index
    Staged { hunks: usize },
    /// No hunk was selected, so nothing was applied
    NothingSelected,
    /// The patch applier rejected the patch
    ApplyFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub outcome: FileOutcome,
    /// Input ended before every hunk had a decision
    pub aborted: bool,
}

/// Main interface for interactive staging
pub struct Stager<'c, G> {
    git: G,
    config: &'c Config,
}

impl<'c, G: DiffEngine + PatchApplier> Stager<'c, G> {
    pub fn new(git: G, config: &'c Config) -> Self {
        Self { git, config }
    }

    /// Walk every changed file matching `pathspec`, asking the operator
    /// about each hunk and staging the ones selected.
    ///
    /// Input running out ends the current file early; hunks already
    /// selected in it are still staged. Each later file starts over with a
    /// fresh read, so input that resumes keeps the run going.
    ///
    /// # Examples
    /// ```no_run
    /// # use git_addp::{Config, GitRepo, Stager};
    /// let config = Config::plain();
    /// let stager = Stager::new(GitRepo::new("."), &config);
    /// let reports = stager
    ///     .run(&[], std::io::stdin().lock(), std::io::stdout().lock())
    ///     .unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// A failed initial index refresh, diff engine failures and parse
    /// failures abort the run before anything is staged. A rejected patch is
    /// only reported for its file.
    pub fn run<R: BufRead, W: Write>(
        &self,
        pathspec: &[String],
        input: R,
        mut output: W,
    ) -> Result<Vec<FileReport>, GitAddpError> {
        self.git.refresh_index()?;

        let text = self.load(pathspec)?;
        let diff = Diff::parse(&text)?;

        if diff.is_empty() {
            writeln!(output, "No changes.")?;
            return Ok(Vec::new());
        }

        let mut selector = Selector::new(self.config, input, output);
        let mut reports = Vec::new();

        for mut file in diff.files {
            if file.hunks.is_empty() {
                debug!(path = %file.path, "no hunks, skipping");
                continue;
            }

            let aborted = selector.select_file(&text, &mut file)? == Outcome::Aborted;
            let outcome = self.stage(&text, &file);

            if let FileOutcome::ApplyFailed { message } = &outcome {
                selector.say(|p| p.error.as_str(), message.trim_end())?;
            }

            reports.push(FileReport {
                path: file.path,
                outcome,
                aborted,
            });
        }

        Ok(reports)
    }

    /// Fetch the diff, with its colored twin when output is colored
    fn load(&self, pathspec: &[String]) -> Result<DiffText, GitAddpError> {
        let plain = self.git.plain_diff(pathspec)?;
        if !self.config.use_color {
            return Ok(DiffText::new(plain));
        }

        let colored = self.git.colored_diff(pathspec)?;
        Ok(DiffText::with_colored(plain, colored)?)
    }

    fn stage(&self, text: &DiffText, file: &FileDiff) -> FileOutcome {
        let Some(patch) = reassemble(text, file) else {
            debug!(path = %file.path, "nothing selected");
            return FileOutcome::NothingSelected;
        };

        let hunks = file
            .hunks
            .iter()
            .filter(|hunk| hunk.decision == Decision::Use)
            .count();

        match self.git.apply_cached(&patch) {
            Ok(()) => {
                info!(path = %file.path, hunks, "staged");
                if let Err(err) = self.git.refresh_index() {
                    warn!(%err, "index refresh failed");
                }
                FileOutcome::Staged { hunks }
            }
            Err(err) => {
                warn!(path = %file.path, %err, "patch did not apply");
                FileOutcome::ApplyFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}

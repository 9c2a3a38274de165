//! The `git` subprocesses the stager talks to.

use crate::config::ConfigSource;
use crate::{ColorDiffEngineError, DiffEngineError, PatchApplyError, RefreshIndexError};
use std::io::Write;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Produces unified diffs of the working tree against the index.
///
/// Output is raw bytes; file contents need not be UTF-8.
pub trait DiffEngine {
    /// `diff-files -p` output without color
    fn plain_diff(&self, pathspec: &[String]) -> Result<Vec<u8>, DiffEngineError>;

    /// The same diff with color escapes, line for line
    fn colored_diff(&self, pathspec: &[String]) -> Result<Vec<u8>, ColorDiffEngineError>;
}

/// Applies patches to the index
pub trait PatchApplier {
    fn apply_cached(&self, patch: &[u8]) -> Result<(), PatchApplyError>;

    /// Bring cached stat information up to date
    fn refresh_index(&self) -> Result<(), RefreshIndexError>;
}

/// A repository driven through the `git` binary
#[derive(Debug, Clone, Copy)]
pub struct GitRepo<'a> {
    repo_path: &'a str,
}

impl<'a> GitRepo<'a> {
    pub fn new(repo_path: &'a str) -> Self {
        Self { repo_path }
    }

    fn git(&self) -> Command {
        let mut command = Command::new("git");
        command.args(["-C", self.repo_path]);
        command
    }

    fn diff_files(&self, color: &str, pathspec: &[String]) -> std::io::Result<Output> {
        debug!(repo = self.repo_path, color, ?pathspec, "git diff-files");
        self.git()
            .args(["diff-files", "-p", color, "--"])
            .args(pathspec)
            .output()
    }

    /// Run `git config` with `args` and return its trimmed stdout on success
    fn config_value(&self, args: &[&str]) -> Option<String> {
        let output = self.git().arg("config").args(args).output().ok()?;
        if !output.status.success() {
            debug!(?args, status = ?output.status, "git config lookup failed");
            return None;
        }
        String::from_utf8(output.stdout).ok()
    }
}

impl DiffEngine for GitRepo<'_> {
    fn plain_diff(&self, pathspec: &[String]) -> Result<Vec<u8>, DiffEngineError> {
        let output = self
            .diff_files("--no-color", pathspec)
            .map_err(|e| DiffEngineError::DiffFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiffEngineError::DiffExitError {
                stderr: stderr.into_owned(),
            });
        }

        Ok(output.stdout)
    }

    fn colored_diff(&self, pathspec: &[String]) -> Result<Vec<u8>, ColorDiffEngineError> {
        let output = self
            .diff_files("--color", pathspec)
            .map_err(|e| ColorDiffEngineError::ColorDiffFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ColorDiffEngineError::ColorDiffExitError {
                stderr: stderr.into_owned(),
            });
        }

        Ok(output.stdout)
    }
}

impl PatchApplier for GitRepo<'_> {
    fn apply_cached(&self, patch: &[u8]) -> Result<(), PatchApplyError> {
        debug!(repo = self.repo_path, bytes = patch.len(), "git apply --cached");

        let mut child = self
            .git()
            .args(["apply", "--cached", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PatchApplyError::ApplySpawnFailed {
                message: e.to_string(),
            })?;

        child
            .stdin
            .take()
            .ok_or(PatchApplyError::ApplyStdinFailed)?
            .write_all(patch)
            .map_err(|e| PatchApplyError::ApplyWriteFailed {
                message: e.to_string(),
            })?;

        let output = child
            .wait_with_output()
            .map_err(|e| PatchApplyError::ApplyWaitFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PatchApplyError::ApplyExitError {
                stderr: stderr.into_owned(),
            });
        }

        Ok(())
    }

    fn refresh_index(&self) -> Result<(), RefreshIndexError> {
        debug!(repo = self.repo_path, "git update-index --refresh");
        let output = self
            .git()
            .args(["update-index", "-q", "--refresh"])
            .output()
            .map_err(|e| RefreshIndexError::RefreshFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RefreshIndexError::RefreshExitError {
                stderr: stderr.into_owned(),
            });
        }

        Ok(())
    }
}

impl ConfigSource for GitRepo<'_> {
    fn colorbool(&self, key: &str, stdout_is_tty: bool) -> Option<bool> {
        let tty = if stdout_is_tty { "true" } else { "false" };
        match self.config_value(&["--get-colorbool", key, tty])?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn color(&self, key: &str, default: &str) -> Option<String> {
        self.config_value(&["--get-color", key, default])
    }
}

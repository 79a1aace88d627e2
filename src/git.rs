//! Git boundary: the command runner seam, the per-folder status probe, and
//! the fatal error taxonomy.

use std::path::Path;
use std::time::Duration;

use crate::shell_exec::Cmd;

mod error;
mod probe;

pub use error::{ScanError, exit_code};
pub use probe::{ProbeOptions, Prober, parse_left_right_counts, upstream_remote_name};

/// Captured result of one git invocation.
///
/// `stdout` and `stderr` are trimmed, matching how every probe step consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Trimmed stderr, or `None` when git printed nothing.
    pub fn stderr_message(&self) -> Option<String> {
        (!self.stderr.is_empty()).then(|| self.stderr.clone())
    }
}

/// Runs `git` against a folder.
///
/// An `Err` means git could not be spawned or waited on at all; a non-zero
/// exit is reported through `GitOutput::code`.
pub trait GitRunner: Send + Sync {
    fn run(
        &self,
        path: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> std::io::Result<GitOutput>;
}

/// Runs the real `git` executable found on PATH.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(
        &self,
        path: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> std::io::Result<GitOutput> {
        let context = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut cmd = Cmd::new("git")
            .arg("-C")
            .arg(path.to_string_lossy())
            .args(args.iter().copied())
            .context(context)
            // Never block a worker on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            // Keep `git status` from rewriting the index
            .env("GIT_OPTIONAL_LOCKS", "0");
        if let Some(timeout) = timeout {
            cmd = cmd.timeout(timeout);
        }

        let output = cmd.run()?;
        Ok(GitOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Check once, before any folder is enumerated, that `git` can be invoked.
pub fn ensure_git_available() -> Result<String, ScanError> {
    let unavailable = || ScanError::ToolUnavailable {
        message: "git is not available on PATH. Please install Git and try again.".to_string(),
    };

    match Cmd::new("git").arg("--version").run() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            log::debug!("Using {version}");
            Ok(version)
        }
        Ok(output) => {
            log::debug!(
                "git --version exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Err(unavailable())
        }
        Err(e) => {
            log::debug!("Failed to spawn git: {e}");
            Err(unavailable())
        }
    }
}

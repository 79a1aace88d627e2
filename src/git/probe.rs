//! Per-folder status probe.
//!
//! A probe is a fixed sequence of git queries. Steps 1-3 (work tree, HEAD,
//! status) short-circuit with a reduced result when they fail; everything
//! after that is best-effort and only ever degrades one field.

use std::path::Path;
use std::time::Duration;

use super::{GitOutput, GitRunner, SystemGit};
use crate::scan::{RepoInfo, RepoStatus};

/// Environment variable overriding the fetch timeout, in whole seconds.
pub const FETCH_TIMEOUT_ENV: &str = "REPO_CHECK_FETCH_TIMEOUT_SECS";

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Refresh the upstream's remote before counting divergence.
    pub fetch: bool,
    pub fetch_timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            fetch: true,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ProbeOptions {
    /// Defaults with the fetch timeout taken from `REPO_CHECK_FETCH_TIMEOUT_SECS`
    /// when it holds a positive integer.
    pub fn from_env() -> Self {
        let fetch_timeout = match std::env::var(FETCH_TIMEOUT_ENV) {
            Ok(raw) => parse_timeout_secs(&raw).unwrap_or_else(|| {
                log::warn!("Ignoring {FETCH_TIMEOUT_ENV}={raw:?}: expected a positive integer");
                DEFAULT_FETCH_TIMEOUT
            }),
            Err(_) => DEFAULT_FETCH_TIMEOUT,
        };
        Self {
            fetch_timeout,
            ..Self::default()
        }
    }
}

fn parse_timeout_secs(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
    }
}

/// Runs the probe sequence through a `GitRunner`.
#[derive(Debug, Clone)]
pub struct Prober<R = SystemGit> {
    runner: R,
    options: ProbeOptions,
}

impl<R: GitRunner> Prober<R> {
    pub fn new(runner: R, options: ProbeOptions) -> Self {
        Self { runner, options }
    }

    pub fn probe(&self, path: &Path) -> RepoStatus {
        // Steps 1-3 need git to actually run; a spawn failure there leaves
        // nothing to report.
        let inside = match self.git(path, &["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) => output,
            Err(e) => return probe_failed(e),
        };
        if !inside.success() || inside.stdout != "true" {
            return RepoStatus::NotRepository;
        }

        let head = match self.git(path, &["rev-parse", "--abbrev-ref", "HEAD"]) {
            Ok(output) => output,
            Err(e) => return probe_failed(e),
        };
        if !head.success() {
            return RepoStatus::Repo(RepoInfo {
                error: head.stderr_message(),
                ..RepoInfo::default()
            });
        }
        let branch = Some(head.stdout);

        let status = match self.git(path, &["status", "--porcelain"]) {
            Ok(output) => output,
            Err(e) => return probe_failed(e),
        };
        if !status.success() {
            return RepoStatus::Repo(RepoInfo {
                branch,
                error: status.stderr_message(),
                ..RepoInfo::default()
            });
        }
        let is_clean = Some(status.stdout.is_empty());

        let origin_url = self
            .git(path, &["remote", "get-url", "origin"])
            .ok()
            .filter(|output| output.success() && !output.stdout.is_empty())
            .map(|output| output.stdout);

        let upstream_ref = self
            .git(
                path,
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
            )
            .ok()
            .filter(|output| output.success() && !output.stdout.is_empty())
            .map(|output| output.stdout);

        let (ahead_count, behind_count) = match &upstream_ref {
            Some(upstream) => {
                if self.options.fetch {
                    self.refresh_remote(path, upstream);
                }
                self.git(path, &["rev-list", "--left-right", "--count", "HEAD...@{u}"])
                    .ok()
                    .filter(GitOutput::success)
                    .and_then(|output| parse_left_right_counts(&output.stdout))
                    .unzip()
            }
            None => (None, None),
        };

        RepoStatus::Repo(RepoInfo {
            branch,
            is_clean,
            origin_url,
            upstream_ref,
            ahead_count,
            behind_count,
            error: None,
        })
    }

    /// Fetch the remote named by the upstream ref. Failures (offline,
    /// timeout, auth) are logged and otherwise ignored; divergence is then
    /// computed from the last-known remote-tracking ref.
    fn refresh_remote(&self, path: &Path, upstream: &str) {
        let Some(remote) = upstream_remote_name(upstream) else {
            return;
        };
        let result = self.runner.run(
            path,
            &["fetch", "--quiet", "--prune", "--no-tags", remote],
            Some(self.options.fetch_timeout),
        );
        match result {
            Ok(output) if output.success() => {}
            Ok(output) => log::debug!(
                "fetch {remote} failed in {}: {}",
                path.display(),
                output.stderr
            ),
            Err(e) => log::debug!("fetch {remote} failed in {}: {e}", path.display()),
        }
    }

    fn git(&self, path: &Path, args: &[&str]) -> std::io::Result<GitOutput> {
        self.runner.run(path, args, None)
    }
}

fn probe_failed(e: std::io::Error) -> RepoStatus {
    RepoStatus::ProbeFailed {
        message: format!("failed to run git: {e}"),
    }
}

/// Remote name of an upstream ref such as `origin/main` or
/// `upstream/feature/foo`. A ref without a `/` has no remote.
pub fn upstream_remote_name(upstream: &str) -> Option<&str> {
    upstream
        .split_once('/')
        .map(|(remote, _)| remote)
        .filter(|remote| !remote.is_empty())
}

/// Parse `git rev-list --left-right --count HEAD...@{u}` output into
/// `(ahead, behind)`.
///
/// The left column counts commits reachable only from HEAD (ahead), the right
/// column commits reachable only from the upstream (behind).
pub fn parse_left_right_counts(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let left = parts.next()?;
    let right = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let parse = |part: &str| -> Option<u32> {
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    Some((parse(left)?, parse(right)?))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use rstest::rstest;

    use super::*;

    type Reply = io::Result<GitOutput>;

    /// Fake runner that answers a fixed script of git calls in order and
    /// records what was asked.
    struct ScriptedGit {
        script: Mutex<VecDeque<(Vec<&'static str>, Reply)>>,
        calls: Mutex<Vec<(Vec<String>, Option<Duration>)>>,
    }

    impl ScriptedGit {
        fn new(script: Vec<(Vec<&'static str>, Reply)>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Vec<String>, Option<Duration>)> {
            self.calls.lock().unwrap().clone()
        }

        fn assert_exhausted(&self) {
            let remaining = self.script.lock().unwrap().len();
            assert_eq!(remaining, 0, "{remaining} scripted git calls never happened");
        }
    }

    impl GitRunner for &ScriptedGit {
        fn run(&self, _path: &Path, args: &[&str], timeout: Option<Duration>) -> Reply {
            self.calls.lock().unwrap().push((
                args.iter().map(|s| s.to_string()).collect(),
                timeout,
            ));
            let (expected, reply) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected git call: {args:?}"));
            assert_eq!(args, expected.as_slice());
            reply
        }
    }

    fn ok(stdout: &str) -> Reply {
        Ok(GitOutput {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    fn fail(code: i32, stderr: &str) -> Reply {
        Ok(GitOutput {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    const INSIDE: [&str; 2] = ["rev-parse", "--is-inside-work-tree"];
    const HEAD: [&str; 3] = ["rev-parse", "--abbrev-ref", "HEAD"];
    const STATUS: [&str; 2] = ["status", "--porcelain"];
    const ORIGIN: [&str; 3] = ["remote", "get-url", "origin"];
    const UPSTREAM: [&str; 4] = ["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"];
    const COUNTS: [&str; 4] = ["rev-list", "--left-right", "--count", "HEAD...@{u}"];
    const FETCH_ORIGIN: [&str; 5] = ["fetch", "--quiet", "--prune", "--no-tags", "origin"];

    fn probe_with(git: &ScriptedGit, options: ProbeOptions) -> RepoStatus {
        Prober::new(git, options).probe(&PathBuf::from("/src/api"))
    }

    /// Script for a clean repo on `main` tracking `origin/main`, up to the fetch.
    fn tracked_repo_prefix() -> Vec<(Vec<&'static str>, Reply)> {
        vec![
            (INSIDE.to_vec(), ok("true")),
            (HEAD.to_vec(), ok("main")),
            (STATUS.to_vec(), ok("")),
            (ORIGIN.to_vec(), ok("git@example.com:org/api.git")),
            (UPSTREAM.to_vec(), ok("origin/main")),
        ]
    }

    #[test]
    fn test_plain_folder_is_not_repository() {
        let git = ScriptedGit::new(vec![(
            INSIDE.to_vec(),
            fail(128, "fatal: not a git repository"),
        )]);
        assert_eq!(
            probe_with(&git, ProbeOptions::default()),
            RepoStatus::NotRepository
        );
        assert_eq!(git.calls().len(), 1);
    }

    #[test]
    fn test_inside_git_dir_is_not_repository() {
        let git = ScriptedGit::new(vec![(INSIDE.to_vec(), ok("false"))]);
        assert_eq!(
            probe_with(&git, ProbeOptions::default()),
            RepoStatus::NotRepository
        );
    }

    #[test]
    fn test_spawn_failure_is_probe_failed() {
        let git = ScriptedGit::new(vec![(
            INSIDE.to_vec(),
            Err(io::Error::new(io::ErrorKind::NotFound, "git vanished")),
        )]);
        let RepoStatus::ProbeFailed { message } = probe_with(&git, ProbeOptions::default())
        else {
            panic!("expected ProbeFailed");
        };
        assert!(message.contains("git vanished"));
    }

    #[test]
    fn test_unreadable_head_keeps_error() {
        let git = ScriptedGit::new(vec![
            (INSIDE.to_vec(), ok("true")),
            (HEAD.to_vec(), fail(128, "fatal: ambiguous argument 'HEAD'")),
        ]);
        let status = probe_with(&git, ProbeOptions::default());
        assert_eq!(
            status,
            RepoStatus::Repo(RepoInfo {
                error: Some("fatal: ambiguous argument 'HEAD'".into()),
                ..RepoInfo::default()
            })
        );
        git.assert_exhausted();
    }

    #[test]
    fn test_unreadable_head_without_stderr_has_no_error() {
        let git = ScriptedGit::new(vec![
            (INSIDE.to_vec(), ok("true")),
            (HEAD.to_vec(), fail(1, "")),
        ]);
        let status = probe_with(&git, ProbeOptions::default());
        assert_eq!(status, RepoStatus::Repo(RepoInfo::default()));
    }

    #[test]
    fn test_status_failure_keeps_branch() {
        let git = ScriptedGit::new(vec![
            (INSIDE.to_vec(), ok("true")),
            (HEAD.to_vec(), ok("main")),
            (STATUS.to_vec(), fail(128, "fatal: index file corrupt")),
        ]);
        let status = probe_with(&git, ProbeOptions::default());
        assert_eq!(
            status,
            RepoStatus::Repo(RepoInfo {
                branch: Some("main".into()),
                is_clean: None,
                error: Some("fatal: index file corrupt".into()),
                ..RepoInfo::default()
            })
        );
    }

    #[test]
    fn test_no_remote_no_upstream_skips_fetch_and_counts() {
        let git = ScriptedGit::new(vec![
            (INSIDE.to_vec(), ok("true")),
            (HEAD.to_vec(), ok("HEAD")),
            (STATUS.to_vec(), ok(" M src/lib.rs")),
            (ORIGIN.to_vec(), fail(2, "error: No such remote 'origin'")),
            (UPSTREAM.to_vec(), fail(128, "fatal: no upstream configured")),
        ]);
        let status = probe_with(&git, ProbeOptions::default());
        assert_eq!(
            status,
            RepoStatus::Repo(RepoInfo {
                branch: Some("HEAD".into()),
                is_clean: Some(false),
                ..RepoInfo::default()
            })
        );
        git.assert_exhausted();
    }

    #[test]
    fn test_fetch_ok_then_counts() {
        let mut script = tracked_repo_prefix();
        script.push((FETCH_ORIGIN.to_vec(), ok("")));
        script.push((COUNTS.to_vec(), ok("3\t1")));
        let git = ScriptedGit::new(script);

        let status = probe_with(&git, ProbeOptions::default());
        let info = status.repo().unwrap();
        assert_eq!(info.ahead_count, Some(3));
        assert_eq!(info.behind_count, Some(1));
        assert_eq!(info.error, None);
        assert_eq!(info.upstream_ref.as_deref(), Some("origin/main"));
        assert_eq!(
            info.origin_url.as_deref(),
            Some("git@example.com:org/api.git")
        );
        git.assert_exhausted();
    }

    #[test]
    fn test_fetch_failure_is_swallowed() {
        let mut script = tracked_repo_prefix();
        script.push((FETCH_ORIGIN.to_vec(), fail(128, "offline")));
        script.push((COUNTS.to_vec(), ok("0\t2")));
        let git = ScriptedGit::new(script);

        let status = probe_with(&git, ProbeOptions::default());
        let info = status.repo().unwrap();
        assert_eq!(info.ahead_count, Some(0));
        assert_eq!(info.behind_count, Some(2));
        assert_eq!(info.error, None);
    }

    #[test]
    fn test_fetch_timeout_is_swallowed_and_bounded() {
        let mut script = tracked_repo_prefix();
        script.push((
            FETCH_ORIGIN.to_vec(),
            Err(io::Error::new(io::ErrorKind::TimedOut, "command timed out")),
        ));
        script.push((COUNTS.to_vec(), ok("0\t0")));
        let git = ScriptedGit::new(script);

        let options = ProbeOptions {
            fetch: true,
            fetch_timeout: Duration::from_secs(7),
        };
        let status = probe_with(&git, options);
        assert_eq!(status.repo().unwrap().divergence(), Some((0, 0)));

        let calls = git.calls();
        let fetch = calls.iter().find(|(args, _)| args[0] == "fetch").unwrap();
        assert_eq!(fetch.1, Some(Duration::from_secs(7)));
        // Only the fetch carries a timeout
        assert_eq!(calls.iter().filter(|(_, t)| t.is_some()).count(), 1);
    }

    #[test]
    fn test_fetch_disabled() {
        let mut script = tracked_repo_prefix();
        script.push((COUNTS.to_vec(), ok("1\t0")));
        let git = ScriptedGit::new(script);

        let options = ProbeOptions {
            fetch: false,
            ..ProbeOptions::default()
        };
        let status = probe_with(&git, options);
        assert_eq!(status.repo().unwrap().divergence(), Some((1, 0)));
        assert!(git.calls().iter().all(|(args, _)| args[0] != "fetch"));
    }

    #[test]
    fn test_fetch_uses_upstream_remote() {
        let git = ScriptedGit::new(vec![
            (INSIDE.to_vec(), ok("true")),
            (HEAD.to_vec(), ok("feature/foo")),
            (STATUS.to_vec(), ok("")),
            (ORIGIN.to_vec(), ok("https://example.com/fork.git")),
            (UPSTREAM.to_vec(), ok("upstream/feature/foo")),
            (
                vec!["fetch", "--quiet", "--prune", "--no-tags", "upstream"],
                ok(""),
            ),
            (COUNTS.to_vec(), ok("0\t0")),
        ]);
        probe_with(&git, ProbeOptions::default());
        git.assert_exhausted();
    }

    #[test]
    fn test_malformed_counts_leave_divergence_unknown() {
        let mut script = tracked_repo_prefix();
        script.push((FETCH_ORIGIN.to_vec(), ok("")));
        script.push((COUNTS.to_vec(), ok("garbage")));
        let git = ScriptedGit::new(script);

        let status = probe_with(&git, ProbeOptions::default());
        let info = status.repo().unwrap();
        assert_eq!(info.upstream_ref.as_deref(), Some("origin/main"));
        assert_eq!(info.divergence(), None);
        assert_eq!(info.error, None);
    }

    #[rstest]
    #[case("origin/main", Some("origin"))]
    #[case("upstream/feature/foo", Some("upstream"))]
    #[case("main", None)]
    #[case("/main", None)]
    fn test_upstream_remote_name(#[case] upstream: &str, #[case] expected: Option<&str>) {
        assert_eq!(upstream_remote_name(upstream), expected);
    }

    #[rstest]
    #[case("3\t1", Some((3, 1)))]
    #[case("0 0", Some((0, 0)))]
    #[case("12\t0\n", Some((12, 0)))]
    #[case("3", None)]
    #[case("3 1 4", None)]
    #[case("-1 2", None)]
    #[case("+1 2", None)]
    #[case("", None)]
    fn test_parse_left_right_counts(#[case] output: &str, #[case] expected: Option<(u32, u32)>) {
        assert_eq!(parse_left_right_counts(output), expected);
    }

    #[test]
    fn test_left_column_is_ahead() {
        // HEAD...@{u}: left side is commits only on HEAD
        let (ahead, behind) = parse_left_right_counts("5\t0").unwrap();
        assert_eq!((ahead, behind), (5, 0));
    }

    #[rstest]
    #[case("30", Some(Duration::from_secs(30)))]
    #[case(" 5 ", Some(Duration::from_secs(5)))]
    #[case("0", None)]
    #[case("soon", None)]
    fn test_parse_timeout_secs(#[case] raw: &str, #[case] expected: Option<Duration>) {
        assert_eq!(parse_timeout_secs(raw), expected);
    }
}

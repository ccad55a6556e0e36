use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::env_filter;
use crate::error::{RewritePass, TransferError};
use crate::message;
use crate::request::{Identity, Replacement};

/// Remote name the destination is registered under in the bare clone.
pub const DESTINATION_REMOTE: &str = "new-origin";

/// The version-control operations a transfer needs.
///
/// [`CommandBackend`] shells out to `git` and `git filter-repo`; tests use
/// an in-memory fake so the orchestration in [`crate::transfer`] can run
/// without a network or a real repository.
pub trait GitBackend {
    /// Bare-clones `url` into `dest`, which must not exist yet.
    fn clone_bare(&mut self, url: &str, dest: &Path) -> Result<(), TransferError>;

    /// Overrides author/committer identity on every commit and applies the
    /// message replacements in order.
    fn rewrite_author_and_messages(
        &mut self,
        repo: &Path,
        author: &Identity,
        replacements: &[Replacement],
    ) -> Result<(), TransferError>;

    /// All commits reachable from any ref, parents before children.
    fn list_commits(&mut self, repo: &Path) -> Result<Vec<String>, TransferError>;

    /// Rewrites author and committer dates to the assigned unix timestamps.
    ///
    /// `map_path` is a scratch file the backend may use to hand the
    /// assignment to the rewrite tool.
    fn rewrite_timestamps(
        &mut self,
        repo: &Path,
        assignments: &[(String, i64)],
        map_path: &Path,
    ) -> Result<(), TransferError>;

    /// Registers `url` as remote `name`, replacing a stale one.
    fn add_remote(&mut self, repo: &Path, name: &str, url: &str) -> Result<(), TransferError>;

    /// Pushes every ref to remote `name` so its ref set mirrors the clone.
    fn mirror_push(&mut self, repo: &Path, name: &str) -> Result<(), TransferError>;
}

/// Runs a Git (or other) command and reports whether it succeeded.
///
/// Output is captured so failures can carry git's diagnostics.
///
/// # Parameters
///
/// * `cmd` — A fully configured [`std::process::Command`] to run.
///
/// # Returns
///
/// * `Ok(())` if the command exits with status `0`.
/// * `Err(String)` with the trimmed stderr, or `"non-zero exit"` if stderr
///   was empty.
/// * `Err(String)` with the I/O error message if the process fails to start.
///
/// # Examples
///
/// ```ignore
/// // Crate-private; shown for illustration.
/// let mut cmd = Command::new("git");
/// cmd.args(["remote", "add", "new-origin", "https://example.com/a.git"]);
/// run_status(cmd)?;
/// ```
fn run_status(mut cmd: Command) -> Result<(), String> {
    debug!(command = ?cmd, "running");
    match cmd.output() {
        Ok(out) => {
            if out.status.success() {
                Ok(())
            } else {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                if stderr.is_empty() {
                    Err(String::from("non-zero exit"))
                } else {
                    Err(stderr)
                }
            }
        }
        Err(e) => Err(format!("{}", e)),
    }
}

/// Runs a command and returns its trimmed standard output on success,
/// or its standard error as an `Err` on failure.
///
/// # Parameters
///
/// * `cmd` — A fully configured [`std::process::Command`] ready to execute.
///
/// # Returns
///
/// * `Ok(String)` containing trimmed `stdout` if the command succeeded.
/// * `Err(String)` containing trimmed `stderr` or the I/O error message otherwise.
///
/// # Examples
///
/// ```ignore
/// // Crate-private; shown for illustration.
/// let mut cmd = Command::new("git");
/// cmd.args(["rev-list", "--all"]);
/// let ids = run_output(cmd)?;
/// ```
fn run_output(mut cmd: Command) -> Result<String, String> {
    debug!(command = ?cmd, "running");
    match cmd.output() {
        Ok(out) => {
            if out.status.success() {
                Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
            } else {
                Err(String::from_utf8_lossy(&out.stderr).trim().to_string())
            }
        }
        Err(e) => Err(format!("{}", e)),
    }
}

/// `git` with piped output, running inside `repo`.
fn git_in(repo: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(repo);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd
}

/// Runs `git config --get <key>` and returns the result as a trimmed string.
///
/// Used to prefill the author prompts. If the key does not exist or the
/// command fails, an empty string is returned instead of an error.
///
/// # Parameters
///
/// * `key` — The Git configuration key to query (e.g. `"user.name"`).
///
/// # Returns
///
/// * `Ok(String)` containing the trimmed value, or an empty string.
/// * `Err(String)` is never returned.
///
/// # Examples
///
/// ```ignore
/// // Ignored because it depends on the user's git configuration.
/// use git_history_transfer::git::config_get;
///
/// let name = config_get("user.name").unwrap_or_default();
/// ```
pub fn config_get(key: &str) -> Result<String, String> {
    let mut cmd = Command::new("git");
    cmd.arg("config").arg("--get").arg(key);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    match run_output(cmd) {
        Ok(s) => Ok(s),
        Err(_) => Ok(String::new()),
    }
}

/// Runs `git rev-list --count --all` inside `repo`.
///
/// # Parameters
///
/// * `repo` — Path to a (bare or non-bare) repository.
///
/// # Returns
///
/// * `Ok(usize)` with the number of commits reachable from any ref.
/// * `Err(String)` with git's stderr, or a message if the output is not a number.
///
/// # Examples
///
/// ```ignore
/// // Ignored because it requires a Git repository.
/// use std::path::Path;
/// use git_history_transfer::git::commit_count;
///
/// let n = commit_count(Path::new("/tmp/tool.git"))?;
/// println!("{n} commits");
/// ```
pub fn commit_count(repo: &Path) -> Result<usize, String> {
    let mut cmd = git_in(repo);
    cmd.args(["rev-list", "--count", "--all"]);
    let out = run_output(cmd)?;
    out.parse::<usize>()
        .map_err(|e| format!("unexpected rev-list output '{}': {}", out, e))
}

/// Whether a push failure means the destination refused our refs rather
/// than being unreachable or denying access.
pub(crate) fn is_ref_conflict(stderr: &str) -> bool {
    ["[rejected]", "[remote rejected]", "non-fast-forward", "fetch first"]
        .iter()
        .any(|marker| stderr.contains(marker))
}

/// Prepends `dir` to the current `PATH`.
pub(crate) fn path_with(dir: &Path) -> Option<OsString> {
    let mut dirs = vec![dir.to_path_buf()];
    if let Some(current) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&current));
    }
    std::env::join_paths(dirs).ok()
}

/// Production [`GitBackend`] that shells out to `git`.
#[derive(Debug, Default)]
pub struct CommandBackend {
    /// Directory holding `git-filter-repo` when it is not on `PATH`.
    filter_repo_dir: Option<PathBuf>,
}

impl CommandBackend {
    /// Creates a backend.
    ///
    /// # Parameters
    ///
    /// * `filter_repo_dir` – Directory to prepend to `PATH` when running
    ///   `git filter-repo`, as returned in
    ///   [`FilterRepoTool::extra_path`](crate::provision::FilterRepoTool).
    ///   `None` when the tool is already on `PATH`.
    pub fn new(filter_repo_dir: Option<PathBuf>) -> Self {
        CommandBackend { filter_repo_dir }
    }

    /// Deletes the `refs/original/*` backups left by `git filter-branch`.
    fn drop_backup_refs(&self, repo: &Path) -> Result<(), String> {
        let mut list = git_in(repo);
        list.args(["for-each-ref", "--format=%(refname)", "refs/original/"]);
        let refs = run_output(list)?;

        for name in refs.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut del = git_in(repo);
            del.args(["update-ref", "-d", name]);
            run_status(del)?;
        }
        Ok(())
    }

    /// Expires reflogs and prunes unreachable objects; failures only warn.
    fn housekeeping(&self, repo: &Path) {
        let mut expire = git_in(repo);
        expire.args(["reflog", "expire", "--expire=now", "--all"]);
        if let Err(e) = run_status(expire) {
            warn!(error = %e, "reflog expire failed");
        }

        let mut gc = git_in(repo);
        gc.args(["gc", "--prune=now", "--quiet"]);
        if let Err(e) = run_status(gc) {
            warn!(error = %e, "gc failed");
        }
    }
}

impl GitBackend for CommandBackend {
    fn clone_bare(&mut self, url: &str, dest: &Path) -> Result<(), TransferError> {
        info!(%url, "cloning bare repository");
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg("--bare").arg(url).arg(dest);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        run_status(cmd).map_err(|stderr| TransferError::Clone {
            url: url.to_string(),
            stderr,
        })?;

        match commit_count(dest) {
            Ok(n) => info!(commits = n, "clone complete"),
            Err(e) => warn!(error = %e, "could not count commits"),
        }
        Ok(())
    }

    fn rewrite_author_and_messages(
        &mut self,
        repo: &Path,
        author: &Identity,
        replacements: &[Replacement],
    ) -> Result<(), TransferError> {
        info!(%author, replacements = replacements.len(), "rewriting author and messages");
        let mut cmd = git_in(repo);
        cmd.args(["filter-repo", "--force", "--replace-refs", "delete-no-add"]);
        cmd.arg("--commit-callback")
            .arg(message::commit_callback(author, replacements));
        if let Some(path) = self.filter_repo_dir.as_deref().and_then(path_with) {
            cmd.env("PATH", path);
        }

        run_status(cmd).map_err(|stderr| TransferError::Rewrite {
            pass: RewritePass::Identity,
            stderr,
        })
    }

    fn list_commits(&mut self, repo: &Path) -> Result<Vec<String>, TransferError> {
        let mut cmd = git_in(repo);
        cmd.args(["rev-list", "--all", "--reverse", "--topo-order"]);
        let out = run_output(cmd).map_err(|stderr| TransferError::Rewrite {
            pass: RewritePass::Dates,
            stderr,
        })?;

        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn rewrite_timestamps(
        &mut self,
        repo: &Path,
        assignments: &[(String, i64)],
        map_path: &Path,
    ) -> Result<(), TransferError> {
        let rewrite_err = |stderr: String| TransferError::Rewrite {
            pass: RewritePass::Dates,
            stderr,
        };

        info!(commits = assignments.len(), "rewriting commit dates");
        env_filter::write_date_map(map_path, assignments).map_err(rewrite_err)?;

        let mut cmd = git_in(repo);
        cmd.env("FILTER_BRANCH_SQUELCH_WARNING", "1");
        cmd.args(["filter-branch", "-f", "--env-filter"]);
        cmd.arg(env_filter::env_filter_script(map_path));
        cmd.args(["--tag-name-filter", "cat", "--", "--all"]);
        run_status(cmd).map_err(rewrite_err)?;

        self.drop_backup_refs(repo).map_err(rewrite_err)?;
        self.housekeeping(repo);
        Ok(())
    }

    fn add_remote(&mut self, repo: &Path, name: &str, url: &str) -> Result<(), TransferError> {
        let mut stale = git_in(repo);
        stale.args(["remote", "remove", name]);
        if run_status(stale).is_ok() {
            debug!(remote = name, "removed stale remote");
        }

        info!(remote = name, %url, "adding destination remote");
        let mut cmd = git_in(repo);
        cmd.args(["remote", "add", name, url]);
        run_status(cmd).map_err(|stderr| TransferError::Push { stderr })
    }

    fn mirror_push(&mut self, repo: &Path, name: &str) -> Result<(), TransferError> {
        info!(remote = name, "pushing all refs (mirror)");
        let mut cmd = git_in(repo);
        cmd.args(["push", "--mirror", name]);
        run_status(cmd).map_err(|stderr| {
            if is_ref_conflict(&stderr) {
                TransferError::DestinationConflict { stderr }
            } else {
                TransferError::Push { stderr }
            }
        })
    }
}

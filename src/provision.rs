//! Makes sure the external tools a transfer shells out to are present.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::TransferError;

pub const FILTER_REPO: &str = "git-filter-repo";
const FILTER_REPO_PACKAGE: &str = "git-filter-repo";

/// Where `git-filter-repo` was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRepoTool {
    pub executable: PathBuf,
    /// Set when the tool lives outside `PATH` and must be added for child
    /// processes.
    pub extra_path: Option<PathBuf>,
}

/// Installs a package into a user-writable location.
pub trait PackageInstaller {
    /// Installs `package`, returning the directory its scripts land in.
    fn install(&mut self, package: &str) -> Result<PathBuf, String>;
}

/// Installs with `pip --user`, trying `pip3`, `pip` and `python3 -m pip`.
///
/// If none succeed, the same commands are retried with
/// `--break-system-packages` for externally-managed Python installs.
pub struct PipInstaller;

impl PipInstaller {
    fn candidates() -> Vec<Vec<&'static str>> {
        vec![vec!["pip3"], vec!["pip"], vec!["python3", "-m", "pip"]]
    }

    fn try_install(argv: &[&str], package: &str, break_system: bool) -> Result<(), String> {
        let (program, rest) = match argv.split_first() {
            Some(split) => split,
            None => return Err(String::from("empty installer command")),
        };
        let mut cmd = Command::new(program);
        cmd.args(rest).args(["install", "--user"]);
        if break_system {
            cmd.arg("--break-system-packages");
        }
        cmd.arg(package);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        debug!(command = ?cmd, "running");

        match cmd.output() {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(String::from_utf8_lossy(&out.stderr).trim().to_string()),
            Err(e) => Err(format!("{}", e)),
        }
    }

    /// `$(python3 -m site --user-base)/bin`, else `~/.local/bin`.
    fn user_script_dir() -> Result<PathBuf, String> {
        let mut cmd = Command::new("python3");
        cmd.args(["-m", "site", "--user-base"]);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        if let Ok(out) = cmd.output() {
            let base = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if out.status.success() && !base.is_empty() {
                return Ok(PathBuf::from(base).join("bin"));
            }
        }

        match dirs::home_dir() {
            Some(home) => Ok(home.join(".local").join("bin")),
            None => Err(String::from("cannot determine home directory")),
        }
    }
}

impl PackageInstaller for PipInstaller {
    fn install(&mut self, package: &str) -> Result<PathBuf, String> {
        let mut last_error = String::from("no pip found");
        for break_system in [false, true] {
            for argv in Self::candidates() {
                match Self::try_install(&argv, package, break_system) {
                    Ok(()) => {
                        info!(installer = %argv.join(" "), "installed {}", package);
                        return Self::user_script_dir();
                    }
                    Err(e) => {
                        debug!(installer = %argv.join(" "), error = %e, "install attempt failed");
                        last_error = e;
                    }
                }
            }
        }
        Err(last_error)
    }
}

/// Looks up an executable on `PATH`, optionally searching `extra` first.
///
/// # Parameters
///
/// * `name` – Executable name, e.g. `"git-filter-repo"`.
/// * `extra` – A directory searched before `PATH`, such as pip's user
///   script directory right after an install.
///
/// # Returns
///
/// * `Some(PathBuf)` with the resolved executable.
/// * `None` if it is not found (or the current directory is unreadable).
///
/// # Examples
///
/// ```ignore
/// // Ignored because the result depends on the host.
/// use std::path::Path;
/// use git_history_transfer::provision::locate;
///
/// let tool = locate("git-filter-repo", Some(Path::new("/home/me/.local/bin")));
/// ```
pub fn locate(name: &str, extra: Option<&Path>) -> Option<PathBuf> {
    match extra {
        Some(dir) => {
            let cwd = std::env::current_dir().ok()?;
            let search = crate::git::path_with(dir)?;
            which::which_in(name, Some(search), cwd).ok()
        }
        None => which::which(name).ok(),
    }
}

/// Verifies that `git` is on `PATH`.
///
/// # Returns
///
/// * `Ok(PathBuf)` with the resolved `git` executable.
/// * `Err(TransferError::ToolUnavailable)` if it cannot be found; nothing
///   else can run without it.
pub fn ensure_git() -> Result<PathBuf, TransferError> {
    which::which("git").map_err(|e| TransferError::ToolUnavailable {
        tool: String::from("git"),
        detail: e.to_string(),
    })
}

/// Finds `git-filter-repo`, installing it through `installer` if missing.
///
/// `lookup` resolves a tool name given an optional extra search directory;
/// production code passes [`locate`].
pub fn ensure_filter_repo<I, L>(installer: &mut I, lookup: L) -> Result<FilterRepoTool, TransferError>
where
    I: PackageInstaller,
    L: Fn(&str, Option<&Path>) -> Option<PathBuf>,
{
    info!("checking for {}", FILTER_REPO);
    if let Some(executable) = lookup(FILTER_REPO, None) {
        debug!(path = %executable.display(), "found {}", FILTER_REPO);
        return Ok(FilterRepoTool {
            executable,
            extra_path: None,
        });
    }

    info!("{} not found, installing", FILTER_REPO);
    let unavailable = |detail: String| TransferError::ToolUnavailable {
        tool: FILTER_REPO.to_string(),
        detail: format!(
            "{detail} (install manually with: pip install --user {FILTER_REPO_PACKAGE})"
        ),
    };

    let script_dir = installer.install(FILTER_REPO_PACKAGE).map_err(unavailable)?;

    if let Some(executable) = lookup(FILTER_REPO, None) {
        return Ok(FilterRepoTool {
            executable,
            extra_path: None,
        });
    }
    match lookup(FILTER_REPO, Some(&script_dir)) {
        Some(executable) => {
            info!(path = %executable.display(), "{} installed", FILTER_REPO);
            Ok(FilterRepoTool {
                executable,
                extra_path: Some(script_dir),
            })
        }
        None => {
            warn!(dir = %script_dir.display(), "installed package but executable not found");
            Err(unavailable(format!(
                "installed, but not found on PATH or in {}",
                script_dir.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeInstaller {
        result: Result<PathBuf, String>,
        calls: usize,
    }

    impl PackageInstaller for FakeInstaller {
        fn install(&mut self, package: &str) -> Result<PathBuf, String> {
            assert_eq!(package, "git-filter-repo");
            self.calls += 1;
            self.result.clone()
        }
    }

    #[test]
    fn present_tool_skips_install() {
        let mut installer = FakeInstaller {
            result: Err("should not be called".to_string()),
            calls: 0,
        };
        let tool = ensure_filter_repo(&mut installer, |_, _| {
            Some(PathBuf::from("/usr/bin/git-filter-repo"))
        })
        .expect("tool is present");
        assert_eq!(installer.calls, 0);
        assert_eq!(tool.extra_path, None);
    }

    #[test]
    fn failed_install_is_tool_unavailable() {
        let mut installer = FakeInstaller {
            result: Err("pip: command not found".to_string()),
            calls: 0,
        };
        let err = ensure_filter_repo(&mut installer, |_, _| None).unwrap_err();
        assert_eq!(installer.calls, 1);
        match err {
            TransferError::ToolUnavailable { tool, detail } => {
                assert_eq!(tool, "git-filter-repo");
                assert!(detail.contains("pip: command not found"));
                assert!(detail.contains("pip install --user git-filter-repo"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn installed_into_user_dir_adds_extra_path() {
        let mut installer = FakeInstaller {
            result: Ok(PathBuf::from("/home/me/.local/bin")),
            calls: 0,
        };
        let tool = ensure_filter_repo(&mut installer, |_, extra| {
            extra.map(|d| d.join("git-filter-repo"))
        })
        .expect("found after install");
        assert_eq!(tool.extra_path, Some(PathBuf::from("/home/me/.local/bin")));
        assert_eq!(
            tool.executable,
            PathBuf::from("/home/me/.local/bin/git-filter-repo")
        );
    }

    #[test]
    fn installed_onto_path_needs_no_extra_dir() {
        let mut installer = FakeInstaller {
            result: Ok(PathBuf::from("/home/me/.local/bin")),
            calls: 0,
        };
        let lookups = Cell::new(0);
        let tool = ensure_filter_repo(&mut installer, |_, _| {
            lookups.set(lookups.get() + 1);
            if lookups.get() > 1 {
                Some(PathBuf::from("/usr/local/bin/git-filter-repo"))
            } else {
                None
            }
        })
        .expect("found after install");
        assert_eq!(tool.extra_path, None);
    }

    #[test]
    fn installed_but_missing_is_tool_unavailable() {
        let mut installer = FakeInstaller {
            result: Ok(PathBuf::from("/nowhere/bin")),
            calls: 0,
        };
        let err = ensure_filter_repo(&mut installer, |_, _| None).unwrap_err();
        assert!(matches!(err, TransferError::ToolUnavailable { .. }));
        assert!(err.to_string().contains("/nowhere/bin"));
    }
}

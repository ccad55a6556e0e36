use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

/// Temporary directory holding the bare clone for one run.
///
/// The directory is removed when the workspace is dropped, whichever way the
/// run ends, unless [`Workspace::preserve`] detached it first.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    repo: PathBuf,
}

impl Workspace {
    /// Creates a fresh directory under the system temp dir (honors `TMPDIR`).
    pub fn create(repo_name: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("git-history-transfer-")
            .tempdir()?;
        Ok(Self::from_dir(dir, repo_name))
    }

    /// Like [`Workspace::create`], but under `parent`.
    pub fn create_in(parent: &Path, repo_name: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("git-history-transfer-")
            .tempdir_in(parent)?;
        Ok(Self::from_dir(dir, repo_name))
    }

    fn from_dir(dir: TempDir, repo_name: &str) -> Self {
        let repo = dir.path().join(format!("{repo_name}.git"));
        debug!(root = %dir.path().display(), "created workspace");
        Workspace { dir, repo }
    }

    /// The temporary directory itself, parent of [`Workspace::repo_path`].
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Where the bare clone lives (not created until the clone runs).
    pub fn repo_path(&self) -> &Path {
        &self.repo
    }

    /// Path for an auxiliary file next to the clone.
    pub fn aux_path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    /// Detaches the directory so it survives this process and returns its path.
    pub fn preserve(self) -> PathBuf {
        let path = self.dir.keep();
        info!(path = %path.display(), "workspace kept for inspection");
        path
    }

    /// Removes the directory now, surfacing I/O failures.
    pub fn cleanup(self) -> io::Result<()> {
        let root = self.dir.path().to_path_buf();
        self.dir.close()?;
        info!(path = %root.display(), "removed temporary workspace");
        Ok(())
    }
}

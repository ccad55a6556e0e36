//! Sequences clone → rewrite → publish → cleanup for one request.

use std::fmt;
use std::path::PathBuf;

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::dates;
use crate::error::TransferError;
use crate::git::{DESTINATION_REMOTE, GitBackend};
use crate::request::TransferRequest;
use crate::workspace::Workspace;

/// Name of the scratch file holding the commit → timestamp map.
const DATE_MAP_FILE: &str = "commit-dates.map";

/// Steps of a transfer, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clone,
    RewriteIdentity,
    RewriteDates,
    AddRemote,
    Push,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Clone => "clone",
            Stage::RewriteIdentity => "author/message rewrite",
            Stage::RewriteDates => "date rewrite",
            Stage::AddRemote => "add remote",
            Stage::Push => "mirror push",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(s)
    }
}

/// What a finished transfer did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub completed: Vec<Stage>,
    pub commits_redated: usize,
}

/// A transfer that stopped part-way.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct TransferFailure {
    pub stage: Stage,
    #[source]
    pub source: TransferError,
    /// Stages that finished before the failure.
    pub completed: Vec<Stage>,
    /// The bare clone left on disk for inspection, if any.
    pub preserved: Option<PathBuf>,
}

struct Progress {
    completed: Vec<Stage>,
}

impl Progress {
    fn done(&mut self, stage: Stage) {
        info!(%stage, "stage complete");
        self.completed.push(stage);
    }

    /// Turns `source` into a failure, keeping or dropping the workspace.
    fn fail(self, stage: Stage, source: TransferError, workspace: Workspace) -> TransferFailure {
        let preserved = if source.preserves_workspace() {
            Some(workspace.preserve())
        } else {
            drop(workspace);
            None
        };
        TransferFailure {
            stage,
            source,
            completed: self.completed,
            preserved,
        }
    }
}

/// Runs one transfer against `backend` inside `workspace`.
///
/// The workspace is consumed: it is removed on success and on clone
/// failure, and kept on disk when a rewrite or push fails.
pub fn run<B, R>(
    request: &TransferRequest,
    backend: &mut B,
    workspace: Workspace,
    rng: &mut R,
) -> Result<TransferReport, TransferFailure>
where
    B: GitBackend + ?Sized,
    R: Rng + ?Sized,
{
    let mut progress = Progress {
        completed: Vec::new(),
    };
    let repo = workspace.repo_path().to_path_buf();

    if let Err(e) = backend.clone_bare(&request.source_url, &repo) {
        return Err(progress.fail(Stage::Clone, e, workspace));
    }
    progress.done(Stage::Clone);

    if let Err(e) =
        backend.rewrite_author_and_messages(&repo, &request.author, &request.replacements)
    {
        return Err(progress.fail(Stage::RewriteIdentity, e, workspace));
    }
    progress.done(Stage::RewriteIdentity);

    let mut commits_redated = 0;
    if let Some(range) = &request.date_range {
        let commits = match backend.list_commits(&repo) {
            Ok(c) => c,
            Err(e) => return Err(progress.fail(Stage::RewriteDates, e, workspace)),
        };

        if commits.is_empty() {
            warn!("repository has no commits; skipping date rewrite");
        } else {
            let assignments = dates::assign_timestamps(&commits, range, rng);
            let map_path = workspace.aux_path(DATE_MAP_FILE);
            if let Err(e) = backend.rewrite_timestamps(&repo, &assignments, &map_path) {
                return Err(progress.fail(Stage::RewriteDates, e, workspace));
            }
            commits_redated = assignments.len();
        }
        progress.done(Stage::RewriteDates);
    }

    if let Err(e) = backend.add_remote(&repo, DESTINATION_REMOTE, &request.destination_url) {
        return Err(progress.fail(Stage::AddRemote, e, workspace));
    }
    progress.done(Stage::AddRemote);

    if let Err(e) = backend.mirror_push(&repo, DESTINATION_REMOTE) {
        return Err(progress.fail(Stage::Push, e, workspace));
    }
    progress.done(Stage::Push);

    match workspace.cleanup() {
        Ok(()) => progress.done(Stage::Cleanup),
        Err(e) => warn!(error = %e, "could not remove temporary workspace"),
    }

    Ok(TransferReport {
        completed: progress.completed,
        commits_redated,
    })
}

use std::fmt;
use std::io;

use thiserror::Error;

/// The two history rewrite passes run against the bare clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewritePass {
    /// Author/committer identity and commit message replacements.
    Identity,
    /// Author/committer timestamp randomization.
    Dates,
}

impl fmt::Display for RewritePass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewritePass::Identity => f.write_str("identity/message"),
            RewritePass::Dates => f.write_str("date"),
        }
    }
}

/// Everything that can stop a transfer.
///
/// `Validation` is recovered at the prompt; every other variant aborts the
/// run. Variants that wrap a child process carry its diagnostic output.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("`{tool}` is not available: {detail}")]
    ToolUnavailable { tool: String, detail: String },

    #[error("temporary workspace error: {0}")]
    Workspace(#[from] io::Error),

    #[error("cloning {url} failed: {stderr}")]
    Clone { url: String, stderr: String },

    #[error("{pass} rewrite failed: {stderr}")]
    Rewrite { pass: RewritePass, stderr: String },

    #[error("push failed: {stderr}")]
    Push { stderr: String },

    #[error("destination rejected the mirror push (is it non-empty?): {stderr}")]
    DestinationConflict { stderr: String },
}

impl TransferError {
    /// Shorthand for a [`TransferError::Validation`] with a message.
    pub fn validation(msg: impl Into<String>) -> Self {
        TransferError::Validation(msg.into())
    }

    /// Whether the workspace should be kept on disk after this error.
    ///
    /// Rewrite and push failures leave the clone behind for inspection.
    pub fn preserves_workspace(&self) -> bool {
        matches!(
            self,
            TransferError::Rewrite { .. }
                | TransferError::Push { .. }
                | TransferError::DestinationConflict { .. }
        )
    }
}

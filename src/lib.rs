//! # git-history-transfer
//!
//! A CLI tool to move a Git repository's full history to a new remote under
//! a new author identity.
//!
//! This crate provides functionality to:
//! - Prompt for source/destination URLs, the new author, an optional date
//!   range and optional commit message replacements
//! - Bare-clone the source into a temporary workspace
//! - Rewrite author, committer and messages with `git filter-repo`
//! - Spread commit dates randomly (and chronologically) across the range
//! - Mirror-push every branch and tag to the destination
//!
//! ## Usage
//!
//! ```bash
//! git-history-transfer
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface and main entry point
//! - [`prompt`] - User input abstractions and the questionnaire
//! - [`request`] - The transfer request and input validation
//! - [`banner`] - Boxed plan summary
//! - [`provision`] - Locating and installing external tools
//! - [`git`] - Git command wrappers and the backend trait
//! - [`message`] - Commit message replacements
//! - [`dates`] - Random timestamp generation
//! - [`env_filter`] - Date map and `filter-branch` env-filter script
//! - [`workspace`] - Temporary clone directory
//! - [`transfer`] - Stage sequencing
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod dates;
pub mod env_filter;
pub mod error;
pub mod git;
pub mod message;
pub mod prompt;
pub mod provision;
pub mod request;
pub mod transfer;
pub mod workspace;

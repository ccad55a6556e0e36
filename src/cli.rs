use crate::{
    banner::print_plan,
    git::{self, CommandBackend},
    prompt,
    provision::{self, PipInstaller},
    request::TransferRequest,
    transfer::{self, TransferFailure, TransferReport},
    workspace::Workspace,
};

use console::style;
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the stderr log subscriber. `RUST_LOG` overrides the default `info`.
fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Prompts for every input and the final confirmation.
///
/// Returns `Ok(None)` if the user declined to proceed.
fn gather_request() -> Result<Option<TransferRequest>, ()> {
    let defaults = prompt::AuthorDefaults {
        name: git::config_get("user.name").unwrap_or_default(),
        email: git::config_get("user.email").unwrap_or_default(),
    };

    let mut string_prompter = prompt::DialoguerStringPrompter;
    let mut confirm_prompter = prompt::DialoguerConfirmPrompter;

    let request =
        match prompt::collect_request(&mut string_prompter, &mut confirm_prompter, &defaults) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{}", style(format!("Error: {}", e)).red().bold());
                return Err(());
            }
        };

    print_plan(&request);

    match prompt::confirm_transfer(&mut confirm_prompter) {
        Ok(true) => Ok(Some(request)),
        Ok(false) => Ok(None),
        Err(e) => {
            eprintln!("{}", style(format!("Error: {}", e)).red().bold());
            Err(())
        }
    }
}

/// Prints which stages finished and where the clone was left, if anywhere.
fn report_failure(failure: &TransferFailure) {
    eprintln!(
        "{}",
        style(format!("❌ Transfer aborted during {}.", failure.stage))
            .red()
            .bold()
    );
    eprintln!("{}", style(format!("   {}", failure.source)).red());

    if failure.completed.is_empty() {
        eprintln!("   Completed stages: none");
    } else {
        let done: Vec<String> = failure.completed.iter().map(|s| s.to_string()).collect();
        eprintln!("   Completed stages: {}", done.join(", "));
    }

    if let Some(path) = &failure.preserved {
        eprintln!(
            "{}",
            style(format!("   Bare clone kept for inspection at {}", path.display())).yellow()
        );
    }
}

fn report_success(report: &TransferReport) {
    if report.commits_redated > 0 {
        println!("Re-dated {} commit(s).", report.commits_redated);
    }
    println!(
        "{}",
        style("✅ Repository transfer complete!").green().bold()
    );
}

/// Prints usage information to stdout.
fn print_help() {
    println!(
        "\
git-history-transfer {}

Copy a repository's full history to a new remote with a new author.

USAGE:
    git-history-transfer [OPTIONS]

OPTIONS:
    -h, --help       Print help information
    -V, --version    Print version information

DESCRIPTION:
    Prompts for a source and destination URL, the new author name and email,
    an optional date range and optional commit-message replacements, then:

      1) bare-clones the source into a temporary directory
      2) rewrites every commit's author and committer with git-filter-repo
      3) optionally spreads commit dates randomly across the range
      4) mirror-pushes all branches and tags to the destination

    git-filter-repo is installed with pip --user if it is missing.
    Set RUST_LOG=debug to see every git command.",
        env!("CARGO_PKG_VERSION")
    );
}

/// Main CLI entry point for `git-history-transfer`.
///
/// This function:
/// 1. Handles `--help` and `--version`.
/// 2. Verifies that `git` is installed.
/// 3. Collects the transfer request interactively.
/// 4. Shows the plan and asks for confirmation.
/// 5. Ensures `git-filter-repo` is available, installing it if needed.
/// 6. Runs clone, rewrite, push and cleanup in a temporary workspace.
///
/// # Exit Codes
///
/// * `0` – Transfer completed, or the user cancelled before anything ran.
/// * Non-zero – Any failure along the way.
pub fn entry() -> Result<i32, ()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(0);
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("git-history-transfer {}", env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }

    init_logging();

    if let Err(e) = provision::ensure_git() {
        eprintln!("{}", style(format!("Error: {}", e)).red().bold());
        return Err(());
    }

    let request = match gather_request()? {
        Some(r) => r,
        None => {
            println!("{}", style("Transfer cancelled.").yellow().bold());
            return Ok(0);
        }
    };

    let tool = match provision::ensure_filter_repo(&mut PipInstaller, provision::locate) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", style(format!("Error: {}", e)).red().bold());
            return Err(());
        }
    };
    debug!(path = %tool.executable.display(), "using git-filter-repo");

    let workspace = match Workspace::create(&request.repo_name()) {
        Ok(w) => w,
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("Error: cannot create temporary directory: {}", e))
                    .red()
                    .bold()
            );
            return Err(());
        }
    };

    let mut backend = CommandBackend::new(tool.extra_path);
    match transfer::run(&request, &mut backend, workspace, &mut rand::thread_rng()) {
        Ok(report) => {
            report_success(&report);
            Ok(0)
        }
        Err(failure) => {
            report_failure(&failure);
            Err(())
        }
    }
}

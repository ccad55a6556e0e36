use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use crate::error::TransferError;
use crate::request::{self, DateRange, Identity, Replacement, TransferRequest};

/// Abstraction over a string input prompt.
///
/// Implementors define how string input is collected from the user,
/// including any styling or interactivity. This trait enables testability
/// by decoupling user input from the logic that consumes it.
pub trait StringPrompter {
    /// Prompt the user for a string input.
    ///
    /// # Parameters
    /// - `prompt`: The message shown to the user.
    /// - `default`: Value used if the user presses Enter without input. An
    ///   empty default means "no default".
    ///
    /// # Returns
    /// `Ok(String)` if input is successfully collected, or an `Err(String)` describing the failure.
    fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String>;
}

/// Abstraction over a boolean (yes/no) confirmation prompt.
///
/// This trait allows interactive confirmation to be injected or mocked,
/// promoting testability in CLI workflows.
pub trait ConfirmPrompter {
    /// Prompt the user for a yes/no confirmation.
    ///
    /// # Returns
    /// `Ok(true)` if confirmed, `Ok(false)` if declined, or `Err(String)` on input failure.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String>;
}

/// Default implementation of `StringPrompter` using `dialoguer::Input`.
pub struct DialoguerStringPrompter;

impl StringPrompter for DialoguerStringPrompter {
    fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        match input.interact_text() {
            Ok(v) => Ok(v),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Default implementation of `ConfirmPrompter` using `dialoguer::Confirm`.
pub struct DialoguerConfirmPrompter;

impl ConfirmPrompter for DialoguerConfirmPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
        let theme = ColorfulTheme::default();
        let confirm = Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default);
        match confirm.interact() {
            Ok(v) => Ok(v),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Prefilled answers offered at the author prompts (from `git config`).
#[derive(Debug, Clone, Default)]
pub struct AuthorDefaults {
    pub name: String,
    pub email: String,
}

fn report_invalid(err: &TransferError) {
    eprintln!("{}", style(err.to_string()).red());
}

/// Prompts until `validate` accepts the answer.
///
/// Validation failures are shown and the question is asked again; only a
/// failing prompter ends the loop with an error.
pub fn ask_validated<P, T, F>(
    prompter: &mut P,
    label: &str,
    default: &str,
    validate: F,
) -> Result<T, TransferError>
where
    P: StringPrompter,
    F: Fn(&str) -> Result<T, TransferError>,
{
    loop {
        let answer = prompter
            .prompt(label, default)
            .map_err(TransferError::Prompt)?;
        match validate(&answer) {
            Ok(v) => return Ok(v),
            Err(e) => report_invalid(&e),
        }
    }
}

/// Asks for both bounds of the randomization window.
///
/// A malformed bound re-asks that bound; a reversed range re-asks both.
pub fn ask_date_range<P: StringPrompter>(prompter: &mut P) -> Result<DateRange, TransferError> {
    loop {
        let start = ask_validated(prompter, "Start date (YYYY-MM-DD)", "", request::parse_date)?;
        let end = ask_validated(prompter, "End date (YYYY-MM-DD)", "", request::parse_date)?;
        match DateRange::new(start, end) {
            Ok(range) => return Ok(range),
            Err(e) => report_invalid(&e),
        }
    }
}

/// Collects find/replace pairs until the user declines to add another.
pub fn ask_replacements<S, C>(strings: &mut S, confirms: &mut C) -> Result<Vec<Replacement>, TransferError>
where
    S: StringPrompter,
    C: ConfirmPrompter,
{
    let mut rules = Vec::new();
    loop {
        let question = if rules.is_empty() {
            "Replace text in commit messages?"
        } else {
            "Add another commit message replacement?"
        };
        let more = confirms
            .confirm(question, false)
            .map_err(TransferError::Prompt)?;
        if !more {
            return Ok(rules);
        }

        let find = ask_validated(strings, "Text to find in commit messages", "", |s| {
            if s.is_empty() {
                Err(TransferError::validation("text to find must not be empty"))
            } else {
                Ok(s.to_string())
            }
        })?;
        let replace = strings
            .prompt("Replacement text", "")
            .map_err(TransferError::Prompt)?;
        let rule = Replacement::new(&find, &replace)?;
        println!(
            "{}",
            style(format!("Added replacement: '{}' → '{}'", rule.find, rule.replace)).green()
        );
        rules.push(rule);
    }
}

/// Runs the whole questionnaire and returns the finished request.
pub fn collect_request<S, C>(
    strings: &mut S,
    confirms: &mut C,
    defaults: &AuthorDefaults,
) -> Result<TransferRequest, TransferError>
where
    S: StringPrompter,
    C: ConfirmPrompter,
{
    let source_url = ask_validated(strings, "Source repository URL", "", request::validate_url)?;
    let destination_url =
        ask_validated(strings, "Destination repository URL", "", request::validate_url)?;
    let name = ask_validated(strings, "New author name", &defaults.name, request::validate_name)?;
    let email = ask_validated(strings, "New author email", &defaults.email, request::validate_email)?;
    let author = Identity::new(&name, &email)?;

    let randomize = confirms
        .confirm("Randomize commit dates?", false)
        .map_err(TransferError::Prompt)?;
    let date_range = if randomize {
        Some(ask_date_range(strings)?)
    } else {
        None
    };

    let replacements = ask_replacements(strings, confirms)?;

    Ok(TransferRequest {
        source_url,
        destination_url,
        author,
        date_range,
        replacements,
    })
}

/// Final go/no-go before anything touches disk or network. Defaults to no.
pub fn confirm_transfer<P: ConfirmPrompter>(prompter: &mut P) -> Result<bool, TransferError> {
    prompter
        .confirm("Proceed with transfer?", false)
        .map_err(TransferError::Prompt)
}

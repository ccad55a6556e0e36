use console::{measure_text_width, style};
use std::iter;

use crate::request::TransferRequest;

/// Prints the transfer plan inside a colorized box.
///
/// The box is sized to the widest **visible** line, using
/// [`console::measure_text_width`] so ANSI color codes inside the content do
/// not throw off the padding. Borders are styled separately from the text.
///
/// Every field of the request is shown verbatim, URLs and email included.
///
/// # Examples
///
/// ```no_run
/// use git_history_transfer::banner::print_plan;
/// use git_history_transfer::request::{Identity, TransferRequest};
///
/// let request = TransferRequest {
///     source_url: "https://github.com/old/tool.git".into(),
///     destination_url: "https://github.com/new/tool.git".into(),
///     author: Identity::new("John Doe", "john@example.com").unwrap(),
///     date_range: None,
///     replacements: Vec::new(),
/// };
/// print_plan(&request);
/// ```
pub fn print_plan(request: &TransferRequest) {
    let lines = plan_lines(request);

    let max_width = lines
        .iter()
        .map(|l| measure_text_width(l)) // ignore ANSI in content
        .max()
        .unwrap_or(0)
        + 2;

    let border = "═".repeat(max_width);
    let top = style(format!("╔{}╗", border)).blue().bold();
    let bottom = style(format!("╚{}╝", border)).blue().bold();
    let left = style("║ ").blue().bold().to_string();
    let right = style("║").blue().bold().to_string();

    println!();
    println!("{top}");
    for line in lines {
        let visible = measure_text_width(&line);
        let pad = max_width - visible; // includes the one space after left border
        println!("{}{}{}{}", left, line, " ".repeat(pad - 1), right);
    }
    println!("{bottom}");
    println!();
}

/// Builds the lines shown by [`print_plan`], in display order.
///
/// Some lines carry ANSI styling; measure them with
/// `console::measure_text_width`, not `str::len()`.
fn plan_lines(request: &TransferRequest) -> Vec<String> {
    let header = ["Transfer summary", ""].into_iter().map(|s| s.to_string());

    let fields = [
        format!("Source:       {}", request.source_url),
        format!("Destination:  {}", request.destination_url),
        format!("New author:   {}", request.author),
        match &request.date_range {
            Some(range) => format!("Dates:        random, {}", range),
            None => String::from("Dates:        unchanged"),
        },
    ]
    .into_iter();

    let rules = if request.replacements.is_empty() {
        vec![String::from("Messages:     unchanged")]
    } else {
        iter::once(format!(
            "Messages:     {} replacement(s), applied in order",
            request.replacements.len()
        ))
        .chain(
            request
                .replacements
                .iter()
                .enumerate()
                .map(|(i, r)| format!("  {}) '{}' → '{}'", i + 1, r.find, r.replace)),
        )
        .collect()
    }
    .into_iter();

    let warning = [
        String::new(),
        style("The destination's refs will be replaced by a mirror push.")
            .yellow()
            .bold()
            .to_string(),
    ]
    .into_iter();

    header.chain(fields).chain(rules).chain(warning).collect()
}

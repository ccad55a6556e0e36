//! Commit message substitutions and the `git filter-repo` callback that
//! carries them.

use crate::request::{Identity, Replacement};

/// Applies `rules` to `message` one after another.
///
/// Matching is literal and case-sensitive; each rule sees the output of the
/// rules before it, so `[("foo", "bar"), ("bar", "baz")]` turns `foo` into
/// `baz`.
pub fn apply_replacements(message: &str, rules: &[Replacement]) -> String {
    rules
        .iter()
        .fold(message.to_string(), |msg, r| msg.replace(&r.find, &r.replace))
}

/// Renders `text` as a Python bytes literal.
///
/// Printable ASCII passes through; `\` and `'` are backslash-escaped and
/// every other byte (including each byte of multi-byte UTF-8) becomes `\xNN`.
pub fn py_bytes_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 3);
    out.push_str("b'");
    for b in text.bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

/// Builds the body passed to `git filter-repo --commit-callback`.
///
/// The body overrides author and committer identity on every commit, then
/// applies each replacement to the raw message bytes in order.
pub fn commit_callback(author: &Identity, rules: &[Replacement]) -> String {
    let name = py_bytes_literal(&author.name);
    let email = py_bytes_literal(&author.email);

    let mut lines = vec![
        format!("commit.author_name = {name}"),
        format!("commit.author_email = {email}"),
        format!("commit.committer_name = {name}"),
        format!("commit.committer_email = {email}"),
    ];
    lines.extend(rules.iter().map(|r| {
        format!(
            "commit.message = commit.message.replace({}, {})",
            py_bytes_literal(&r.find),
            py_bytes_literal(&r.replace)
        )
    }));
    lines.join("\n")
}

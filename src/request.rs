use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use crate::error::TransferError;

/// Author identity applied to every rewritten commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Builds an identity from trimmed input.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Validation`] if the name is empty or the
    /// email does not contain `@`.
    pub fn new(name: &str, email: &str) -> Result<Self, TransferError> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        Ok(Identity { name, email })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Inclusive calendar window used to draw commit timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns [`TransferError::Validation`] when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TransferError> {
        if start > end {
            return Err(TransferError::validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(DateRange { start, end })
    }

    /// First second of the window (start date, 00:00:00 UTC) as unix time.
    pub fn first_second(&self) -> i64 {
        self.start.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    /// Last second of the window (end date, 23:59:59 UTC) as unix time.
    pub fn last_second(&self) -> i64 {
        self.end
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp()
            + 86_399
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
    }
}

/// A literal, case-sensitive commit message substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub find: String,
    pub replace: String,
}

impl Replacement {
    /// # Errors
    ///
    /// Returns [`TransferError::Validation`] when `find` is empty.
    pub fn new(find: &str, replace: &str) -> Result<Self, TransferError> {
        if find.is_empty() {
            return Err(TransferError::validation("text to find must not be empty"));
        }
        Ok(Replacement {
            find: find.to_string(),
            replace: replace.to_string(),
        })
    }
}

/// Everything one run needs, collected up front and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source_url: String,
    pub destination_url: String,
    pub author: Identity,
    pub date_range: Option<DateRange>,
    pub replacements: Vec<Replacement>,
}

impl TransferRequest {
    pub fn randomize_dates(&self) -> bool {
        self.date_range.is_some()
    }

    /// Directory-friendly name of the source repository.
    pub fn repo_name(&self) -> String {
        repo_name_from_url(&self.source_url)
    }
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` date.
///
/// Shorter fields (`2023-1-5`), signs, whitespace and trailing text are all
/// rejected before the calendar check.
pub fn parse_date(input: &str) -> Result<NaiveDate, TransferError> {
    let bytes = input.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(TransferError::validation(format!(
            "'{input}' is not a YYYY-MM-DD date"
        )));
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|e| TransferError::validation(format!("'{input}' is not a valid date ({e})")))
}

/// Accepts HTTP(S), SSH, git, file URLs and the scp-like `user@host:path` form.
pub fn validate_url(input: &str) -> Result<String, TransferError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(TransferError::validation("repository URL is required"));
    }

    const SCHEMES: [&str; 5] = ["https://", "http://", "ssh://", "git://", "file://"];
    let has_scheme = SCHEMES
        .iter()
        .any(|s| url.starts_with(s) && url.len() > s.len());

    if has_scheme || is_scp_like(url) {
        Ok(url.to_string())
    } else {
        Err(TransferError::validation(format!(
            "'{url}' is not a Git URL (expected https://, ssh:// or user@host:path)"
        )))
    }
}

fn is_scp_like(url: &str) -> bool {
    match url.split_once(':') {
        Some((user_host, path)) => match user_host.split_once('@') {
            Some((user, host)) => {
                !user.is_empty() && !host.is_empty() && !host.contains('/') && !path.is_empty()
            }
            None => false,
        },
        None => false,
    }
}

pub fn validate_name(input: &str) -> Result<String, TransferError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(TransferError::validation("author name is required"));
    }
    Ok(name.to_string())
}

pub fn validate_email(input: &str) -> Result<String, TransferError> {
    let email = input.trim();
    if !email.contains('@') {
        return Err(TransferError::validation(format!(
            "'{email}' is not an email address"
        )));
    }
    Ok(email.to_string())
}

/// Last path segment of a Git URL without `.git`, or `repo` if none.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let tail = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = tail.strip_suffix(".git").unwrap_or(tail);

    if name.is_empty() || name.contains('@') {
        String::from("repo")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parse_date_round_trips() {
        for s in ["2023-01-01", "2024-02-29", "1999-12-31", "2023-07-04"] {
            let parsed = parse_date(s).expect("should parse");
            assert_eq!(parsed.format(DATE_FORMAT).to_string(), s);
        }
    }

    #[test]
    fn parse_date_rejects_other_shapes() {
        for s in [
            "",
            "2023-1-01",
            "2023-01-1",
            "23-01-01",
            "2023/01/01",
            "2023-01-01 ",
            " 2023-01-01",
            "2023-01-01T00:00",
            "+2023-01-0",
            "01-01-2023",
        ] {
            assert!(parse_date(s).is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn parse_date_rejects_impossible_calendar_days() {
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("2023-13-01").is_err());
        assert!(parse_date("2023-00-10").is_err());
    }

    #[test]
    fn date_range_rejects_start_after_end() {
        let r = DateRange::new(date(2023, 2, 1), date(2023, 1, 31));
        assert!(matches!(r, Err(TransferError::Validation(_))));
    }

    #[test]
    fn date_range_allows_single_day() {
        let r = DateRange::new(date(2023, 1, 1), date(2023, 1, 1)).expect("same day is valid");
        assert_eq!(r.last_second() - r.first_second(), 86_399);
    }

    #[test]
    fn date_range_bounds_are_utc_day_edges() {
        let r = DateRange::new(date(2023, 1, 1), date(2023, 1, 31)).expect("valid range");
        assert_eq!(r.first_second(), 1_672_531_200);
        assert_eq!(r.last_second(), 1_675_209_599);
        assert_eq!(r.to_string(), "2023-01-01 to 2023-01-31");
    }

    #[test]
    fn url_validation() {
        assert!(validate_url("https://github.com/a/b.git").is_ok());
        assert!(validate_url("ssh://git@host/a/b.git").is_ok());
        assert!(validate_url("git@github.com:a/b.git").is_ok());
        assert!(validate_url("file:///tmp/b.git").is_ok());
        assert!(validate_url("  https://x/y  ").is_ok_and(|u| u == "https://x/y"));
        assert!(validate_url("").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("github.com/a/b").is_err());
        assert!(validate_url("/tmp/repo").is_err());
    }

    #[test]
    fn identity_requires_name_and_at_sign() {
        let id = Identity::new(" Jane Doe ", " jane@x.com ").expect("valid identity");
        assert_eq!(id.to_string(), "Jane Doe <jane@x.com>");
        assert!(Identity::new("", "jane@x.com").is_err());
        assert!(Identity::new("Jane", "jane.x.com").is_err());
    }

    #[test]
    fn replacement_requires_find_text() {
        assert!(Replacement::new("", "x").is_err());
        let r = Replacement::new("foo", "").expect("empty replacement is fine");
        assert_eq!(r.replace, "");
    }

    #[test]
    fn repo_names_from_urls() {
        assert_eq!(repo_name_from_url("https://github.com/org/tool.git"), "tool");
        assert_eq!(repo_name_from_url("https://github.com/org/tool"), "tool");
        assert_eq!(repo_name_from_url("https://github.com/org/tool/"), "tool");
        assert_eq!(repo_name_from_url("git@github.com:org/tool.git"), "tool");
        assert_eq!(repo_name_from_url("git@host:tool.git"), "tool");
        assert_eq!(repo_name_from_url("file:///srv/git/tool.git"), "tool");
        assert_eq!(repo_name_from_url("https://host/.git"), "repo");
    }
}

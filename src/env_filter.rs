use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Writes the commit → timestamp map read by the env-filter script.
///
/// One `<commit-id> <unix-seconds>` pair per line, in assignment order.
///
/// # Returns
///
/// * `Ok(())` on success.
/// * `Err(String)` if the file cannot be created or written.
pub fn write_date_map(path: &Path, assignments: &[(String, i64)]) -> Result<(), String> {
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => return Err(format!("create failed: {}", e)),
    };
    let mut out = BufWriter::new(file);

    for (commit, stamp) in assignments {
        if let Err(e) = writeln!(out, "{}", map_line(commit, *stamp)) {
            return Err(format!("write failed: {}", e));
        }
    }

    match out.flush() {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("write failed: {}", e)),
    }
}

fn map_line(commit: &str, stamp: i64) -> String {
    format!("{commit} {stamp}")
}

/// Builds the `git filter-branch --env-filter` script.
///
/// The script looks up `$GIT_COMMIT` in the map at `map_path` and, when
/// found, exports the same timestamp as author and committer date in UTC.
/// Commits missing from the map keep their dates.
///
/// # Parameters
///
/// * `map_path` – File written by [`write_date_map`]. Quoted for `sh`, so
///   spaces and quotes in the path are safe.
///
/// # Examples
///
/// ```ignore
/// let script = env_filter_script(Path::new("/tmp/ws/commit-dates.map"));
/// assert!(script.contains("GIT_COMMITTER_DATE"));
/// ```
pub fn env_filter_script(map_path: &Path) -> String {
    let quoted = shell_quote(&map_path.to_string_lossy());
    format!(
        "ts=$(sed -n \"s/^$GIT_COMMIT //p\" {quoted})\n\
         if [ -n \"$ts\" ]; then\n\
         \x20   export GIT_AUTHOR_DATE=\"@$ts +0000\"\n\
         \x20   export GIT_COMMITTER_DATE=\"@$ts +0000\"\n\
         fi\n"
    )
}

/// Single-quotes `s` for POSIX `sh`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

//! Common utility functions used across modules.
//!
//! - [`indent`] - Indent a block of text for nesting inside the template
//! - [`backup_path`] - Timestamped sibling path for a configuration backup
//! - [`format_generated_at`] - Header timestamp for generated files

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Second resolution; two runs within the same second share a name.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Indent every non-blank line of `text` by `width` spaces.
///
/// # Examples
/// ```
/// use nginx_setup::utils::indent;
/// assert_eq!(indent("a {\n    b;\n}", 4), "    a {\n        b;\n    }");
/// assert_eq!(indent("a\n\nb", 2), "  a\n\n  b");
/// ```
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Backup path for `target`: the same path with `.bak.<timestamp>` appended.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use nginx_setup::utils::backup_path;
/// use std::path::Path;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(
///     backup_path(Path::new("/etc/nginx/nginx.conf"), &at),
///     Path::new("/etc/nginx/nginx.conf.bak.20240309140507")
/// );
/// ```
pub fn backup_path<Tz>(target: &Path, taken_at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut name = target.as_os_str().to_owned();
    name.push(format!(".bak.{}", taken_at.format(BACKUP_TIMESTAMP_FORMAT)));
    PathBuf::from(name)
}

/// Timestamp written in the header comment of generated files.
pub fn format_generated_at<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(GENERATED_AT_FORMAT).to_string()
}

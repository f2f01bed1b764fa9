//! Human-readable size parsing and formatting (e.g., "8GB", "500MB").

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '8GB', '500MB', or '1024KB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Bare numbers are bytes; `KB`/`MB`/`GB` (or `K`/`M`/`G`) suffixes are
/// accepted case-insensitively, with optional whitespace before the
/// suffix.
///
/// # Examples
///
/// ```
/// use tilestore::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1 KB").unwrap(), 1024);
/// assert_eq!(parse_size("8gb").unwrap(), 8 * 1024 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SizeParseError::new(s));
    }

    let upper = trimmed.to_uppercase();

    let (num_str, multiplier) = if let Some(rest) = strip_suffix(&upper, trimmed, &["GB", "G"]) {
        (rest, GB)
    } else if let Some(rest) = strip_suffix(&upper, trimmed, &["MB", "M"]) {
        (rest, MB)
    } else if let Some(rest) = strip_suffix(&upper, trimmed, &["KB", "K"]) {
        (rest, KB)
    } else {
        (trimmed, 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| SizeParseError::new(s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| SizeParseError::new(s))
}

fn strip_suffix<'a>(upper: &str, original: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    suffixes
        .iter()
        .find(|suffix| upper.ends_with(*suffix))
        .map(|suffix| &original[..original.len() - suffix.len()])
}

/// Format a byte count as a human-readable string.
///
/// # Examples
///
/// ```
/// use tilestore::config::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(2 * 1024 * 1024), "2.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

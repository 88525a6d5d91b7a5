//! Value-level recognizers for numbers, dates and timestamps

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

// Optional sign, digits with optional fraction, optional exponent
static NUMERIC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap());

static ALPHABETIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]").unwrap());

/// Explicit date/time patterns, tried in order
///
/// The boolean marks patterns that carry a time of day.
pub const EXPLICIT_PATTERNS: &[(&str, bool)] = &[
    ("%Y-%m-%d", false),
    ("%d/%m/%Y", false),
    ("%m/%d/%Y", false),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%Y-%m-%dT%H:%M:%S", true),
    ("%d/%m/%Y %H:%M:%S", true),
    ("%m/%d/%Y %H:%M:%S", true),
];

/// Extra patterns accepted by the permissive parser
const PERMISSIVE_DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const PERMISSIVE_DATE_PATTERNS: &[&str] = &[
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%a, %d %b %Y",
];

/// Check whether a value parses as a number
pub fn is_numeric(value: &str) -> bool {
    NUMERIC_REGEX.is_match(value.trim())
}

/// Check whether a value contains an ASCII letter
pub fn has_alphabetic(value: &str) -> bool {
    ALPHABETIC_REGEX.is_match(value)
}

/// Parse a numeric value as a float
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if !NUMERIC_REGEX.is_match(value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a value as a whole number
///
/// Exact decimal digits are preferred so values beyond f64 precision keep
/// their magnitude; numeric values with a zero fractional part (`3.0`,
/// `1e3`) are accepted too.
pub fn parse_integral(value: &str) -> Option<i128> {
    let value = value.trim();
    let digits = value.strip_prefix('+').unwrap_or(value);
    if let Ok(exact) = digits.parse::<i128>() {
        return Some(exact);
    }
    let float = parse_number(value)?;
    if float.fract() != 0.0 || float.abs() >= 1e38 {
        return None;
    }
    Some(float as i128)
}

/// Parse a value with one explicit pattern
pub fn parse_with_pattern(value: &str, pattern: &str, has_time: bool) -> Option<NaiveDateTime> {
    let value = value.trim();
    if has_time {
        NaiveDateTime::parse_from_str(value, pattern).ok()
    } else {
        NaiveDate::parse_from_str(value, pattern)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

/// Parse a value with the explicit patterns only
pub fn parse_explicit(value: &str) -> Option<NaiveDateTime> {
    EXPLICIT_PATTERNS
        .iter()
        .find_map(|(pattern, has_time)| parse_with_pattern(value, pattern, *has_time))
}

/// Parse a free-form date or timestamp
///
/// Accepts RFC 3339, RFC 2822, fractional seconds, minute precision, slash,
/// dot and dash separators and English month names. Offsets are dropped,
/// keeping the wall-clock time as written.
pub fn parse_permissive(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(parsed) = parse_explicit(value) {
        return Some(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.naive_local());
    }
    if let Some(parsed) = PERMISSIVE_DATETIME_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(value, pattern).ok())
    {
        return Some(parsed);
    }
    PERMISSIVE_DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(value, pattern).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Check whether a timestamp falls exactly on midnight
pub fn is_midnight(value: &NaiveDateTime) -> bool {
    value.num_seconds_from_midnight() == 0 && value.nanosecond() == 0
}

/// Fraction of values accepted by the permissive parser
pub fn date_confidence(values: &[&str]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let matches = values
        .iter()
        .filter(|v| parse_permissive(v).is_some())
        .count();

    matches as f64 / values.len() as f64
}

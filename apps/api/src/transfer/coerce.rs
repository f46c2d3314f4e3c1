//! Conversions between CSV text and typed optional fields, plus the date and
//! time normalizers applied on every write.
//!
//! Absent values always encode as the empty string. `NULL` is still accepted
//! on input because older exports wrote it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub const NULL_TOKEN: &str = "NULL";

/// Whether a posted salary of zero is a real value or a placeholder for "unset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryPolicy {
    #[default]
    ZeroIsValue,
    ZeroIsAbsent,
}

impl SalaryPolicy {
    pub fn apply(self, value: Option<i64>) -> Option<i64> {
        match (self, value) {
            (SalaryPolicy::ZeroIsAbsent, Some(0)) => None,
            (_, value) => value,
        }
    }

    pub fn excludes_zero(self) -> bool {
        self == SalaryPolicy::ZeroIsAbsent
    }
}

fn is_absent(raw: &str) -> bool {
    raw.is_empty() || raw == NULL_TOKEN
}

/// `""` and `NULL` are absent; anything else is kept verbatim.
pub fn decode_opt_string(raw: &str) -> Option<String> {
    if is_absent(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Parses salary-like integers such as `$130,047.00`. Unparseable input is absent.
pub fn decode_opt_int(raw: &str, policy: SalaryPolicy) -> Option<i64> {
    let raw = raw.trim();
    if is_absent(raw) {
        return None;
    }
    let digits = raw.strip_prefix('$').unwrap_or(raw).replace(',', "");
    let whole = match digits.find('.') {
        Some(idx) => &digits[..idx],
        None => digits.as_str(),
    };
    policy.apply(whole.parse::<i64>().ok())
}

/// Optional text as it is written to the database: blank and `NULL` become
/// SQL NULL, so CSV export has exactly one absent form to write.
pub fn storage_text(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(decode_opt_string)
}

pub fn decode_opt_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "t" | "y" => Some(true),
        "false" | "no" | "0" | "f" | "n" => Some(false),
        _ => None,
    }
}

pub fn encode_opt_string(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn encode_opt_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn encode_opt_bool(value: Option<bool>) -> String {
    match value {
        Some(true) => "true".to_string(),
        Some(false) => "false".to_string(),
        None => String::new(),
    }
}

const LONG_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%B %d %Y"];
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Recognizes ISO dates, long-form dates and the datetime shapes the data
/// store and older exports produced.
fn parse_date_like(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    for format in LONG_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    // `2025-10-20 00:00:00.000Z` is RFC 3339 apart from the separator.
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s.replacen(' ', "T", 1)) {
        return Some(dt.date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|dt| dt.date())
}

/// Storage form: `April 8, 2025` and `2025-04-08` both become `2025-04-08`.
/// Unrecognized input is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    parse_date_like(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Display form: `2025-10-01` becomes `October 1, 2025`.
pub fn format_date_long(raw: &str) -> String {
    parse_date_like(raw)
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
}

/// Storage form: `3:04 PM` becomes `15:04`.
pub fn normalize_time(raw: &str) -> String {
    parse_time(raw)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Display form: `14:30` becomes `2:30 PM`.
pub fn format_time_12h(raw: &str) -> String {
    parse_time(raw)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| raw.to_string())
}

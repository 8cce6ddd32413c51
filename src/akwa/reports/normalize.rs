//! Best-effort cleaning of free-text fields pulled from client exports.
//!
//! Every function here is total: malformed input degrades to a defined
//! default (zero, or the raw text) instead of failing the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;

/// Canonical rendering used for every timestamp written to a report.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Strict layout some exports use for bare times, e.g. `14:05.09`.
const SHORT_TIME_FORMAT: &str = "%H:%M.%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// A timestamp as delivered by a data source: either already typed by the
/// driver or spreadsheet, or plain text of unknown layout.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    Native(NaiveDateTime),
    Text(String),
}

/// Collapses a client name to its comparison key: lower-case, trimmed, with
/// every non-alphanumeric character removed.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Parses a currency-ish string such as `$1,234.56` into a number.
///
/// Empty input and the `nan` / `n/a` sentinels read as zero, and so does
/// anything else that fails to parse.
pub fn parse_amount(text: &str) -> f64 {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let cleaned: String = unsigned.chars().filter(|c| *c != ',').collect();

    if cleaned.is_empty()
        || cleaned.eq_ignore_ascii_case("nan")
        || cleaned.eq_ignore_ascii_case("n/a")
    {
        return 0.0;
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Renders a timestamp in the canonical `YYYY-MM-DD HH:MM:SS.mmm` layout.
///
/// Text that matches neither the short time layout nor any of the permissive
/// date layouts is returned unchanged.
pub fn parse_timestamp(raw: &RawTimestamp) -> String {
    match raw {
        RawTimestamp::Native(value) => format_timestamp(value),
        RawTimestamp::Text(text) => match parse_datetime_text(text) {
            Some(value) => format_timestamp(&value),
            None => {
                warn!(raw = %text, "can't parse date, keeping raw value");
                text.clone()
            }
        },
    }
}

/// Parses text into a timestamp, trying the short time layout first.
pub fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_short_time(trimmed).or_else(|| parse_flexible(trimmed))
}

/// Parses text into a calendar date, discarding any time component.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    parse_datetime_text(text).map(|value| value.date())
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_short_time(text: &str) -> Option<NaiveDateTime> {
    let time = NaiveTime::parse_from_str(text, SHORT_TIME_FORMAT).ok()?;
    // A bare time carries no date; 1900-01-01 is what strptime assumes.
    NaiveDate::from_ymd_opt(1900, 1, 1).map(|date| date.and_time(time))
}

fn parse_flexible(text: &str) -> Option<NaiveDateTime> {
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.naive_local());
    }
    if let Ok(value) = DateTime::parse_from_rfc2822(text) {
        return Some(value.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(value);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_strips_currency_and_separators() {
        assert_eq!(parse_amount("$1,234.56"), 1234.56);
        assert_eq!(parse_amount("  1,234 "), 1234.0);
        assert_eq!(parse_amount("-12.5"), -12.5);
    }

    #[test]
    fn amount_sentinels_and_garbage_read_as_zero() {
        for input in ["", "   ", "N/A", "n/a", "nan", "NaN", "$$5", "1.2.3", "abc", "inf", "$"] {
            assert_eq!(parse_amount(input), 0.0, "input {input:?}");
        }
    }

    #[test]
    fn names_compare_without_punctuation_or_case() {
        assert_eq!(
            normalize_name("Dr. Smith's Clinic"),
            normalize_name("dr smiths clinic")
        );
        assert_eq!(normalize_name("  --  "), "");
        let once = normalize_name("Acme, Inc. (West)");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn lowercasing_never_leaves_marks_behind() {
        // 'İ' lowercases to 'i' followed by a combining dot.
        let once = normalize_name("İstanbul Clinic");
        assert_eq!(once, "istanbulclinic");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn short_time_gets_placeholder_date() {
        let raw = RawTimestamp::Text("14:05.09".into());
        assert_eq!(parse_timestamp(&raw), "1900-01-01 14:05:09.000");
    }

    #[test]
    fn free_form_dates_are_reformatted() {
        let iso = RawTimestamp::Text("2024-03-05T07:08:09.1234".into());
        assert_eq!(parse_timestamp(&iso), "2024-03-05 07:08:09.123");

        let us = RawTimestamp::Text("03/05/2024".into());
        assert_eq!(parse_timestamp(&us), "2024-03-05 00:00:00.000");
    }

    #[test]
    fn native_values_format_with_milliseconds() {
        let value = NaiveDate::from_ymd_opt(2023, 12, 31)
            .and_then(|date| date.and_hms_milli_opt(23, 59, 58, 7))
            .expect("valid timestamp");
        assert_eq!(
            parse_timestamp(&RawTimestamp::Native(value)),
            "2023-12-31 23:59:58.007"
        );
    }

    #[test]
    fn unparseable_text_passes_through() {
        let raw = RawTimestamp::Text("sometime last week".into());
        assert_eq!(parse_timestamp(&raw), "sometime last week");
    }
}

//! Format checks shared by the scorer, the normalizer and the payload validator.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

/// `local@domain.tld` shape: no whitespace, exactly one `@`, a dot after it.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Offset-carrying layouts that RFC 3339 rejects (no colon in the offset).
const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Naive date-time layouts, read as UTC.
const NAIVE_DATE_TIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, read as midnight UTC.
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Basic email syntax check (`local@domain.tld`).
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Canonical, lowercase 8-4-4-4-12 UUID check.
pub fn is_canonical_uuid(value: &str) -> bool {
    value.len() == 36
        && value.chars().all(|c| !c.is_ascii_uppercase())
        && Uuid::try_parse(value).is_ok()
}

/// Years that render as plain `YYYY` in ISO 8601.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parses a date-time string in any of the layouts upstream sources send.
///
/// Years outside 0000-9999 are rejected so every accepted value renders in a
/// form this function parses back.
pub fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    parse_any_layout(raw).filter(has_four_digit_year)
}

fn parse_any_layout(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(raw, layout) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for layout in NAIVE_DATE_TIME_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, layout) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Parses a JSON value as a timestamp. Numbers are epoch milliseconds.
pub fn parse_date_time_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_time(s),
        Value::Number(n) => {
            let millis = n.as_f64()?;
            if !millis.is_finite() {
                return None;
            }
            Utc.timestamp_millis_opt(millis.trunc() as i64)
                .single()
                .filter(has_four_digit_year)
        }
        _ => None,
    }
}

fn has_four_digit_year(dt: &DateTime<Utc>) -> bool {
    YEAR_RANGE.contains(&dt.year())
}

/// Renders a timestamp as ISO 8601 with millisecond precision and a `Z` offset.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// ISO 8601 date-time check used by the `date-time` schema format.
///
/// A bare date parses but is rejected: a time component is required.
pub fn is_valid_date_time(value: &str) -> bool {
    value.contains('T') && parse_date_time(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a@b.c"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_canonical_uuid() {
        assert!(is_canonical_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_canonical_uuid("550E8400-E29B-41D4-A716-446655440000"));
        assert!(!is_canonical_uuid("550e8400e29b41d4a716446655440000"));
        assert!(!is_canonical_uuid("{550e8400-e29b-41d4-a716-446655440000}"));
        assert!(!is_canonical_uuid("not-a-uuid"));
    }

    #[test]
    fn test_parse_layouts() {
        let expected = "2024-01-15T10:30:00.000Z";
        for raw in [
            "2024-01-15T10:30:00Z",
            "2024-01-15T10:30:00.000Z",
            "2024-01-15T12:30:00+02:00",
            "2024-01-15T12:30:00+0200",
            "2024-01-15 10:30:00",
            "2024-01-15T10:30",
            "Mon, 15 Jan 2024 10:30:00 +0000",
        ] {
            let parsed = parse_date_time(raw).unwrap_or_else(|| panic!("failed on {raw}"));
            assert_eq!(format_timestamp(&parsed), expected, "layout {raw}");
        }

        let date_only = parse_date_time("2024-01-15").unwrap();
        assert_eq!(format_timestamp(&date_only), "2024-01-15T00:00:00.000Z");
        assert!(parse_date_time("next tuesday").is_none());
    }

    #[test]
    fn test_epoch_millis() {
        let parsed = parse_date_time_value(&serde_json::json!(1_705_314_600_000u64)).unwrap();
        assert_eq!(format_timestamp(&parsed), "2024-01-15T10:30:00.000Z");
        assert!(parse_date_time_value(&serde_json::json!(true)).is_none());
    }

    #[test]
    fn test_years_outside_four_digits_rejected() {
        assert!(parse_date_time_value(&serde_json::json!(1e15)).is_none());
        assert!(parse_date_time_value(&serde_json::json!(-62_198_755_200_000i64)).is_none());
        assert!(parse_date_time("+33658-09-27T01:46:40.000Z").is_none());
        assert!(parse_date_time("12024-01-15").is_none());

        let last = parse_date_time_value(&serde_json::json!(253_402_300_799_999i64)).unwrap();
        assert_eq!(format_timestamp(&last), "9999-12-31T23:59:59.999Z");
        assert_eq!(parse_date_time(&format_timestamp(&last)), Some(last));
    }

    #[test]
    fn test_date_time_requires_time_part() {
        assert!(is_valid_date_time("2024-01-15T10:30:00Z"));
        assert!(!is_valid_date_time("2024-01-15"));
        assert!(!is_valid_date_time("2024-13-45T99:00:00Z"));
    }
}

//! Total timestamp coercion.
//!
//! Chart timestamps arrive as text in a handful of layouts. Parsing never
//! fails: anything unrecognised yields `None` and the caller decides how to
//! count it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Canonical output layout for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a timestamp, returning `None` for blank or unrecognised text.
///
/// Offsets (`Z`, `+01:00`) are accepted and dropped after conversion to
/// UTC wall time. Date-only values anchor at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in &DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for fmt in &DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_common_layouts() {
        let expected = at(2024, 1, 1, 23, 59, 0);
        assert_eq!(parse_timestamp("2024-01-01T23:59:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 23:59:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 23:59"), Some(expected));
        assert_eq!(parse_timestamp("2024/01/01 23:59:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-01-01T23:59:00Z "), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-02"),
            Some(at(2024, 1, 2, 0, 0, 0))
        );
    }

    #[test]
    fn rejects_garbage_without_panicking() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2024-13-40 99:99"), None);
    }

    #[test]
    fn canonical_format() {
        assert_eq!(
            format_timestamp(at(2024, 1, 1, 1, 0, 0)),
            "2024-01-01T01:00:00"
        );
    }

    proptest! {
        #[test]
        fn parse_is_total(input in ".{0,40}") {
            let _ = parse_timestamp(&input);
        }

        #[test]
        fn canonical_form_round_trips(secs in 0i64..4_000_000_000) {
            let value = DateTime::from_timestamp(secs, 0).unwrap().naive_utc();
            prop_assert_eq!(parse_timestamp(&format_timestamp(value)), Some(value));
        }
    }
}

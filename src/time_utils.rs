// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a timestamp as the backend sends it.
///
/// Accepts RFC3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC), or a bare
/// date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Whether `raw` falls inside the optional inclusive day range.
///
/// Unparseable timestamps never match an active bound.
pub fn within_days(raw: &str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(ts) = parse_timestamp(raw) else {
        return false;
    };
    let day = ts.date_naive();
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-01T18:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T19:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T18:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-01"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn test_within_days_is_inclusive() {
        let from = parse_date("2025-03-01");
        let to = parse_date("2025-03-31");
        assert!(within_days("2025-03-01T00:00:00Z", from, to));
        assert!(within_days("2025-03-31T23:59:00Z", from, to));
        assert!(!within_days("2025-04-01T00:00:00Z", from, to));
        assert!(!within_days("not a date", from, None));
        assert!(within_days("not a date", None, None));
    }

    #[test]
    fn test_format_uses_z_suffix() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap();
        assert_eq!(format_utc_rfc3339(dt), "2025-03-01T18:30:00Z");
    }
}

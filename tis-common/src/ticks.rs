//! Conversion between .NET-style "ticks" timestamps and displayable dates.
//!
//! The catalog encodes `created`/`releaseDateTime`/`tisFileDeletedDate` as a
//! count of 100-nanosecond intervals since `0001-01-01T00:00:00Z` ("ticks"),
//! occasionally as an ISO-8601 string instead. Both shapes must round-trip
//! through the same formatted-date output.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Seconds between `0001-01-01` and the Unix epoch `1970-01-01`.
const DOTNET_EPOCH_DIFF_SECONDS: i64 = 62_135_596_800;

/// Parse a raw timestamp value (ticks or ISO-8601 string) into a UTC instant.
///
/// Returns `None` on any parse failure rather than erroring — callers treat
/// an unparseable timestamp as absent rather than erroring.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.contains('T') || raw.contains('-') {
        let trimmed = raw.strip_suffix('Z').unwrap_or(raw);
        let head = trimmed.split('.').next().unwrap_or(trimmed);
        return NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc());
    }

    let ticks: i128 = raw.parse().ok()?;
    let unix_seconds = ticks / 10_000_000 - DOTNET_EPOCH_DIFF_SECONDS as i128;
    let unix_seconds: i64 = unix_seconds.try_into().ok()?;
    DateTime::from_timestamp(unix_seconds, 0)
}

/// Format a raw timestamp value using `display_format` (a `strftime`-style
/// pattern, e.g. `"%d-%m-%Y %H:%M:%S"`).
///
/// `None` on parse failure, matching `parse_instant`.
pub fn format_instant(raw: &str, display_format: &str) -> Option<String> {
    parse_instant(raw).map(|dt| dt.format(display_format).to_string())
}

/// Whether a raw deletion timestamp represents an instant at or before `now`.
///
/// A future deletion date is not a deletion; an unparseable date is
/// conservatively treated as "not deleted".
pub fn is_past_or_now(raw: &str, now: DateTime<Utc>) -> bool {
    match parse_instant(raw) {
        Some(dt) => dt <= now,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ticks_round_trip_within_one_second() {
        // 638349664128090000 ticks ~= 2023-10-03 09:06:52 UTC.
        let ticks = "638349664128090000";
        let formatted = format_instant(ticks, "%d-%m-%Y %H:%M:%S").unwrap();
        let reparsed_seconds = {
            let dt = chrono::NaiveDateTime::parse_from_str(&formatted, "%d-%m-%Y %H:%M:%S")
                .unwrap()
                .and_utc();
            dt.timestamp()
        };
        let original_seconds = parse_instant(ticks).unwrap().timestamp();
        assert!((reparsed_seconds - original_seconds).abs() <= 1);
    }

    #[test]
    fn iso_string_is_parsed_and_reformatted() {
        let formatted = format_instant("2023-10-03T09:06:52Z", "%d-%m-%Y %H:%M:%S").unwrap();
        assert_eq!(formatted, "03-10-2023 09:06:52");
    }

    #[test]
    fn future_deletion_is_not_past() {
        let future = Utc::now() + chrono::Duration::days(365);
        let ticks_value = dotnet_ticks_for(future);
        assert!(!is_past_or_now(&ticks_value, Utc::now()));
    }

    #[test]
    fn malformed_timestamp_parses_to_none() {
        assert_eq!(parse_instant("not-a-date-or-ticks!!"), None);
        assert!(!is_past_or_now("not-a-date-or-ticks!!", Utc::now()));
    }

    fn dotnet_ticks_for(dt: DateTime<Utc>) -> String {
        let unix_seconds = dt.timestamp() as i128;
        let ticks = (unix_seconds + DOTNET_EPOCH_DIFF_SECONDS as i128) * 10_000_000;
        ticks.to_string()
    }

    #[test]
    fn epoch_sanity() {
        let dt = Utc.with_ymd_and_hms(2023, 10, 3, 9, 6, 52).unwrap();
        let ticks = dotnet_ticks_for(dt);
        let parsed = parse_instant(&ticks).unwrap();
        assert_eq!(parsed.timestamp(), dt.timestamp());
    }
}

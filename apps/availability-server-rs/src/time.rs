use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Human-facing timestamp format used by every response.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const REPORT_DATE_FORMAT: &str = "%m/%d/%y";

const SOURCE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

pub fn format_report_date(ts: DateTime<Utc>) -> String {
    ts.format(REPORT_DATE_FORMAT).to_string()
}

/// Status rows carry zone-less text written against the UTC clock.
pub fn parse_source_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    SOURCE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
}

/// Accepts RFC3339, the stored row formats, or a bare date (midnight).
pub fn parse_query_instant(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = parse_source_timestamp(trimmed) {
        return Some(parsed);
    }
    parse_report_day(trimmed)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn parse_report_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// `[00:00, next 00:00)` for a calendar day.
pub fn day_bounds(day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = day.and_hms_opt(0, 0, 0)?.and_utc();
    let end = start.checked_add_signed(Duration::days(1))?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_both_stored_representations() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(parse_source_timestamp("2024-03-09 14:05:07"), Some(expected));
        assert_eq!(
            parse_source_timestamp("2024-03-09T14:05:07.250000"),
            Some(expected + Duration::milliseconds(250))
        );
        assert_eq!(
            parse_source_timestamp("2024-03-09 14:05:07.5"),
            Some(expected + Duration::milliseconds(500))
        );
    }

    #[test]
    fn rejects_unparseable_rows() {
        assert_eq!(parse_source_timestamp("09/03/2024 14:05"), None);
        assert_eq!(parse_source_timestamp(""), None);
    }

    #[test]
    fn query_instants_accept_rfc3339_and_dates() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        assert_eq!(parse_query_instant("2024-03-09"), Some(midnight));
        assert_eq!(
            parse_query_instant("2024-03-09T02:00:00+02:00"),
            Some(midnight)
        );
        assert_eq!(parse_query_instant("2024-03-09 00:00:00"), Some(midnight));
        assert_eq!(parse_query_instant("soon"), None);
    }

    #[test]
    fn formats_without_zone() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-09 14:05:07");
        assert_eq!(format_report_date(ts), "03/09/24");
    }

    #[test]
    fn day_bounds_cover_one_day() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let (start, end) = day_bounds(day).unwrap();
        assert_eq!(end - start, Duration::days(1));
        assert_eq!(format_timestamp(end), "2024-02-29 00:00:00");
    }

    #[test]
    fn day_bounds_of_the_last_representable_day_is_none() {
        assert_eq!(parse_report_day("+262142-12-31"), Some(NaiveDate::MAX));
        assert_eq!(day_bounds(NaiveDate::MAX), None);
    }
}

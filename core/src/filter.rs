//! Trailing time-window filter.

use crate::record::ScoreRecord;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a stored timestamp into a local instant.
///
/// Accepts RFC 3339, naive ISO-8601 (read as local time) and bare dates.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Local.from_local_datetime(&naive).earliest()
}

/// Keep records from the last `days` days relative to `now`.
///
/// `None` keeps everything. Records whose timestamp cannot be parsed are kept.
pub fn filter_by_days(
    records: Vec<ScoreRecord>,
    days: Option<u32>,
    now: DateTime<Local>,
) -> Vec<ScoreRecord> {
    let Some(days) = days else {
        return records;
    };
    let cutoff = now - TimeDelta::days(i64::from(days));

    records
        .into_iter()
        .filter(|r| match parse_timestamp(r.when()) {
            Some(at) => at >= cutoff,
            None => {
                tracing::debug!(timestamp = r.when(), "unparseable timestamp, keeping record");
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn rec(score: i64, timestamp: &str, date: &str) -> ScoreRecord {
        ScoreRecord {
            score,
            timestamp: timestamp.into(),
            date: date.into(),
        }
    }

    fn kept(records: Vec<ScoreRecord>, days: Option<u32>) -> Vec<i64> {
        filter_by_days(records, days, now()).iter().map(|r| r.score).collect()
    }

    #[test]
    fn none_keeps_everything() {
        let records = vec![rec(1, "1999-01-01T00:00:00", ""), rec(2, "garbage", "")];
        assert_eq!(kept(records, None), vec![1, 2]);
    }

    #[test]
    fn drops_records_older_than_window() {
        let records = vec![
            rec(1, "2025-06-14T12:00:00", ""),
            rec(2, "2025-06-01T12:00:00", ""),
            rec(3, "2025-06-08T12:00:00.250000", ""),
        ];
        assert_eq!(kept(records, Some(7)), vec![1, 3]);
    }

    #[test]
    fn malformed_timestamp_is_kept() {
        let records = vec![rec(1, "not-a-date", ""), rec(2, "2020-01-01T00:00:00", "")];
        assert_eq!(kept(records, Some(7)), vec![1]);
    }

    #[test]
    fn falls_back_to_date_field() {
        let records = vec![
            rec(1, "", "2025-06-14 09:30:00"),
            rec(2, "", "2025-01-01 09:30:00"),
            rec(3, "", ""),
        ];
        assert_eq!(kept(records, Some(7)), vec![1, 3]);
    }

    #[test]
    fn parses_common_forms() {
        assert!(parse_timestamp("2025-06-14T10:00:00Z").is_some());
        assert!(parse_timestamp("2025-06-14T10:00:00+02:00").is_some());
        assert!(parse_timestamp("2025-06-14T10:00:00.123456").is_some());
        assert!(parse_timestamp("2025-06-14 10:00:00").is_some());
        assert!(parse_timestamp("2025-06-14T10:00").is_some());
        assert!(parse_timestamp("2025-06-14").is_some());
        assert!(parse_timestamp("14/06/2025").is_none());
        assert!(parse_timestamp("").is_none());
    }
}

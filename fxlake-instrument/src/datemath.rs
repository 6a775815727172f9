//! UTC-exclusive date arithmetic shared by the importer and materializer.
//!
//! Every function here takes and returns `chrono::NaiveDate`/`DateTime<Utc>`
//! — never `Local` — so a local-time day-boundary bug
//! (`Date.getDate()`/`setDate()` mis-filing blobs by one day) has no
//! equivalent entry point in this module.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// UTC midnight for the given calendar day.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time"),
    )
}

/// The UTC calendar day a timestamp falls in.
pub fn utc_day(t: DateTime<Utc>) -> NaiveDate {
    t.date_naive()
}

/// Inclusive count of UTC calendar days spanned by `[start, end]`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Every UTC calendar day in `[start, end]`, inclusive.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        days.push(cursor);
        cursor += Duration::days(1);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_midnight_has_zero_time_components() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let dt = utc_midnight(date);
        assert_eq!(dt.timestamp(), 1_703_980_800);
    }

    #[test]
    fn days_inclusive_counts_both_endpoints() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 11, 7).unwrap();
        assert_eq!(days_inclusive(start, end), 7);
    }

    #[test]
    fn days_in_range_is_contiguous() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let days = days_in_range(start, end);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], start);
        assert_eq!(days[2], end);
    }
}

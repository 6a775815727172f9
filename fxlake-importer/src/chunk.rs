//! UTC-day-aligned chunk walking and adaptive sub-chunking.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};

pub const DEFAULT_CHUNK_HOURS: i64 = 24;
pub const SUB_CHUNK_HOURS_COARSE: i64 = 6;
pub const SUB_CHUNK_HOURS_FINE: i64 = 1;

/// The market-closed window: Saturday 00:00 UTC through Sunday 22:00 UTC,
/// relative to the week containing `t`.
fn closed_window_for_week_of(t: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    // chrono's `num_days_from_monday`: Mon=0 .. Sun=6.
    let days_since_saturday = (t.weekday().num_days_from_monday() + 2) % 7;
    let saturday: NaiveDate = t.date_naive() - Duration::days(days_since_saturday as i64);
    let saturday_midnight = Utc.from_utc_datetime(&saturday.and_hms_opt(0, 0, 0).unwrap());
    let sunday_reopen = saturday_midnight + Duration::days(1) + Duration::hours(22);
    (saturday_midnight, sunday_reopen)
}

/// Is `[start, end)` entirely contained in the weekend market-closed window?
fn is_chunk_entirely_closed(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    let (closed_start, closed_end) = closed_window_for_week_of(start);
    start >= closed_start && end <= closed_end
}

/// Walk `[start, end)` into `chunk_hours`-wide UTC-aligned chunks, dropping
/// any chunk that falls entirely within the weekend closed window. The
/// final chunk is clipped to `end`.
pub fn walk_chunks(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    chunk_hours: i64,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut chunks = Vec::new();
    let mut cursor = start;
    let step = Duration::hours(chunk_hours.max(1));

    while cursor < end {
        let chunk_end = (cursor + step).min(end);
        if !is_chunk_entirely_closed(cursor, chunk_end) {
            chunks.push((cursor, chunk_end));
        }
        cursor = chunk_end;
    }

    chunks
}

/// Split `[start, end)` into `sub_hours`-wide sub-chunks, the adaptive
/// descent's recursive step on a `ProviderBuffer` failure.
pub fn split(start: DateTime<Utc>, end: DateTime<Utc>, sub_hours: i64) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut chunks = Vec::new();
    let mut cursor = start;
    let step = Duration::hours(sub_hours.max(1));

    while cursor < end {
        let chunk_end = (cursor + step).min(end);
        chunks.push((cursor, chunk_end));
        cursor = chunk_end;
    }

    chunks
}

/// The next smaller sub-chunk width to retry at on a `ProviderBuffer`
/// failure: 6h if the current span is wider than 6h, else 1h. Returns
/// `None` once the current span is already at or below 1h — the recursion's
/// base case, where the caller logs "no data available" and advances.
pub fn next_split_hours(span: Duration) -> Option<i64> {
    if span <= Duration::hours(SUB_CHUNK_HOURS_FINE) {
        None
    } else if span > Duration::hours(SUB_CHUNK_HOURS_COARSE) {
        Some(SUB_CHUNK_HOURS_COARSE)
    } else {
        Some(SUB_CHUNK_HOURS_FINE)
    }
}

//! Component E.3 — coverage/gap analysis over the materialized 5-minute
//! table. The day-set-to-report transform is pure and
//! testable without a relational store; [`crate::store::CandleStore`] is
//! the only piece that talks to Postgres to produce the day set.

use fxlake_instrument::datemath;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    pub total_days: i64,
    pub covered_days: i64,
    pub missing_ranges: Vec<(NaiveDate, NaiveDate)>,
    pub covered: bool,
}

/// Build a [`CoverageReport`] for `[start, end]` given the set of UTC
/// calendar days that have at least one materialized row. `missing_ranges`
/// is formed by merging contiguous missing days; it is pairwise
/// non-overlapping and sorted by construction, since the input days are
/// walked in order.
pub fn build_coverage(
    start: NaiveDate,
    end: NaiveDate,
    covered_day_set: &BTreeSet<NaiveDate>,
) -> CoverageReport {
    let all_days = datemath::days_in_range(start, end);
    let total_days = datemath::days_inclusive(start, end);
    let covered_days = all_days
        .iter()
        .filter(|day| covered_day_set.contains(day))
        .count() as i64;

    let mut missing_ranges = Vec::new();
    let mut run_start: Option<NaiveDate> = None;
    let mut run_end: Option<NaiveDate> = None;

    for day in &all_days {
        if covered_day_set.contains(day) {
            if let (Some(s), Some(e)) = (run_start.take(), run_end.take()) {
                missing_ranges.push((s, e));
            }
        } else {
            run_start.get_or_insert(*day);
            run_end = Some(*day);
        }
    }
    if let (Some(s), Some(e)) = (run_start, run_end) {
        missing_ranges.push((s, e));
    }

    CoverageReport {
        total_days,
        covered_days,
        covered: missing_ranges.is_empty(),
        missing_ranges,
    }
}

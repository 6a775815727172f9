//! Date argument parsing. Dates are always parsed as UTC midnight — there
//! is no local-time parsing path anywhere in this CLI.

use crate::commands::error::CliError;
use chrono::{DateTime, NaiveDate, Utc};
use fxlake_instrument::datemath;

pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CliError::InvalidArgument(format!("expected YYYY-MM-DD, got {raw:?}")))
}

pub fn parse_utc_midnight(raw: &str) -> Result<DateTime<Utc>, CliError> {
    Ok(datemath::utc_midnight(parse_date(raw)?))
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DD:YYYY-MM-DD` into an inclusive day
/// range.
pub fn parse_day_range(raw: &str) -> Result<(NaiveDate, NaiveDate), CliError> {
    match raw.split_once(':') {
        Some((start, end)) => {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            if end < start {
                return Err(CliError::InvalidArgument(format!(
                    "range end {end} is before start {start}"
                )));
            }
            Ok((start, end))
        }
        None => {
            let day = parse_date(raw)?;
            Ok((day, day))
        }
    }
}

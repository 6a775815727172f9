//! Relational store for `candles_5m` —
//! batched upsert, continuous-aggregate refresh, and the covered-day query
//! behind [`crate::coverage`]. Grounded on the `TimescaleStorage` pattern in
//! one `PgPool` held directly (no lazily-initialized global client),
//! `ON CONFLICT ... DO UPDATE SET` per field.

use crate::coverage::{build_coverage, CoverageReport};
use crate::error::MaterializeError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fxlake_instrument::{Candle, Symbol};
use sqlx::{PgPool, QueryBuilder};
use std::collections::BTreeSet;

/// Continuous aggregates maintained by the relational store over
/// `candles_5m`.
pub const CONTINUOUS_AGGREGATES: &[&str] = &["candles_15m", "candles_1h", "candles_4h", "candles_12h"];

/// Rows per `INSERT` statement, bounded by the relational store's
/// parameter limit.
pub const UPSERT_BATCH_SIZE: usize = 500;

pub struct CandleStore {
    pool: PgPool,
}

impl CandleStore {
    pub async fn connect(connection_url: &str) -> Result<Self, MaterializeError> {
        let pool = PgPool::connect(connection_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert `candles` into `candles_5m` in batches of
    /// [`UPSERT_BATCH_SIZE`], `DO UPDATE SET` on every field — re-materialization
    /// is authoritative. Invalid candles are dropped before
    /// batching. Returns the number of rows actually sent.
    pub async fn upsert_candles(&self, candles: &[Candle]) -> Result<u64, MaterializeError> {
        let valid: Vec<&Candle> = candles.iter().filter(|c| c.is_valid()).collect();
        let mut written = 0u64;

        for batch in valid.chunks(UPSERT_BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
                "INSERT INTO candles_5m (time, symbol, open, high, low, close, volume, trades) ",
            );
            builder.push_values(batch, |mut row, candle| {
                row.push_bind(bucket_time(candle.bucket_start))
                    .push_bind(candle.symbol.as_str())
                    .push_bind(candle.open)
                    .push_bind(candle.high)
                    .push_bind(candle.low)
                    .push_bind(candle.close)
                    .push_bind(candle.volume)
                    .push_bind(candle.trades as i32);
            });
            builder.push(
                " ON CONFLICT (symbol, time) DO UPDATE SET \
                  open = EXCLUDED.open, \
                  high = EXCLUDED.high, \
                  low = EXCLUDED.low, \
                  close = EXCLUDED.close, \
                  volume = EXCLUDED.volume, \
                  trades = EXCLUDED.trades",
            );
            builder.build().execute(&self.pool).await?;
            written += batch.len() as u64;
        }

        Ok(written)
    }

    /// Request a refresh of every continuous aggregate over `candles_5m`
    ///. Issued per-view so one failing refresh doesn't block
    /// the others.
    pub async fn refresh_continuous_aggregates(&self) -> Result<(), MaterializeError> {
        for view in CONTINUOUS_AGGREGATES {
            sqlx::query(&format!("CALL refresh_continuous_aggregate('{view}', NULL, NULL)"))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Distinct UTC calendar days with at least one row in `candles_5m` for
    /// `symbol` within `[start, end]`, the input to [`build_coverage`].
    pub async fn covered_days(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, MaterializeError> {
        let rows: Vec<(NaiveDate,)> = sqlx::query_as(
            "SELECT DISTINCT (time AT TIME ZONE 'UTC')::date \
             FROM candles_5m WHERE symbol = $1 AND time >= $2 AND time < $3",
        )
        .bind(symbol.as_str())
        .bind(start_of_day(start))
        .bind(start_of_day(end) + chrono::Duration::days(1))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(day,)| day).collect())
    }

    pub async fn coverage(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CoverageReport, MaterializeError> {
        let covered = self.covered_days(symbol, start, end).await?;
        Ok(build_coverage(start, end, &covered))
    }
}

fn bucket_time(bucket_start: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(bucket_start, 0).single().unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxlake_instrument::Symbol;

    #[test]
    fn upsert_batch_size_matches_parameter_limit_note() {
        assert_eq!(UPSERT_BATCH_SIZE, 500);
    }

    #[test]
    fn continuous_aggregates_cover_all_four_higher_timeframes() {
        assert_eq!(CONTINUOUS_AGGREGATES, &["candles_15m", "candles_1h", "candles_4h", "candles_12h"]);
    }

    #[test]
    fn invalid_candles_are_filtered_before_batching() {
        let symbol = Symbol::canonicalize("EURUSD");
        let valid = Candle {
            bucket_start: 0,
            symbol: symbol.clone(),
            open: 1.1,
            high: 1.2,
            low: 1.0,
            close: 1.15,
            volume: 0.0,
            trades: 1,
        };
        let invalid = Candle {
            bucket_start: 300,
            symbol,
            open: f64::NAN,
            high: 1.2,
            low: 1.0,
            close: 1.15,
            volume: 0.0,
            trades: 1,
        };
        let candles = vec![valid, invalid];
        let kept: Vec<&Candle> = candles.iter().filter(|c| c.is_valid()).collect();
        assert_eq!(kept.len(), 1);
    }
}

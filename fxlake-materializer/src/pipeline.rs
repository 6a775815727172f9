//! Day-level orchestration: read a day's tick blobs out of the object
//! store, build candles, upsert, refresh continuous aggregates. This is
//! the glue `fxlake-cli`'s `materialize`/`backfill`
//! subcommands call into; [`crate::candles`] and [`crate::store`] stay
//! pure/DB-only respectively so they're independently testable.

use crate::candles::build_candles;
use crate::clean::CleanStats;
use crate::error::MaterializeError;
use crate::store::CandleStore;
use chrono::NaiveDate;
use fxlake_data::store::TickRecord;
use fxlake_instrument::{Symbol, Tick};
use futures::StreamExt;
use object_store::{path::Path as ObjectPath, ObjectStore};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub blobs_read: u32,
    pub ticks_read: u64,
    pub candles_written: u64,
}

/// Ticks loaded for one symbol/day, plus how many blobs they came from —
/// the latter feeds [`MaterializeSummary::blobs_read`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadedTicks {
    pub ticks: Vec<Tick>,
    pub blobs_read: u32,
}

/// List and decode every tick blob under `ticks/{symbol}/{yyyy}/{mm}/{dd}/`
/// for one UTC day. Malformed blobs are a hard error — a corrupt blob is
/// an infrastructure failure, not a skippable one.
pub async fn load_ticks_for_day(
    object_store: &Arc<dyn ObjectStore>,
    symbol: &Symbol,
    day: NaiveDate,
) -> Result<LoadedTicks, MaterializeError> {
    let prefix = ObjectPath::from(format!(
        "ticks/{symbol}/{:04}/{:02}/{:02}/",
        day.format("%Y"),
        day.format("%m"),
        day.format("%d"),
    ));

    let mut ticks = Vec::new();
    let mut blobs_read = 0u32;
    let mut listing = object_store.list(Some(&prefix));
    while let Some(meta) = listing.next().await {
        let meta = meta?;
        let bytes = object_store.get(&meta.location).await?.bytes().await?;
        let records: Vec<TickRecord> = serde_json::from_slice(&bytes)?;
        ticks.extend(records.into_iter().map(Tick::from));
        blobs_read += 1;
    }

    Ok(LoadedTicks { ticks, blobs_read })
}

/// Materialize one UTC day for one symbol: load, build candles, upsert,
/// refresh. A quality-gate failure aborts this day only; the caller
/// continues to the next day rather than failing the whole job.
pub async fn materialize_day(
    object_store: &Arc<dyn ObjectStore>,
    candle_store: &CandleStore,
    symbol: &Symbol,
    day: NaiveDate,
    dry_run: bool,
) -> Result<MaterializeSummary, MaterializeError> {
    let loaded = load_ticks_for_day(object_store, symbol, day).await?;
    let mut summary = MaterializeSummary {
        blobs_read: loaded.blobs_read,
        ticks_read: loaded.ticks.len() as u64,
        candles_written: 0,
    };

    let (candles, stats) = build_candles(symbol, &loaded.ticks)?;
    log_clean_stats(symbol, day, &stats);

    if candles.is_empty() {
        return Ok(summary);
    }

    if dry_run {
        debug!(%symbol, %day, candles = candles.len(), "dry run, skipping upsert");
        return Ok(summary);
    }

    summary.candles_written = candle_store.upsert_candles(&candles).await?;
    candle_store.refresh_continuous_aggregates().await?;

    Ok(summary)
}

fn log_clean_stats(symbol: &Symbol, day: NaiveDate, stats: &CleanStats) {
    if stats.invalid > 0 || stats.duplicates > 0 {
        warn!(
            %symbol,
            %day,
            invalid = stats.invalid,
            duplicates = stats.duplicates,
            total = stats.total,
            "ticks dropped during cleaning",
        );
    }
}

/// Per-bucket statistics over every blob for one symbol/day, for the CLI's
/// `analyze` subcommand. Unlike
/// `materialize_day`, this never writes to the relational store.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BucketStatistics {
    pub ticks_seen: u64,
    pub invalid_ticks: u64,
    pub candle_count: u64,
    pub drop_rate: f64,
}

pub async fn bucket_statistics(
    object_store: &Arc<dyn ObjectStore>,
    symbol: &Symbol,
    day: NaiveDate,
) -> Result<BucketStatistics, MaterializeError> {
    let loaded = load_ticks_for_day(object_store, symbol, day).await?;
    let (_, stats) = crate::clean::clean_and_dedupe(&loaded.ticks);
    let (candles, _) =
        build_candles(symbol, &loaded.ticks).unwrap_or_else(|_| (Vec::new(), stats));

    Ok(BucketStatistics {
        ticks_seen: stats.total as u64,
        invalid_ticks: stats.invalid as u64,
        candle_count: candles.len() as u64,
        drop_rate: stats.drop_rate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxlake_data::store::{write_blob, MonotonicSuffix};
    use object_store::memory::InMemory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn eurusd() -> Symbol {
        Symbol::canonicalize("EURUSD")
    }

    #[tokio::test]
    async fn loads_ticks_written_by_the_batcher() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = eurusd();
        let suffix = MonotonicSuffix::default();
        let ticks = vec![Tick::new(1_704_067_200.0, 1.1, 1.1002)];
        write_blob(&store, &symbol, 1_704_067_200.0, &ticks, &suffix).await.unwrap();

        let loaded = load_ticks_for_day(&store, &symbol, date(2024, 1, 1)).await.unwrap();
        assert_eq!(loaded.ticks.len(), 1);
        assert_eq!(loaded.ticks[0], ticks[0]);
        assert_eq!(loaded.blobs_read, 1);
    }

    #[tokio::test]
    async fn missing_day_yields_empty_tick_set() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let loaded = load_ticks_for_day(&store, &eurusd(), date(2024, 1, 1)).await.unwrap();
        assert!(loaded.ticks.is_empty());
        assert_eq!(loaded.blobs_read, 0);
    }

    #[tokio::test]
    async fn multiple_blobs_for_the_same_day_are_merged() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = eurusd();
        let suffix = MonotonicSuffix::default();
        write_blob(&store, &symbol, 1_704_067_200.0, &[Tick::new(1_704_067_200.0, 1.1, 1.1002)], &suffix)
            .await
            .unwrap();
        write_blob(&store, &symbol, 1_704_067_200.0, &[Tick::new(1_704_067_260.0, 1.1004, 1.1006)], &suffix)
            .await
            .unwrap();

        let loaded = load_ticks_for_day(&store, &symbol, date(2024, 1, 1)).await.unwrap();
        assert_eq!(loaded.ticks.len(), 2);
        assert_eq!(loaded.blobs_read, 2);
    }

    #[tokio::test]
    async fn bucket_statistics_reports_ticks_and_drop_rate_without_writing_candles() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = eurusd();
        let suffix = MonotonicSuffix::default();
        let ticks = vec![
            Tick::new(1_704_067_200.0, 1.1, 1.1002),
            Tick::new(1_704_067_260.0, 1.3, 1.1), // crossed spread
        ];
        write_blob(&store, &symbol, 1_704_067_200.0, &ticks, &suffix).await.unwrap();

        let stats = bucket_statistics(&store, &symbol, date(2024, 1, 1)).await.unwrap();
        assert_eq!(stats.ticks_seen, 2);
        assert_eq!(stats.invalid_ticks, 1);
        assert_eq!(stats.candle_count, 1);
    }
}

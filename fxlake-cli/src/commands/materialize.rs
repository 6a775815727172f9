//! `fxlake materialize SYMBOL YYYY-MM-DD[:YYYY-MM-DD] [--dry-run]`.
//! A quality-gate failure on one day aborts that day only — the job
//! continues to the next day, logs the failure, and still exits non-zero
//! overall if any day failed its quality gate.

use crate::commands::dates::parse_day_range;
use crate::commands::error::CliError;
use crate::config::{ObjectStoreConfig, RelationalConfig};
use fxlake_instrument::{datemath, Symbol};
use fxlake_materializer::{materialize_day, CandleStore, MaterializeError};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

pub async fn run(symbol: &str, range: &str, dry_run: bool) -> Result<(), CliError> {
    let symbol = Symbol::canonicalize(symbol);
    let (start, end) = parse_day_range(range)?;

    let object_store_config = ObjectStoreConfig::from_env()?;
    let relational_config = RelationalConfig::from_env()?;

    let store = object_store_config.build()?;
    let pool = PgPoolOptions::new()
        .max_connections(relational_config.pool_size)
        .acquire_timeout(relational_config.connect_timeout)
        .connect(&relational_config.connection_url)
        .await
        .map_err(MaterializeError::from)?;
    let candle_store = CandleStore::from_pool(pool);

    let mut total_candles = 0u64;
    let mut total_ticks = 0u64;
    let mut quality_failures = 0u32;

    for day in datemath::days_in_range(start, end) {
        match materialize_day(&store, &candle_store, &symbol, day, dry_run).await {
            Ok(summary) => {
                total_candles += summary.candles_written;
                total_ticks += summary.ticks_read;
                info!(%symbol, %day, blobs = summary.blobs_read, candles = summary.candles_written, ticks = summary.ticks_read, dry_run, "materialized day");
            }
            Err(error @ MaterializeError::Quality { .. }) => {
                quality_failures += 1;
                error!(%symbol, %day, %error, "quality gate failed, skipping day");
            }
            Err(error) => return Err(error.into()),
        }
    }

    println!(
        "materialize {symbol} {start}:{end}: {total_candles} candles written from {total_ticks} ticks, {quality_failures} day(s) failed the quality gate{}",
        if dry_run { " (dry run)" } else { "" },
    );

    if quality_failures > 0 {
        return Err(CliError::QualityGateFailures(quality_failures));
    }

    Ok(())
}

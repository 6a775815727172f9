//! `fxlake backfill SYMBOL START END [--dry-run]`: "fills
//! missing Fridays using the importer". Coverage analysis (component E.3)
//! finds the gaps; only the Fridays among them are re-imported and
//! re-materialized — every other missing weekday is left alone, since a
//! missing non-Friday in this pipeline's source data is normal (the
//! provider's weekend-adjacent days are the ones that flake).

use crate::commands::dates::parse_utc_midnight;
use crate::commands::error::CliError;
use crate::config::{HistoricalProviderConfig, ObjectStoreConfig, RelationalConfig};
use chrono::{Datelike, Weekday};
use fxlake_importer::{import_range, HttpHistoricalProvider, ImportConfig};
use fxlake_instrument::{datemath, Symbol};
use fxlake_materializer::{materialize_day, CandleStore, MaterializeError};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::{info, warn};

pub async fn run(symbol: &str, start: &str, end: &str, dry_run: bool) -> Result<(), CliError> {
    let symbol = Symbol::canonicalize(symbol);
    let start_dt = parse_utc_midnight(start)?;
    let end_dt = parse_utc_midnight(end)?;
    let start_date = datemath::utc_day(start_dt);
    let end_date = datemath::utc_day(end_dt);

    let object_store_config = ObjectStoreConfig::from_env()?;
    let relational_config = RelationalConfig::from_env()?;
    let provider_config = HistoricalProviderConfig::from_env()?;

    let store = object_store_config.build()?;
    let pool = PgPoolOptions::new()
        .max_connections(relational_config.pool_size)
        .acquire_timeout(relational_config.connect_timeout)
        .connect(&relational_config.connection_url)
        .await
        .map_err(MaterializeError::from)?;
    let candle_store = CandleStore::from_pool(pool);
    let provider = HttpHistoricalProvider::new(provider_config.base_url, provider_config.api_key);

    let coverage = candle_store.coverage(&symbol, start_date, end_date).await?;
    let missing_fridays: Vec<_> = coverage
        .missing_ranges
        .iter()
        .flat_map(|(range_start, range_end)| datemath::days_in_range(*range_start, *range_end))
        .filter(|day| day.weekday() == Weekday::Fri)
        .collect();

    if missing_fridays.is_empty() {
        println!("backfill {symbol} {start_date}:{end_date}: no missing Fridays");
        return Ok(());
    }

    if dry_run {
        for day in &missing_fridays {
            println!("backfill {symbol} {day}: would import and materialize (dry run)");
        }
        return Ok(());
    }

    let import_config = ImportConfig {
        chunk_hours: 24,
        between_chunk_delay: Duration::from_secs(10),
    };

    let mut filled = 0u32;
    for day in &missing_fridays {
        let day_start = datemath::utc_midnight(*day);
        let day_end = day_start + chrono::Duration::days(1);

        let import_summary =
            import_range(&provider, &store, &symbol, day_start, day_end, &import_config).await?;
        info!(%symbol, %day, blobs = import_summary.blobs_written, "backfill re-imported missing Friday");

        match materialize_day(&store, &candle_store, &symbol, *day, false).await {
            Ok(summary) => {
                filled += 1;
                info!(%symbol, %day, candles = summary.candles_written, "backfill materialized Friday");
            }
            Err(error @ MaterializeError::Quality { .. }) => {
                warn!(%symbol, %day, %error, "backfilled Friday still fails the quality gate");
            }
            Err(error) => return Err(error.into()),
        }
    }

    println!(
        "backfill {symbol} {start_date}:{end_date}: {filled}/{} missing Friday(s) filled",
        missing_fridays.len(),
    );

    Ok(())
}

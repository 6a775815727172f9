//! `fxlake import SYMBOL START END [chunk_hours] [delay_sec]`.

use crate::commands::dates::parse_utc_midnight;
use crate::commands::error::CliError;
use crate::config::{HistoricalProviderConfig, ObjectStoreConfig};
use fxlake_importer::{import_range, HttpHistoricalProvider, ImportConfig};
use fxlake_instrument::Symbol;
use std::time::Duration;
use tracing::info;

pub async fn run(
    symbol: &str,
    start: &str,
    end: &str,
    chunk_hours: Option<i64>,
    delay_sec: Option<u64>,
) -> Result<(), CliError> {
    let symbol = Symbol::canonicalize(symbol);
    let start = parse_utc_midnight(start)?;
    let end = parse_utc_midnight(end)?;

    let object_store_config = ObjectStoreConfig::from_env()?;
    let provider_config = HistoricalProviderConfig::from_env()?;

    let store = object_store_config.build()?;
    let provider = HttpHistoricalProvider::new(provider_config.base_url, provider_config.api_key);

    let config = ImportConfig {
        chunk_hours: chunk_hours.unwrap_or(fxlake_importer::chunk::DEFAULT_CHUNK_HOURS),
        between_chunk_delay: Duration::from_secs(delay_sec.unwrap_or(10)),
    };

    info!(%symbol, %start, %end, ?config, "starting historical import");
    let summary = import_range(&provider, &store, &symbol, start, end, &config).await?;

    info!(
        %symbol,
        chunks_attempted = summary.chunks_attempted,
        chunks_succeeded = summary.chunks_succeeded,
        chunks_skipped = summary.chunks_skipped,
        blobs_written = summary.blobs_written,
        ticks_written = summary.ticks_written,
        "import finished",
    );
    println!(
        "import {symbol}: {} chunks attempted, {} succeeded, {} skipped, {} blobs written, {} ticks written",
        summary.chunks_attempted,
        summary.chunks_succeeded,
        summary.chunks_skipped,
        summary.blobs_written,
        summary.ticks_written,
    );

    Ok(())
}

//! `fxlake analyze [--sample] [--output=FILE]`: "walks the
//! bucket and prints per-symbol statistics". Discovers every
//! `(symbol, day)` pair actually present in the data lake by listing blob
//! keys rather than requiring the caller to name symbols/dates up front —
//! this is an operational diagnostic, not a job with a known input range.

use crate::commands::error::CliError;
use crate::config::ObjectStoreConfig;
use chrono::NaiveDate;
use fxlake_instrument::Symbol;
use fxlake_materializer::bucket_statistics;
use futures::StreamExt;
use object_store::{path::Path as ObjectPath, ObjectStore};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use tracing::info;

/// Only sample every Nth discovered `(symbol, day)` pair when `--sample`
/// is set, instead of walking the whole bucket — a bucket with years of
/// history can hold far more blobs than an interactive run should read.
const SAMPLE_STRIDE: usize = 10;

#[derive(Debug, Default, Clone, Serialize)]
struct SymbolReport {
    symbol: String,
    days_seen: u64,
    ticks_seen: u64,
    invalid_ticks: u64,
    candle_count: u64,
}

pub async fn run(sample: bool, output: Option<String>) -> Result<(), CliError> {
    let object_store_config = ObjectStoreConfig::from_env()?;
    let store = object_store_config.build()?;

    let mut pairs: BTreeSet<(Symbol, NaiveDate)> = BTreeSet::new();
    let mut listing = store.list(Some(&ObjectPath::from("ticks/")));
    while let Some(meta) = listing.next().await {
        let meta = meta?;
        if let Some(pair) = parse_symbol_day(meta.location.as_ref()) {
            pairs.insert(pair);
        }
    }

    let pairs: Vec<_> = if sample {
        pairs.into_iter().step_by(SAMPLE_STRIDE).collect()
    } else {
        pairs.into_iter().collect()
    };

    info!(pairs = pairs.len(), sample, "analyzing discovered symbol/day pairs");

    let mut reports: BTreeMap<String, SymbolReport> = BTreeMap::new();
    for (symbol, day) in &pairs {
        let stats = bucket_statistics(&store, symbol, *day).await?;
        let entry = reports.entry(symbol.as_str().to_string()).or_insert_with(|| SymbolReport {
            symbol: symbol.as_str().to_string(),
            ..Default::default()
        });
        entry.days_seen += 1;
        entry.ticks_seen += stats.ticks_seen;
        entry.invalid_ticks += stats.invalid_ticks;
        entry.candle_count += stats.candle_count;
    }

    let reports: Vec<SymbolReport> = reports.into_values().collect();

    match output {
        Some(path) => {
            let json = serde_json::to_vec_pretty(&reports).expect("report always serializes");
            let mut file = std::fs::File::create(&path).map_err(|source| CliError::OutputWrite {
                path: path.clone(),
                source,
            })?;
            file.write_all(&json).map_err(|source| CliError::OutputWrite { path, source })?;
        }
        None => {
            println!("{:<12} {:>8} {:>12} {:>12} {:>12}", "symbol", "days", "ticks", "invalid", "candles");
            for report in &reports {
                println!(
                    "{:<12} {:>8} {:>12} {:>12} {:>12}",
                    report.symbol, report.days_seen, report.ticks_seen, report.invalid_ticks, report.candle_count,
                );
            }
        }
    }

    Ok(())
}

/// Parse `ticks/{SYMBOL}/{YYYY}/{MM}/{DD}/part-{suffix}.json` into
/// `(Symbol, NaiveDate)`. Any key that doesn't match this layout is silently skipped — a foreign object under the
/// same bucket shouldn't abort the whole walk.
fn parse_symbol_day(key: &str) -> Option<(Symbol, NaiveDate)> {
    let mut parts = key.split('/');
    if parts.next()? != "ticks" {
        return None;
    }
    let symbol = parts.next()?;
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some((Symbol::canonicalize(symbol), date))
}

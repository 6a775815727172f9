//! Object-store writer for tick blobs — the data lake both the batcher (C)
//! and the historical importer (D) write into.

use chrono::{Datelike, TimeZone, Utc};
use fxlake_instrument::{Symbol, Tick};
use object_store::{path::Path as ObjectPath, ObjectStore, PutPayload};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic millisecond-resolution suffix generator, guaranteeing a unique
/// blob key per writer process even if two flushes land in the same
/// millisecond.
#[derive(Default)]
pub struct MonotonicSuffix {
    last: AtomicU64,
}

impl MonotonicSuffix {
    pub fn next(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        loop {
            let last = self.last.load(Ordering::Acquire);
            let candidate = now.max(last + 1);
            if self
                .last
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return candidate;
            }
        }
    }
}

/// Wire record for one tick inside a blob: `{timestamp, bid, ask}` UTF-8
/// JSON.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct TickRecord {
    pub timestamp: f64,
    pub bid: f64,
    pub ask: f64,
}

impl From<Tick> for TickRecord {
    fn from(tick: Tick) -> Self {
        Self {
            timestamp: tick.t,
            bid: tick.bid,
            ask: tick.ask,
        }
    }
}

impl From<TickRecord> for Tick {
    fn from(record: TickRecord) -> Self {
        Tick::new(record.timestamp, record.bid, record.ask)
    }
}

/// Build the canonical blob key
/// `ticks/{SYMBOL}/{YYYY}/{MM}/{DD}/part-{suffix}.json`. The date is
/// derived in UTC from `date_source_unix_seconds` — the first tick's time
/// for the batcher, the chunk start for the importer. UTC is used
/// exclusively; there is no local-time equivalent of this function.
pub fn blob_key(symbol: &Symbol, date_source_unix_seconds: f64, suffix: u64) -> ObjectPath {
    let day_start = Tick::new(date_source_unix_seconds, 1.0, 1.0).utc_day_start();
    let datetime = Utc
        .timestamp_opt(day_start, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());

    ObjectPath::from(format!(
        "ticks/{symbol}/{:04}/{:02}/{:02}/part-{suffix}.json",
        datetime.year(),
        datetime.month(),
        datetime.day(),
    ))
}

/// Write a tick blob: write-once, the writer never overwrites an existing
/// key.
pub async fn write_blob(
    store: &Arc<dyn ObjectStore>,
    symbol: &Symbol,
    date_source_unix_seconds: f64,
    ticks: &[Tick],
    suffix: &MonotonicSuffix,
) -> Result<ObjectPath, object_store::Error> {
    let key = blob_key(symbol, date_source_unix_seconds, suffix.next());
    let records: Vec<TickRecord> = ticks.iter().copied().map(TickRecord::from).collect();
    let body = serde_json::to_vec(&records).expect("TickRecord always serializes");

    store.put(&key, PutPayload::from(body)).await?;
    Ok(key)
}

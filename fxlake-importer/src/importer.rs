//! Component D — Historical Importer: pulls a `(symbol, [start, end])`
//! range from a [`HistoricalProvider`] in adaptive chunks and writes it into
//! the data lake with the same blob layout the tick batcher uses.
//!
//! The adaptive descent on `ProviderBuffer` is an explicit recursive
//! function over [`ProviderError`], never exceptions-for-control-flow —
//! a bounded `for _ in 0..MAX_RETRIES`-style loop with explicit error
//! matching, no silent infinite retry.

use crate::chunk::{self, DEFAULT_CHUNK_HOURS};
use crate::error::ImportError;
use crate::provider::{HistoricalProvider, ProviderError, RawTick};
use crate::symbols;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fxlake_data::store::{self, MonotonicSuffix};
use fxlake_instrument::{Symbol, Tick};
use futures::future::BoxFuture;
use object_store::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sleep before retrying a chunk that failed with a transient network
/// error.
const TRANSIENT_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct ImportConfig {
    pub chunk_hours: i64,
    /// Delay between top-level chunks to respect provider rate limits.
    /// Zero is allowed.
    pub between_chunk_delay: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_hours: DEFAULT_CHUNK_HOURS,
            between_chunk_delay: Duration::from_secs(10),
        }
    }
}

/// Per-job accounting, surfaced to the CLI's summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub chunks_attempted: u32,
    pub chunks_succeeded: u32,
    pub chunks_skipped: u32,
    pub blobs_written: u32,
    pub ticks_written: u64,
}

/// Import `[start, end)` for `symbol`. The only propagated error is
/// [`ImportError::InvalidSymbol`] — every chunk-level failure is absorbed
/// (adaptively split, retried once, or logged and skipped) so the job
/// always terminates with a summary, never a panic or a hang.
pub async fn import_range(
    provider: &dyn HistoricalProvider,
    store: &Arc<dyn ObjectStore>,
    symbol: &Symbol,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    config: &ImportConfig,
) -> Result<ImportSummary, ImportError> {
    symbols::validate(symbol)?;

    let suffix = MonotonicSuffix::default();
    let mut summary = ImportSummary::default();
    let top_level_chunks = chunk::walk_chunks(start, end, config.chunk_hours);

    for (index, (chunk_start, chunk_end)) in top_level_chunks.iter().enumerate() {
        import_chunk(
            provider,
            store,
            symbol,
            &suffix,
            *chunk_start,
            *chunk_end,
            &mut summary,
        )
        .await;

        let is_last = index + 1 == top_level_chunks.len();
        if !is_last && !config.between_chunk_delay.is_zero() {
            tokio::time::sleep(config.between_chunk_delay).await;
        }
    }

    Ok(summary)
}

/// One node of the adaptive descent. Boxed because it recurses through an
/// `async fn`, which Rust cannot express as a directly self-referential
/// future.
fn import_chunk<'a>(
    provider: &'a dyn HistoricalProvider,
    store: &'a Arc<dyn ObjectStore>,
    symbol: &'a Symbol,
    suffix: &'a MonotonicSuffix,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    summary: &'a mut ImportSummary,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        summary.chunks_attempted += 1;

        match fetch_with_transient_retry(provider, symbol, start, end).await {
            Ok(raw_ticks) => {
                summary.chunks_succeeded += 1;
                upload_chunk(store, symbol, suffix, start, raw_ticks, summary).await;
            }
            Err(error) if error.is_provider_buffer() => {
                let span = end - start;
                match chunk::next_split_hours(span) {
                    Some(sub_hours) => {
                        debug!(%symbol, %start, %end, sub_hours, "provider buffer error, descending to smaller sub-chunks");
                        for (sub_start, sub_end) in chunk::split(start, end, sub_hours) {
                            import_chunk(provider, store, symbol, suffix, sub_start, sub_end, summary)
                                .await;
                        }
                    }
                    None => {
                        warn!(%symbol, %start, %end, "provider buffer error persists at 1h resolution, no data available, skipping");
                        summary.chunks_skipped += 1;
                    }
                }
            }
            Err(error) => {
                warn!(%symbol, %start, %end, ?error, "chunk fetch failed, skipping");
                summary.chunks_skipped += 1;
            }
        }
    })
}

async fn fetch_with_transient_retry(
    provider: &dyn HistoricalProvider,
    symbol: &Symbol,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<RawTick>, ProviderError> {
    match provider.fetch(symbol.as_str(), start, end).await {
        Ok(ticks) => Ok(ticks),
        Err(error) if error.is_transient() => {
            warn!(%symbol, %start, %end, ?error, "transient provider error, retrying once after 30s");
            tokio::time::sleep(TRANSIENT_RETRY_DELAY).await;
            provider.fetch(symbol.as_str(), start, end).await
        }
        Err(error) => Err(error),
    }
}

async fn upload_chunk(
    store: &Arc<dyn ObjectStore>,
    symbol: &Symbol,
    suffix: &MonotonicSuffix,
    chunk_start: DateTime<Utc>,
    raw_ticks: Vec<RawTick>,
    summary: &mut ImportSummary,
) {
    let ticks: Vec<Tick> = raw_ticks
        .into_iter()
        .map(|raw| Tick::new(raw.timestamp_ms as f64 / 1000.0, raw.bid, raw.ask))
        .filter(Tick::has_finite_positive_fields)
        .collect();

    if ticks.is_empty() {
        return;
    }

    match store::write_blob(store, symbol, chunk_start.timestamp() as f64, &ticks, suffix).await {
        Ok(key) => {
            debug!(%symbol, %key, count = ticks.len(), "uploaded historical chunk");
            summary.blobs_written += 1;
            summary.ticks_written += ticks.len() as u64;
        }
        Err(error) => {
            warn!(%symbol, ?error, "failed to upload historical chunk, ticks lost for this sub-chunk");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use object_store::memory::InMemory;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    /// A provider whose failure behaviour is scripted per exact `(start,
    /// end)` window, so tests can assert the adaptive descent visits
    /// exactly the expected sub-chunks.
    struct ScriptedProvider {
        fail_windows: Mutex<HashMap<(i64, i64), ProviderError>>,
        calls: Mutex<Vec<(i64, i64)>>,
    }

    impl ScriptedProvider {
        fn new(fail: Vec<((DateTime<Utc>, DateTime<Utc>), ProviderError)>) -> Self {
            let mut map = HashMap::new();
            for ((start, end), error) in fail {
                map.insert((start.timestamp(), end.timestamp()), error);
            }
            Self {
                fail_windows: Mutex::new(map),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl HistoricalProvider for ScriptedProvider {
        async fn fetch(
            &self,
            _symbol: &str,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> Result<Vec<RawTick>, ProviderError> {
            self.calls.lock().push((from.timestamp(), to.timestamp()));
            if let Some(error) = self
                .fail_windows
                .lock()
                .get(&(from.timestamp(), to.timestamp()))
            {
                return Err(match error {
                    ProviderError::ProviderBuffer => ProviderError::ProviderBuffer,
                    ProviderError::Transient(msg) => ProviderError::Transient(msg.clone()),
                    ProviderError::Other(msg) => ProviderError::Other(msg.clone()),
                });
            }
            Ok(vec![RawTick {
                timestamp_ms: from.timestamp_millis(),
                bid: 1.1000,
                ask: 1.1002,
            }])
        }
    }

    #[tokio::test]
    async fn invalid_symbol_is_rejected_before_any_fetch() {
        let provider = ScriptedProvider::new(vec![]);
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = Symbol::canonicalize("ZZZQQQ");
        let result = import_range(
            &provider,
            &store,
            &symbol,
            ymd_hms(2024, 1, 8, 0),
            ymd_hms(2024, 1, 9, 0),
            &ImportConfig {
                chunk_hours: 24,
                between_chunk_delay: Duration::ZERO,
            },
        )
        .await;
        assert!(matches!(result, Err(ImportError::InvalidSymbol(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn weekend_only_range_writes_nothing_and_succeeds() {
        let provider = ScriptedProvider::new(vec![]);
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = Symbol::canonicalize("EURUSD");
        // 2024-01-06 is a Saturday, entirely inside the closed window.
        let summary = import_range(
            &provider,
            &store,
            &symbol,
            ymd_hms(2024, 1, 6, 0),
            ymd_hms(2024, 1, 7, 0),
            &ImportConfig {
                chunk_hours: 24,
                between_chunk_delay: Duration::ZERO,
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.chunks_attempted, 0);
        assert_eq!(summary.blobs_written, 0);
        let listed: Vec<_> = futures::StreamExt::collect::<Vec<_>>(store.list(None)).await;
        assert!(listed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn provider_buffer_descends_to_six_hour_sub_chunks() {
        let day_start = ymd_hms(2024, 1, 8, 0);
        let day_end = ymd_hms(2024, 1, 9, 0);
        let provider = ScriptedProvider::new(vec![((day_start, day_end), ProviderError::ProviderBuffer)]);
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = Symbol::canonicalize("EURUSD");

        let summary = import_range(
            &provider,
            &store,
            &symbol,
            day_start,
            day_end,
            &ImportConfig {
                chunk_hours: 24,
                between_chunk_delay: Duration::ZERO,
            },
        )
        .await
        .unwrap();

        // 1 failed 24h attempt + 4 successful 6h sub-chunks.
        assert_eq!(summary.chunks_attempted, 5);
        assert_eq!(summary.chunks_succeeded, 4);
        assert_eq!(summary.blobs_written, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_buffer_at_one_hour_is_logged_and_skipped_not_fatal() {
        let start = ymd_hms(2024, 1, 8, 0);
        let end = start + ChronoDuration::hours(1);
        let provider = ScriptedProvider::new(vec![((start, end), ProviderError::ProviderBuffer)]);
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = Symbol::canonicalize("EURUSD");

        let summary = import_range(
            &provider,
            &store,
            &symbol,
            start,
            end,
            &ImportConfig {
                chunk_hours: 1,
                between_chunk_delay: Duration::ZERO,
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.chunks_skipped, 1);
        assert_eq!(summary.blobs_written, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_is_retried_once_then_succeeds() {
        struct FlakyOnceProvider {
            attempts: Mutex<u32>,
        }

        #[async_trait]
        impl HistoricalProvider for FlakyOnceProvider {
            async fn fetch(
                &self,
                _symbol: &str,
                from: DateTime<Utc>,
                _to: DateTime<Utc>,
            ) -> Result<Vec<RawTick>, ProviderError> {
                let mut attempts = self.attempts.lock();
                *attempts += 1;
                if *attempts == 1 {
                    Err(ProviderError::Transient("timeout".into()))
                } else {
                    Ok(vec![RawTick {
                        timestamp_ms: from.timestamp_millis(),
                        bid: 1.1,
                        ask: 1.1002,
                    }])
                }
            }
        }

        let provider = FlakyOnceProvider {
            attempts: Mutex::new(0),
        };
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = Symbol::canonicalize("EURUSD");

        let summary = import_range(
            &provider,
            &store,
            &symbol,
            ymd_hms(2024, 1, 8, 0),
            ymd_hms(2024, 1, 9, 0),
            &ImportConfig {
                chunk_hours: 24,
                between_chunk_delay: Duration::ZERO,
            },
        )
        .await
        .unwrap();

        assert_eq!(*provider.attempts.lock(), 2);
        assert_eq!(summary.chunks_succeeded, 1);
        assert_eq!(summary.blobs_written, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_and_non_positive_ticks_are_sanitized_before_upload() {
        struct DirtyProvider;

        #[async_trait]
        impl HistoricalProvider for DirtyProvider {
            async fn fetch(
                &self,
                _symbol: &str,
                from: DateTime<Utc>,
                _to: DateTime<Utc>,
            ) -> Result<Vec<RawTick>, ProviderError> {
                Ok(vec![
                    RawTick {
                        timestamp_ms: from.timestamp_millis(),
                        bid: 1.1,
                        ask: 1.1002,
                    },
                    RawTick {
                        timestamp_ms: from.timestamp_millis(),
                        bid: f64::NAN,
                        ask: 1.1002,
                    },
                    RawTick {
                        timestamp_ms: from.timestamp_millis(),
                        bid: -1.0,
                        ask: 1.1002,
                    },
                ])
            }
        }

        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let symbol = Symbol::canonicalize("EURUSD");
        let summary = import_range(
            &DirtyProvider,
            &store,
            &symbol,
            ymd_hms(2024, 1, 8, 0),
            ymd_hms(2024, 1, 9, 0),
            &ImportConfig {
                chunk_hours: 24,
                between_chunk_delay: Duration::ZERO,
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.ticks_written, 1);
    }
}

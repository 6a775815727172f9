//! End-to-end flow across two crates: the tick batcher (component C, in
//! `fxlake-data`) writes blobs into an object store, and this crate's
//! pipeline reads them back and builds candles from them — the same
//! object-store layout both sides agree on, exercised without a database.

use fxlake_data::batcher::{spawn, TickBatcherHandle};
use fxlake_data::config::BatcherConfig;
use fxlake_data::session::TickEvent;
use fxlake_instrument::{Symbol, Tick, VenueId};
use fxlake_materializer::{build_candles, load_ticks_for_day};
use object_store::memory::InMemory;
use object_store::ObjectStore;
use std::sync::Arc;
use std::time::Duration;

fn tick_event(symbol: &Symbol, t: f64, bid: f64, ask: f64) -> TickEvent {
    TickEvent {
        venue: VenueId::Mock,
        symbol: symbol.clone(),
        tick: Tick::new(t, bid, ask),
        client_id: None,
    }
}

async fn spawn_small_batcher(store: Arc<dyn ObjectStore>) -> TickBatcherHandle {
    spawn(
        store,
        BatcherConfig {
            max_batch_size: 100,
            max_batch_age: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(3600),
        },
    )
}

#[tokio::test]
async fn ticks_flushed_by_the_batcher_materialize_into_the_expected_candle() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let handle = spawn_small_batcher(store.clone()).await;
    let symbol = Symbol::canonicalize("EURUSD");

    // Spec scenario 1: three ticks in one 5-minute bucket.
    for (t, bid, ask) in [
        (1_704_067_200.0, 1.1000, 1.1002),
        (1_704_067_260.0, 1.1004, 1.1006),
        (1_704_067_499.0, 1.1001, 1.1003),
    ] {
        handle.accept(tick_event(&symbol, t, bid, ask));
    }
    handle.stop().await;

    let loaded = load_ticks_for_day(&store, &symbol, chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap();
    assert_eq!(loaded.ticks.len(), 3);
    assert_eq!(loaded.blobs_read, 1);

    let (candles, stats) = build_candles(&symbol, &loaded.ticks).unwrap();
    assert_eq!(candles.len(), 1);
    let candle = &candles[0];
    assert_eq!(candle.bucket_start, 1_704_067_200);
    assert_eq!(candle.open, 1.1001);
    assert_eq!(candle.high, 1.1005);
    assert_eq!(candle.low, 1.1001);
    assert_eq!(candle.close, 1.1002);
    assert_eq!(candle.trades, 3);
    assert_eq!(stats.invalid, 0);
}

#[tokio::test]
async fn batches_split_across_two_flushes_still_merge_into_one_days_candles() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let handle = spawn_small_batcher(store.clone()).await;
    let symbol = Symbol::canonicalize("GBPUSD");

    handle.accept(tick_event(&symbol, 1_704_067_200.0, 1.25, 1.2502));
    handle.stop().await;

    // Second flush for a later bucket on the same UTC day, same symbol.
    let handle = spawn_small_batcher(store.clone()).await;
    handle.accept(tick_event(&symbol, 1_704_067_800.0, 1.2510, 1.2512));
    handle.stop().await;

    let loaded = load_ticks_for_day(&store, &symbol, chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap();
    assert_eq!(loaded.ticks.len(), 2);
    assert_eq!(loaded.blobs_read, 2);

    let (candles, _) = build_candles(&symbol, &loaded.ticks).unwrap();
    assert_eq!(candles.len(), 2);
}

#[tokio::test]
async fn invalid_ticks_dropped_at_ingest_never_reach_the_materializer() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    let handle = spawn_small_batcher(store.clone()).await;
    let symbol = Symbol::canonicalize("USDJPY");

    // t == 0 is dropped by the batcher at ingest, never written.
    handle.accept(tick_event(&symbol, 0.0, 150.0, 150.02));
    handle.accept(tick_event(&symbol, 1_704_067_200.0, 150.0, 150.02));
    handle.stop().await;

    let loaded = load_ticks_for_day(&store, &symbol, chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap();
    assert_eq!(loaded.ticks.len(), 1);
}

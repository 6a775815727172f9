//! Tick Batcher: accumulates live ticks per symbol and flushes them to the
//! data lake on a size or age trigger.
//!
//! A single owner worker receives inbound ticks and sweep timer ticks over
//! channels; there is no shared mutable map behind a lock.

use crate::config::BatcherConfig;
use crate::session::TickEvent;
use crate::store::{self, MonotonicSuffix};
use fxlake_instrument::{Symbol, Tick};
use object_store::ObjectStore;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

struct Batch {
    ticks: Vec<Tick>,
    first_tick_time: f64,
    /// When the oldest unflushed tick arrived. Recorded once at batch
    /// creation and never touched by `push` — the age trigger fires off the
    /// oldest tick's arrival, not the most recent one, so a symbol ticking
    /// continuously still ages out on schedule.
    created_at: Instant,
}

impl Batch {
    fn new(tick: Tick) -> Self {
        Self {
            first_tick_time: tick.t,
            ticks: vec![tick],
            created_at: Instant::now(),
        }
    }

    fn push(&mut self, tick: Tick) {
        self.ticks.push(tick);
    }

    fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

enum Command {
    Tick(Symbol, Tick),
    Stop(oneshot::Sender<()>),
}

/// Handle to a running batcher worker. Cloning this handle is cheap — it's
/// just a channel sender — so every `BrokerSession`/router caller can hold
/// one.
#[derive(Clone)]
pub struct TickBatcherHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl TickBatcherHandle {
    /// Accept one tick into the batcher. Returns immediately; flushing
    /// happens asynchronously on the worker. Never blocks or errors to the
    /// caller — a full send failure just means the worker has already
    /// stopped.
    pub fn accept(&self, venue_tick: TickEvent) {
        let _ = self
            .cmd_tx
            .send(Command::Tick(venue_tick.symbol, venue_tick.tick));
    }

    /// Cancel the sweeper and flush every non-empty batch synchronously
    /// before returning. Must not accept new ticks after this call — the
    /// worker exits its command loop immediately after, so any ticks sent
    /// after `stop()` resolves are silently dropped by the disconnected
    /// channel.
    pub async fn stop(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Stop(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

/// Spawn the batcher worker and return a handle to it.
pub fn spawn(store: Arc<dyn ObjectStore>, config: BatcherConfig) -> TickBatcherHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(store, config, cmd_rx));
    TickBatcherHandle { cmd_tx }
}

async fn run(
    store: Arc<dyn ObjectStore>,
    config: BatcherConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut batches: HashMap<Symbol, Batch> = HashMap::new();
    let suffix = MonotonicSuffix::default();
    let mut sweep = tokio::time::interval(config.sweep_interval);

    loop {
        tokio::select! {
            command = cmd_rx.recv() => {
                match command {
                    Some(Command::Tick(symbol, tick)) => {
                        if !tick.is_batchable() {
                            warn!(%symbol, ?tick, "dropped invalid tick at ingest");
                            continue;
                        }
                        accept_tick(&store, &config, &mut batches, &suffix, symbol, tick).await;
                    }
                    Some(Command::Stop(done)) => {
                        flush_all(&store, &suffix, &mut batches).await;
                        let _ = done.send(());
                        return;
                    }
                    None => {
                        flush_all(&store, &suffix, &mut batches).await;
                        return;
                    }
                }
            }

            _ = sweep.tick() => {
                sweep_aged_batches(&store, &config, &suffix, &mut batches).await;
            }
        }
    }
}

async fn accept_tick(
    store: &Arc<dyn ObjectStore>,
    config: &BatcherConfig,
    batches: &mut HashMap<Symbol, Batch>,
    suffix: &MonotonicSuffix,
    symbol: Symbol,
    tick: Tick,
) {
    match batches.entry(symbol.clone()) {
        Entry::Occupied(mut occupied) => occupied.get_mut().push(tick),
        Entry::Vacant(vacant) => {
            vacant.insert(Batch::new(tick));
        }
    }

    let len = batches.get(&symbol).map(|b| b.ticks.len()).unwrap_or(0);
    if len >= config.max_batch_size {
        flush_one(store, suffix, batches, &symbol).await;
    }
}

async fn sweep_aged_batches(
    store: &Arc<dyn ObjectStore>,
    config: &BatcherConfig,
    suffix: &MonotonicSuffix,
    batches: &mut HashMap<Symbol, Batch>,
) {
    let aged: Vec<Symbol> = batches
        .iter()
        .filter(|(_, batch)| batch.age() >= config.max_batch_age)
        .map(|(symbol, _)| symbol.clone())
        .collect();

    for symbol in aged {
        flush_one(store, suffix, batches, &symbol).await;
    }
}

async fn flush_one(
    store: &Arc<dyn ObjectStore>,
    suffix: &MonotonicSuffix,
    batches: &mut HashMap<Symbol, Batch>,
    symbol: &Symbol,
) {
    let Some(batch) = batches.get(symbol) else {
        return;
    };

    match store::write_blob(store, symbol, batch.first_tick_time, &batch.ticks, suffix).await {
        Ok(key) => {
            tracing::debug!(%symbol, %key, count = batch.ticks.len(), "flushed tick batch");
            batches.remove(symbol);
        }
        Err(error) => {
            // Retained for retry on the next trigger — lost ticks are
            // worse than duplicate ticks.
            warn!(%symbol, ?error, "flush failed, batch retained for retry");
        }
    }
}

async fn flush_all(
    store: &Arc<dyn ObjectStore>,
    suffix: &MonotonicSuffix,
    batches: &mut HashMap<Symbol, Batch>,
) {
    let symbols: Vec<Symbol> = batches.keys().cloned().collect();
    for symbol in symbols {
        flush_one(store, suffix, batches, &symbol).await;
    }
}

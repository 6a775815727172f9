//! Synthetic timer-driven venue used in integration tests.

use super::{BrokerSession, TickEvent};
use crate::error::SessionError;
use async_trait::async_trait;
use fxlake_instrument::{Symbol, Tick, VenueId};
use fxlake_integration::channel::{Tx, UnboundedTx};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Emits one synthetic tick per subscribed symbol every `interval`, with a
/// deterministic, monotonically increasing mid-price so tests can assert on
/// exact candle output.
pub struct MockSession {
    subscribed: Arc<RwLock<BTreeSet<Symbol>>>,
    interval: Duration,
    client_id: Option<String>,
    task: Option<tokio::task::JoinHandle<()>>,
    cancel: CancellationToken,
}

impl MockSession {
    pub fn new(interval: Duration) -> Self {
        Self {
            subscribed: Arc::new(RwLock::new(BTreeSet::new())),
            interval,
            client_id: None,
            task: None,
            cancel: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl BrokerSession for MockSession {
    async fn connect(
        &mut self,
        tx: UnboundedTx<TickEvent, SessionError>,
    ) -> Result<(), SessionError> {
        let interval = self.interval;
        let cancel = self.cancel.clone();
        let client_id = self.client_id.clone();
        let subscribed = self.subscribed.clone();

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut sequence: i64 = 0;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        sequence += 1;
                        let t = sequence as f64;
                        let mid = 1.1000 + (sequence as f64) * 0.00001;
                        let symbols = subscribed.read().clone();
                        for symbol in symbols {
                            let event = TickEvent {
                                venue: VenueId::Mock,
                                symbol,
                                tick: Tick::new(t, mid - 0.0001, mid + 0.0001),
                                client_id: client_id.clone(),
                            };
                            let _ = tx.send(event);
                        }
                    }
                }
            }
        }));

        Ok(())
    }

    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError> {
        self.subscribed.write().extend(symbols.iter().cloned());
        Ok(())
    }

    async fn unsubscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError> {
        let mut guard = self.subscribed.write();
        for symbol in symbols {
            guard.remove(symbol);
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.cancel = CancellationToken::new();
    }

    fn subscribed_symbols(&self) -> BTreeSet<Symbol> {
        self.subscribed.read().clone()
    }
}

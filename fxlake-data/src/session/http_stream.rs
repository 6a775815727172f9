//! HTTP-stream venue session — a long-poll GET returning a newline-delimited
//! stream of JSON records, e.g. a forex broker.
//!
//! The subscription set is encoded in the request URL, so changing it
//! requires tearing down the connection and redialing; the session
//! preserves the subscription set across that teardown.

use super::{BrokerSession, TickEvent};
use crate::config::VenueConfig;
use crate::error::SessionError;
use crate::reconnect::{sleep_reconnect_delay, ReconnectGuard};
use async_trait::async_trait;
use fxlake_instrument::{Symbol, Tick, VenueId};
use fxlake_integration::channel::{Tx, UnboundedTx};
use fxlake_integration::protocol::http_stream;
use futures_util::StreamExt;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct HttpPriceRecord {
    instrument: Option<String>,
    bid: f64,
    ask: f64,
    timestamp: f64,
}

pub struct HttpStreamSession {
    config: VenueConfig,
    subscribed: BTreeSet<Symbol>,
    symbols_tx: Option<watch::Sender<BTreeSet<Symbol>>>,
    task: Option<tokio::task::JoinHandle<()>>,
    cancel: CancellationToken,
}

impl HttpStreamSession {
    pub fn new(config: VenueConfig) -> Self {
        Self {
            config,
            subscribed: BTreeSet::new(),
            symbols_tx: None,
            task: None,
            cancel: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl BrokerSession for HttpStreamSession {
    async fn connect(
        &mut self,
        tx: UnboundedTx<TickEvent, SessionError>,
    ) -> Result<(), SessionError> {
        if !self.config.has_credentials() {
            return Err(SessionError::Auth {
                venue: self.config.venue.to_string(),
                reason: "missing api key".into(),
            });
        }

        let (symbols_tx, symbols_rx) = watch::channel(self.subscribed.clone());
        self.symbols_tx = Some(symbols_tx);

        let config = self.config.clone();
        let cancel = self.cancel.clone();
        let client_id = self.config.client_id.clone();

        self.task = Some(tokio::spawn(async move {
            run(config, symbols_rx, client_id, tx, cancel).await;
        }));

        Ok(())
    }

    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError> {
        self.subscribed.extend(symbols.iter().cloned());
        if let Some(symbols_tx) = &self.symbols_tx {
            let _ = symbols_tx.send(self.subscribed.clone());
        }
        Ok(())
    }

    async fn unsubscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError> {
        for symbol in symbols {
            self.subscribed.remove(symbol);
        }
        if let Some(symbols_tx) = &self.symbols_tx {
            let _ = symbols_tx.send(self.subscribed.clone());
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.symbols_tx = None;
        self.cancel = CancellationToken::new();
    }

    fn subscribed_symbols(&self) -> BTreeSet<Symbol> {
        self.subscribed.clone()
    }
}

/// Build the request URL for the current subscription set. The broker's
/// subscription model is expressed entirely in the URL's query string.
fn request_url(base: &url::Url, symbols: &BTreeSet<Symbol>) -> url::Url {
    let mut url = base.clone();
    let joined = symbols
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",");
    url.query_pairs_mut().append_pair("symbols", &joined);
    url
}

async fn run(
    config: VenueConfig,
    mut symbols_rx: watch::Receiver<BTreeSet<Symbol>>,
    client_id: Option<String>,
    tx: UnboundedTx<TickEvent, SessionError>,
    cancel: CancellationToken,
) {
    let client = reqwest::Client::new();
    let guard = ReconnectGuard::new();

    loop {
        if cancel.is_cancelled() {
            return;
        }

        let symbols = symbols_rx.borrow().clone();
        if symbols.is_empty() {
            // Nothing to subscribe to yet; wait for the first subscribe()
            // or a cancellation before dialing.
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = symbols_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
            }
        }

        match stream_once(&client, &config, &symbols, &client_id, &mut symbols_rx, &tx, &cancel)
            .await
        {
            Ok(()) => return, // disconnect() was called
            Err(error) => {
                warn!(venue = %config.venue, ?error, "HTTP stream session error, scheduling reconnect");
                if !guard.try_enter() {
                    continue;
                }
                sleep_reconnect_delay(&cancel).await;
                guard.exit();
            }
        }
    }
}

async fn stream_once(
    client: &reqwest::Client,
    config: &VenueConfig,
    symbols: &BTreeSet<Symbol>,
    client_id: &Option<String>,
    symbols_rx: &mut watch::Receiver<BTreeSet<Symbol>>,
    tx: &UnboundedTx<TickEvent, SessionError>,
    cancel: &CancellationToken,
) -> Result<(), fxlake_integration::SocketError> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or(fxlake_integration::SocketError::MissingCredentials)?;

    let url = request_url(&config.url, symbols);
    let mut lines =
        Box::pin(http_stream::open_line_stream(client, url, api_key, REQUEST_TIMEOUT).await?);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),

            // A change to the subscription set requires tearing down and
            // redialing, since the subscription is baked into the URL.
            // The subscription set itself must survive the teardown.
            changed = symbols_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                return Err(fxlake_integration::SocketError::Terminated(
                    "subscription set changed, redialing".into(),
                ));
            }

            line = lines.next() => {
                let Some(line) = line else {
                    return Err(fxlake_integration::SocketError::Terminated("stream ended".into()));
                };
                let line = line?;
                handle_line(&line, config.venue, client_id, tx);
            }
        }
    }
}

fn handle_line(
    line: &str,
    venue: VenueId,
    client_id: &Option<String>,
    tx: &UnboundedTx<TickEvent, SessionError>,
) {
    match http_stream::parse_line::<HttpPriceRecord>(line) {
        None => {} // blank / heartbeat line, silently dropped
        Some(Ok(HttpPriceRecord {
            instrument: Some(instrument),
            bid,
            ask,
            timestamp,
        })) => {
            let event = TickEvent {
                venue,
                symbol: Symbol::canonicalize(&instrument),
                tick: Tick::new(timestamp, bid, ask),
                client_id: client_id.clone(),
            };
            let _ = tx.send(event);
        }
        Some(Ok(HttpPriceRecord { instrument: None, .. })) => {
            warn!("dropped price record missing instrument field");
        }
        Some(Err(error)) => {
            warn!(?error, payload = %line, "failed to parse HTTP-stream line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_encodes_symbols_as_query_param() {
        let base = url::Url::parse("https://broker.example/stream").unwrap();
        let mut symbols = BTreeSet::new();
        symbols.insert(Symbol::canonicalize("EURUSD"));
        symbols.insert(Symbol::canonicalize("GBPUSD"));

        let url = request_url(&base, &symbols);
        assert!(url.query().unwrap().contains("EURUSD"));
        assert!(url.query().unwrap().contains("GBPUSD"));
    }

    #[test]
    fn heartbeat_line_is_silently_dropped() {
        let (tx, mut rx) = fxlake_integration::channel::unbounded::<TickEvent, SessionError>();
        handle_line("heartbeat", VenueId::ForexHttpStream, &None, &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_instrument_is_dropped_with_warning() {
        let (tx, mut rx) = fxlake_integration::channel::unbounded::<TickEvent, SessionError>();
        handle_line(
            r#"{"bid":1.1,"ask":1.2,"timestamp":1700000000.0}"#,
            VenueId::ForexHttpStream,
            &None,
            &tx,
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn well_formed_record_emits_tick_event() {
        let (tx, mut rx) = fxlake_integration::channel::unbounded::<TickEvent, SessionError>();
        handle_line(
            r#"{"instrument":"eur/usd","bid":1.1,"ask":1.1002,"timestamp":1700000000.0}"#,
            VenueId::ForexHttpStream,
            &None,
            &tx,
        );
        let event = rx.try_recv().unwrap();
        assert_eq!(event.symbol.as_str(), "EURUSD");
    }
}

//! WS-framed venue session — a full-duplex binary-framed socket, subscribed
//! to via JSON control messages, e.g. a crypto exchange.

use super::{BrokerSession, TickEvent};
use crate::config::{VenueConfig, HEARTBEAT_INTERVAL};
use crate::error::SessionError;
use crate::reconnect::{sleep_reconnect_delay, ReconnectGuard};
use async_trait::async_trait;
use fxlake_instrument::{Symbol, Tick, VenueId};
use fxlake_integration::channel::{Tx, UnboundedTx};
use fxlake_integration::protocol::websocket::{self, WsMessage};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Exchange-specific ticker payload. An externally-tagged enum instead of a
/// dynamically-shaped JSON blob — a missing or mistyped field becomes a
/// decode error, never a silently-wrong value.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsInbound {
    Ticker {
        symbol: Option<String>,
        bid: f64,
        ask: f64,
        ts: f64,
    },
    SubscribeAck {
        #[serde(default)]
        id: Option<u64>,
    },
    #[serde(other)]
    Unknown,
}

enum Command {
    Subscribe(Vec<Symbol>),
    Unsubscribe(Vec<Symbol>),
}

pub struct WsFramedSession {
    config: VenueConfig,
    subscribed: BTreeSet<Symbol>,
    cmd_tx: Option<mpsc::UnboundedSender<Command>>,
    task: Option<tokio::task::JoinHandle<()>>,
    cancel: CancellationToken,
}

impl WsFramedSession {
    pub fn new(config: VenueConfig) -> Self {
        Self {
            config,
            subscribed: BTreeSet::new(),
            cmd_tx: None,
            task: None,
            cancel: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl BrokerSession for WsFramedSession {
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

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        self.cmd_tx = Some(cmd_tx);

        let config = self.config.clone();
        let cancel = self.cancel.clone();
        let initial = self.subscribed.clone();
        let client_id = self.config.client_id.clone();

        self.task = Some(tokio::spawn(async move {
            run(config, initial, client_id, cmd_rx, tx, cancel).await;
        }));

        Ok(())
    }

    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError> {
        self.subscribed.extend(symbols.iter().cloned());
        if let Some(cmd_tx) = &self.cmd_tx {
            let _ = cmd_tx.send(Command::Subscribe(symbols.to_vec()));
        }
        Ok(())
    }

    async fn unsubscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError> {
        for symbol in symbols {
            self.subscribed.remove(symbol);
        }
        if let Some(cmd_tx) = &self.cmd_tx {
            let _ = cmd_tx.send(Command::Unsubscribe(symbols.to_vec()));
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.cmd_tx = None;
        // Idempotent: a second disconnect() call is a no-op CancellationToken
        // re-cancel plus an already-consumed task handle.
        self.cancel = CancellationToken::new();
    }

    fn subscribed_symbols(&self) -> BTreeSet<Symbol> {
        self.subscribed.clone()
    }
}

async fn run(
    config: VenueConfig,
    mut symbols: BTreeSet<Symbol>,
    client_id: Option<String>,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    tx: UnboundedTx<TickEvent, SessionError>,
    cancel: CancellationToken,
) {
    let guard = ReconnectGuard::new();

    loop {
        if cancel.is_cancelled() {
            return;
        }

        match connect_and_run(&config, &mut symbols, &client_id, &mut cmd_rx, &tx, &cancel).await
        {
            Ok(()) => return, // disconnect() was called
            Err(error) => {
                let disconnect = matches!(&error, fxlake_integration::SocketError::WebSocket(ws) if websocket::is_disconnect(ws));
                warn!(venue = %config.venue, ?error, disconnect, "WS session transport error, scheduling reconnect");
                if symbols.is_empty() {
                    // Nothing to resubscribe; idle until disconnected or a
                    // new subscribe arrives via cmd_rx on the next loop.
                    continue;
                }
                if !guard.try_enter() {
                    continue;
                }
                sleep_reconnect_delay(&cancel).await;
                guard.exit();
            }
        }
    }
}

async fn connect_and_run(
    config: &VenueConfig,
    symbols: &mut BTreeSet<Symbol>,
    client_id: &Option<String>,
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    tx: &UnboundedTx<TickEvent, SessionError>,
    cancel: &CancellationToken,
) -> Result<(), fxlake_integration::SocketError> {
    let socket = websocket::connect(config.url.as_str()).await?;
    let (mut sink, mut stream) = socket.split();

    if !symbols.is_empty() {
        sink.send(subscribe_message(symbols)).await?;
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),

            _ = heartbeat.tick() => {
                sink.send(WsMessage::Ping(Vec::new().into())).await?;
            }

            command = cmd_rx.recv() => {
                match command {
                    Some(Command::Subscribe(new_symbols)) => {
                        symbols.extend(new_symbols.iter().cloned());
                        sink.send(subscribe_message(&new_symbols.into_iter().collect())).await?;
                    }
                    Some(Command::Unsubscribe(removed)) => {
                        for symbol in &removed {
                            symbols.remove(symbol);
                        }
                        sink.send(unsubscribe_message(&removed.into_iter().collect())).await?;
                    }
                    None => return Ok(()),
                }
            }

            message = stream.next() => {
                let Some(message) = message else {
                    return Err(fxlake_integration::SocketError::Terminated("stream ended".into()));
                };
                let message = message?;
                let WsMessage::Text(text) = message else {
                    continue;
                };
                handle_inbound(&text, config.venue, client_id, tx);
            }
        }
    }
}

fn handle_inbound(
    text: &str,
    venue: VenueId,
    client_id: &Option<String>,
    tx: &UnboundedTx<TickEvent, SessionError>,
) {
    let Some(parsed) = websocket::decode_text::<WsInbound>(text) else {
        return;
    };
    match parsed {
        Ok(WsInbound::Ticker {
            symbol: Some(symbol),
            bid,
            ask,
            ts,
        }) => {
            let event = TickEvent {
                venue,
                symbol: Symbol::canonicalize(&symbol),
                tick: Tick::new(ts, bid, ask),
                client_id: client_id.clone(),
            };
            // Duplicate deliveries are passed through; dedup happens at
            // materialization time.
            let _ = tx.send(event);
        }
        Ok(WsInbound::Ticker { symbol: None, .. }) => {
            warn!("dropped ticker message missing instrument field");
        }
        Ok(WsInbound::SubscribeAck { id }) => {
            debug!(?id, "subscription acknowledged");
        }
        Ok(WsInbound::Unknown) => {
            debug!(payload = %text, "ignored unrecognised WS message");
        }
        Err(error) => {
            warn!(?error, payload = %text, "failed to parse WS message");
        }
    }
}

fn subscribe_message(symbols: &BTreeSet<Symbol>) -> WsMessage {
    WsMessage::Text(
        serde_json::json!({
            "method": "subscribe",
            "symbols": symbols.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        })
        .to_string()
        .into(),
    )
}

fn unsubscribe_message(symbols: &BTreeSet<Symbol>) -> WsMessage {
    WsMessage::Text(
        serde_json::json!({
            "method": "unsubscribe",
            "symbols": symbols.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        })
        .to_string()
        .into(),
    )
}

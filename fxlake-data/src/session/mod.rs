//! Broker Session: one long-lived connection to one upstream venue,
//! emitting a unified stream of normalized [`TickEvent`]s.
//!
//! The event-emitter-inheritance shape of a typical JS broker client is
//! replaced here with a small trait (`connect`/`disconnect`/`subscribe`/
//! `unsubscribe`) plus a tick channel — variants are distinct structs, not a
//! class hierarchy.

pub mod http_stream;
pub mod mock;
pub mod ws;

use crate::error::SessionError;
use async_trait::async_trait;
use fxlake_instrument::{Symbol, Tick, VenueId};
use std::collections::BTreeSet;

/// A normalized tick emitted by a [`BrokerSession`], tagged with venue
/// identity and optional per-client scoping — a client-scoped session's
/// ticks carry a `client_id` tag on emission.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvent {
    pub venue: VenueId,
    pub symbol: Symbol,
    pub tick: Tick,
    pub client_id: Option<String>,
}

impl From<tokio::sync::mpsc::error::SendError<TickEvent>> for SessionError {
    fn from(_: tokio::sync::mpsc::error::SendError<TickEvent>) -> Self {
        // The receiving end (router/batcher) has been dropped; there is no
        // caller left to propagate this to, so sessions treat it the same
        // as any other transport-level disconnect.
        SessionError::Transport(fxlake_integration::SocketError::Terminated(
            "tick channel receiver dropped".into(),
        ))
    }
}

/// Defines how to connect, subscribe, and disconnect from one upstream
/// venue. Implemented by [`ws::WsFramedSession`], [`http_stream::HttpStreamSession`]
/// and [`mock::MockSession`].
///
/// A `BrokerSession` is tolerant of network/protocol errors: they trigger a
/// reconnect internally and never propagate through this trait's methods.
/// Only `connect`'s own `SessionError` return is allowed to surface
/// misconfiguration.
#[async_trait]
pub trait BrokerSession: Send {
    /// Establish the transport and start the internal heartbeat/parse loop.
    /// Emitted ticks are sent on `tx`.
    async fn connect(
        &mut self,
        tx: fxlake_integration::channel::UnboundedTx<TickEvent, SessionError>,
    ) -> Result<(), SessionError>;

    /// Mutate the subscription set and reconcile it with the transport.
    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError>;

    async fn unsubscribe(&mut self, symbols: &[Symbol]) -> Result<(), SessionError>;

    /// Cancel heartbeat, close transport, clear reconnect timers. Idempotent.
    async fn disconnect(&mut self);

    /// Snapshot of the currently-desired subscription set. Owned rather
    /// than borrowed since some variants keep this behind a shared lock
    /// for a background worker task to read concurrently.
    fn subscribed_symbols(&self) -> BTreeSet<Symbol>;
}

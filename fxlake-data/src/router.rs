//! Component B — Broker Router: owns one [`BrokerSession`] per venue plus
//! per-client overrides, routes subscribe/unsubscribe, and re-emits ticks
//! on one consolidated channel.
//!
//! All mutating operations are serialized by virtue of `&mut self` — the
//! router is a single logical worker.

use crate::config::VenueConfig;
use crate::error::SessionError;
use crate::session::{http_stream::HttpStreamSession, ws::WsFramedSession, BrokerSession, TickEvent};
use fxlake_instrument::{venue, Symbol, VenueId};
use fxlake_integration::channel::UnboundedTx;
use std::collections::HashMap;
use tracing::warn;

/// Key identifying one owned session: the base venue, or a per-client
/// override scoped by `clientId`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum SessionKey {
    Venue(VenueId),
    Client(String, VenueId),
}

pub struct BrokerRouter {
    sessions: HashMap<SessionKey, Box<dyn BrokerSession>>,
    /// `symbol -> venue` routing table built up by `subscribe`.
    symbol_venue: HashMap<Symbol, VenueId>,
    tx: UnboundedTx<TickEvent, SessionError>,
}

impl BrokerRouter {
    pub fn new(tx: UnboundedTx<TickEvent, SessionError>) -> Self {
        Self {
            sessions: HashMap::new(),
            symbol_venue: HashMap::new(),
            tx,
        }
    }

    /// Construct a [`BrokerSession`] of the appropriate variant and connect
    /// it. A connect failure is logged but the session is retained —
    /// reconnection is the session's own responsibility, not the router's.
    pub async fn add_venue(&mut self, config: VenueConfig) {
        let venue = config.venue;
        let mut session = build_session(config);

        if let Err(error) = session.connect(self.tx.clone()).await {
            warn!(%venue, ?error, "failed to connect venue, session retained for retry");
        }

        self.sessions.insert(SessionKey::Venue(venue), session);
    }

    /// Create a per-client session scoped for isolation, with its own
    /// credentials. Ticks from it carry `client_id` on emission.
    pub async fn add_client_venue(
        &mut self,
        client_id: String,
        mut config: VenueConfig,
    ) {
        config.client_id = Some(client_id.clone());
        let venue = config.venue;
        let mut session = build_session(config);

        if let Err(error) = session.connect(self.tx.clone()).await {
            warn!(%venue, %client_id, ?error, "failed to connect client venue, session retained for retry");
        }

        self.sessions
            .insert(SessionKey::Client(client_id, venue), session);
    }

    /// Route a subscribe request. If `venue` is given, routes there;
    /// otherwise a heuristic picks a connected session: forex-looking
    /// symbols go to the forex venue, crypto-looking to the crypto venue,
    /// otherwise the first connected session.
    pub async fn subscribe(
        &mut self,
        venue: Option<VenueId>,
        symbols: &[Symbol],
        client_id: Option<&str>,
    ) -> Result<(), SessionError> {
        let key = self.resolve_key(venue, symbols, client_id)?;
        let session = self
            .sessions
            .get_mut(&key)
            .ok_or_else(|| SessionError::Configuration(format!("no session for {key:?}")))?;

        session.subscribe(symbols).await?;

        let resolved_venue = match &key {
            SessionKey::Venue(v) | SessionKey::Client(_, v) => *v,
        };
        for symbol in symbols {
            self.symbol_venue.insert(symbol.clone(), resolved_venue);
        }
        Ok(())
    }

    /// Applied in the same order it was issued relative to a prior
    /// `subscribe` for the same symbol.
    pub async fn unsubscribe(
        &mut self,
        venue: Option<VenueId>,
        symbols: &[Symbol],
        client_id: Option<&str>,
    ) -> Result<(), SessionError> {
        let key = self.resolve_key(venue, symbols, client_id)?;
        let session = self
            .sessions
            .get_mut(&key)
            .ok_or_else(|| SessionError::Configuration(format!("no session for {key:?}")))?;

        session.unsubscribe(symbols).await?;
        Ok(())
    }

    pub async fn disconnect_all(&mut self) {
        for session in self.sessions.values_mut() {
            session.disconnect().await;
        }
    }

    fn resolve_key(
        &self,
        venue: Option<VenueId>,
        symbols: &[Symbol],
        client_id: Option<&str>,
    ) -> Result<SessionKey, SessionError> {
        if let Some(client_id) = client_id {
            let venue = venue.ok_or_else(|| {
                SessionError::Configuration("client subscribe requires an explicit venue".into())
            })?;
            return Ok(SessionKey::Client(client_id.to_string(), venue));
        }

        if let Some(venue) = venue {
            return Ok(SessionKey::Venue(venue));
        }

        let heuristic = symbols
            .first()
            .map(|s| pick_venue_heuristically(s.as_str()))
            .unwrap_or(VenueId::Mock);

        if self.sessions.contains_key(&SessionKey::Venue(heuristic)) {
            return Ok(SessionKey::Venue(heuristic));
        }

        // Fall back to any connected base-venue session.
        self.sessions
            .keys()
            .find(|key| matches!(key, SessionKey::Venue(_)))
            .cloned()
            .ok_or_else(|| SessionError::Configuration("no venues registered".into()))
    }
}

fn pick_venue_heuristically(symbol: &str) -> VenueId {
    if venue::looks_like_forex(symbol) {
        VenueId::ForexHttpStream
    } else if venue::looks_like_crypto(symbol) {
        VenueId::CryptoWs
    } else {
        VenueId::ForexHttpStream
    }
}

fn build_session(config: VenueConfig) -> Box<dyn BrokerSession> {
    match config.venue {
        VenueId::CryptoWs => Box::new(WsFramedSession::new(config)),
        VenueId::ForexHttpStream => Box::new(HttpStreamSession::new(config)),
        VenueId::Mock | VenueId::HistoricalProvider => {
            Box::new(crate::session::mock::MockSession::new(
                std::time::Duration::from_secs(1),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_routes_forex_symbol_to_forex_venue() {
        assert_eq!(pick_venue_heuristically("EURUSD"), VenueId::ForexHttpStream);
    }

    #[test]
    fn heuristic_routes_crypto_symbol_to_crypto_venue() {
        assert_eq!(pick_venue_heuristically("BTCUSDT"), VenueId::CryptoWs);
    }
}

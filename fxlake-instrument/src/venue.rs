use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an upstream venue — a live broker, the historical provider,
/// or the integration-test mock.
///
/// Unlike an exchange-id enum that has to enumerate dozens of crypto
/// exchanges, this venue set is small and mixed kind: one WS-framed
/// crypto-style venue, one HTTP-stream forex broker, the historical
/// provider, and the mock.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueId {
    /// Full-duplex binary-framed WS venue, e.g. a crypto exchange.
    CryptoWs,
    /// Long-poll newline-delimited HTTP venue, e.g. a forex broker.
    ForexHttpStream,
    /// Historical tick provider (backfill only, never a live session).
    HistoricalProvider,
    /// Synthetic timer-driven venue used in integration tests.
    Mock,
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VenueId::CryptoWs => write!(f, "crypto_ws"),
            VenueId::ForexHttpStream => write!(f, "forex_http_stream"),
            VenueId::HistoricalProvider => write!(f, "historical_provider"),
            VenueId::Mock => write!(f, "mock"),
        }
    }
}

/// Does this venue kind look like it trades the given canonical symbol?
/// Used by the router's symbol-driven venue selection heuristic:
/// forex-looking symbols go to the forex venue, crypto-looking symbols go
/// to the crypto venue, everything else falls back to any connected
/// session.
pub fn looks_like_forex(symbol: &str) -> bool {
    const FOREX_BASES: &[&str] = &[
        "EUR", "USD", "GBP", "JPY", "CHF", "AUD", "NZD", "CAD",
    ];
    symbol.len() == 6 && FOREX_BASES.iter().any(|ccy| symbol.starts_with(ccy))
}

pub fn looks_like_crypto(symbol: &str) -> bool {
    const CRYPTO_QUOTES: &[&str] = &["BTC", "ETH", "USDT", "USDC"];
    CRYPTO_QUOTES.iter().any(|q| symbol.ends_with(q)) && !looks_like_forex(symbol)
}

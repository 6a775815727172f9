use fxlake_instrument::VenueId;
use std::fmt;
use std::time::Duration;

/// Bounded reconnect delay after a transport close or read error while the
/// subscription set is non-empty.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Application-level WebSocket ping cadence for framed-socket venues.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Per-venue connection configuration. Credentials are never `Debug`-printed
/// in full — only a redacted form — so structured logs can't leak secrets.
#[derive(Clone)]
pub struct VenueConfig {
    pub venue: VenueId,
    pub url: url::Url,
    pub api_key: Option<String>,
    pub account_id: Option<String>,
    /// Isolates a per-client session from the shared venue session.
    pub client_id: Option<String>,
}

impl fmt::Debug for VenueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueConfig")
            .field("venue", &self.venue)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("account_id", &self.account_id.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl VenueConfig {
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Tunables for the tick batcher.
#[derive(Debug, Clone, Copy)]
pub struct BatcherConfig {
    pub max_batch_size: usize,
    pub max_batch_age: Duration,
    pub sweep_interval: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            max_batch_age: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

//! The historical provider boundary: "a function `fetch(instrument,
//! from, to) -> [{timestamp_ms, bid, ask}] | Error`, where `Error` may be
//! any of: transient network, the `ProviderBuffer` signature, or other."
//!
//! Expressed here as a swappable trait rather than a module-level singleton
//! client — the black-box SDK is an implementation detail behind
//! [`HistoricalProvider`], not a global.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One raw price observation as the provider returns it, before the
/// importer's own sanitization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTick {
    pub timestamp_ms: i64,
    pub bid: f64,
    pub ask: f64,
}

/// Error taxonomy a [`HistoricalProvider`] call can fail with. `ProviderBuffer`
/// is a named kind the importer pattern-matches on to drive adaptive
/// sub-chunking — never detected by scraping a message string or stack
/// trace.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider's recognizable "buffer too large for this range"
    /// failure signature. Triggers adaptive sub-chunking, not a retry of
    /// the same range.
    #[error("provider buffer error for the requested range")]
    ProviderBuffer,

    /// DNS/TCP/timeout/hang-up class of failure. Worth one retry.
    #[error("transient network error: {0}")]
    Transient(String),

    /// Anything else the provider can fail with.
    #[error("provider error: {0}")]
    Other(String),
}

impl ProviderError {
    pub fn is_provider_buffer(&self) -> bool {
        matches!(self, ProviderError::ProviderBuffer)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

/// The historical tick provider SDK boundary. Implementations MUST honor a
/// finite retry budget internally; this trait
/// does not retry on the provider's behalf beyond what [`crate::importer`]
/// does explicitly.
#[async_trait]
pub trait HistoricalProvider: Send + Sync {
    async fn fetch(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RawTick>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_buffer_is_distinguishable_from_transient() {
        let buffer = ProviderError::ProviderBuffer;
        let transient = ProviderError::Transient("timeout".into());
        assert!(buffer.is_provider_buffer());
        assert!(!buffer.is_transient());
        assert!(transient.is_transient());
        assert!(!transient.is_provider_buffer());
    }
}

//! A concrete [`HistoricalProvider`] backed by a REST historical-tick
//! service over `reqwest`.
//!
//! This is the black-box historical SDK boundary, treated as a
//! collaborator rather than part of the core: one `reqwest::Client` built
//! once at construction (no lazily-initialized global client), a bounded
//! per-request timeout, and **no built-in retry loop** of its own. The one
//! allowed retry on a transient failure lives in
//! [`crate::importer::import_range`]; this type never loops internally, so
//! the no-infinite-retry contract can't be violated by a forgotten retry
//! layer underneath it.
//!
//! `ProviderBuffer` is detected from a named `error.code` field in the
//! response body, never by scraping `.message`/stack-trace text.

use crate::provider::{HistoricalProvider, ProviderError, RawTick};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// The provider's recognizable "buffer too large for this range" error
/// code. Any other `error.code` value is treated as an opaque provider
/// failure.
const PROVIDER_BUFFER_CODE: &str = "BUFFER_TOO_LARGE";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TickResponse {
    ticks: Vec<WireTick>,
}

#[derive(Debug, Deserialize)]
struct WireTick {
    timestamp_ms: i64,
    bid: f64,
    ask: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    #[allow(dead_code)]
    message: String,
}

pub struct HttpHistoricalProvider {
    client: reqwest::Client,
    base_url: url::Url,
    api_key: String,
}

impl HttpHistoricalProvider {
    pub fn new(base_url: url::Url, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with static config always builds");
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn request_url(&self, symbol: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> url::Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("from", &from.timestamp_millis().to_string())
            .append_pair("to", &to.timestamp_millis().to_string());
        url
    }
}

#[async_trait]
impl HistoricalProvider for HttpHistoricalProvider {
    async fn fetch(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RawTick>, ProviderError> {
        let url = self.request_url(symbol, from, to);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error_body(&body));
        }

        let parsed: TickResponse = response
            .json()
            .await
            .map_err(|error| ProviderError::Other(error.to_string()))?;

        Ok(parsed
            .ticks
            .into_iter()
            .map(|wire| RawTick {
                timestamp_ms: wire.timestamp_ms,
                bid: wire.bid,
                ask: wire.ask,
            })
            .collect())
    }
}

fn classify_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() {
        ProviderError::Transient(error.to_string())
    } else {
        ProviderError::Other(error.to_string())
    }
}

fn classify_error_body(body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if parsed.error.code == PROVIDER_BUFFER_CODE => ProviderError::ProviderBuffer,
        Ok(parsed) => ProviderError::Other(parsed.error.code),
        Err(_) => ProviderError::Other(body.to_string()),
    }
}

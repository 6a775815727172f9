use thiserror::Error;

/// All transport-level errors generated below the domain crates.
///
/// One flat enum of transport failure kinds rather than `anyhow`-style
/// string catch-alls, so callers can match on what actually went wrong.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("HTTP request timed out")]
    HttpTimeout(reqwest::Error),

    #[error("HTTP response (status={0}) error: {1}")]
    HttpResponse(reqwest::StatusCode, String),

    #[error("deserialising JSON error: {error} for payload: {payload}")]
    Deserialise {
        error: serde_json::Error,
        payload: String,
    },

    #[error("missing required credentials for connection")]
    MissingCredentials,

    #[error("stream terminated with closing frame: {0}")]
    Terminated(String),
}

impl From<reqwest::Error> for SocketError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SocketError::HttpTimeout(error)
        } else {
            SocketError::Http(error)
        }
    }
}

impl SocketError {
    /// Does this error indicate the underlying transport has disconnected
    /// and requires a reconnect, rather than e.g. a misconfiguration?
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SocketError::WebSocket(_)
                | SocketError::Http(_)
                | SocketError::HttpTimeout(_)
                | SocketError::HttpResponse(..)
                | SocketError::Terminated(_)
        )
    }
}

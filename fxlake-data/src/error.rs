use fxlake_integration::SocketError;
use thiserror::Error;

/// Error taxonomy for the broker session, broker router, and tick batcher.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Fatal for the session it was raised on: credentials missing or
    /// invalid. The session remains un-connected; it is never retried
    /// automatically.
    #[error("authentication failed for venue {venue}: {reason}")]
    Auth { venue: String, reason: String },

    /// Network/protocol failure. Always absorbed by a reconnect, never
    /// propagated to a caller.
    #[error("transport error: {0}")]
    Transport(#[from] SocketError),

    /// Misconfiguration at construction time, e.g. an unknown venue kind.
    /// The only other fatal condition besides `Auth`.
    #[error("invalid session configuration: {0}")]
    Configuration(String),
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Auth { .. } | SessionError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_not_fatal() {
        let error = SessionError::Transport(SocketError::MissingCredentials);
        assert!(!error.is_fatal());
    }

    #[test]
    fn auth_errors_are_fatal() {
        let error = SessionError::Auth {
            venue: "forex_http_stream".into(),
            reason: "missing api key".into(),
        };
        assert!(error.is_fatal());
    }
}

use crate::error::SocketError;
use serde::Deserialize;
use std::fmt::Debug;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, connect_async, tungstenite::client::IntoClientRequest};
use tracing::debug;

/// Convenient type alias for a tungstenite `WebSocketStream`.
pub type WebSocket = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Convenient type alias for the `Sink` half of a tungstenite [`WebSocket`].
pub type WsSink = futures::stream::SplitSink<WebSocket, WsMessage>;

/// Convenient type alias for the `Stream` half of a tungstenite [`WebSocket`].
pub type WsStream = futures::stream::SplitStream<WebSocket>;

pub type WsMessage = tokio_tungstenite::tungstenite::Message;
pub type WsError = tokio_tungstenite::tungstenite::Error;

/// Connect asynchronously to a [`WebSocket`] server.
pub async fn connect<R>(request: R) -> Result<WebSocket, SocketError>
where
    R: IntoClientRequest + Unpin + Debug,
{
    debug!(?request, "attempting to establish WebSocket connection");
    connect_async(request)
        .await
        .map(|(websocket, _)| websocket)
        .map_err(SocketError::from)
}

/// Determine whether a [`WsError`] indicates the [`WebSocket`] has
/// disconnected and a reconnect should be scheduled.
pub fn is_disconnect(error: &WsError) -> bool {
    use tokio_tungstenite::tungstenite::error::ProtocolError;
    matches!(
        error,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Io(_)
            | WsError::Protocol(ProtocolError::SendAfterClosing)
    )
}

/// Deserialise a text/binary WebSocket payload into a domain message,
/// logging and returning `None` (silently dropped) rather than propagating
/// on malformed input heartbeat-style frames. Named-struct payloads mean a
/// mistyped/missing field is a hard decode error, never a silently wrong
/// value from loosely-typed JSON.
pub fn decode_text<Output>(payload: &str) -> Option<Result<Output, SocketError>>
where
    Output: for<'de> Deserialize<'de>,
{
    Some(
        serde_json::from_str::<Output>(payload).map_err(|error| SocketError::Deserialise {
            error,
            payload: payload.to_string(),
        }),
    )
}

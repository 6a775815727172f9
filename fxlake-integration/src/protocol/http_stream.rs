//! Newline-delimited JSON long-poll streaming, the HTTP-stream venue shape:
//! a single `GET` whose response body is an unbounded sequence of
//! `\n`-terminated JSON records, authenticated with a `Bearer` token.

use crate::error::SocketError;
use futures::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::Duration;

/// Open a long-poll `GET` against `url` with the given bearer token and
/// return a [`Stream`] of raw lines, each either a successfully read `\n`
/// delimited chunk or a transport error.
///
/// The HTTP connection itself is the suspension point; nothing here blocks
/// the caller beyond awaiting the next chunk.
pub async fn open_line_stream(
    client: &reqwest::Client,
    url: url::Url,
    bearer_token: &str,
    request_timeout: Duration,
) -> Result<impl Stream<Item = Result<String, SocketError>>, SocketError> {
    let response = client
        .get(url)
        .bearer_auth(bearer_token)
        .timeout(request_timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(SocketError::HttpResponse(
            response.status(),
            response.text().await.unwrap_or_default(),
        ));
    }

    let bytes_stream = response.bytes_stream();

    Ok(async_stream_lines(bytes_stream))
}

/// Re-chunk a byte stream into `\n`-delimited lines, carrying a partial
/// trailing line across polls.
fn async_stream_lines(
    bytes_stream: impl Stream<Item = reqwest::Result<bytes::Bytes>>,
) -> impl Stream<Item = Result<String, SocketError>> {
    futures::stream::unfold(
        (bytes_stream.boxed(), String::new()),
        |(mut bytes_stream, mut buffer)| async move {
            loop {
                if let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].to_string();
                    buffer.drain(..=pos);
                    return Some((Ok(line), (bytes_stream, buffer)));
                }

                match bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));
                    }
                    Some(Err(error)) => {
                        return Some((Err(SocketError::from(error)), (bytes_stream, buffer)));
                    }
                    None if buffer.trim().is_empty() => return None,
                    None => {
                        let line = std::mem::take(&mut buffer);
                        return Some((Ok(line), (bytes_stream, buffer)));
                    }
                }
            }
        },
    )
}

/// Parse one raw line. Blank lines and known heartbeat markers are dropped
/// silently; genuine parse errors on a non-heartbeat line are returned so
/// the caller can log them at warning level.
pub fn parse_line<Output>(line: &str) -> Option<Result<Output, SocketError>>
where
    Output: for<'de> Deserialize<'de>,
{
    let trimmed = line.trim();
    if trimmed.is_empty() || is_heartbeat(trimmed) {
        return None;
    }

    Some(
        serde_json::from_str::<Output>(trimmed).map_err(|error| SocketError::Deserialise {
            error,
            payload: trimmed.to_string(),
        }),
    )
}

fn is_heartbeat(line: &str) -> bool {
    matches!(line, "heartbeat" | "ping" | ":keepalive")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        value: u32,
    }

    #[test]
    fn parse_line_drops_heartbeat() {
        assert!(parse_line::<Record>("heartbeat").is_none());
        assert!(parse_line::<Record>("").is_none());
        assert!(parse_line::<Record>("   ").is_none());
    }

    #[test]
    fn parse_line_decodes_record() {
        let parsed = parse_line::<Record>(r#"{"value": 7}"#).unwrap().unwrap();
        assert_eq!(parsed, Record { value: 7 });
    }

    #[test]
    fn parse_line_surfaces_malformed_non_heartbeat_line() {
        assert!(parse_line::<Record>("not json").unwrap().is_err());
    }
}

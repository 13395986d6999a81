//! WebSocket transport over `tokio-tungstenite`.
//!
//! Frame handling:
//! - `Text` → yielded
//! - `Binary` / `Ping` / `Pong` / raw frames → skipped (pings are answered by tungstenite)
//! - `Close` with a normal or going-away code → end of stream
//! - `Close` with any other code → [`ConnectionError::Closed`]

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use super::{Connection, Transport};
use crate::error::ConnectionError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default transport: plain `ws://` or TLS `wss://` (rustls with webpki roots).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, ConnectionError> {
        let (stream, response) =
            connect_async(url.as_str())
                .await
                .map_err(|e| ConnectionError::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        debug!(url = %url, status = %response.status(), "websocket handshake complete");
        Ok(Box::new(WebSocketConnection {
            stream,
            done: false,
        }))
    }
}

struct WebSocketConnection {
    stream: WsStream,
    done: bool,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn next(&mut self) -> Option<Result<String, ConnectionError>> {
        if self.done {
            return None;
        }
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    self.done = true;
                    return close_result(frame);
                }
                Ok(other) => trace!(len = other.len(), "skipping non-text frame"),
                Err(e) => {
                    self.done = true;
                    return Some(Err(ConnectionError::Transport {
                        reason: e.to_string(),
                    }));
                }
            }
        }
        self.done = true;
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            trace!(error = %e, "websocket close");
        }
        self.done = true;
    }
}

fn close_result(frame: Option<CloseFrame>) -> Option<Result<String, ConnectionError>> {
    let frame = frame?;
    match frame.code {
        CloseCode::Normal | CloseCode::Away => None,
        code => Some(Err(ConnectionError::Closed {
            code: code.into(),
            reason: frame.reason.as_str().to_owned(),
        })),
    }
}

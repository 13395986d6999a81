//! # Transport abstraction.
//!
//! The driver only needs "open a stream of text messages to a URL, and close it".
//! [`Transport`] opens, [`Connection`] reads and closes. [`WebSocketTransport`] is
//! the default implementation; tests and embedders can plug in their own.
//!
//! ## Rules
//! - `next()` yields text payloads only; frames without text are the transport's business.
//! - `None` from `next()` means the peer ended the stream cleanly.
//! - `Err` from `next()` is terminal; the driver does not call `next()` again.
//! - `close()` may be called after the stream ended and must not fail.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use jetvisor::{Connection, ConnectionError, Transport};
//! use url::Url;
//!
//! /// Replays a fixed list of messages.
//! struct Replay(Vec<String>);
//!
//! struct ReplayConnection(std::vec::IntoIter<String>);
//!
//! #[async_trait]
//! impl Transport for Replay {
//!     async fn connect(&self, _url: &Url) -> Result<Box<dyn Connection>, ConnectionError> {
//!         Ok(Box::new(ReplayConnection(self.0.clone().into_iter())))
//!     }
//! }
//!
//! #[async_trait]
//! impl Connection for ReplayConnection {
//!     async fn next(&mut self) -> Option<Result<String, ConnectionError>> {
//!         self.0.next().map(Ok)
//!     }
//!
//!     async fn close(&mut self) {}
//! }
//! ```

mod websocket;

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::ConnectionError;

pub use websocket::WebSocketTransport;

/// Opens connections to a relay.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Opens a connection to `url`.
    ///
    /// The returned future is dropped if the firehose is closed before it resolves.
    async fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, ConnectionError>;
}

/// An open stream of text messages.
#[async_trait]
pub trait Connection: Send + 'static {
    /// Waits for the next text message.
    ///
    /// Must be cancel-safe: the driver drops the future when the firehose is closed.
    async fn next(&mut self) -> Option<Result<String, ConnectionError>>;

    /// Closes the connection.
    async fn close(&mut self);
}

/// Shared handle to a transport.
pub type TransportRef = Arc<dyn Transport>;

//! # Read loop: one connection from connect to close.
//!
//! The driver owns the transport connection exclusively and processes one
//! message at a time.
//!
//! ## Flow
//! ```text
//! run()
//!   ├─► select! { cancelled → Closed(None) | transport.connect(url) }
//!   │        └─ Err(e) → Closed(Some(e))
//!   ├─► state = Open, publish Opened
//!   ├─► loop {
//!   │     select! { cancelled → break | conn.next() }
//!   │       ├─ None          → break (relay ended the stream)
//!   │       ├─ Some(Err(e))  → break with e
//!   │       └─ Some(Ok(text))
//!   │            ├─ cancelled?  → break (no dispatch after close)
//!   │            └─ decode ──┬─ Ok  → dispatcher.dispatch → publish listener failures → cursor = time_us
//!   │                        └─ Err → warn + publish DecodeFailed (stream continues)
//!   │   }
//!   ├─► conn.close() (bounded by close_timeout)
//!   └─► publish Closed, state = Closed(err)
//! ```
//!
//! ## Rules
//! - Cancellation wins every race (`biased` select).
//! - The cursor only moves after a message was decoded and dispatched.
//! - Decode and listener failures never end the loop; transport errors always do.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::select;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::decoder::decode;
use crate::dispatch::Dispatcher;
use crate::error::ConnectionError;
use crate::status::{Bus, StatusEvent, StatusKind};
use crate::transport::{Connection, TransportRef};

use super::state::ConnectionState;

/// Last processed cursor; `0` means none.
#[derive(Debug, Default)]
pub(crate) struct Cursor(AtomicU64);

impl Cursor {
    pub(crate) fn get(&self) -> Option<u64> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            n => Some(n),
        }
    }

    fn set(&self, time_us: u64) {
        self.0.store(time_us, Ordering::Release);
    }
}

/// Everything the read loop needs; moved into the spawned task.
pub(crate) struct Driver {
    pub(crate) url: Url,
    pub(crate) transport: TransportRef,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) bus: Bus,
    pub(crate) state: watch::Sender<ConnectionState>,
    pub(crate) cursor: Arc<Cursor>,
    pub(crate) token: CancellationToken,
    pub(crate) close_timeout: Duration,
}

impl Driver {
    /// Runs the connection to completion and publishes the terminal state.
    pub(crate) async fn run(self) {
        let result = self.drive().await;
        let err = result.err();

        match &err {
            Some(e) => error!(url = %self.url, error = %e, label = e.as_label(), "firehose closed"),
            None => debug!(url = %self.url, cursor = ?self.cursor.get(), "firehose closed"),
        }

        let mut ev = StatusEvent::new(StatusKind::Closed).with_cursor(self.cursor.get());
        if let Some(e) = &err {
            ev = ev.with_reason(e.as_message());
        }
        self.bus.publish(ev);
        self.state.send_replace(ConnectionState::Closed(err));
    }

    async fn drive(&self) -> Result<(), ConnectionError> {
        debug!(url = %self.url, "connecting");
        let mut conn = select! {
            biased;
            _ = self.token.cancelled() => return Ok(()),
            res = self.transport.connect(&self.url) => res?,
        };

        self.state.send_replace(ConnectionState::Open);
        self.bus
            .publish(StatusEvent::new(StatusKind::Opened).with_reason(self.url.as_str()));
        debug!(url = %self.url, "connected");

        let res = self.read_loop(conn.as_mut()).await;
        if timeout(self.close_timeout, conn.close()).await.is_err() {
            warn!(url = %self.url, timeout = ?self.close_timeout, "close handshake timed out");
        }
        res
    }

    async fn read_loop(&self, conn: &mut dyn Connection) -> Result<(), ConnectionError> {
        loop {
            let next = select! {
                biased;
                _ = self.token.cancelled() => return Ok(()),
                next = conn.next() => next,
            };
            let text = match next {
                Some(Ok(text)) => text,
                Some(Err(e)) => return Err(e),
                None => {
                    debug!(url = %self.url, "stream ended by relay");
                    return Ok(());
                }
            };
            if self.token.is_cancelled() {
                return Ok(());
            }
            self.process(&text);
        }
    }

    fn process(&self, text: &str) {
        let event = match decode(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, label = e.as_label(), "dropping undecodable message");
                self.bus
                    .publish(StatusEvent::decode_failed(&e).with_cursor(self.cursor.get()));
                return;
            }
        };

        let time_us = event.event().time_us();
        let outcome = self.dispatcher.dispatch(&event);
        trace!(key = event.key().as_str(), cursor = time_us, delivered = outcome.delivered, "dispatched");

        for failure in &outcome.failures {
            self.bus
                .publish(StatusEvent::listener_failed(failure).with_cursor(Some(time_us)));
        }
        self.cursor.set(time_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_zero_is_none() {
        let cursor = Cursor::default();
        assert_eq!(cursor.get(), None);
        cursor.set(17);
        assert_eq!(cursor.get(), Some(17));
    }
}

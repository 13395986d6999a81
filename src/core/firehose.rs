//! # Firehose: handle to one live relay connection.
//!
//! A [`Firehose`] is created from [`SubscriptionOptions`] and immediately starts
//! a background read loop on the current Tokio runtime. The handle is how the
//! caller registers listeners, observes the connection and closes it.
//!
//! ## Architecture
//! ```text
//! Firehose (handle)                          read loop (spawned task)
//!   Arc<Dispatcher>    ◄── shared ──►          dispatcher.dispatch(&event)
//!   watch::Receiver    ◄── state ───           watch::Sender<ConnectionState>
//!   Bus                ◄── status ──           bus.publish(StatusEvent)
//!   Arc<Cursor>        ◄── time_us ──          cursor.set(time_us)
//!   CancellationToken  ─── close() ──►         select! { cancelled() | conn.next() }
//! ```
//!
//! ## Rules
//! - `close()` is idempotent and can be called in any state.
//! - Dropping the handle closes the connection.
//! - There is no automatic reconnect; use [`Firehose::resume_options`] to start a
//!   new firehose where the previous one stopped.
//!
//! ## Example
//! ```rust,no_run
//! use jetvisor::{Firehose, SubscriptionOptions, topic};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let opts = SubscriptionOptions::builder("jetstream2.us-east.bsky.network")
//!         .collection("app.bsky.feed.post")
//!         .build();
//!
//!     let firehose = Firehose::connect(opts)?;
//!     firehose.on::<topic::Create>(|ev| println!("{} posted {}", ev.did, ev.commit.rkey));
//!
//!     tokio::signal::ctrl_c().await?;
//!     firehose.close();
//!     if let Some(err) = firehose.closed().await {
//!         eprintln!("stream failed: {err}");
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::dispatch::{Dispatcher, ListenerRef, Topic};
use crate::error::{ConnectionError, FirehoseError, ListenerError};
use crate::options::SubscriptionOptions;
use crate::status::{Bus, StatusEvent};

use super::builder::FirehoseBuilder;
use super::driver::Cursor;
use super::state::ConnectionState;

/// Handle to a live firehose connection.
pub struct Firehose {
    options: SubscriptionOptions,
    url: Url,
    dispatcher: Arc<Dispatcher>,
    bus: Bus,
    state: watch::Receiver<ConnectionState>,
    cursor: Arc<Cursor>,
    token: CancellationToken,
}

impl Firehose {
    /// Connects to the relay over [`WebSocketTransport`](crate::WebSocketTransport)
    /// with default configuration.
    ///
    /// Returns as soon as the read loop is spawned; the state is `Opening`.
    ///
    /// # Errors
    /// [`FirehoseError::TooManyRepos`] or [`FirehoseError::InvalidService`].
    ///
    /// # Panics
    /// When called outside a Tokio runtime.
    pub fn connect(options: SubscriptionOptions) -> Result<Self, FirehoseError> {
        FirehoseBuilder::new(options).build()
    }

    /// Starts a builder for a custom transport, dispatcher or configuration.
    pub fn builder(options: SubscriptionOptions) -> FirehoseBuilder {
        FirehoseBuilder::new(options)
    }

    pub(crate) fn from_parts(
        options: SubscriptionOptions,
        url: Url,
        dispatcher: Arc<Dispatcher>,
        bus: Bus,
        state: watch::Receiver<ConnectionState>,
        cursor: Arc<Cursor>,
        token: CancellationToken,
    ) -> Self {
        Self {
            options,
            url,
            dispatcher,
            bus,
            state,
            cursor,
            token,
        }
    }

    /// Options this firehose was built from.
    pub fn options(&self) -> &SubscriptionOptions {
        &self.options
    }

    /// Connection URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Shared dispatcher; listeners can also be managed through it directly.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// See [`Dispatcher::subscribe`].
    pub fn subscribe<T: Topic>(&self, listener: ListenerRef<T::Payload>) -> bool {
        self.dispatcher.subscribe::<T>(listener)
    }

    /// See [`Dispatcher::unsubscribe`].
    pub fn unsubscribe<T: Topic>(&self, listener: &ListenerRef<T::Payload>) -> bool {
        self.dispatcher.unsubscribe::<T>(listener)
    }

    /// See [`Dispatcher::on`].
    pub fn on<T: Topic>(
        &self,
        f: impl Fn(&T::Payload) + Send + Sync + 'static,
    ) -> ListenerRef<T::Payload> {
        self.dispatcher.on::<T>(f)
    }

    /// See [`Dispatcher::try_on`].
    pub fn try_on<T: Topic>(
        &self,
        f: impl Fn(&T::Payload) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> ListenerRef<T::Payload> {
        self.dispatcher.try_on::<T>(f)
    }

    /// Closes the connection.
    ///
    /// Idempotent. Before the transport opened, the pending connect is abandoned.
    /// No dispatch starts after the read loop observes the close; a dispatch
    /// already running finishes first. Use [`closed`](Self::closed) to wait for
    /// the loop to end.
    pub fn close(&self) {
        if !self.token.is_cancelled() {
            debug!(url = %self.url, "close requested");
            self.token.cancel();
        }
    }

    /// Waits until the connection is closed and returns its terminal error, if any.
    pub async fn closed(&self) -> Option<ConnectionError> {
        let mut rx = self.state.clone();
        match rx.wait_for(ConnectionState::is_closed).await {
            Ok(state) => state.error().cloned(),
            Err(_) => None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Receiver for state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Receiver for status events published from now on.
    ///
    /// To observe the `Opening` event as well, pass a pre-subscribed bus to
    /// [`FirehoseBuilder::with_status_bus`].
    pub fn status(&self) -> broadcast::Receiver<StatusEvent> {
        self.bus.subscribe()
    }

    /// `time_us` of the last processed message, if any.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor.get()
    }

    /// The original options, resuming from the last processed cursor.
    ///
    /// Without a processed message the original cursor is kept.
    pub fn resume_options(&self) -> SubscriptionOptions {
        match self.cursor.get() {
            Some(cursor) => self.options.resume_from(cursor),
            None => self.options.clone(),
        }
    }
}

impl Drop for Firehose {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for Firehose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firehose")
            .field("url", &self.url.as_str())
            .field("state", &*self.state.borrow())
            .field("cursor", &self.cursor.get())
            .finish()
    }
}

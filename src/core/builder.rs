use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::error::FirehoseError;
use crate::options::SubscriptionOptions;
use crate::status::{Bus, StatusEvent, StatusKind};
use crate::transport::{Transport, TransportRef, WebSocketTransport};

use super::config::FirehoseConfig;
use super::driver::{Cursor, Driver};
use super::firehose::Firehose;
use super::state::ConnectionState;

/// Builder for a [`Firehose`] with a custom transport, dispatcher, status bus or config.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use jetvisor::{Dispatcher, Firehose, FirehoseConfig, SubscriptionOptions, topic};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), jetvisor::FirehoseError> {
/// // listeners registered here see the very first message
/// let dispatcher = Arc::new(Dispatcher::new());
/// dispatcher.on::<topic::Delete>(|ev| println!("deleted {}", ev.commit.rkey));
///
/// let firehose = Firehose::builder(SubscriptionOptions::new("localhost:6008").with_secure(false))
///     .with_dispatcher(dispatcher)
///     .with_config(FirehoseConfig { status_capacity: 64, ..Default::default() })
///     .build()?;
/// firehose.close();
/// # Ok(())
/// # }
/// ```
pub struct FirehoseBuilder {
    options: SubscriptionOptions,
    cfg: FirehoseConfig,
    transport: Option<TransportRef>,
    dispatcher: Option<Arc<Dispatcher>>,
    bus: Option<Bus>,
}

impl FirehoseBuilder {
    /// Creates a builder with default config and the WebSocket transport.
    pub fn new(options: SubscriptionOptions) -> Self {
        Self {
            options,
            cfg: FirehoseConfig::default(),
            transport: None,
            dispatcher: None,
            bus: None,
        }
    }

    /// Sets the runtime configuration.
    pub fn with_config(mut self, cfg: FirehoseConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replaces the default [`WebSocketTransport`].
    pub fn with_transport(self, transport: impl Transport) -> Self {
        self.with_transport_ref(Arc::new(transport))
    }

    /// Replaces the default transport with a shared one.
    pub fn with_transport_ref(mut self, transport: TransportRef) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Uses `dispatcher` instead of a fresh one.
    ///
    /// Listeners already registered on it receive events from the first message on.
    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Publishes status events on `bus` instead of a new one sized by the config.
    ///
    /// Receivers subscribed to `bus` beforehand observe every event, `Opening` included.
    pub fn with_status_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Validates the options, enters `Opening` and spawns the read loop.
    ///
    /// # Errors
    /// - [`FirehoseError::TooManyRepos`] when more repos are selected than the relay accepts
    /// - [`FirehoseError::InvalidService`] when the service is not a usable host
    ///
    /// # Panics
    /// When called outside a Tokio runtime.
    pub fn build(self) -> Result<Firehose, FirehoseError> {
        self.options.check_limits()?;
        let url = self.options.target()?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WebSocketTransport::new()));
        let dispatcher = self.dispatcher.unwrap_or_default();
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.status_capacity_clamped()));
        let cursor = Arc::new(Cursor::default());
        let token = CancellationToken::new();

        let (state_tx, state_rx) = watch::channel(ConnectionState::Unopened);
        state_tx.send_replace(ConnectionState::Opening);
        bus.publish(
            StatusEvent::new(StatusKind::Opening)
                .with_reason(url.as_str())
                .with_cursor(self.options.cursor()),
        );
        debug!(
            url = %url,
            collections = self.options.select_collections().len(),
            repos = self.options.select_repos().len(),
            cursor = ?self.options.cursor(),
            "opening firehose"
        );

        let driver = Driver {
            url: url.clone(),
            transport,
            dispatcher: Arc::clone(&dispatcher),
            bus: bus.clone(),
            state: state_tx,
            cursor: Arc::clone(&cursor),
            token: token.clone(),
            close_timeout: self.cfg.close_timeout,
        };
        tokio::spawn(driver.run());

        Ok(Firehose::from_parts(
            self.options,
            url,
            dispatcher,
            bus,
            state_rx,
            cursor,
            token,
        ))
    }
}

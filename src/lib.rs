//! # jetvisor
//!
//! **Jetvisor** is a typed client for the AT Protocol Jetstream firehose.
//!
//! It connects to a Jetstream relay over a WebSocket, optionally filters the
//! stream server-side by collection (NSID) and repository (DID), decodes every
//! JSON message into a strongly typed event and hands it to listeners
//! registered for that exact event type.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   SubscriptionOptions ──► target() ──► wss://{service}/subscribe?cursor=..&wantedCollections=..&wantedDids=..
//!                                              │
//! ┌────────────────────────────────────────────┼──────────────────────────────┐
//! │  Firehose (handle)                         ▼                              │
//! │                                   Transport::connect(url)                 │
//! │                                            │                              │
//! │   read loop (one per Firehose)             ▼                              │
//! │     Connection::next() ──► decode(text) ──► Dispatcher::dispatch(&event)  │
//! │            │                    │                 │                       │
//! │            │                    │ Err             │ per key, in order     │
//! │            │                    ▼                 ▼                       │
//! │            │               DecodeFailed      ┌────┴─────┬─────────┐       │
//! │            │                    │            ▼          ▼         ▼       │
//! │            │                    │         listener1  listener2  listenerN │
//! │            │                    │            │ Err / panic                │
//! │            ▼                    ▼            ▼                            │
//! │   ConnectionState (watch)   Bus (broadcast StatusEvent)                   │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Dispatch keys
//! ```text
//! kind=identity                       ──► topic::Identity ──► IdentityEvent
//! kind=account                        ──► topic::Account  ──► AccountEvent
//! kind=commit, commit.operation=create ─► topic::Create   ──► CreateEvent
//! kind=commit, commit.operation=update ─► topic::Update   ──► UpdateEvent
//! kind=commit, commit.operation=delete ─► topic::Delete   ──► DeleteEvent
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Options**       | Relay host, server-side filters, replay cursor.               | [`SubscriptionOptions`]                     |
//! | **Events**        | Closed set of decoded events and commit operations.           | [`Event`], [`Commit`], [`DispatchKey`]      |
//! | **Dispatch**      | Typed subscribe/unsubscribe, isolated listener failures.      | [`Dispatcher`], [`topic`], [`Listener`]     |
//! | **Connection**    | Read loop, state machine, close, resume.                      | [`Firehose`], [`ConnectionState`]           |
//! | **Status**        | Lifecycle and diagnostic events on a broadcast bus.           | [`StatusEvent`], [`StatusKind`]             |
//! | **Transport**     | Pluggable message stream; WebSocket by default.               | [`Transport`], [`WebSocketTransport`]       |
//! | **Errors**        | Typed errors with stable labels.                              | [`FirehoseError`], [`ConnectionError`]      |
//!
//! ## Example
//! ```rust,no_run
//! use jetvisor::{Firehose, SubscriptionOptions, topic};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let opts = SubscriptionOptions::builder("jetstream1.us-east.bsky.network")
//!         .collection("app.bsky.feed.post")
//!         .build();
//!
//!     let firehose = Firehose::connect(opts)?;
//!     firehose.on::<topic::Create>(|ev| {
//!         println!("{} {}", ev.commit.uri(&ev.did), ev.commit.record);
//!     });
//!     firehose.on::<topic::Identity>(|ev| {
//!         println!("{} is now {:?}", ev.did, ev.identity.handle);
//!     });
//!
//!     if let Some(err) = firehose.closed().await {
//!         eprintln!("stream failed: {err}, resume with cursor {:?}", firehose.cursor());
//!     }
//!     Ok(())
//! }
//! ```
mod core;
mod decoder;
mod dispatch;
mod error;
mod model;
mod options;
pub mod status;
mod transport;

// ---- Public re-exports ----

pub use core::{ConnectionState, Firehose, FirehoseBuilder, FirehoseConfig};
pub use decoder::decode;
pub use dispatch::{
    DispatchOutcome, Dispatcher, Listener, ListenerFailure, ListenerRef, Topic, topic,
};
pub use error::{ConnectionError, DecodeError, FirehoseError, ListenerError};
pub use model::{
    Account, AccountEvent, Commit, CommitEvent, Create, CreateEvent, Delete, DeleteEvent, Did,
    DispatchKey, DispatchedEvent, Event, EventKind, Identity, IdentityEvent, Nsid, Operation,
    Update, UpdateEvent,
};
pub use options::{MAX_WANTED_DIDS, SUBSCRIBE_PATH, SubscriptionOptions, SubscriptionOptionsBuilder};
pub use status::{StatusEvent, StatusKind};
pub use transport::{Connection, Transport, TransportRef, WebSocketTransport};

//! Connection status: event types and broadcast bus.
//!
//! ## Contents
//! - [`StatusKind`], [`StatusEvent`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! The read loop is the only publisher. Receivers come from
//! [`Firehose::status`](crate::Firehose::status).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{StatusEvent, StatusKind};

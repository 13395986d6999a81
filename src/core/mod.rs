//! Connection core: the [`Firehose`] handle and its read loop.
//!
//! Internal modules:
//! - `builder`: validates options, wires the shared parts and spawns the loop;
//! - `driver`: the read loop (connect, read, decode, dispatch, close);
//! - `firehose`: the caller-facing handle;
//! - `state`: the connection state machine;
//! - `config`: runtime configuration.

mod builder;
mod config;
mod driver;
mod firehose;
mod state;

pub use builder::FirehoseBuilder;
pub use config::FirehoseConfig;
pub use firehose::Firehose;
pub use state::ConnectionState;

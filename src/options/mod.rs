//! Subscription options and the relay URL they produce.
//!
//! - [`SubscriptionOptions`] what to stream (host, filters, cursor)
//! - [`SubscriptionOptionsBuilder`] fluent construction
//! - [`SubscriptionOptions::target`] the `wss://{service}/subscribe?...` URL

mod builder;
mod subscription;
mod target;

pub use builder::SubscriptionOptionsBuilder;
pub use subscription::{MAX_WANTED_DIDS, SubscriptionOptions};
pub use target::SUBSCRIBE_PATH;

//! # Listener registration and event dispatch.
//!
//! - [`Dispatcher`] holds one ordered listener list per [`DispatchKey`](crate::DispatchKey).
//! - [`Topic`] / [`topic`] bind each key to its payload type at compile time.
//! - [`Listener`] is the handler trait; plain closures implement it.

mod dispatcher;
mod key;
mod listener;
mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher, ListenerFailure};
pub use listener::{Listener, ListenerRef};
pub use key::{Topic, topic};

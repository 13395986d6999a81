//! # Event listener trait.
//!
//! Provides [`Listener`] the extension point for reacting to decoded events.
//!
//! Each listener:
//! - is registered for **one** key with an exact payload type (see [`Topic`](super::Topic))
//! - is invoked **synchronously**, in registration order, from the read loop
//! - is **isolated**: an error or a panic is reported and the next listener still runs
//!
//! ## Rules
//! - Keep `on_event` short; a slow listener delays every following event on the stream.
//! - Identity is the `Arc` allocation: clone the [`ListenerRef`] to unsubscribe later.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use jetvisor::{CreateEvent, Listener, ListenerError, ListenerRef};
//!
//! #[derive(Default)]
//! struct PostCounter(AtomicU64);
//!
//! impl Listener<CreateEvent> for PostCounter {
//!     fn on_event(&self, ev: &CreateEvent) -> Result<(), ListenerError> {
//!         if ev.commit.collection == "app.bsky.feed.post" {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "post-counter" }
//! }
//!
//! let counter: ListenerRef<CreateEvent> = Arc::new(PostCounter::default());
//! ```

use std::sync::Arc;

use crate::error::ListenerError;

/// Handler for one event payload type.
///
/// Implemented automatically for closures `Fn(&P)`.
pub trait Listener<P>: Send + Sync + 'static {
    /// Handles a single event.
    ///
    /// Returning `Err` or panicking does not affect other listeners or the stream;
    /// the failure is logged and published as a status event.
    fn on_event(&self, event: &P) -> Result<(), ListenerError>;

    /// Returns the listener name used in logs and status events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a listener; also the token used to unsubscribe it.
pub type ListenerRef<P> = Arc<dyn Listener<P>>;

impl<P, F> Listener<P> for F
where
    F: Fn(&P) + Send + Sync + 'static,
{
    fn on_event(&self, event: &P) -> Result<(), ListenerError> {
        self(event);
        Ok(())
    }
}

/// Adapter for closures that report failures through `Result`.
pub(crate) struct Fallible<F>(pub(crate) F);

impl<P, F> Listener<P> for Fallible<F>
where
    F: Fn(&P) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    fn on_event(&self, event: &P) -> Result<(), ListenerError> {
        (self.0)(event)
    }

    fn name(&self) -> &str {
        std::any::type_name::<F>()
    }
}

/// Whether two handles point at the same listener allocation.
#[inline]
pub(crate) fn same_listener<P>(a: &ListenerRef<P>, b: &ListenerRef<P>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

//! # Typed event dispatcher.
//!
//! Provides [`Dispatcher`], the publish/subscribe surface between the decoder
//! and user listeners.
//!
//! ## Architecture
//! ```text
//! dispatch(DispatchedEvent)
//!     │
//!     ├─ identity ──► [snapshot] ──► l1.on_event(&IdentityEvent) ──► l2 ...
//!     ├─ account  ──► [snapshot] ──► l1.on_event(&AccountEvent)  ──► ...
//!     ├─ create   ──► [snapshot] ──► l1.on_event(&CreateEvent)   ──► ...
//!     ├─ update   ──► [snapshot] ──► l1.on_event(&UpdateEvent)   ──► ...
//!     └─ delete   ──► [snapshot] ──► l1.on_event(&DeleteEvent)   ──► ...
//!                                      └─ Err / panic → ListenerFailure, next listener runs
//! ```
//!
//! ## Rules
//! - **Synchronous**: `dispatch` returns after every listener has returned.
//! - **Ordered**: listeners run in registration order.
//! - **Exact types**: each key has one payload type (see [`Topic`]); there is no catch-all.
//! - **Idempotent registration**: the same listener registered twice runs once per event.
//! - **Unsubscribe wins**: a listener removed mid-dispatch (even by itself) is not invoked again.
//!
//! ## Panic handling
//! Listener calls are wrapped in `catch_unwind`. A panic becomes
//! [`ListenerError::Panicked`] and the next listener runs.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a listener panics while holding a lock.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use crate::error::ListenerError;
use crate::model::{
    AccountEvent, Commit, CreateEvent, DeleteEvent, DispatchKey, DispatchedEvent, Event,
    IdentityEvent, UpdateEvent,
};

use super::listener::{Fallible, ListenerRef};
use super::registry::ListenerList;
use super::key::Topic;

/// A listener that failed during one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Key the event was dispatched under.
    pub key: DispatchKey,
    /// [`Listener::name`](super::Listener::name) of the failing listener.
    pub listener: String,
    pub error: ListenerError,
}

/// Result of one [`Dispatcher::dispatch`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Listeners that returned `Ok`.
    pub delivered: usize,
    /// Listeners that returned `Err` or panicked.
    pub failures: Vec<ListenerFailure>,
}

impl DispatchOutcome {
    /// Number of listeners invoked.
    pub fn invoked(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// `true` when no listener failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry of typed listeners, one ordered list per [`DispatchKey`].
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use jetvisor::{Dispatcher, decode, topic};
///
/// let dispatcher = Dispatcher::new();
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&seen);
/// let handle = dispatcher.on::<topic::Delete>(move |ev| {
///     assert_eq!(ev.commit.rkey, "k");
///     counter.fetch_add(1, Ordering::Relaxed);
/// });
///
/// let msg = r#"{"did":"did:plc:abc","time_us":5,"kind":"commit",
///     "commit":{"operation":"delete","rev":"1","collection":"app.bsky.feed.like","rkey":"k"}}"#;
/// let outcome = dispatcher.dispatch(&decode(msg).unwrap());
/// assert_eq!(outcome.delivered, 1);
///
/// dispatcher.unsubscribe::<topic::Delete>(&handle);
/// dispatcher.dispatch(&decode(msg).unwrap());
/// assert_eq!(seen.load(Ordering::Relaxed), 1);
/// ```
pub struct Dispatcher {
    pub(crate) identity: ListenerList<IdentityEvent>,
    pub(crate) account: ListenerList<AccountEvent>,
    pub(crate) create: ListenerList<CreateEvent>,
    pub(crate) update: ListenerList<UpdateEvent>,
    pub(crate) delete: ListenerList<DeleteEvent>,
}

impl Dispatcher {
    /// Creates a dispatcher with no listeners.
    pub fn new() -> Self {
        Self {
            identity: ListenerList::new(),
            account: ListenerList::new(),
            create: ListenerList::new(),
            update: ListenerList::new(),
            delete: ListenerList::new(),
        }
    }

    /// Registers `listener` for topic `T`.
    ///
    /// Returns `false` (and changes nothing) if this listener is already registered for `T`.
    pub fn subscribe<T: Topic>(&self, listener: ListenerRef<T::Payload>) -> bool {
        T::listeners(self).insert(listener)
    }

    /// Removes `listener` from topic `T`.
    ///
    /// Returns `false` if it was not registered. Safe to call from inside the listener itself.
    pub fn unsubscribe<T: Topic>(&self, listener: &ListenerRef<T::Payload>) -> bool {
        T::listeners(self).remove(listener)
    }

    /// Registers a closure for topic `T` and returns its handle (needed to unsubscribe).
    pub fn on<T: Topic>(
        &self,
        f: impl Fn(&T::Payload) + Send + Sync + 'static,
    ) -> ListenerRef<T::Payload> {
        let listener: ListenerRef<T::Payload> = Arc::new(f);
        self.subscribe::<T>(Arc::clone(&listener));
        listener
    }

    /// Registers a fallible closure for topic `T`; `Err` results are reported like panics.
    pub fn try_on<T: Topic>(
        &self,
        f: impl Fn(&T::Payload) -> Result<(), ListenerError> + Send + Sync + 'static,
    ) -> ListenerRef<T::Payload> {
        let listener: ListenerRef<T::Payload> = Arc::new(Fallible(f));
        self.subscribe::<T>(Arc::clone(&listener));
        listener
    }

    /// Number of listeners registered for topic `T`.
    pub fn listener_count<T: Topic>(&self) -> usize {
        T::listeners(self).len()
    }

    /// Number of listeners registered for a runtime key.
    pub fn listener_count_for(&self, key: DispatchKey) -> usize {
        match key {
            DispatchKey::Identity => self.identity.len(),
            DispatchKey::Account => self.account.len(),
            DispatchKey::Create => self.create.len(),
            DispatchKey::Update => self.update.len(),
            DispatchKey::Delete => self.delete.len(),
        }
    }

    /// Removes every listener of every key.
    pub fn clear(&self) {
        self.identity.clear();
        self.account.clear();
        self.create.clear();
        self.update.clear();
        self.delete.clear();
    }

    /// Delivers `event` to every listener registered for its key.
    ///
    /// Listener failures are logged, collected in the outcome and do not stop
    /// the remaining listeners.
    pub fn dispatch(&self, event: &DispatchedEvent) -> DispatchOutcome {
        let key = event.key();
        match event.event() {
            Event::Identity(ev) => deliver(&self.identity, key, ev),
            Event::Account(ev) => deliver(&self.account, key, ev),
            Event::Commit(Commit::Create(ev)) => deliver(&self.create, key, ev),
            Event::Commit(Commit::Update(ev)) => deliver(&self.update, key, ev),
            Event::Commit(Commit::Delete(ev)) => deliver(&self.delete, key, ev),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for key in DispatchKey::ALL {
            map.entry(&key.as_str(), &self.listener_count_for(key));
        }
        map.finish()
    }
}

fn deliver<P: 'static>(
    list: &ListenerList<P>,
    key: DispatchKey,
    payload: &P,
) -> DispatchOutcome {
    let snapshot = list.snapshot();
    let mut outcome = DispatchOutcome::default();

    for entry in snapshot.iter() {
        if !entry.is_active() {
            continue;
        }
        let listener = &entry.listener;
        let error = match catch_unwind(AssertUnwindSafe(|| listener.on_event(payload))) {
            Ok(Ok(())) => {
                outcome.delivered += 1;
                continue;
            }
            Ok(Err(e)) => e,
            Err(panic_err) => ListenerError::Panicked {
                reason: panic_message(&*panic_err),
            },
        };

        warn!(
            key = key.as_str(),
            listener = listener.name(),
            error = %error,
            "listener failed"
        );
        outcome.failures.push(ListenerFailure {
            key,
            listener: listener.name().to_owned(),
            error,
        });
    }
    outcome
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

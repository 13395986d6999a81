//! # Per-key listener list.
//!
//! [`ListenerList`] holds the listeners of one dispatch key as a copy-on-write
//! snapshot. Dispatch clones the current `Arc` and iterates it without holding
//! the lock, so listeners may subscribe/unsubscribe (even themselves) while an
//! event is being delivered.
//!
//! ```text
//! subscribe/unsubscribe ──► lock ──► build new Vec ──► swap Arc ──► unlock
//! dispatch              ──► lock ──► clone Arc     ──► unlock  ──► iterate snapshot
//!                                                                  └─ skip entries with active=false
//! ```
//!
//! ## Rules
//! - Registration order is preserved.
//! - The same listener (same allocation) is stored at most once.
//! - Removal clears the entry's `active` flag first, so an entry removed during a
//!   dispatch is skipped by that dispatch's remaining iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::listener::{ListenerRef, same_listener};

/// One registration.
pub(crate) struct Entry<P> {
    pub(crate) listener: ListenerRef<P>,
    active: AtomicBool,
}

impl<P> Entry<P> {
    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

pub(crate) type Snapshot<P> = Arc<Vec<Arc<Entry<P>>>>;

/// Ordered listeners of one key.
pub struct ListenerList<P> {
    entries: Mutex<Snapshot<P>>,
}

impl<P> ListenerList<P> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Arc::new(Vec::new())),
        }
    }

    /// Appends `listener` unless it is already registered. Returns `true` if added.
    pub(crate) fn insert(&self, listener: ListenerRef<P>) -> bool {
        let mut guard = self.entries.lock();
        if guard.iter().any(|e| same_listener(&e.listener, &listener)) {
            return false;
        }
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(Arc::new(Entry {
            listener,
            active: AtomicBool::new(true),
        }));
        *guard = Arc::new(next);
        true
    }

    /// Removes `listener`. Returns `true` if it was registered.
    pub(crate) fn remove(&self, listener: &ListenerRef<P>) -> bool {
        let mut guard = self.entries.lock();
        let Some(pos) = guard
            .iter()
            .position(|e| same_listener(&e.listener, listener))
        else {
            return false;
        };
        guard[pos].active.store(false, Ordering::Release);

        let next: Vec<_> = guard
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(_, e)| Arc::clone(e))
            .collect();
        *guard = Arc::new(next);
        true
    }

    /// Current listeners, for iteration outside the lock.
    pub(crate) fn snapshot(&self) -> Snapshot<P> {
        Arc::clone(&self.entries.lock())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Deactivates and drops every listener.
    pub(crate) fn clear(&self) {
        let mut guard = self.entries.lock();
        for entry in guard.iter() {
            entry.active.store(false, Ordering::Release);
        }
        *guard = Arc::new(Vec::new());
    }
}

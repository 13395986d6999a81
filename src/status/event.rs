//! # Status events emitted by a firehose connection.
//!
//! The [`StatusKind`] enum classifies events in two groups:
//! - **Lifecycle**: the connection moves through opening, opened and closed
//! - **Diagnostics**: a message or a listener failed, the stream keeps going
//!
//! The [`StatusEvent`] struct carries the metadata: timestamp, reason, the
//! dispatch key and listener involved, and the cursor at the time of the event.
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events from several connections are merged.
//!
//! ## Example
//! ```rust
//! use jetvisor::{DispatchKey, StatusEvent, StatusKind};
//!
//! let ev = StatusEvent::new(StatusKind::ListenerFailed)
//!     .with_key(DispatchKey::Create)
//!     .with_listener("post-counter")
//!     .with_reason("db unavailable");
//!
//! assert_eq!(ev.kind, StatusKind::ListenerFailed);
//! assert_eq!(ev.listener.as_deref(), Some("post-counter"));
//! assert!(ev.kind.is_diagnostic());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::dispatch::ListenerFailure;
use crate::error::{DecodeError, ListenerError};
use crate::model::DispatchKey;

static STATUS_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of status events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    // === Lifecycle ===
    /// The transport connect was started.
    ///
    /// Sets:
    /// - `reason`: target URL
    /// - `cursor`: cursor requested by the subscription, if any
    Opening,

    /// The transport is open and messages are being read.
    ///
    /// Sets:
    /// - `reason`: target URL
    Opened,

    /// The read loop ended. No further events follow for this connection.
    ///
    /// Sets:
    /// - `reason`: terminal error message (absent on a clean close)
    /// - `cursor`: last processed cursor, if any
    Closed,

    // === Diagnostics ===
    /// A message could not be decoded and was skipped.
    ///
    /// Sets:
    /// - `reason`: decoder message
    /// - `cursor`: last processed cursor, if any
    DecodeFailed,

    /// A listener returned an error.
    ///
    /// Sets:
    /// - `key`: dispatch key of the event
    /// - `listener`: listener name
    /// - `reason`: error reason
    /// - `cursor`: `time_us` of the event being dispatched
    ListenerFailed,

    /// A listener panicked.
    ///
    /// Sets: same fields as [`StatusKind::ListenerFailed`], `reason` is the panic message.
    ListenerPanicked,
}

impl StatusKind {
    /// Returns `true` for events that report a skipped message or a failed listener.
    pub fn is_diagnostic(self) -> bool {
        matches!(
            self,
            StatusKind::DecodeFailed | StatusKind::ListenerFailed | StatusKind::ListenerPanicked
        )
    }
}

/// Status event with optional metadata.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: StatusKind,
    /// Human-readable reason (errors, URL).
    pub reason: Option<Arc<str>>,
    /// Dispatch key, for listener events.
    pub key: Option<DispatchKey>,
    /// Listener name, for listener events.
    pub listener: Option<Arc<str>>,
    /// Cursor (`time_us`) associated with the event.
    pub cursor: Option<u64>,
}

impl StatusEvent {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: StatusKind) -> Self {
        Self {
            seq: STATUS_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            reason: None,
            key: None,
            listener: None,
            cursor: None,
        }
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_key(mut self, key: DispatchKey) -> Self {
        self.key = Some(key);
        self
    }

    #[inline]
    pub fn with_listener(mut self, listener: impl Into<Arc<str>>) -> Self {
        self.listener = Some(listener.into());
        self
    }

    /// Attaches a cursor; `None` leaves the field unset.
    #[inline]
    pub fn with_cursor(mut self, cursor: Option<u64>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Creates a decode failure event.
    pub fn decode_failed(err: &DecodeError) -> Self {
        StatusEvent::new(StatusKind::DecodeFailed).with_reason(err.as_message())
    }

    /// Creates a listener failure event; the kind follows the error variant.
    pub fn listener_failed(failure: &ListenerFailure) -> Self {
        let kind = match failure.error {
            ListenerError::Panicked { .. } => StatusKind::ListenerPanicked,
            _ => StatusKind::ListenerFailed,
        };
        StatusEvent::new(kind)
            .with_key(failure.key)
            .with_listener(failure.listener.as_str())
            .with_reason(failure.error.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = StatusEvent::new(StatusKind::Opening);
        let b = StatusEvent::new(StatusKind::Opened);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_listener_failed_maps_kind() {
        let panicked = ListenerFailure {
            key: DispatchKey::Delete,
            listener: "audit".into(),
            error: ListenerError::Panicked {
                reason: "boom".into(),
            },
        };
        let ev = StatusEvent::listener_failed(&panicked);
        assert_eq!(ev.kind, StatusKind::ListenerPanicked);
        assert_eq!(ev.key, Some(DispatchKey::Delete));
        assert_eq!(ev.listener.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));

        let failed = ListenerFailure {
            error: ListenerError::failed("nope"),
            ..panicked
        };
        assert_eq!(
            StatusEvent::listener_failed(&failed).kind,
            StatusKind::ListenerFailed
        );
    }

    #[test]
    fn test_decode_failed_carries_message() {
        let err = DecodeError::UnknownVariant {
            field: "kind",
            value: "frobnicate".into(),
        };
        let ev = StatusEvent::decode_failed(&err).with_cursor(Some(42));
        assert_eq!(ev.kind, StatusKind::DecodeFailed);
        assert_eq!(ev.reason.as_deref(), Some("unknown kind=frobnicate"));
        assert_eq!(ev.cursor, Some(42));
        assert!(!StatusKind::Closed.is_diagnostic());
    }
}

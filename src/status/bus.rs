//! # Broadcast bus for status events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. The read loop
//! publishes into it; any number of callers observe it through
//! [`Firehose::status`](crate::Firehose::status).
//!
//! ```text
//! read loop ──► Bus (ring buffer) ──┬──► receiver 1
//!                                   └──► receiver N
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits for receivers.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events sent while nobody listens are dropped.

use tokio::sync::broadcast;

use super::event::StatusEvent;

/// Broadcast channel for [`StatusEvent`]s. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<StatusEvent>,
}

impl Bus {
    /// Creates a new bus with the given capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: StatusEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::RecvError;

    use super::*;
    use crate::status::StatusKind;

    #[tokio::test]
    async fn test_publish_without_receivers_is_dropped() {
        let bus = Bus::new(4);
        bus.publish(StatusEvent::new(StatusKind::Opening));
        let mut rx = bus.subscribe();
        bus.publish(StatusEvent::new(StatusKind::Opened));
        assert_eq!(rx.recv().await.unwrap().kind, StatusKind::Opened);
    }

    #[tokio::test]
    async fn test_receiver_count_tracks_subscribers() {
        let bus = Bus::new(4);
        assert_eq!(bus.receiver_count(), 0);
        let rx = bus.subscribe();
        let _rx2 = bus.clone().subscribe();
        assert_eq!(bus.receiver_count(), 2);
        drop(rx);
        assert_eq!(bus.receiver_count(), 1);
    }

    #[tokio::test]
    async fn test_lagging_receiver_skips_oldest() {
        let bus = Bus::new(0);
        let mut rx = bus.subscribe();
        bus.publish(StatusEvent::new(StatusKind::Opening));
        bus.publish(StatusEvent::new(StatusKind::Closed));

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().kind, StatusKind::Closed);
    }
}

//! # Firehose runtime configuration.
//!
//! Provides [`FirehoseConfig`]: settings that shape the runtime of one
//! [`Firehose`](crate::Firehose) but not *what* it streams (that is
//! [`SubscriptionOptions`](crate::SubscriptionOptions)).

use std::time::Duration;

/// Runtime configuration for a firehose connection.
///
/// ## Field semantics
/// - `status_capacity`: status bus ring buffer size (min 1; clamped)
/// - `close_timeout`: upper bound on the transport's close handshake
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirehoseConfig {
    /// Capacity of the status bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `status_capacity` events
    /// observe `Lagged` and skip older items.
    pub status_capacity: usize,

    /// How long the read loop waits for [`Connection::close`](crate::Connection::close)
    /// before giving up on the handshake and reporting `Closed` anyway.
    pub close_timeout: Duration,
}

impl FirehoseConfig {
    /// Returns the status bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn status_capacity_clamped(&self) -> usize {
        self.status_capacity.max(1)
    }
}

impl Default for FirehoseConfig {
    /// `status_capacity = 1024`, `close_timeout = 5s`
    fn default() -> Self {
        Self {
            status_capacity: 1024,
            close_timeout: Duration::from_secs(5),
        }
    }
}

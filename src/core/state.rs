//! Connection state machine.
//!
//! ```text
//! Unopened ──► Opening ──► Open ──► Closed(None)          close() / relay ended the stream
//!                 │          └────► Closed(Some(err))     transport failure
//!                 ├───────────────► Closed(None)          close() before the connect resolved
//!                 └───────────────► Closed(Some(err))     connect failed
//! ```
//!
//! `Closed` is terminal. Transitions are published through a `tokio::sync::watch`
//! channel, see [`Firehose::watch_state`](crate::Firehose::watch_state).

use std::fmt;

use crate::error::ConnectionError;

/// Lifecycle state of a [`Firehose`](crate::Firehose).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not started yet. A built firehose is already past this state.
    #[default]
    Unopened,
    /// Transport connect in progress.
    Opening,
    /// Messages are being read and dispatched.
    Open,
    /// Finished; carries the terminal error, if any.
    Closed(Option<ConnectionError>),
}

impl ConnectionState {
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed(_))
    }

    /// Terminal error, if the state is `Closed` with one.
    pub fn error(&self) -> Option<&ConnectionError> {
        match self {
            ConnectionState::Closed(err) => err.as_ref(),
            _ => None,
        }
    }

    /// Short lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Unopened => "unopened",
            ConnectionState::Opening => "opening",
            ConnectionState::Open => "open",
            ConnectionState::Closed(_) => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Closed(Some(err)) => write!(f, "closed: {err}"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_error_accessor() {
        let err = ConnectionError::Transport {
            reason: "reset".into(),
        };
        let closed = ConnectionState::Closed(Some(err.clone()));
        assert!(closed.is_closed());
        assert_eq!(closed.error(), Some(&err));
        assert_eq!(closed.to_string(), "closed: transport error: reset");

        assert_eq!(ConnectionState::Closed(None).error(), None);
        assert_eq!(ConnectionState::default(), ConnectionState::Unopened);
        assert!(ConnectionState::Open.is_open());
    }
}

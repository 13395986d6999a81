//! Error types used by the firehose client.
//!
//! This module defines four error enums:
//!
//! - [`FirehoseError`]: a connection could not be constructed.
//! - [`ConnectionError`]: the transport failed to open or closed unexpectedly.
//! - [`DecodeError`]: a single message could not be parsed or classified.
//! - [`ListenerError`]: a listener failed while handling an event.
//!
//! Only [`FirehoseError`] and [`ConnectionError`] are terminal. Decode and listener
//! errors are reported (tracing + status bus) and the stream keeps going.
//! All types provide `as_label` / `as_message` helpers for logs and metrics.

use thiserror::Error;

/// # Errors produced while constructing a [`Firehose`](crate::Firehose).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FirehoseError {
    /// The service host does not form a valid connection URL.
    #[error("invalid service {service:?}: {reason}")]
    InvalidService {
        /// The host as given by the caller.
        service: String,
        /// Parser message.
        reason: String,
    },

    /// More repositories were selected than the relay accepts.
    #[error("{count} repos selected; at most {max} are allowed")]
    TooManyRepos {
        /// Number of selected repos.
        count: usize,
        /// Relay limit.
        max: usize,
    },

    /// Transport-level failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl FirehoseError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jetvisor::FirehoseError;
    ///
    /// let err = FirehoseError::TooManyRepos { count: 10_001, max: 10_000 };
    /// assert_eq!(err.as_label(), "firehose_too_many_repos");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FirehoseError::InvalidService { .. } => "firehose_invalid_service",
            FirehoseError::TooManyRepos { .. } => "firehose_too_many_repos",
            FirehoseError::Connection(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FirehoseError::InvalidService { service, reason } => {
                format!("invalid service {service}: {reason}")
            }
            FirehoseError::TooManyRepos { count, max } => {
                format!("too many repos: {count} > {max}")
            }
            FirehoseError::Connection(e) => e.as_message(),
        }
    }
}

/// # Errors raised by the transport.
///
/// Stored in [`ConnectionState::Closed`](crate::ConnectionState::Closed), hence `Clone`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection could not be opened.
    #[error("failed to connect to {url}: {reason}")]
    Connect {
        /// Target URL.
        url: String,
        /// Underlying error message.
        reason: String,
    },

    /// The open connection failed while reading.
    #[error("transport error: {reason}")]
    Transport {
        /// Underlying error message.
        reason: String,
    },

    /// The relay sent a close frame with an abnormal status code.
    #[error("closed by relay with code {code}: {reason}")]
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason sent by the relay (may be empty).
        reason: String,
    },
}

impl ConnectionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectionError::Connect { .. } => "connection_connect",
            ConnectionError::Transport { .. } => "connection_transport",
            ConnectionError::Closed { .. } => "connection_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConnectionError::Connect { url, reason } => format!("connect {url}: {reason}"),
            ConnectionError::Transport { reason } => format!("transport: {reason}"),
            ConnectionError::Closed { code, reason } => format!("closed ({code}): {reason}"),
        }
    }
}

/// # Errors produced by the message decoder.
///
/// `UnknownVariant` is kept apart from `Malformed`: the relay may introduce
/// new kinds or operations, and those must surface loudly instead of being
/// mistaken for garbage.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The message is not valid JSON or does not match the event shape.
    #[error("malformed message: {reason}")]
    Malformed {
        /// Parser message.
        reason: String,
    },

    /// `kind` or `commit.operation` holds a value this client does not know.
    #[error("unknown {field} {value:?}")]
    UnknownVariant {
        /// Wire field holding the discriminant (`kind` or `commit.operation`).
        field: &'static str,
        /// The unrecognized value.
        value: String,
    },
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jetvisor::DecodeError;
    ///
    /// let err = DecodeError::UnknownVariant { field: "kind", value: "frobnicate".into() };
    /// assert_eq!(err.as_label(), "decode_unknown_variant");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Malformed { .. } => "decode_malformed",
            DecodeError::UnknownVariant { .. } => "decode_unknown_variant",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DecodeError::Malformed { reason } => format!("malformed: {reason}"),
            DecodeError::UnknownVariant { field, value } => format!("unknown {field}={value}"),
        }
    }

    /// Indicates whether the message carried a discriminant this client does not know.
    pub fn is_unknown_variant(&self) -> bool {
        matches!(self, DecodeError::UnknownVariant { .. })
    }
}

/// # Errors produced by listeners.
///
/// A listener may return [`ListenerError::Failed`] itself; panics are caught by
/// the dispatcher and converted to [`ListenerError::Panicked`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// Listener reported a failure.
    #[error("listener failed: {reason}")]
    Failed {
        /// The underlying error message.
        reason: String,
    },

    /// Listener panicked.
    #[error("listener panicked: {reason}")]
    Panicked {
        /// Panic payload, if it was a string.
        reason: String,
    },
}

impl ListenerError {
    /// Convenience constructor for listener implementations.
    pub fn failed(reason: impl Into<String>) -> Self {
        ListenerError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Failed { .. } => "listener_failed",
            ListenerError::Panicked { .. } => "listener_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ListenerError::Failed { reason } => format!("failed: {reason}"),
            ListenerError::Panicked { reason } => format!("panicked: {reason}"),
        }
    }

    /// Returns the failure reason.
    pub fn reason(&self) -> &str {
        match self {
            ListenerError::Failed { reason } | ListenerError::Panicked { reason } => reason,
        }
    }
}

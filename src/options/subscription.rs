//! # Subscription options for a firehose connection.
//!
//! Defines [`SubscriptionOptions`] the description of *what* to stream and
//! *where from*: relay host, server-side filters and replay cursor.
//!
//! Options can be created:
//! - **Explicitly** with [`SubscriptionOptions::new`] plus `with_*` setters
//! - **Fluently** with [`SubscriptionOptions::builder`]
//!
//! ## Rules
//! - Options are consumed when a [`Firehose`](crate::Firehose) is built; filters
//!   cannot change on a live connection.
//! - A cursor of `0` means the same as no cursor: live-tail from "now".
//! - At most [`MAX_WANTED_DIDS`] repos may be selected.
//! - Collection and repo strings are passed through unvalidated.

use crate::model::{Did, Nsid};

/// Maximum number of `wantedDids` the relay accepts.
pub const MAX_WANTED_DIDS: usize = 10_000;

/// What to stream from a Jetstream relay.
///
/// ## Example
/// ```rust
/// use jetvisor::SubscriptionOptions;
///
/// let opts = SubscriptionOptions::new("jetstream1.us-east.bsky.network")
///     .with_collections(["app.bsky.feed.post", "app.bsky.graph.*"])
///     .with_cursor(Some(1_725_911_162_329_308));
///
/// assert_eq!(opts.select_collections().len(), 2);
/// assert!(opts.select_repos().is_empty());
/// assert_eq!(opts.cursor(), Some(1_725_911_162_329_308));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionOptions {
    service: String,
    select_collections: Vec<Nsid>,
    select_repos: Vec<Did>,
    cursor: Option<u64>,
    secure: bool,
}

impl SubscriptionOptions {
    /// Creates options for `service` with no filters and no cursor.
    ///
    /// `service` is a bare host (subdomain, domain and TLD, optionally `:port`),
    /// for example one of the public Bluesky instances:
    /// - `jetstream1.us-east.bsky.network`
    /// - `jetstream2.us-east.bsky.network`
    /// - `jetstream1.us-west.bsky.network`
    /// - `jetstream2.us-west.bsky.network`
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            select_collections: Vec::new(),
            select_repos: Vec::new(),
            cursor: None,
            secure: true,
        }
    }

    /// Relay host.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Collection filters, in the order they are sent.
    pub fn select_collections(&self) -> &[Nsid] {
        &self.select_collections
    }

    /// Repo filters, in the order they are sent.
    pub fn select_repos(&self) -> &[Did] {
        &self.select_repos
    }

    /// Replay cursor; `Some(0)` is normalized to `None`.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor.filter(|c| *c != 0)
    }

    /// Whether the connection uses TLS (`wss`).
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Returns new options with the given collection filters.
    ///
    /// Entries are either exact NSIDs or prefix patterns like `app.bsky.graph.*`.
    pub fn with_collections<I, N>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Nsid>,
    {
        self.select_collections = collections.into_iter().map(Into::into).collect();
        self
    }

    /// Returns new options with the given repo filters.
    ///
    /// At most [`MAX_WANTED_DIDS`] entries are accepted when connecting.
    pub fn with_repos<I, D>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Did>,
    {
        self.select_repos = repos.into_iter().map(Into::into).collect();
        self
    }

    /// Returns new options with the given replay cursor (Unix microseconds).
    ///
    /// An absent cursor, a zero cursor or a cursor from the future results in live-tail.
    /// When reconnecting, use the `time_us` of the last processed event, possibly
    /// minus a few seconds, for gapless playback.
    pub fn with_cursor(mut self, cursor: Option<u64>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Returns new options using plain `ws` instead of `wss` when `secure` is false.
    ///
    /// Useful for a local relay (e.g. `localhost:6008`).
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns a copy that resumes from `cursor`, keeping every filter.
    pub fn resume_from(&self, cursor: u64) -> Self {
        self.clone().with_cursor(Some(cursor))
    }

    /// Checks the repo limit.
    pub(crate) fn check_limits(&self) -> Result<(), crate::FirehoseError> {
        let count = self.select_repos.len();
        if count > MAX_WANTED_DIDS {
            return Err(crate::FirehoseError::TooManyRepos {
                count,
                max: MAX_WANTED_DIDS,
            });
        }
        Ok(())
    }
}

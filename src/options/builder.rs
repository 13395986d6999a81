//! # Fluent builder for [`SubscriptionOptions`].
//!
//! Collections and repos accumulate across calls; everything else overwrites.
//! Nothing is validated here: the repo cap is checked when a
//! [`Firehose`](crate::Firehose) is built.

use crate::model::{Did, Nsid};

use super::subscription::SubscriptionOptions;

/// Builder for [`SubscriptionOptions`] with fluent API.
#[derive(Clone, Debug)]
pub struct SubscriptionOptionsBuilder {
    service: String,
    collections: Vec<Nsid>,
    repos: Vec<Did>,
    cursor: Option<u64>,
    secure: bool,
}

impl SubscriptionOptionsBuilder {
    /// Creates a new builder for the given relay host.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            collections: Vec::new(),
            repos: Vec::new(),
            cursor: None,
            secure: true,
        }
    }

    /// Appends one collection filter.
    pub fn collection(mut self, nsid: impl Into<Nsid>) -> Self {
        self.collections.push(nsid.into());
        self
    }

    /// Appends several collection filters, keeping their order.
    pub fn collections<I, N>(mut self, nsids: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Nsid>,
    {
        self.collections.extend(nsids.into_iter().map(Into::into));
        self
    }

    /// Appends one repo filter.
    pub fn repo(mut self, did: impl Into<Did>) -> Self {
        self.repos.push(did.into());
        self
    }

    /// Appends several repo filters, keeping their order.
    pub fn repos<I, D>(mut self, dids: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Did>,
    {
        self.repos.extend(dids.into_iter().map(Into::into));
        self
    }

    /// Replays from `time_us` (Unix microseconds); `0` means live tail.
    pub fn cursor(mut self, time_us: u64) -> Self {
        self.cursor = Some(time_us);
        self
    }

    /// Chooses `wss://` (`true`, the default) or plain `ws://` for local relays.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Builds the options.
    pub fn build(self) -> SubscriptionOptions {
        SubscriptionOptions::new(self.service)
            .with_collections(self.collections)
            .with_repos(self.repos)
            .with_cursor(self.cursor)
            .with_secure(self.secure)
    }
}

impl SubscriptionOptions {
    /// Creates a builder for constructing options with fluent API.
    ///
    /// ```rust
    /// use jetvisor::SubscriptionOptions;
    ///
    /// let opts = SubscriptionOptions::builder("localhost:6008")
    ///     .collection("app.bsky.feed.post")
    ///     .repo("did:plc:abc")
    ///     .secure(false)
    ///     .build();
    /// assert!(!opts.secure());
    /// ```
    pub fn builder(service: impl Into<String>) -> SubscriptionOptionsBuilder {
        SubscriptionOptionsBuilder::new(service)
    }
}

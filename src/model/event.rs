//! # Repository events carried by the firehose.
//!
//! The [`Event`] enum covers the three top-level kinds sent by the relay:
//! - **identity**: handle or identity document changed ([`IdentityEvent`])
//! - **account**: hosting status changed ([`AccountEvent`])
//! - **commit**: one record was created, updated or deleted ([`Commit`])
//!
//! Commits are further split by operation so that each one has its own payload
//! type ([`CreateEvent`], [`UpdateEvent`], [`DeleteEvent`]).
//!
//! ## Dispatch keys
//! Every event maps to exactly one [`DispatchKey`]. For identity/account events the
//! key is the kind itself; for commits it is the **operation**, never `commit`:
//! ```text
//! kind=identity                      ──► identity
//! kind=account                       ──► account
//! kind=commit, commit.operation=create ──► create
//! kind=commit, commit.operation=update ──► update
//! kind=commit, commit.operation=delete ──► delete
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ids::{Did, Nsid};

/// Top-level classification of a firehose message (the wire `kind` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Identity change.
    Identity,
    /// Account status change.
    Account,
    /// Repository commit.
    Commit,
}

impl EventKind {
    /// Wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Identity => "identity",
            EventKind::Account => "account",
            EventKind::Commit => "commit",
        }
    }
}

/// Commit operation (the wire `commit.operation` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Record created.
    Create,
    /// Record replaced.
    Update,
    /// Record removed.
    Delete,
}

impl Operation {
    /// Wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Key listeners subscribe to.
///
/// One key per identity/account kind and one per commit operation; there is no
/// `commit` key and no catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchKey {
    /// `identity` events.
    Identity,
    /// `account` events.
    Account,
    /// `commit` events with `operation = create`.
    Create,
    /// `commit` events with `operation = update`.
    Update,
    /// `commit` events with `operation = delete`.
    Delete,
}

impl DispatchKey {
    /// All keys, in a stable order.
    pub const ALL: [DispatchKey; 5] = [
        DispatchKey::Identity,
        DispatchKey::Account,
        DispatchKey::Create,
        DispatchKey::Update,
        DispatchKey::Delete,
    ];

    /// Key name as used by the relay (`identity`, `account`, `create`, `update`, `delete`).
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchKey::Identity => "identity",
            DispatchKey::Account => "account",
            DispatchKey::Create => "create",
            DispatchKey::Update => "update",
            DispatchKey::Delete => "delete",
        }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Operation> for DispatchKey {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Create => DispatchKey::Create,
            Operation::Update => DispatchKey::Update,
            Operation::Delete => DispatchKey::Delete,
        }
    }
}

/// Identity change of a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub did: Did,
    /// Relay sequence number.
    pub seq: i64,
    pub time: DateTime<Utc>,
    /// Current handle, absent when the identity has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// Account status change of a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub did: Did,
    /// Relay sequence number.
    pub seq: i64,
    pub time: DateTime<Utc>,
    /// `false` when the account is inactive at the emitting host, which includes takedowns.
    pub active: bool,
    /// Reason for inactivity (`takendown`, `suspended`, `deleted`, `deactivated`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Created record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Create {
    /// Repository revision of the commit.
    pub rev: String,
    pub collection: Nsid,
    /// Record key within the collection.
    pub rkey: String,
    /// Content hash of the record.
    pub cid: String,
    /// Record body, not validated against any schema.
    pub record: serde_json::Value,
}

/// Replaced record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Repository revision of the commit.
    pub rev: String,
    pub collection: Nsid,
    /// Record key within the collection.
    pub rkey: String,
    /// Content hash of the new record.
    pub cid: String,
    /// New record body, not validated against any schema.
    pub record: serde_json::Value,
}

/// Removed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    /// Repository revision of the commit.
    pub rev: String,
    pub collection: Nsid,
    /// Record key within the collection.
    pub rkey: String,
}

impl Create {
    /// Interprets the record body with a caller-provided schema.
    pub fn record_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.record)
    }

    /// `at://` URI of the record.
    pub fn uri(&self, did: &Did) -> String {
        format!("at://{did}/{}/{}", self.collection, self.rkey)
    }
}

impl Update {
    /// Interprets the record body with a caller-provided schema.
    pub fn record_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.record)
    }

    /// `at://` URI of the record.
    pub fn uri(&self, did: &Did) -> String {
        format!("at://{did}/{}/{}", self.collection, self.rkey)
    }
}

impl Delete {
    /// `at://` URI of the removed record.
    pub fn uri(&self, did: &Did) -> String {
        format!("at://{did}/{}/{}", self.collection, self.rkey)
    }
}

/// `identity` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityEvent {
    pub did: Did,
    /// Relay timestamp in Unix microseconds; usable as a resume cursor.
    pub time_us: u64,
    pub identity: Identity,
}

/// `account` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEvent {
    pub did: Did,
    /// Relay timestamp in Unix microseconds; usable as a resume cursor.
    pub time_us: u64,
    pub account: Account,
}

/// `commit` message with a typed operation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEvent<C> {
    pub did: Did,
    /// Relay timestamp in Unix microseconds; usable as a resume cursor.
    pub time_us: u64,
    pub commit: C,
}

/// Payload delivered to `create` listeners.
pub type CreateEvent = CommitEvent<Create>;
/// Payload delivered to `update` listeners.
pub type UpdateEvent = CommitEvent<Update>;
/// Payload delivered to `delete` listeners.
pub type DeleteEvent = CommitEvent<Delete>;

/// Commit, split by operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    Create(CreateEvent),
    Update(UpdateEvent),
    Delete(DeleteEvent),
}

impl Commit {
    /// Operation of this commit.
    pub fn operation(&self) -> Operation {
        match self {
            Commit::Create(_) => Operation::Create,
            Commit::Update(_) => Operation::Update,
            Commit::Delete(_) => Operation::Delete,
        }
    }

    /// Collection the record belongs to.
    pub fn collection(&self) -> &Nsid {
        match self {
            Commit::Create(c) => &c.commit.collection,
            Commit::Update(c) => &c.commit.collection,
            Commit::Delete(c) => &c.commit.collection,
        }
    }
}

/// Decoded firehose message.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Identity(IdentityEvent),
    Account(AccountEvent),
    Commit(Commit),
}

impl Event {
    /// Top-level kind.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Identity(_) => EventKind::Identity,
            Event::Account(_) => EventKind::Account,
            Event::Commit(_) => EventKind::Commit,
        }
    }

    /// Key used to route the event to listeners.
    pub fn key(&self) -> DispatchKey {
        match self {
            Event::Identity(_) => DispatchKey::Identity,
            Event::Account(_) => DispatchKey::Account,
            Event::Commit(c) => c.operation().into(),
        }
    }

    /// Repository the event is about.
    pub fn did(&self) -> &Did {
        match self {
            Event::Identity(e) => &e.did,
            Event::Account(e) => &e.did,
            Event::Commit(Commit::Create(e)) => &e.did,
            Event::Commit(Commit::Update(e)) => &e.did,
            Event::Commit(Commit::Delete(e)) => &e.did,
        }
    }

    /// Relay timestamp in Unix microseconds.
    pub fn time_us(&self) -> u64 {
        match self {
            Event::Identity(e) => e.time_us,
            Event::Account(e) => e.time_us,
            Event::Commit(Commit::Create(e)) => e.time_us,
            Event::Commit(Commit::Update(e)) => e.time_us,
            Event::Commit(Commit::Delete(e)) => e.time_us,
        }
    }
}

/// A decoded event together with the key it is dispatched under.
///
/// The key is derived from the event on construction and cannot disagree with it.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    key: DispatchKey,
    event: Event,
}

impl DispatchedEvent {
    /// Wraps an event, deriving its dispatch key.
    pub fn new(event: Event) -> Self {
        Self {
            key: event.key(),
            event,
        }
    }

    /// Dispatch key.
    #[inline]
    pub fn key(&self) -> DispatchKey {
        self.key
    }

    /// The decoded event.
    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Unwraps the decoded event.
    pub fn into_event(self) -> Event {
        self.event
    }
}

impl From<Event> for DispatchedEvent {
    fn from(event: Event) -> Self {
        Self::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete_event() -> Event {
        Event::Commit(Commit::Delete(CommitEvent {
            did: Did::new("did:plc:abc"),
            time_us: 42,
            commit: Delete {
                rev: "3l".into(),
                collection: Nsid::new("app.bsky.feed.like"),
                rkey: "k1".into(),
            },
        }))
    }

    #[test]
    fn test_commit_key_is_operation() {
        let ev = DispatchedEvent::new(delete_event());
        assert_eq!(ev.key(), DispatchKey::Delete);
        assert_eq!(ev.event().kind(), EventKind::Commit);
        assert_eq!(ev.event().time_us(), 42);
        assert_eq!(ev.event().did(), "did:plc:abc");
    }

    #[test]
    fn test_commit_collection_and_into_event() {
        let ev = DispatchedEvent::new(delete_event());
        let Event::Commit(commit) = ev.into_event() else {
            unreachable!()
        };
        assert_eq!(commit.operation(), Operation::Delete);
        assert_eq!(commit.collection(), "app.bsky.feed.like");
    }

    #[test]
    fn test_record_uri() {
        let Event::Commit(Commit::Delete(ev)) = delete_event() else {
            unreachable!()
        };
        assert_eq!(ev.commit.uri(&ev.did), "at://did:plc:abc/app.bsky.feed.like/k1");
    }

    #[test]
    fn test_record_as() {
        #[derive(Deserialize)]
        struct Post {
            text: String,
        }

        let create = Create {
            rev: "1".into(),
            collection: Nsid::new("app.bsky.feed.post"),
            rkey: "x".into(),
            cid: "bafy".into(),
            record: serde_json::json!({ "$type": "app.bsky.feed.post", "text": "hi" }),
        };
        let post: Post = create.record_as().unwrap();
        assert_eq!(post.text, "hi");
    }

    #[test]
    fn test_key_names() {
        let names: Vec<_> = DispatchKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["identity", "account", "create", "update", "delete"]);
    }
}

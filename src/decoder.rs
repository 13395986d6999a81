//! # Message decoder.
//!
//! Turns one raw text message from the relay into a [`DispatchedEvent`].
//!
//! ## Flow
//! ```text
//! text ──► JSON ──► kind ──┬─ identity ─────────────────────► IdentityEvent  (key=identity)
//!                          ├─ account ──────────────────────► AccountEvent   (key=account)
//!                          ├─ commit ──► commit.operation ─┬─ create ──► CreateEvent (key=create)
//!                          │                               ├─ update ──► UpdateEvent (key=update)
//!                          │                               ├─ delete ──► DeleteEvent (key=delete)
//!                          │                               └─ other  ──► UnknownVariant
//!                          └─ other ────────────────────────► UnknownVariant
//! ```
//!
//! ## Rules
//! - Invalid JSON, missing discriminants or a payload that does not fit the
//!   variant yield [`DecodeError::Malformed`].
//! - Unrecognized `kind` / `commit.operation` values yield
//!   [`DecodeError::UnknownVariant`]; they are never coerced into a known variant.
//! - `record` bodies are kept as opaque JSON.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;
use crate::model::{Commit, DispatchedEvent, Event, EventKind, Operation};

/// Decodes one relay message.
///
/// ## Example
/// ```rust
/// use jetvisor::{DispatchKey, Event, Commit, decode};
///
/// let msg = r#"{"did":"did:plc:abc","time_us":5,"kind":"commit","commit":{
///     "operation":"create","rev":"1","collection":"app.bsky.feed.post",
///     "rkey":"x","cid":"bafy","record":{}}}"#;
///
/// let ev = decode(msg).unwrap();
/// assert_eq!(ev.key(), DispatchKey::Create);
/// let Event::Commit(Commit::Create(create)) = ev.event() else { unreachable!() };
/// assert_eq!(create.commit.rkey, "x");
/// ```
pub fn decode(text: &str) -> Result<DispatchedEvent, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::malformed(e.to_string()))?;

    let event = match kind_of(&value)? {
        EventKind::Identity => Event::Identity(payload(value)?),
        EventKind::Account => Event::Account(payload(value)?),
        EventKind::Commit => Event::Commit(match operation_of(&value)? {
            Operation::Create => Commit::Create(payload(value)?),
            Operation::Update => Commit::Update(payload(value)?),
            Operation::Delete => Commit::Delete(payload(value)?),
        }),
    };
    Ok(DispatchedEvent::new(event))
}

impl FromStr for DispatchedEvent {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

fn kind_of(value: &Value) -> Result<EventKind, DecodeError> {
    let kind = discriminant(value.get("kind"), "kind")?;
    match kind {
        "identity" => Ok(EventKind::Identity),
        "account" => Ok(EventKind::Account),
        "commit" => Ok(EventKind::Commit),
        other => Err(DecodeError::UnknownVariant {
            field: "kind",
            value: other.to_owned(),
        }),
    }
}

fn operation_of(value: &Value) -> Result<Operation, DecodeError> {
    let op = discriminant(value.pointer("/commit/operation"), "commit.operation")?;
    match op {
        "create" => Ok(Operation::Create),
        "update" => Ok(Operation::Update),
        "delete" => Ok(Operation::Delete),
        other => Err(DecodeError::UnknownVariant {
            field: "commit.operation",
            value: other.to_owned(),
        }),
    }
}

fn discriminant<'a>(field: Option<&'a Value>, name: &str) -> Result<&'a str, DecodeError> {
    match field {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(DecodeError::malformed(format!("`{name}` is not a string"))),
        None => Err(DecodeError::malformed(format!("missing `{name}`"))),
    }
}

fn payload<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::model::DispatchKey;

    fn commit(op: &str) -> String {
        json!({
            "did": "did:plc:abc",
            "time_us": 5,
            "kind": "commit",
            "commit": {
                "operation": op,
                "rev": "1",
                "collection": "app.bsky.feed.post",
                "rkey": "x",
                "cid": "bafy",
                "record": { "text": "hello" }
            }
        })
        .to_string()
    }

    #[test]
    fn test_identity_round_trip() {
        let msg = json!({
            "did": "did:plc:abc",
            "time_us": 1_725_516_665_333_808u64,
            "kind": "identity",
            "identity": {
                "did": "did:plc:abc",
                "handle": "alice.bsky.social",
                "seq": 1_409_752_997,
                "time": "2024-09-05T06:11:04.870Z"
            }
        })
        .to_string();

        let ev = decode(&msg).unwrap();
        assert_eq!(ev.key(), DispatchKey::Identity);
        let Event::Identity(id) = ev.event() else {
            panic!("expected identity, got {:?}", ev.event());
        };
        assert_eq!(id.did, "did:plc:abc");
        assert_eq!(id.time_us, 1_725_516_665_333_808);
        assert_eq!(id.identity.handle.as_deref(), Some("alice.bsky.social"));
        assert_eq!(id.identity.seq, 1_409_752_997);
        assert_eq!(
            id.identity.time,
            Utc.with_ymd_and_hms(2024, 9, 5, 6, 11, 4).unwrap()
                + chrono::Duration::milliseconds(870)
        );
    }

    #[test]
    fn test_identity_without_handle() {
        let msg = r#"{"did":"did:plc:abc","time_us":1,"kind":"identity",
            "identity":{"did":"did:plc:abc","seq":2,"time":"2024-09-05T06:11:04Z"}}"#;
        let ev = decode(msg).unwrap();
        let Event::Identity(id) = ev.event() else {
            panic!("expected identity");
        };
        assert_eq!(id.identity.handle, None);
    }

    #[test]
    fn test_account_round_trip() {
        let msg = r#"{"did":"did:plc:abc","time_us":9,"kind":"account",
            "account":{"active":false,"did":"did:plc:abc","seq":3,
            "status":"takendown","time":"2024-09-05T06:11:04.870Z"}}"#;
        let ev = decode(msg).unwrap();
        assert_eq!(ev.key(), DispatchKey::Account);
        let Event::Account(acc) = ev.event() else {
            panic!("expected account");
        };
        assert!(!acc.account.active);
        assert_eq!(acc.account.status.as_deref(), Some("takendown"));
        assert_eq!(acc.account.seq, 3);
    }

    #[test]
    fn test_commit_key_is_operation() {
        for (op, key) in [
            ("create", DispatchKey::Create),
            ("update", DispatchKey::Update),
            ("delete", DispatchKey::Delete),
        ] {
            let ev = decode(&commit(op)).unwrap();
            assert_eq!(ev.key(), key);
            assert_eq!(ev.event().kind(), EventKind::Commit);
        }
    }

    #[test]
    fn test_create_payload() {
        let ev: DispatchedEvent = commit("create").parse().unwrap();
        let Event::Commit(Commit::Create(c)) = ev.event() else {
            panic!("expected create");
        };
        assert_eq!(c.commit.rkey, "x");
        assert_eq!(c.commit.cid, "bafy");
        assert_eq!(c.commit.collection, "app.bsky.feed.post");
        assert_eq!(c.commit.record, json!({ "text": "hello" }));
    }

    #[test]
    fn test_delete_ignores_record_fields() {
        let msg = r#"{"did":"did:plc:abc","time_us":5,"kind":"commit",
            "commit":{"operation":"delete","rev":"1","collection":"app.bsky.feed.like","rkey":"k"}}"#;
        let ev = decode(msg).unwrap();
        let Event::Commit(Commit::Delete(d)) = ev.event() else {
            panic!("expected delete");
        };
        assert_eq!(d.commit.rkey, "k");
    }

    #[test]
    fn test_unknown_kind() {
        let msg = r#"{"did":"did:plc:abc","time_us":5,"kind":"frobnicate"}"#;
        assert_eq!(
            decode(msg),
            Err(DecodeError::UnknownVariant {
                field: "kind",
                value: "frobnicate".into(),
            })
        );
    }

    #[test]
    fn test_unknown_operation() {
        let err = decode(&commit("upsert")).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownVariant {
                field: "commit.operation",
                value: "upsert".into(),
            }
        );
        assert!(err.is_unknown_variant());
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            "not json",
            "[]",
            r#"{"did":"did:plc:abc","time_us":5}"#,
            r#"{"did":"did:plc:abc","time_us":5,"kind":7}"#,
            r#"{"did":"did:plc:abc","time_us":5,"kind":"commit"}"#,
            r#"{"did":"did:plc:abc","time_us":5,"kind":"commit","commit":{"operation":"create","rev":"1"}}"#,
            r#"{"did":"did:plc:abc","time_us":"soon","kind":"identity","identity":{}}"#,
        ];
        for msg in cases {
            let res = decode(msg);
            assert!(
                matches!(res, Err(DecodeError::Malformed { .. })),
                "{msg} gave {res:?}"
            );
        }
    }
}

//! # Identifier newtypes.
//!
//! [`Did`] names a repository, [`Nsid`] names a record collection (or a prefix
//! pattern of collections). Both are transparent over `String` on the wire and
//! are **not validated** on construction: the relay is the source of truth and
//! rejects what it does not understand.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decentralized identifier of a repository, e.g. `did:plc:ewvi7nxzyoun6zhxrhs64oiz`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Wraps a DID string as-is.
    pub fn new(did: impl Into<String>) -> Self {
        Self(did.into())
    }

    /// Returns the DID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the DID method (`plc`, `web`, ...) if the string has the `did:<method>:` shape.
    pub fn method(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("did:")?;
        let (method, id) = rest.split_once(':')?;
        (!method.is_empty() && !id.is_empty()).then_some(method)
    }
}

/// Namespaced identifier of a record collection, e.g. `app.bsky.feed.post`.
///
/// Subscriptions also accept prefix patterns such as `app.bsky.graph.*`. The part
/// before `.*` must itself be a valid NSID prefix; incomplete segments like
/// `app.bsky.graph.fo*` are not supported by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nsid(String);

impl Nsid {
    /// Wraps an NSID string as-is.
    pub fn new(nsid: impl Into<String>) -> Self {
        Self(nsid.into())
    }

    /// Returns the NSID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a prefix pattern ending in `.*`.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.0.ends_with(".*")
    }

    /// Checks the dotted shape of the identifier or of the prefix before `.*`.
    ///
    /// Every segment must be non-empty and made of ASCII alphanumerics or `-`,
    /// and there must be at least two segments. This is a shape check only;
    /// nothing in the client calls it implicitly.
    ///
    /// ```
    /// use jetvisor::Nsid;
    ///
    /// assert!(Nsid::new("app.bsky.feed.post").is_valid_pattern());
    /// assert!(Nsid::new("app.bsky.*").is_valid_pattern());
    /// assert!(!Nsid::new("app.bsky.graph.fo*").is_valid_pattern());
    /// assert!(!Nsid::new("app").is_valid_pattern());
    /// ```
    pub fn is_valid_pattern(&self) -> bool {
        let prefix = self.0.strip_suffix(".*").unwrap_or(&self.0);
        let mut segments = 0usize;
        for segment in prefix.split('.') {
            let ok = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-');
            if !ok {
                return false;
            }
            segments += 1;
        }
        segments >= 2
    }
}

macro_rules! string_newtype {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_newtype!(Did);
string_newtype!(Nsid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_method() {
        assert_eq!(Did::new("did:plc:abc").method(), Some("plc"));
        assert_eq!(Did::new("did:web:example.com").method(), Some("web"));
        assert_eq!(Did::new("did:plc:").method(), None);
        assert_eq!(Did::new("plc:abc").method(), None);
    }

    #[test]
    fn test_nsid_wildcard_shape() {
        assert!(Nsid::new("app.bsky.graph.*").is_wildcard());
        assert!(!Nsid::new("app.bsky.graph.follow").is_wildcard());
        assert!(Nsid::new("app.bsky.graph.*").is_valid_pattern());
        assert!(!Nsid::new(".*").is_valid_pattern());
        assert!(!Nsid::new("app..post").is_valid_pattern());
        assert!(!Nsid::new("app.bsky.feed.post*").is_valid_pattern());
    }

    #[test]
    fn test_transparent_serde() {
        let did: Did = serde_json::from_str("\"did:plc:abc\"").unwrap();
        assert_eq!(did, "did:plc:abc");
        assert_eq!(serde_json::to_string(&did).unwrap(), "\"did:plc:abc\"");
    }
}

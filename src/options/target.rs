//! # Connection target for a subscription.
//!
//! Turns [`SubscriptionOptions`] into the relay URL:
//! ```text
//! wss://{service}/subscribe?cursor={time_us}
//!                          &wantedCollections={nsid}   (one per collection, input order)
//!                          &wantedDids={did}           (one per repo, input order)
//! ```
//!
//! ## Rules
//! - `cursor` is present only for a non-zero cursor.
//! - Repeated parameters keep input order.
//! - Values are not validated here; malformed NSIDs/DIDs reach the relay as-is.

use url::Url;

use crate::FirehoseError;

use super::subscription::SubscriptionOptions;

/// Path of the Jetstream subscription endpoint.
pub const SUBSCRIBE_PATH: &str = "/subscribe";

impl SubscriptionOptions {
    /// Builds the URL to connect to.
    ///
    /// ### Errors
    /// [`FirehoseError::InvalidService`] if `service` is not a bare host (optionally with port).
    ///
    /// ## Example
    /// ```rust
    /// use jetvisor::SubscriptionOptions;
    ///
    /// let url = SubscriptionOptions::new("example.relay")
    ///     .with_collections(["app.bsky.feed.post"])
    ///     .with_cursor(Some(1000))
    ///     .target()
    ///     .unwrap();
    ///
    /// assert_eq!(url.path(), "/subscribe");
    /// assert_eq!(url.query(), Some("cursor=1000&wantedCollections=app.bsky.feed.post"));
    /// ```
    pub fn target(&self) -> Result<Url, FirehoseError> {
        let scheme = if self.secure() { "wss" } else { "ws" };
        let service = self.service();

        let invalid = |reason: &str| FirehoseError::InvalidService {
            service: service.to_owned(),
            reason: reason.to_owned(),
        };

        if service.is_empty() || service.contains(['/', '?', '#', '@']) {
            return Err(invalid("expected a bare host"));
        }

        let mut url = Url::parse(&format!("{scheme}://{service}{SUBSCRIBE_PATH}"))
            .map_err(|e| invalid(&e.to_string()))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host"));
        }

        let has_params = self.cursor().is_some()
            || !self.select_collections().is_empty()
            || !self.select_repos().is_empty();
        if has_params {
            let mut query = url.query_pairs_mut();
            if let Some(cursor) = self.cursor() {
                query.append_pair("cursor", &cursor.to_string());
            }
            for collection in self.select_collections() {
                query.append_pair("wantedCollections", collection.as_str());
            }
            for repo in self.select_repos() {
                query.append_pair("wantedDids", repo.as_str());
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn params(url: &Url, name: &str) -> Vec<String> {
        url.query_pairs()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    #[test]
    fn test_bare_target() {
        let url = SubscriptionOptions::new("jetstream1.us-east.bsky.network")
            .target()
            .unwrap();
        assert_eq!(url.as_str(), "wss://jetstream1.us-east.bsky.network/subscribe");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_insecure_with_port() {
        let url = SubscriptionOptions::new("localhost:6008")
            .with_secure(false)
            .target()
            .unwrap();
        assert_eq!(url.scheme(), "ws");
        assert_eq!(url.port(), Some(6008));
        assert_eq!(url.path(), SUBSCRIBE_PATH);
    }

    #[test]
    fn test_cursor_zero_omitted() {
        let url = SubscriptionOptions::new("relay")
            .with_cursor(Some(0))
            .target()
            .unwrap();
        assert!(params(&url, "cursor").is_empty());
    }

    #[test]
    fn test_repeated_params_keep_order() {
        let url = SubscriptionOptions::new("relay")
            .with_collections(["app.bsky.graph.*", "app.bsky.feed.post", "app.bsky.feed.like"])
            .with_repos(["did:plc:b", "did:plc:a"])
            .target()
            .unwrap();
        assert_eq!(
            params(&url, "wantedCollections"),
            ["app.bsky.graph.*", "app.bsky.feed.post", "app.bsky.feed.like"]
        );
        assert_eq!(params(&url, "wantedDids"), ["did:plc:b", "did:plc:a"]);
    }

    #[test]
    fn test_malformed_values_pass_through() {
        let url = SubscriptionOptions::new("relay")
            .with_collections(["not an nsid", "app.bsky.graph.fo*"])
            .with_repos(["nope"])
            .target()
            .unwrap();
        assert_eq!(
            params(&url, "wantedCollections"),
            ["not an nsid", "app.bsky.graph.fo*"]
        );
        assert_eq!(params(&url, "wantedDids"), ["nope"]);
    }

    #[test]
    fn test_invalid_service() {
        for service in ["", "wss://relay", "relay/path", "user@relay", "relay:notaport"] {
            let res = SubscriptionOptions::new(service).target();
            assert!(
                matches!(res, Err(FirehoseError::InvalidService { .. })),
                "service {service:?} gave {res:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_params_match_input(
            collections in prop::collection::vec("[a-z]{1,8}(\\.[a-z]{1,8}){1,3}(\\.\\*)?", 0..8),
            repos in prop::collection::vec("did:plc:[a-z0-9]{1,24}", 0..8),
            cursor in prop::option::of(any::<u64>()),
        ) {
            let url = SubscriptionOptions::new("relay.example")
                .with_collections(collections.clone())
                .with_repos(repos.clone())
                .with_cursor(cursor)
                .target()
                .unwrap();

            prop_assert_eq!(params(&url, "wantedCollections"), collections);
            prop_assert_eq!(params(&url, "wantedDids"), repos);

            let cursors = params(&url, "cursor");
            match cursor.filter(|c| *c != 0) {
                Some(c) => prop_assert_eq!(cursors, vec![c.to_string()]),
                None => prop_assert!(cursors.is_empty()),
            }

            // cursor first, then every collection, then every repo
            let names: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
            let mut sorted = names.clone();
            sorted.sort_by_key(|n| match n.as_str() {
                "cursor" => 0,
                "wantedCollections" => 1,
                _ => 2,
            });
            prop_assert_eq!(names, sorted);
        }
    }
}

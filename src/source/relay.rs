//! Relay client.
//!
//! Feeds are never fetched directly.  Every request goes to a same-origin
//! relay endpoint as `GET <relay>?url=<feed url>`, and the relay answers with
//! the raw syndication text (it also caches upstream responses for five
//! minutes).

use std::time::Duration;

use reqwest::header::ACCEPT;
use url::Url;

use super::{FeedFetcher, FetchError};
use crate::config::FeedSource;

/// Default relay endpoint of the development server.
pub const DEFAULT_RELAY: &str = "http://localhost:3000/api/rss";

const USER_AGENT: &str = concat!("news-ticker/", env!("CARGO_PKG_VERSION"));
const ACCEPT_FEEDS: &str = "application/rss+xml, application/xml, text/xml";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetches feed payloads through the relay endpoint.
pub struct RelayClient {
    endpoint: Url,
    client: reqwest::blocking::Client,
}

impl RelayClient {
    pub fn new(endpoint: &str) -> Result<Self, FetchError> {
        let endpoint = Url::parse(endpoint).map_err(|e| FetchError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { endpoint, client })
    }

    /// The relay URL that fetches `feed_url`.
    pub fn request_url(&self, feed_url: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", feed_url);
        url
    }
}

impl FeedFetcher for RelayClient {
    fn fetch(&self, source: &FeedSource) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.request_url(&source.url))
            .header(ACCEPT, ACCEPT_FEEDS)
            .send()
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FetchError::Unreachable(e.to_string())
                } else {
                    FetchError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().map_err(|e| FetchError::Request(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_encodes_feed_url_as_query_parameter() {
        let client = RelayClient::new("http://localhost:3000/api/rss").unwrap();
        let url = client.request_url("https://news.example.com/rss?cat=top&lang=ja");

        assert_eq!(url.path(), "/api/rss");
        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "url");
        assert_eq!(pairs[0].1, "https://news.example.com/rss?cat=top&lang=ja");
        assert!(!url.as_str().contains("&lang"), "inner query must be encoded");
    }

    #[test]
    fn request_url_keeps_existing_query() {
        let client = RelayClient::new("http://relay.local/rss?token=abc").unwrap();
        let url = client.request_url("https://a.example/feed");
        let pairs: Vec<_> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(pairs, ["token", "url"]);
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = RelayClient::new("not a url").err().unwrap();
        assert!(matches!(err, FetchError::InvalidEndpoint { .. }));
    }

    #[test]
    fn unreachable_relay_is_a_transport_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = RelayClient::new("http://127.0.0.1:9/api/rss").unwrap();
        let err = client
            .fetch(&FeedSource::new("a", "A", "https://a.example/rss"))
            .unwrap_err();
        assert!(err.is_unreachable(), "got {err:?}");
    }
}

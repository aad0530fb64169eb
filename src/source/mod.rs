//! Feed sources: the item model, the payload parser and the relay client.
//!
//! The network side is hidden behind the [`FeedFetcher`] trait so that the
//! acquisition logic in [`crate::poll`] can be driven by a fake in tests.
//!
//! ## For contributors: adding a fetch path
//!
//! 1. Implement [`FeedFetcher`] for your client; return the raw payload text.
//! 2. Map transport failures (the whole endpoint is down) to
//!    [`FetchError::Unreachable`] and everything else to the other variants.
//!    Only transport failures can fail a whole fetch pass.
//! 3. Hand an `Arc` of it to [`Acquisition::mount`](crate::poll::Acquisition::mount).

mod news_item;
mod parse;
mod relay;

pub use news_item::{parse_timestamp, NewsItem};
pub use parse::{parse, parse_at, strip_html};
pub use relay::{RelayClient, DEFAULT_RELAY};

#[cfg(test)]
pub(crate) use news_item::tests::make_item;

use thiserror::Error;

use crate::config::FeedSource;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The relay could not be reached at all.
    #[error("relay unreachable: {0}")]
    Unreachable(String),

    #[error("relay answered HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid relay endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl FetchError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Retrieves the raw payload of one feed source.
///
/// Fetch passes run on a worker thread, hence `Send + Sync`.
pub trait FeedFetcher: Send + Sync {
    fn fetch(&self, source: &FeedSource) -> Result<String, FetchError>;
}

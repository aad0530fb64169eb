//! The normalised item every part of the ticker works with.
//!
//! Items come from two places: the syndication parser (relay fetches) and
//! the host injection channel.  Both produce `NewsItem`s, so ordering and
//! rotation never need to know which path an item took.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::DisplayContent;

/// A single headline, normalised from any source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    /// `"{source_id}-{index}"` for parsed items.  Unique within one parse
    /// batch only; refreshes reuse the same ids.
    pub id: String,

    pub title: String,

    /// Plain text.  Any markup has already been stripped.
    pub description: String,

    pub link: String,

    /// Never missing: unparsable dates become the time of parsing.
    pub published_at: DateTime<Utc>,

    /// Id of the [`FeedSource`](crate::config::FeedSource) this came from.
    pub source_id: String,
}

impl NewsItem {
    /// Comparator for newest-first ordering.
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.published_at.cmp(&a.published_at)
    }

    /// The field selected for display.
    pub fn text(&self, content: DisplayContent) -> &str {
        match content {
            DisplayContent::Title => &self.title,
            DisplayContent::Description => &self.description,
        }
    }
}

/// Parse a feed or injection timestamp, falling back to `now`.
///
/// Accepts RFC 2822 (`pubDate`), RFC 3339 (`updated`, injected ISO
/// strings), zone-less ISO date-times (read as UTC) and bare dates.
pub fn parse_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return now;
    };

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return naive.and_utc();
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return naive.and_utc();
    }

    tracing::debug!(raw, "unparsable timestamp, using current time");
    now
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Rotation models: what part of the ordered item list is visible when.
//!
//! * [`Marquee`] — one endless strip of every item, scrolled at a fixed
//!   speed.
//! * [`Carousel`] — one item at a time, swapped between two slots on a timer.
//!
//! Both are driven by the caller's clock; neither owns a thread or a
//! callback.  Text formatting shared by the two lives here.

mod carousel;
mod marquee;

pub use carousel::{Carousel, CarouselView, Phase, Slot, SlotId, TRANSITION};
pub use marquee::{Marquee, ITEM_GAP};

use chrono::{DateTime, Datelike, TimeZone, Timelike};

use crate::config::DisplayContent;
use crate::source::NewsItem;

/// Shown instead of a marquee or carousel while there is nothing to show.
pub const FETCHING_PLACEHOLDER: &str = "Fetching news…";
/// Shown while the first fetch is still running.
pub const LOADING_PLACEHOLDER: &str = "Loading…";

/// `M/D HH:MM`, e.g. `3/7 09:05`.
pub fn format_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!(
        "{}/{} {:02}:{:02}",
        at.month(),
        at.day(),
        at.hour(),
        at.minute()
    )
}

/// Marquee segment for each item: the selected field, optionally preceded
/// by its local timestamp.
pub fn marquee_segments<Tz: TimeZone>(
    items: &[NewsItem],
    content: DisplayContent,
    show_date_time: bool,
    tz: &Tz,
) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let text = item.text(content);
            if show_date_time {
                let stamp = format_stamp(&item.published_at.with_timezone(tz));
                format!("{stamp}  {text}")
            } else {
                text.to_string()
            }
        })
        .collect()
}

/// Carousel text for each item.
pub fn carousel_texts<Tz: TimeZone>(
    items: &[NewsItem],
    content: DisplayContent,
    show_date_time: bool,
    tz: &Tz,
) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let text = item.text(content);
            if show_date_time {
                let stamp = format_stamp(&item.published_at.with_timezone(tz));
                format!("{stamp} {text}")
            } else {
                text.to_string()
            }
        })
        .collect()
}

//! Continuous-scroll model.
//!
//! The content is every segment followed by a wide gap.  Rendering draws two
//! copies back to back ([`Marquee::stream`]) and shifts left by
//! [`Marquee::offset`]; after exactly one content width the offset snaps back
//! to zero, which looks seamless because the second copy sits where the first
//! started.

use std::time::Duration;

use unicode_width::UnicodeWidthStr;

use crate::config::MarqueeSpeed;

/// Spacing after every segment.
pub const ITEM_GAP: &str = "      ";

#[derive(Debug, Clone, PartialEq)]
pub struct Marquee {
    content: String,
    content_width: usize,
    loop_duration: Duration,
    started: Duration,
}

impl Marquee {
    pub fn new(segments: &[String], speed: MarqueeSpeed, now: Duration) -> Self {
        let content: String = segments
            .iter()
            .flat_map(|segment| [segment.as_str(), ITEM_GAP])
            .collect();
        let content_width = content.width();
        Self {
            loop_duration: speed.loop_duration(content_width),
            content,
            content_width,
            started: now,
        }
    }

    /// One copy of the content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Two copies back to back.
    pub fn stream(&self) -> String {
        self.content.repeat(2)
    }

    /// Display width of one copy, in columns.
    pub fn content_width(&self) -> usize {
        self.content_width
    }

    pub fn loop_duration(&self) -> Duration {
        self.loop_duration
    }

    /// Columns scrolled at `now`, always below [`content_width`](Self::content_width).
    pub fn offset(&self, now: Duration) -> usize {
        if self.content_width == 0 || self.loop_duration.is_zero() {
            return 0;
        }
        let elapsed = now.saturating_sub(self.started).as_secs_f64();
        let period = self.loop_duration.as_secs_f64();
        let fraction = (elapsed % period) / period;
        ((fraction * self.content_width as f64) as usize).min(self.content_width - 1)
    }

    /// Start scrolling from the beginning again.
    pub fn restart(&mut self, now: Duration) {
        self.started = now;
    }
}

//! Ticker configuration.
//!
//! The configuration arrives as the widget's JSON record (camelCase keys).
//! Every field is optional; missing fields take the defaults the widget has
//! always used.  Cosmetic keys (fonts, colours, borders) are accepted and
//! ignored, since rendering them is the presentation layer's business.
//!
//! ## Marquee speed
//!
//! Older configurations store the marquee speed as a named tier
//! (`"slow"`, `"normal"`, `"fast"`); newer ones store a plain number.  Both
//! deserialize into [`MarqueeSpeed`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest carousel interval accepted, in seconds.
pub const MIN_CAROUSEL_INTERVAL: u32 = 3;
/// Longest carousel interval accepted, in seconds.
pub const MAX_CAROUSEL_INTERVAL: u32 = 30;
/// Carousel interval used when the configuration has none.
pub const DEFAULT_CAROUSEL_INTERVAL: u32 = 5;
/// Numeric marquee speed (display columns per second) used by default.
pub const DEFAULT_MARQUEE_SPEED: f64 = 30.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("feed id {0:?} appears more than once")]
    DuplicateFeedId(String),
}

// ---------------------------------------------------------------------------
// Feed sources
// ---------------------------------------------------------------------------

/// A configured syndication URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Unique within the owning list; becomes the prefix of item ids.
    pub id: String,
    pub label: String,
    pub url: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl FeedSource {
    pub fn new(id: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            url: url.into(),
            enabled: true,
        }
    }
}

/// The feed list a fresh widget starts with.
pub fn default_feeds() -> Vec<FeedSource> {
    vec![FeedSource::new(
        "default-yahoo",
        "Yahoo!ニュース",
        "https://news.yahoo.co.jp/rss/topics/top-picks.xml",
    )]
}

// ---------------------------------------------------------------------------
// Display enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TickerType {
    /// Continuous horizontal scroll.
    #[default]
    Marquee,
    /// One item at a time, rotated on a timer.
    Carousel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayOrder {
    /// Newest first.
    #[default]
    Chronological,
    /// Fresh shuffle every time the list is ordered.
    Random,
}

/// Which field of an item is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayContent {
    #[default]
    Title,
    #[serde(alias = "body")]
    Description,
}

/// Axis along which carousel slots enter and leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarouselDirection {
    Up,
    Down,
    #[default]
    Left,
    Right,
}

impl CarouselDirection {
    /// Unit offset `(x, y)` the entering slot starts from, in slot sizes.
    /// Positive `y` is downwards.
    pub fn enter_offset(self) -> (i8, i8) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (1, 0),
            Self::Right => (-1, 0),
        }
    }

    /// Unit offset the leaving slot moves towards.
    pub fn exit_offset(self) -> (i8, i8) {
        let (x, y) = self.enter_offset();
        (-x, -y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTier {
    Slow,
    Normal,
    Fast,
}

impl SpeedTier {
    /// Time for the content to scroll exactly one copy-width.
    pub fn loop_duration(self) -> Duration {
        match self {
            Self::Slow => Duration::from_secs(30),
            Self::Normal => Duration::from_secs(20),
            Self::Fast => Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarqueeSpeed {
    Tier(SpeedTier),
    /// Display columns per second.
    ColumnsPerSecond(f64),
}

impl Default for MarqueeSpeed {
    fn default() -> Self {
        Self::ColumnsPerSecond(DEFAULT_MARQUEE_SPEED)
    }
}

impl MarqueeSpeed {
    /// Loop duration for content `content_width` columns wide.
    ///
    /// Tiers have a fixed duration regardless of width.  A numeric speed
    /// that is non-positive, non-finite, or so small that the loop would not
    /// fit in a [`Duration`] falls back to [`DEFAULT_MARQUEE_SPEED`].
    pub fn loop_duration(self, content_width: usize) -> Duration {
        let width = content_width.max(1) as f64;
        let at_default = || Duration::from_secs_f64(width / DEFAULT_MARQUEE_SPEED);
        match self {
            Self::Tier(tier) => tier.loop_duration(),
            Self::ColumnsPerSecond(speed) if speed.is_finite() && speed > 0.0 => {
                Duration::try_from_secs_f64(width / speed).unwrap_or_else(|_| at_default())
            }
            Self::ColumnsPerSecond(_) => at_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// TickerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TickerConfig {
    pub feeds: Vec<FeedSource>,
    pub ticker_type: TickerType,
    pub display_order: DisplayOrder,
    pub display_content: DisplayContent,
    pub show_date_time: bool,
    /// Seconds between carousel rotations; see [`TickerConfig::carousel_interval`].
    pub carousel_interval: u32,
    pub carousel_direction: CarouselDirection,
    pub marquee_speed: MarqueeSpeed,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            ticker_type: TickerType::default(),
            display_order: DisplayOrder::default(),
            display_content: DisplayContent::default(),
            show_date_time: false,
            carousel_interval: DEFAULT_CAROUSEL_INTERVAL,
            carousel_direction: CarouselDirection::default(),
            marquee_speed: MarqueeSpeed::default(),
        }
    }
}

impl TickerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for feed in &self.feeds {
            if !seen.insert(feed.id.as_str()) {
                return Err(ConfigError::DuplicateFeedId(feed.id.clone()));
            }
        }
        Ok(())
    }

    /// Rotation interval, clamped to the supported 3–30 second range.
    pub fn carousel_interval(&self) -> Duration {
        let secs = self
            .carousel_interval
            .clamp(MIN_CAROUSEL_INTERVAL, MAX_CAROUSEL_INTERVAL);
        Duration::from_secs(u64::from(secs))
    }

    pub fn enabled_feeds(&self) -> Vec<FeedSource> {
        self.feeds.iter().filter(|f| f.enabled).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = TickerConfig::from_json("{}").unwrap();
        assert_eq!(config, TickerConfig::default());
        assert_eq!(config.feeds[0].id, "default-yahoo");
        assert_eq!(config.carousel_interval(), Duration::from_secs(5));
        assert_eq!(config.carousel_direction, CarouselDirection::Left);
    }

    #[test]
    fn reads_camel_case_and_ignores_cosmetic_keys() {
        let json = r##"{
            "feeds": [
                {"id": "a", "label": "A", "url": "https://a.example/rss", "enabled": true},
                {"id": "b", "label": "B", "url": "https://b.example/rss", "enabled": false}
            ],
            "tickerType": "carousel",
            "displayOrder": "random",
            "displayContent": "description",
            "showDateTime": true,
            "carouselInterval": 7,
            "carouselDirection": "up",
            "textFont": "mincho-bold",
            "bgColor": "#000000"
        }"##;
        let config = TickerConfig::from_json(json).unwrap();

        assert_eq!(config.ticker_type, TickerType::Carousel);
        assert_eq!(config.display_order, DisplayOrder::Random);
        assert_eq!(config.display_content, DisplayContent::Description);
        assert!(config.show_date_time);
        assert_eq!(config.carousel_interval(), Duration::from_secs(7));
        assert_eq!(config.carousel_direction, CarouselDirection::Up);
        assert_eq!(config.enabled_feeds().len(), 1);
        assert_eq!(config.enabled_feeds()[0].id, "a");
    }

    #[test]
    fn body_is_an_alias_for_description() {
        let config = TickerConfig::from_json(r#"{"displayContent": "body"}"#).unwrap();
        assert_eq!(config.display_content, DisplayContent::Description);
    }

    #[test]
    fn feed_enabled_defaults_to_true() {
        let config =
            TickerConfig::from_json(r#"{"feeds": [{"id": "x", "label": "X", "url": "u"}]}"#)
                .unwrap();
        assert!(config.feeds[0].enabled);
    }

    #[test]
    fn marquee_speed_accepts_tier_or_number() {
        let tier = TickerConfig::from_json(r#"{"marqueeSpeed": "fast"}"#).unwrap();
        assert_eq!(tier.marquee_speed, MarqueeSpeed::Tier(SpeedTier::Fast));

        let number = TickerConfig::from_json(r#"{"marqueeSpeed": 45}"#).unwrap();
        assert_eq!(number.marquee_speed, MarqueeSpeed::ColumnsPerSecond(45.0));
    }

    #[test]
    fn tier_loop_duration_ignores_width() {
        let speed = MarqueeSpeed::Tier(SpeedTier::Slow);
        assert_eq!(speed.loop_duration(10), Duration::from_secs(30));
        assert_eq!(speed.loop_duration(10_000), Duration::from_secs(30));
    }

    #[test]
    fn numeric_loop_duration_scales_with_width() {
        let speed = MarqueeSpeed::ColumnsPerSecond(20.0);
        assert_eq!(speed.loop_duration(100), Duration::from_secs(5));
    }

    #[test]
    fn non_positive_speed_falls_back_to_default() {
        let speed = MarqueeSpeed::ColumnsPerSecond(0.0);
        assert_eq!(speed.loop_duration(60), Duration::from_secs(2));
    }

    #[test]
    fn vanishingly_small_speed_falls_back_instead_of_overflowing() {
        let config = TickerConfig::from_json(r#"{"marqueeSpeed": 1e-18}"#).unwrap();
        assert_eq!(config.marquee_speed.loop_duration(60), Duration::from_secs(2));
    }

    #[test]
    fn slow_but_representable_speed_is_kept() {
        let speed = MarqueeSpeed::ColumnsPerSecond(0.5);
        assert_eq!(speed.loop_duration(60), Duration::from_secs(120));
    }

    #[test]
    fn carousel_interval_is_clamped() {
        let low = TickerConfig { carousel_interval: 1, ..TickerConfig::default() };
        let high = TickerConfig { carousel_interval: 90, ..TickerConfig::default() };
        assert_eq!(low.carousel_interval(), Duration::from_secs(3));
        assert_eq!(high.carousel_interval(), Duration::from_secs(30));
    }

    #[test]
    fn duplicate_feed_ids_are_rejected() {
        let json = r#"{"feeds": [
            {"id": "dup", "label": "1", "url": "u1"},
            {"id": "dup", "label": "2", "url": "u2"}
        ]}"#;
        let err = TickerConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFeedId(id) if id == "dup"));
    }

    #[test]
    fn direction_offsets_are_opposite() {
        for dir in [
            CarouselDirection::Up,
            CarouselDirection::Down,
            CarouselDirection::Left,
            CarouselDirection::Right,
        ] {
            let (ex, ey) = dir.enter_offset();
            let (xx, xy) = dir.exit_offset();
            assert_eq!((ex + xx, ey + xy), (0, 0));
        }
        assert_eq!(CarouselDirection::Up.enter_offset(), (0, 1));
        assert_eq!(CarouselDirection::Left.enter_offset(), (1, 0));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tickerType": "carousel"}}"#).unwrap();
        let config = TickerConfig::load(file.path()).unwrap();
        assert_eq!(config.ticker_type, TickerType::Carousel);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TickerConfig::load(Path::new("/nonexistent/ticker.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

//! One mounted ticker.
//!
//! [`App`] wires the pieces together for a single widget instance:
//!
//! ```text
//! Acquisition ──items──► order() ──ordered──► Marquee | Carousel ──► TickerFrame
//! ```
//!
//! The ordered list is recomputed only when the acquisition hands over a new
//! list (its generation changes), so a random order stays put between
//! refreshes.  Rebuilding the list also rebuilds the rotation model.

use std::time::Duration;

use chrono::Local;

use crate::config::{TickerConfig, TickerType};
use crate::order::order;
use crate::poll::Acquisition;
use crate::rotate::{
    carousel_texts, marquee_segments, Carousel, CarouselView, Marquee, SlotId,
};
use crate::source::NewsItem;

/// What the presentation layer draws for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerFrame {
    /// First fetch still running and nothing to show yet.
    Loading,
    /// No items.
    Fetching,
    Marquee {
        /// Two copies of the content, back to back.
        stream: String,
        content_width: usize,
        /// Columns to shift the stream left by.
        offset: usize,
    },
    Carousel {
        /// Text staged in slot A and slot B.
        texts: [String; 2],
        view: CarouselView,
    },
}

pub struct App {
    config: TickerConfig,
    acquisition: Acquisition,
    ordered: Vec<NewsItem>,
    ordered_generation: Option<u64>,
    marquee: Option<Marquee>,
    carousel: Option<Carousel>,
    carousel_texts: Vec<String>,
    /// Rotation model must be rebuilt on the next tick.
    view_stale: bool,
    /// Whether the user has requested to quit.
    pub quit: bool,
}

impl App {
    pub fn new(config: TickerConfig, acquisition: Acquisition) -> Self {
        Self {
            config,
            acquisition,
            ordered: Vec::new(),
            ordered_generation: None,
            marquee: None,
            carousel: None,
            carousel_texts: Vec::new(),
            view_stale: false,
            quit: false,
        }
    }

    pub fn config(&self) -> &TickerConfig {
        &self.config
    }

    /// Items in display order.
    pub fn ordered(&self) -> &[NewsItem] {
        &self.ordered
    }

    /// Advance everything to `now` and describe what should be on screen.
    pub fn tick(&mut self, now: Duration) -> TickerFrame {
        self.acquisition.tick(now);
        let state = self.acquisition.state();

        if self.ordered_generation != Some(state.generation) {
            self.ordered = order(&state.items, self.config.display_order);
            self.ordered_generation = Some(state.generation);
            self.rebuild(state.generation, now);
        } else if self.view_stale {
            self.rebuild(state.generation, now);
        }

        if self.ordered.is_empty() {
            return if state.is_loading {
                TickerFrame::Loading
            } else {
                TickerFrame::Fetching
            };
        }

        match self.config.ticker_type {
            TickerType::Marquee => self.marquee_frame(now),
            TickerType::Carousel => self.carousel_frame(now),
        }
    }

    /// Switch between marquee and carousel, keeping the current order.
    pub fn toggle_ticker_type(&mut self) {
        self.config.ticker_type = match self.config.ticker_type {
            TickerType::Marquee => TickerType::Carousel,
            TickerType::Carousel => TickerType::Marquee,
        };
        self.view_stale = true;
    }

    fn rebuild(&mut self, generation: u64, now: Duration) {
        self.view_stale = false;
        // No rotation state outlives unmount.
        if self.acquisition.is_torn_down() {
            return;
        }
        let config = &self.config;
        match config.ticker_type {
            TickerType::Marquee => {
                let segments = marquee_segments(
                    &self.ordered,
                    config.display_content,
                    config.show_date_time,
                    &Local,
                );
                self.marquee = Some(Marquee::new(&segments, config.marquee_speed, now));
                self.carousel = None;
            }
            TickerType::Carousel => {
                self.carousel_texts = carousel_texts(
                    &self.ordered,
                    config.display_content,
                    config.show_date_time,
                    &Local,
                );
                let count = self.ordered.len();
                let interval = config.carousel_interval();
                let direction = config.carousel_direction;
                match &mut self.carousel {
                    Some(carousel) => {
                        carousel.sync(count, generation, interval, direction, now);
                    }
                    None => {
                        self.carousel =
                            Some(Carousel::new(count, generation, interval, direction, now));
                    }
                }
                self.marquee = None;
            }
        }
    }

    fn marquee_frame(&self, now: Duration) -> TickerFrame {
        match &self.marquee {
            Some(marquee) => TickerFrame::Marquee {
                stream: marquee.stream(),
                content_width: marquee.content_width(),
                offset: marquee.offset(now),
            },
            None => TickerFrame::Fetching,
        }
    }

    fn carousel_frame(&mut self, now: Duration) -> TickerFrame {
        let Some(carousel) = self.carousel.as_mut() else {
            return TickerFrame::Fetching;
        };
        carousel.tick(now);
        let view = carousel.view(now);
        let text = |id: SlotId| {
            let index = match id {
                SlotId::A => view.slot_a.item_index,
                SlotId::B => view.slot_b.item_index,
            };
            self.carousel_texts.get(index).cloned().unwrap_or_default()
        };
        TickerFrame::Carousel {
            texts: [text(SlotId::A), text(SlotId::B)],
            view,
        }
    }

    /// One-line summary for the status bar.
    pub fn status(&self) -> String {
        let state = self.acquisition.state();
        let source = if self.acquisition.is_injected() {
            "injected"
        } else {
            "relay"
        };
        match state.last_error {
            Some(error) => format!("{} items ({source})  error: {error}", self.ordered.len()),
            None if state.is_loading => format!("{} items ({source})  refreshing…", self.ordered.len()),
            None => format!("{} items ({source})", self.ordered.len()),
        }
    }

    /// Tear the widget down: stop polling and leave the injection channel.
    pub fn unmount(&mut self) {
        self.acquisition.unmount();
        self.carousel = None;
        self.marquee = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{CarouselDirection, DisplayOrder, MarqueeSpeed, SpeedTier};
    use crate::inject::tests::injected;
    use crate::inject::InjectionRegistry;
    use crate::poll::tests::{feed, rss, FakeFetcher, QueuedExecutor, Reply};
    use crate::poll::{Executor, InlineExecutor, Mount};
    use crate::rotate::TRANSITION;
    use std::sync::Arc;

    pub fn app_with(
        config: TickerConfig,
        fetcher: Arc<FakeFetcher>,
        executor: Arc<dyn Executor>,
        registry: &Arc<InjectionRegistry>,
    ) -> App {
        let acquisition = Acquisition::mount(
            Mount {
                consumer_id: "app-test",
                feeds: &config.feeds,
                fetcher,
                executor,
                registry: Arc::clone(registry),
            },
            Duration::ZERO,
        );
        App::new(config, acquisition)
    }

    fn config(ticker_type: TickerType) -> TickerConfig {
        TickerConfig {
            feeds: vec![feed("a")],
            ticker_type,
            ..TickerConfig::default()
        }
    }

    fn three_item_fetcher() -> Arc<FakeFetcher> {
        FakeFetcher::with(&[("https://a.example/rss", Reply::Feed(rss(&["One", "Two", "Three"])))])
    }

    #[test]
    fn loading_frame_while_first_fetch_in_flight() {
        let registry = InjectionRegistry::new();
        let executor: Arc<dyn Executor> = Arc::new(QueuedExecutor::default());
        let mut app = app_with(config(TickerType::Marquee), three_item_fetcher(), executor, &registry);
        assert_eq!(app.tick(Duration::ZERO), TickerFrame::Loading);
    }

    #[test]
    fn fetching_frame_when_no_items() {
        let registry = InjectionRegistry::new();
        let fetcher = FakeFetcher::with(&[("https://a.example/rss", Reply::Feed(rss(&[])))]);
        let mut app = app_with(config(TickerType::Carousel), fetcher, Arc::new(InlineExecutor), &registry);
        assert_eq!(app.tick(Duration::ZERO), TickerFrame::Fetching);
    }

    #[test]
    fn marquee_frame_carries_two_copies() {
        let registry = InjectionRegistry::new();
        let mut app = app_with(config(TickerType::Marquee), three_item_fetcher(), Arc::new(InlineExecutor), &registry);

        let TickerFrame::Marquee { stream, content_width, offset } = app.tick(Duration::ZERO) else {
            panic!("expected marquee frame");
        };
        assert_eq!(offset, 0);
        assert_eq!(stream.chars().count(), content_width * 2);
        assert_eq!(stream.matches("Three").count(), 2);
    }

    #[test]
    fn marquee_offset_advances_with_time() {
        let registry = InjectionRegistry::new();
        let mut cfg = config(TickerType::Marquee);
        cfg.marquee_speed = MarqueeSpeed::Tier(SpeedTier::Normal);
        let mut app = app_with(cfg, three_item_fetcher(), Arc::new(InlineExecutor), &registry);

        app.tick(Duration::ZERO);
        // Half of a 20 s loop over 29 columns.
        let TickerFrame::Marquee { offset, content_width, .. } = app.tick(Duration::from_secs(10))
        else {
            panic!("expected marquee frame");
        };
        assert_eq!(content_width, 29);
        assert_eq!(offset, 14);
    }

    #[test]
    fn carousel_rotates_through_ordered_items() {
        let registry = InjectionRegistry::new();
        let mut app = app_with(config(TickerType::Carousel), three_item_fetcher(), Arc::new(InlineExecutor), &registry);

        let showing = |frame: TickerFrame| match frame {
            TickerFrame::Carousel { texts, view } => match view.active {
                SlotId::A => texts[0].clone(),
                SlotId::B => texts[1].clone(),
            },
            other => panic!("expected carousel frame, got {other:?}"),
        };

        // Undated items share a timestamp, so the stable sort keeps feed order.
        assert_eq!(showing(app.tick(Duration::ZERO)), "One");
        app.tick(Duration::from_secs(5));
        assert_eq!(showing(app.tick(Duration::from_secs(5) + TRANSITION)), "Two");
        app.tick(Duration::from_secs(10));
        assert_eq!(showing(app.tick(Duration::from_secs(10) + TRANSITION)), "Three");
    }

    #[test]
    fn carousel_direction_reaches_the_frame() {
        let registry = InjectionRegistry::new();
        let mut cfg = config(TickerType::Carousel);
        cfg.carousel_direction = CarouselDirection::Up;
        let mut app = app_with(cfg, three_item_fetcher(), Arc::new(InlineExecutor), &registry);

        let TickerFrame::Carousel { view, .. } = app.tick(Duration::ZERO) else {
            panic!("expected carousel frame");
        };
        assert_eq!(view.enter_from, (0, 1));
    }

    #[test]
    fn injection_resets_carousel_to_first_item() {
        let registry = InjectionRegistry::new();
        let mut app = app_with(config(TickerType::Carousel), three_item_fetcher(), Arc::new(InlineExecutor), &registry);
        app.tick(Duration::ZERO);
        app.tick(Duration::from_secs(5) + TRANSITION);

        registry.set_items(vec![injected("h-0", "Host A"), injected("h-1", "Host B")]);
        let TickerFrame::Carousel { texts, view } = app.tick(Duration::from_secs(6)) else {
            panic!("expected carousel frame");
        };
        assert_eq!(view.active, SlotId::A);
        assert_eq!(texts, ["Host A".to_string(), "Host B".to_string()]);
        assert!(app.status().contains("injected"));
    }

    #[test]
    fn random_order_is_kept_between_refresh_ticks() {
        let registry = InjectionRegistry::new();
        let mut cfg = config(TickerType::Marquee);
        cfg.display_order = DisplayOrder::Random;
        let mut app = app_with(cfg, three_item_fetcher(), Arc::new(InlineExecutor), &registry);

        app.tick(Duration::ZERO);
        let first: Vec<_> = app.ordered().iter().map(|i| i.id.clone()).collect();
        app.tick(Duration::from_secs(1));
        let second: Vec<_> = app.ordered().iter().map(|i| i.id.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn toggling_ticker_type_keeps_order() {
        let registry = InjectionRegistry::new();
        let mut cfg = config(TickerType::Marquee);
        cfg.display_order = DisplayOrder::Random;
        let mut app = app_with(cfg, three_item_fetcher(), Arc::new(InlineExecutor), &registry);

        app.tick(Duration::ZERO);
        let before: Vec<_> = app.ordered().iter().map(|i| i.id.clone()).collect();
        app.toggle_ticker_type();

        let TickerFrame::Carousel { view, .. } = app.tick(Duration::from_secs(1)) else {
            panic!("expected carousel frame");
        };
        assert_eq!(view.active, SlotId::A);
        let after: Vec<_> = app.ordered().iter().map(|i| i.id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn status_reports_errors() {
        let registry = InjectionRegistry::new();
        let fetcher = FakeFetcher::with(&[]);
        let mut app = app_with(config(TickerType::Marquee), fetcher, Arc::new(InlineExecutor), &registry);
        app.tick(Duration::ZERO);
        assert!(app.status().contains("error"));
    }

    #[test]
    fn unmount_stops_updates() {
        let registry = InjectionRegistry::new();
        let mut app = app_with(config(TickerType::Marquee), three_item_fetcher(), Arc::new(InlineExecutor), &registry);
        app.tick(Duration::ZERO);
        app.unmount();

        registry.set_items(vec![injected("h-0", "Late")]);
        app.tick(Duration::from_secs(1));
        assert!(app.ordered().iter().all(|i| i.title != "Late"));
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn toggle_after_unmount_builds_no_rotation() {
        let registry = InjectionRegistry::new();
        let mut app = app_with(config(TickerType::Marquee), three_item_fetcher(), Arc::new(InlineExecutor), &registry);
        app.tick(Duration::ZERO);
        app.unmount();

        app.toggle_ticker_type();
        assert_eq!(app.tick(Duration::from_secs(1)), TickerFrame::Fetching);
        assert_eq!(app.tick(Duration::from_secs(30)), TickerFrame::Fetching);
        assert!(app.carousel.is_none());
    }
}

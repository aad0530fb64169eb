//! news-ticker: a news ticker that reconciles host-injected items with
//! RSS/Atom feeds fetched through a relay, and shows them as a scrolling
//! marquee or a rotating carousel.
//!
//! ## Architecture overview
//!
//! ```text
//!   host ──set_items()──► ┌──────────┐
//!                         │ inject   │ ──handler──┐
//!                         └──────────┘            ▼
//! ┌──────────┐  PassOutcome  ┌──────────┐ items ┌──────────┐ TickerFrame ┌──────────┐
//! │ source/  │ ────────────► │  poll    │ ────► │  app     │ ──────────► │  ui      │
//! │ (relay)  │   (channel)   │(acquire) │       │ (order + │             │ (render) │
//! └──────────┘               └──────────┘       │  rotate) │             └──────────┘
//!                                               └──────────┘
//!                                                    ▲ handle_key_event()
//!                                               ┌──────────┐
//!                                               │ input    │
//!                                               └──────────┘
//! ```
//!
//! * **`config`** — widget configuration (feeds, ticker type, speed, …).
//! * **`source/`** — the `NewsItem` model, the feed parser, the
//!   `FeedFetcher` trait and the relay client.
//! * **`inject`** — process-wide channel through which a host pushes items.
//! * **`poll`** — per-widget acquisition: injection beats fetching, fetch
//!   passes run in the background every five minutes.
//! * **`order`** — newest-first sort or shuffle.
//! * **`rotate`** — marquee and carousel models, driven by the clock.
//! * **`timer`** — clocks and pollable timers.
//! * **`app`** — one mounted ticker, producing a frame per tick.
//! * **`ui`** / **`input`** — terminal rendering and key handling.
//! * **`logging`** — tracing subscriber setup for the binary.

pub mod app;
pub mod config;
pub mod inject;
pub mod input;
pub mod logging;
pub mod order;
pub mod poll;
pub mod rotate;
pub mod source;
pub mod timer;
pub mod ui;

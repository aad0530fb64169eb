//! Feed acquisition.
//!
//! An [`Acquisition`] keeps one ticker's item list up to date from two
//! competing sources:
//!
//! * **injection** — batches pushed by the host through the
//!   [`InjectionRegistry`](crate::inject::InjectionRegistry);
//! * **fetching** — one relay request per enabled feed, repeated every
//!   [`POLL_INTERVAL`].
//!
//! The first non-empty injected batch wins for good: from then on no fetch
//! pass is started, and results of passes already in flight are discarded
//! when they arrive.
//!
//! Fetch passes run through an [`Executor`].  The binary hands each pass to
//! its own thread ([`ThreadExecutor`]); tests run them inline.  Either way
//! the outcome travels back over an [`mpsc`] channel and is applied on the
//! next [`Acquisition::tick`], so the item list only ever changes on the
//! thread that owns the acquisition or inside an injection handler.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::config::FeedSource;
use crate::inject::{InjectedItem, InjectionRegistry, Subscription};
use crate::source::{parse, FeedFetcher, NewsItem};
use crate::timer::Interval;

/// How often feeds are re-fetched while nothing has been injected.  The
/// relay caches for the same period, so polling faster gains nothing.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("could not reach the feed relay for any of {sources} feeds: {reason}")]
    RelayUnreachable { sources: usize, reason: String },

    #[error("all {sources} feeds failed, last error: {reason}")]
    AllSourcesFailed { sources: usize, reason: String },
}

/// Runs fetch passes.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Box<dyn FnOnce() + Send>);
}

/// Runs each pass on a new background thread.
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn execute(&self, job: Box<dyn FnOnce() + Send>) {
        let spawned = thread::Builder::new()
            .name("feed-pass".into())
            .spawn(job);
        if let Err(e) = spawned {
            tracing::error!(error = %e, "could not spawn fetch thread");
        }
    }
}

/// Runs each pass immediately on the calling thread.
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Box<dyn FnOnce() + Send>) {
        job();
    }
}

/// Fetch every source in `sources` and parse what comes back.
///
/// A failing source only loses its own items.  The pass as a whole fails
/// when every source failed; it is reported as an unreachable relay when
/// all of those failures were transport failures.
pub fn fetch_pass(
    fetcher: &dyn FeedFetcher,
    sources: &[FeedSource],
) -> Result<Vec<NewsItem>, AcquisitionError> {
    let mut items = Vec::new();
    let mut failed = 0;
    let mut unreachable = 0;
    let mut last_reason = String::new();

    for source in sources {
        match fetcher.fetch(source) {
            Ok(body) => {
                let parsed = parse(&body, &source.id);
                tracing::debug!(source = %source.id, items = parsed.len(), "fetched feed");
                items.extend(parsed);
            }
            Err(e) => {
                tracing::debug!(source = %source.id, error = %e, "dropping feed source");
                failed += 1;
                if e.is_unreachable() {
                    unreachable += 1;
                }
                last_reason = e.to_string();
            }
        }
    }

    if sources.is_empty() || failed < sources.len() {
        return Ok(items);
    }
    let sources = sources.len();
    if unreachable == sources {
        Err(AcquisitionError::RelayUnreachable { sources, reason: last_reason })
    } else {
        Err(AcquisitionError::AllSourcesFailed { sources, reason: last_reason })
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// What consumers of an acquisition see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionState {
    pub items: Vec<NewsItem>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    /// Bumped every time `items` is replaced; identifies the list.
    pub generation: u64,
}

#[derive(Default)]
struct Shared {
    state: AcquisitionState,
    injected: bool,
    torn_down: bool,
    applied_pass: u64,
}

impl Shared {
    fn replace_items(&mut self, items: Vec<NewsItem>) {
        self.state.items = items;
        self.state.generation += 1;
        self.state.is_loading = false;
        self.state.last_error = None;
    }
}

struct PassOutcome {
    pass: u64,
    result: Result<Vec<NewsItem>, AcquisitionError>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply_injection(shared: &Mutex<Shared>, batch: &[InjectedItem]) {
    if batch.is_empty() {
        tracing::debug!("ignoring empty injected batch");
        return;
    }
    let now = Utc::now();
    let items = batch.iter().map(|item| item.to_news_item(now)).collect();

    let mut shared = lock(shared);
    if shared.torn_down {
        return;
    }
    if !shared.injected {
        tracing::info!(items = batch.len(), "using injected items, fetching disabled");
    }
    shared.injected = true;
    shared.replace_items(items);
}

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------

/// Everything [`Acquisition::mount`] needs.
pub struct Mount<'a> {
    /// Identifies this ticker instance to the injection registry.
    pub consumer_id: &'a str,
    pub feeds: &'a [FeedSource],
    pub fetcher: Arc<dyn FeedFetcher>,
    pub executor: Arc<dyn Executor>,
    pub registry: Arc<InjectionRegistry>,
}

pub struct Acquisition {
    shared: Arc<Mutex<Shared>>,
    sources: Arc<[FeedSource]>,
    fetcher: Arc<dyn FeedFetcher>,
    executor: Arc<dyn Executor>,
    outcomes_tx: mpsc::Sender<PassOutcome>,
    outcomes_rx: mpsc::Receiver<PassOutcome>,
    poll_timer: Option<Interval>,
    passes_started: u64,
    subscription: Option<Subscription>,
}

impl Acquisition {
    /// Subscribe to injection and, unless items were already injected,
    /// start the first fetch pass and the poll timer.
    pub fn mount(mount: Mount<'_>, now: Duration) -> Self {
        let sources: Arc<[FeedSource]> = mount
            .feeds
            .iter()
            .filter(|f| f.enabled)
            .cloned()
            .collect();

        let shared = Arc::new(Mutex::new(Shared {
            state: AcquisitionState {
                is_loading: true,
                ..AcquisitionState::default()
            },
            ..Shared::default()
        }));

        let weak = Arc::downgrade(&shared);
        let subscription = mount.registry.subscribe(mount.consumer_id, move |batch| {
            if let Some(shared) = weak.upgrade() {
                apply_injection(&shared, batch);
            }
        });

        let existing = mount.registry.items();
        if !existing.is_empty() {
            apply_injection(&shared, &existing);
        }

        let (outcomes_tx, outcomes_rx) = mpsc::channel();
        let mut acquisition = Self {
            shared,
            sources,
            fetcher: mount.fetcher,
            executor: mount.executor,
            outcomes_tx,
            outcomes_rx,
            poll_timer: None,
            passes_started: 0,
            subscription: Some(subscription),
        };

        if acquisition.is_injected() {
            return acquisition;
        }

        if acquisition.sources.is_empty() {
            lock(&acquisition.shared).state.is_loading = false;
            tracing::info!(consumer = mount.consumer_id, "no enabled feeds");
            return acquisition;
        }

        acquisition.start_pass();
        acquisition.poll_timer = Some(Interval::starting_at(now, POLL_INTERVAL));
        acquisition.drain_outcomes();
        acquisition
    }

    /// Apply finished passes and start a new one when the poll timer fires.
    pub fn tick(&mut self, now: Duration) {
        if self.is_torn_down() {
            return;
        }
        self.drain_outcomes();

        if self.is_injected() {
            self.poll_timer = None;
            return;
        }
        let due = self
            .poll_timer
            .as_mut()
            .and_then(|timer| timer.poll(now))
            .is_some();
        if due {
            self.start_pass();
            self.drain_outcomes();
        }
    }

    pub fn state(&self) -> AcquisitionState {
        lock(&self.shared).state.clone()
    }

    pub fn generation(&self) -> u64 {
        lock(&self.shared).state.generation
    }

    pub fn is_injected(&self) -> bool {
        lock(&self.shared).injected
    }

    pub fn is_torn_down(&self) -> bool {
        lock(&self.shared).torn_down
    }

    /// Next time the poll timer fires, if it is armed.
    pub fn next_poll(&self) -> Option<Duration> {
        self.poll_timer.as_ref().map(Interval::next_due)
    }

    /// Stop polling and leave the injection channel.  Nothing changes the
    /// state afterwards; outcomes still in flight are dropped.
    pub fn unmount(&mut self) {
        lock(&self.shared).torn_down = true;
        self.poll_timer = None;
        self.subscription = None;
        while self.outcomes_rx.try_recv().is_ok() {}
    }

    fn start_pass(&mut self) {
        self.passes_started += 1;
        let pass = self.passes_started;
        {
            let mut shared = lock(&self.shared);
            shared.state.is_loading = true;
            shared.state.last_error = None;
        }
        tracing::debug!(pass, sources = self.sources.len(), "starting fetch pass");

        let fetcher = Arc::clone(&self.fetcher);
        let sources = Arc::clone(&self.sources);
        let tx = self.outcomes_tx.clone();
        self.executor.execute(Box::new(move || {
            let result = fetch_pass(fetcher.as_ref(), &sources);
            // A closed channel means the acquisition is gone; nothing to do.
            let _ = tx.send(PassOutcome { pass, result });
        }));
    }

    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&self, outcome: PassOutcome) {
        let mut shared = lock(&self.shared);
        if shared.torn_down || shared.injected {
            tracing::debug!(pass = outcome.pass, "discarding fetch result");
            return;
        }
        if outcome.pass <= shared.applied_pass {
            tracing::debug!(pass = outcome.pass, "discarding stale fetch result");
            return;
        }
        shared.applied_pass = outcome.pass;

        match outcome.result {
            Ok(items) => {
                tracing::info!(pass = outcome.pass, items = items.len(), "fetch pass complete");
                shared.replace_items(items);
            }
            Err(e) => {
                tracing::warn!(pass = outcome.pass, error = %e, "fetch pass failed");
                shared.state.last_error = Some(e.to_string());
                shared.state.is_loading = false;
            }
        }
        if outcome.pass < self.passes_started {
            shared.state.is_loading = true;
        }
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.unmount();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

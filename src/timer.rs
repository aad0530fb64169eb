//! Time sources and timers.
//!
//! Nothing in the ticker sleeps or registers callbacks.  Timers are plain
//! values that are polled with the current time, which comes from a
//! [`Clock`].  The binary uses [`SystemClock`]; tests use [`ManualClock`] and
//! move time forward by hand.
//!
//! All times are offsets from the clock's origin.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Monotonic wall clock, measured from construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.  Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, at: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A repeating timer, like `setInterval`.
///
/// Polling after several missed periods fires once and schedules the next
/// due time after `now`; missed firings are not replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    period: Duration,
    next_due: Duration,
}

impl Interval {
    const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// First firing one `period` after `now`.
    pub fn starting_at(now: Duration, period: Duration) -> Self {
        let period = period.max(Self::MIN_PERIOD);
        Self {
            period,
            next_due: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    /// Returns the due time that fired, if any.
    pub fn poll(&mut self, now: Duration) -> Option<Duration> {
        if now < self.next_due {
            return None;
        }
        let fired = self.next_due;
        let missed = (now - fired).as_nanos() / self.period.as_nanos();
        // At least one period forward, skipping every period already past.
        let steps = u32::try_from(missed + 1).unwrap_or(u32::MAX);
        self.next_due = fired + self.period * steps;
        Some(fired)
    }
}

/// A one-shot window of fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    started: Duration,
    length: Duration,
}

impl Timeout {
    pub fn new(started: Duration, length: Duration) -> Self {
        Self { started, length }
    }

    pub fn started(&self) -> Duration {
        self.started
    }

    pub fn is_elapsed(&self, now: Duration) -> bool {
        now >= self.started + self.length
    }

    /// Fraction of the window that has passed, in `0.0..=1.0`.
    pub fn progress(&self, now: Duration) -> f32 {
        if self.length.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started);
        (elapsed.as_secs_f32() / self.length.as_secs_f32()).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

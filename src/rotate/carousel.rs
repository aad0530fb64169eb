//! Two-slot carousel.
//!
//! Slot A and slot B each hold an item index.  One slot is active (visible);
//! the other has the next item staged.  Every `interval` the machine enters
//! [`Phase::Transitioning`] for [`TRANSITION`]; when the window closes the
//! slots swap roles and the slot that just left is re-staged with the item
//! after the one now showing.  Items therefore appear strictly in order,
//! `0, 1, 2, …, n-1, 0, …`.
//!
//! Lists of zero or one item never start the timer.  A new list, or a new
//! interval or direction, resets the machine to A showing item 0 and B
//! holding item `1 % n`.

use std::time::Duration;

use crate::config::CarouselDirection;
use crate::timer::{Interval, Timeout};

/// Length of the slide between two items.
pub const TRANSITION: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub item_index: usize,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning(Timeout),
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselView {
    pub active: SlotId,
    pub slot_a: Slot,
    pub slot_b: Slot,
    pub transitioning: bool,
    /// How far the current transition has run, `0.0..=1.0`; `0.0` when idle.
    pub progress: f32,
    /// Where the incoming slot starts, in slot sizes.
    pub enter_from: (i8, i8),
    /// Where the outgoing slot ends up, in slot sizes.
    pub exit_to: (i8, i8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Carousel {
    slot_a: Slot,
    slot_b: Slot,
    phase: Phase,
    item_count: usize,
    list_generation: u64,
    interval: Duration,
    direction: CarouselDirection,
    timer: Option<Interval>,
}

impl Carousel {
    pub fn new(
        item_count: usize,
        list_generation: u64,
        interval: Duration,
        direction: CarouselDirection,
        now: Duration,
    ) -> Self {
        let mut carousel = Self {
            slot_a: Slot { item_index: 0, is_active: true },
            slot_b: Slot { item_index: 0, is_active: false },
            phase: Phase::Idle,
            item_count,
            list_generation,
            interval,
            direction,
            timer: None,
        };
        carousel.reset(now);
        carousel
    }

    fn reset(&mut self, now: Duration) {
        self.slot_a = Slot { item_index: 0, is_active: true };
        self.slot_b = Slot {
            item_index: 1 % self.item_count.max(1),
            is_active: false,
        };
        self.phase = Phase::Idle;
        self.timer = (self.item_count > 1).then(|| Interval::starting_at(now, self.interval));
    }

    /// Adopt a new list or configuration.  Resets and returns `true` when
    /// anything differs from what the machine is running with.
    pub fn sync(
        &mut self,
        item_count: usize,
        list_generation: u64,
        interval: Duration,
        direction: CarouselDirection,
        now: Duration,
    ) -> bool {
        let unchanged = self.item_count == item_count
            && self.list_generation == list_generation
            && self.interval == interval
            && self.direction == direction;
        if unchanged {
            return false;
        }
        self.item_count = item_count;
        self.list_generation = list_generation;
        self.interval = interval;
        self.direction = direction;
        self.reset(now);
        true
    }

    /// Advance to `now`.  Returns whether anything changed.
    pub fn tick(&mut self, now: Duration) -> bool {
        let mut changed = false;
        loop {
            match self.phase {
                Phase::Transitioning(window) if window.is_elapsed(now) => {
                    self.finish_transition();
                    changed = true;
                }
                // A trigger during a transition is ignored.
                Phase::Transitioning(_) => break,
                Phase::Idle => match self.timer.as_mut().and_then(|t| t.poll(now)) {
                    Some(fired) => {
                        self.phase = Phase::Transitioning(Timeout::new(fired, TRANSITION));
                        changed = true;
                    }
                    None => break,
                },
            }
        }
        changed
    }

    fn finish_transition(&mut self) {
        let incoming = self.active_slot().other();
        let shown = self.slot(incoming).item_index;
        let next = (shown + 1) % self.item_count.max(1);

        let (now_active, now_staged) = match incoming {
            SlotId::A => (&mut self.slot_a, &mut self.slot_b),
            SlotId::B => (&mut self.slot_b, &mut self.slot_a),
        };
        now_active.is_active = true;
        now_staged.is_active = false;
        now_staged.item_index = next;
        self.phase = Phase::Idle;
    }

    pub fn active_slot(&self) -> SlotId {
        if self.slot_a.is_active {
            SlotId::A
        } else {
            SlotId::B
        }
    }

    pub fn slot(&self, id: SlotId) -> Slot {
        match id {
            SlotId::A => self.slot_a,
            SlotId::B => self.slot_b,
        }
    }

    /// Index of the item currently showing.
    pub fn current_index(&self) -> usize {
        self.slot(self.active_slot()).item_index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning(_))
    }

    pub fn is_rotating(&self) -> bool {
        self.timer.is_some()
    }

    pub fn view(&self, now: Duration) -> CarouselView {
        let progress = match self.phase {
            Phase::Idle => 0.0,
            Phase::Transitioning(window) => window.progress(now),
        };
        CarouselView {
            active: self.active_slot(),
            slot_a: self.slot_a,
            slot_b: self.slot_b,
            transitioning: self.is_transitioning(),
            progress,
            enter_from: self.direction.enter_offset(),
            exit_to: self.direction.exit_offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: Duration = Duration::from_secs(5);

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn three_items() -> Carousel {
        Carousel::new(3, 1, FIVE, CarouselDirection::Left, Duration::ZERO)
    }

    fn indices(c: &Carousel) -> (SlotId, usize, usize) {
        (c.active_slot(), c.slot(SlotId::A).item_index, c.slot(SlotId::B).item_index)
    }

    #[test]
    fn starts_idle_with_a_showing_first_item() {
        let c = three_items();
        assert_eq!(indices(&c), (SlotId::A, 0, 1));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.is_rotating());
    }

    #[test]
    fn one_cycle_flips_slot_and_restages_next_item() {
        let mut c = three_items();

        assert!(!c.tick(ms(4_999)));
        assert!(c.tick(ms(5_000)));
        assert!(c.is_transitioning());
        assert_eq!(indices(&c), (SlotId::A, 0, 1), "no swap during the window");

        assert!(!c.tick(ms(5_399)));
        assert!(c.tick(ms(5_400)));

        // B now shows item 1; A is staged with (1 + 1) % 3.
        assert_eq!(indices(&c), (SlotId::B, 2, 1));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn items_appear_in_order_and_wrap() {
        let mut c = three_items();
        let mut shown = vec![c.current_index()];
        for cycle in 1..=6u64 {
            c.tick(FIVE * cycle as u32);
            c.tick(FIVE * cycle as u32 + TRANSITION);
            shown.push(c.current_index());
        }
        assert_eq!(shown, [0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn late_tick_completes_transition_at_once() {
        let mut c = three_items();
        assert!(c.tick(ms(5_600)));
        assert_eq!(indices(&c), (SlotId::B, 2, 1));
        assert!(!c.is_transitioning());
    }

    #[test]
    fn long_gap_rotates_only_once() {
        let mut c = three_items();
        c.tick(Duration::from_secs(60));
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn single_item_never_rotates() {
        let mut c = Carousel::new(1, 1, FIVE, CarouselDirection::Up, Duration::ZERO);
        assert!(!c.is_rotating());
        assert_eq!(indices(&c), (SlotId::A, 0, 0));
        assert!(!c.tick(Duration::from_secs(60)));
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn empty_list_never_rotates() {
        let mut c = Carousel::new(0, 0, FIVE, CarouselDirection::Up, Duration::ZERO);
        assert!(!c.is_rotating());
        assert!(!c.tick(Duration::from_secs(60)));
    }

    #[test]
    fn new_list_resets_mid_rotation() {
        let mut c = three_items();
        c.tick(ms(5_000));
        c.tick(ms(5_400));
        c.tick(ms(10_000));
        assert!(c.is_transitioning());

        assert!(c.sync(4, 2, FIVE, CarouselDirection::Left, ms(10_100)));
        assert_eq!(indices(&c), (SlotId::A, 0, 1));
        assert_eq!(c.phase(), Phase::Idle);

        // Timer restarts from the reset.
        assert!(!c.tick(ms(15_000)));
        assert!(c.tick(ms(15_100)));
    }

    #[test]
    fn config_change_resets() {
        let mut c = three_items();
        c.tick(ms(5_400));
        assert!(c.sync(3, 1, Duration::from_secs(8), CarouselDirection::Left, ms(6_000)));
        assert_eq!(indices(&c), (SlotId::A, 0, 1));

        c.tick(ms(5_600));
        assert!(c.sync(3, 1, Duration::from_secs(8), CarouselDirection::Down, ms(7_000)));
        assert_eq!(c.view(ms(7_000)).enter_from, (0, -1));
    }

    #[test]
    fn unchanged_sync_is_a_no_op() {
        let mut c = three_items();
        c.tick(ms(5_400));
        assert!(!c.sync(3, 1, FIVE, CarouselDirection::Left, ms(6_000)));
        assert_eq!(indices(&c), (SlotId::B, 2, 1));
    }

    #[test]
    fn view_reports_progress_and_direction() {
        let mut c = three_items();
        assert_eq!(c.view(ms(1_000)).progress, 0.0);

        c.tick(ms(5_000));
        let view = c.view(ms(5_200));
        assert!(view.transitioning);
        assert!((view.progress - 0.5).abs() < 1e-6);
        assert_eq!(view.active, SlotId::A);
        assert_eq!(view.enter_from, (1, 0));
        assert_eq!(view.exit_to, (-1, 0));
    }
}

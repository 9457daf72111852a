use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use provider::SlotIndex;
use tracing::debug;

use crate::slots::SlotSet;
use crate::view::{show_only, SlotView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub current_slot: SlotIndex,
    pub running: bool,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            current_slot: SlotIndex::FIRST,
            running: false,
        }
    }
}

/// Cancellation handle for one started animation loop.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl AnimationHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `true` only for the call that flipped the flag.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }
}

/// Self-rescheduling timer cycling the visible slot.
///
/// The loop never sleeps on its own: the owner asks for `next_deadline` and
/// calls `tick` once it has passed.
#[derive(Debug)]
pub struct AnimationLoop {
    interval: Duration,
    state: AnimationState,
    handle: Option<AnimationHandle>,
    next_tick: Option<Instant>,
    started: u64,
}

impl AnimationLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: AnimationState::default(),
            handle: None,
            next_tick: None,
            started: 0,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Shows slot 0 right away and schedules the first tick one interval out.
    /// A loop that is still scheduled is cancelled before the new one starts.
    pub fn start(
        &mut self,
        now: Instant,
        slots: &SlotSet,
        view: &mut dyn SlotView,
    ) -> AnimationHandle {
        if let Some(previous) = self.handle.take() {
            previous.cancel();
            debug!(loop_id = previous.id, "replacing running animation loop");
        }
        self.started += 1;
        let handle = AnimationHandle {
            id: self.started,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        self.state = AnimationState {
            current_slot: SlotIndex::FIRST,
            running: true,
        };
        show_only(view, SlotIndex::FIRST);
        self.next_tick = Some(now + self.interval);
        self.handle = Some(handle.clone());
        debug!(
            loop_id = handle.id,
            loaded = slots.loaded_count(),
            "animation loop started"
        );
        handle
    }

    pub fn cancel(&mut self, handle: &AnimationHandle) {
        handle.cancel();
        let is_current = self
            .handle
            .as_ref()
            .is_some_and(|current| current.id == handle.id);
        if is_current {
            self.stop();
        }
    }

    /// Runs the tick if it is due. Returns the slot that was shown.
    pub fn tick(
        &mut self,
        now: Instant,
        slots: &SlotSet,
        view: &mut dyn SlotView,
    ) -> Option<SlotIndex> {
        let deadline = self.next_tick?;
        if now < deadline {
            return None;
        }
        let handle = self.handle.clone()?;
        if handle.is_cancelled() {
            self.stop();
            return None;
        }

        let next = slots.next_displayable(self.state.current_slot);
        self.state.current_slot = next;
        show_only(view, next);

        if handle.is_cancelled() {
            self.stop();
        } else {
            self.next_tick = Some(now + self.interval);
        }
        Some(next)
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(loop_id = handle.id, "animation loop stopped");
        }
        self.state = AnimationState::default();
        self.next_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::ImageSlot;
    use crate::testing::{png, RecordingView};

    const INTERVAL: Duration = Duration::from_millis(500);

    fn slots_from(loaded: [bool; 4]) -> SlotSet {
        let mut slots = SlotSet::new();
        for (slot, is_loaded) in SlotIndex::ALL.into_iter().zip(loaded) {
            if is_loaded {
                slots.set(slot, ImageSlot::Loaded(png()));
            } else {
                slots.set(slot, ImageSlot::Absent);
            }
        }
        slots
    }

    fn run_ticks(
        animation: &mut AnimationLoop,
        slots: &SlotSet,
        view: &mut RecordingView,
        start: Instant,
        count: u32,
    ) -> Vec<usize> {
        (1..=count)
            .filter_map(|step| animation.tick(start + INTERVAL * step, slots, view))
            .map(SlotIndex::index)
            .collect()
    }

    #[test]
    fn start_shows_first_slot_immediately() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let now = Instant::now();
        animation.start(now, &SlotSet::new(), &mut view);
        assert_eq!(view.shown(), vec![SlotIndex::FIRST]);
        assert_eq!(view.calls().len(), 4);
        assert_eq!(animation.next_deadline(), Some(now + INTERVAL));
        assert!(animation.state().running);
    }

    #[test]
    fn ticks_visit_only_loaded_slots() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let slots = slots_from([true, false, true, false]);
        let start = Instant::now();
        animation.start(start, &slots, &mut view);
        let visited = run_ticks(&mut animation, &slots, &mut view, start, 6);
        assert_eq!(visited, vec![2, 0, 2, 0, 2, 0]);
    }

    #[test]
    fn tick_before_deadline_does_nothing() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let slots = slots_from([true; 4]);
        let start = Instant::now();
        animation.start(start, &slots, &mut view);
        view.clear();
        assert_eq!(
            animation.tick(start + Duration::from_millis(499), &slots, &mut view),
            None
        );
        assert!(view.calls().is_empty());
        assert_eq!(
            animation.tick(start + INTERVAL, &slots, &mut view),
            Some(SlotIndex::ALL[1])
        );
    }

    #[test]
    fn nothing_loaded_stays_on_first_slot() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let slots = SlotSet::new();
        let start = Instant::now();
        animation.start(start, &slots, &mut view);
        let visited = run_ticks(&mut animation, &slots, &mut view, start, 3);
        assert_eq!(visited, vec![0, 0, 0]);
    }

    #[test]
    fn cancel_then_start_resets_to_first_slot() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let slots = slots_from([true, false, true, false]);
        let start = Instant::now();
        let handle = animation.start(start, &slots, &mut view);
        animation.tick(start + INTERVAL, &slots, &mut view);
        assert_eq!(animation.state().current_slot, SlotIndex::ALL[2]);

        animation.cancel(&handle);
        assert_eq!(animation.state(), AnimationState::default());
        assert_eq!(animation.next_deadline(), None);
        assert_eq!(animation.tick(start + INTERVAL * 4, &slots, &mut view), None);

        view.clear();
        let restart = start + INTERVAL * 5;
        animation.start(restart, &slots, &mut view);
        assert_eq!(view.shown(), vec![SlotIndex::FIRST]);
        let visited = run_ticks(&mut animation, &slots, &mut view, restart, 3);
        assert_eq!(visited, vec![2, 0, 2]);
    }

    #[test]
    fn cancel_twice_matches_cancel_once() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let handle = animation.start(Instant::now(), &SlotSet::new(), &mut view);
        animation.cancel(&handle);
        let once = animation.state();
        animation.cancel(&handle);
        assert_eq!(animation.state(), once);
        assert!(handle.is_cancelled());
        assert!(!handle.cancel());
    }

    #[test]
    fn restart_cancels_previous_handle() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let now = Instant::now();
        let first = animation.start(now, &SlotSet::new(), &mut view);
        let second = animation.start(now, &SlotSet::new(), &mut view);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_ne!(first.id(), second.id());

        // a stale handle must not stop the replacement loop
        animation.cancel(&first);
        assert!(animation.state().running);
        assert!(animation.next_deadline().is_some());
    }

    #[test]
    fn externally_cancelled_handle_stops_rescheduling() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let slots = slots_from([true; 4]);
        let start = Instant::now();
        let handle = animation.start(start, &slots, &mut view);
        handle.cancel();
        view.clear();
        assert_eq!(animation.tick(start + INTERVAL, &slots, &mut view), None);
        assert!(view.calls().is_empty());
        assert_eq!(animation.next_deadline(), None);
        assert!(!animation.state().running);
    }

    #[test]
    fn never_shows_unloaded_slot_while_slots_change() {
        let mut view = RecordingView::default();
        let mut animation = AnimationLoop::new(INTERVAL);
        let mut slots = SlotSet::new();
        let start = Instant::now();
        animation.start(start, &slots, &mut view);

        // deterministic pseudo-random load/unload sequence
        let mut seed: u32 = 0x2545_f491;
        for step in 1..=200u32 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let slot = SlotIndex::ALL[(seed % 4) as usize];
            if seed & 0x10 == 0 {
                slots.set(slot, ImageSlot::Loaded(png()));
            } else {
                slots.set(slot, ImageSlot::Absent);
            }

            let shown = animation
                .tick(start + INTERVAL * step, &slots, &mut view)
                .expect("tick is due");
            if slots.loaded_count() > 0 {
                assert!(
                    slots.is_loaded(shown),
                    "step {step} showed unloaded slot {shown}"
                );
            } else {
                assert_eq!(shown, SlotIndex::FIRST);
            }
        }
    }
}

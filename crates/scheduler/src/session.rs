use std::time::Instant;

use provider::SlotIndex;
use spriteconfig::SessionSettings;
use tracing::{debug, info};

use crate::animation::{AnimationHandle, AnimationLoop, AnimationState};
use crate::flash::ErrorFlash;
use crate::generation::FetchHandle;
use crate::sequencer::{Completion, SequenceEvent, SequenceState, TaskSequencer};
use crate::slots::SlotSet;
use crate::view::SlotView;

/// Owner of the slot set, the current fetch generation and the current
/// animation loop for one view. Every method runs on the apply context.
pub struct Session<V: SlotView> {
    view: V,
    slots: SlotSet,
    sequencer: TaskSequencer,
    fetch: Option<FetchHandle>,
    animation: AnimationLoop,
    animation_handle: Option<AnimationHandle>,
    flash: ErrorFlash,
    display_name: Option<String>,
}

impl<V: SlotView> Session<V> {
    pub fn new(settings: &SessionSettings, sequencer: TaskSequencer, view: V) -> Self {
        Self {
            view,
            slots: SlotSet::new(),
            sequencer,
            fetch: None,
            animation: AnimationLoop::new(settings.animation_interval),
            animation_handle: None,
            flash: ErrorFlash::new(settings.error_flash),
            display_name: None,
        }
    }

    pub fn on_become_visible(&mut self, now: Instant) {
        if let Some(previous) = self.animation_handle.take() {
            self.animation.cancel(&previous);
        }
        let handle = self.animation.start(now, &self.slots, &mut self.view);
        info!(loop_id = handle.id(), "view visible; animation started");
        self.animation_handle = Some(handle);
    }

    pub fn on_become_hidden(&mut self) {
        if let Some(handle) = self.animation_handle.take() {
            self.animation.cancel(&handle);
            info!(loop_id = handle.id(), "view hidden; animation stopped");
        }
    }

    /// Starts a fetch generation for `name`, cancelling the current one first.
    pub fn on_request_changed(&mut self, name: &str) -> FetchHandle {
        if let Some(previous) = self.fetch.take() {
            self.sequencer.cancel(&previous);
        }
        let handle = self.sequencer.start(name);
        self.fetch = Some(handle.clone());
        handle
    }

    pub fn apply_completion(&mut self, completion: Completion, now: Instant) {
        for event in self.sequencer.apply(completion, &mut self.slots) {
            match event {
                SequenceEvent::Resolved { name } => {
                    self.view.set_display_name(&name);
                    for slot in SlotIndex::ALL {
                        self.view.set_slot_image(slot, None);
                    }
                    self.display_name = Some(name);
                }
                SequenceEvent::SlotUpdated(slot) => {
                    self.view.set_slot_image(slot, self.slots.get(slot).image());
                }
                SequenceEvent::InvalidInput { requested, error } => {
                    debug!(requested = %requested, %error, "flashing invalid input");
                    self.flash.trigger(now, &mut self.view);
                }
                SequenceEvent::Completed => {
                    debug!(loaded = self.slots.loaded_count(), "all slot fetches settled");
                }
            }
        }
    }

    /// Runs whatever timers have come due.
    pub fn poll_timers(&mut self, now: Instant) {
        self.flash.expire_if_due(now, &mut self.view);
        self.animation.tick(now, &self.slots, &mut self.view);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.animation.next_deadline(), self.flash.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Retires both the fetch generation and the animation loop.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.fetch.take() {
            self.sequencer.cancel(&handle);
        }
        self.on_become_hidden();
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn animation_state(&self) -> AnimationState {
        self.animation.state()
    }

    pub fn fetch_state(&self) -> Option<SequenceState> {
        self.sequencer.state()
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }
}

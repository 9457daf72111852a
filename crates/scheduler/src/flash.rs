use std::time::{Duration, Instant};

use crate::view::SlotView;

/// Transient "invalid input" signal with a timed revert.
#[derive(Debug, Clone)]
pub struct ErrorFlash {
    duration: Duration,
    clear_at: Option<Instant>,
}

impl ErrorFlash {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            clear_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.clear_at.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.clear_at
    }

    /// Shows the signal; a second trigger while active restarts the timer.
    pub fn trigger(&mut self, now: Instant, view: &mut dyn SlotView) {
        view.set_input_error_flash(self.duration);
        self.clear_at = Some(now + self.duration);
    }

    pub fn expire_if_due(&mut self, now: Instant, view: &mut dyn SlotView) -> bool {
        match self.clear_at {
            Some(deadline) if now >= deadline => {
                self.clear_at = None;
                view.clear_input_error_flash();
                true
            }
            _ => false,
        }
    }
}

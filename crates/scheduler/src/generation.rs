use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies one run of the fetch sequence. Zero is reserved for "no live run".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub const NONE: Generation = Generation(0);

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cancellation handle for one fetch generation.
///
/// Every handle issued by a sequencer shares one counter holding the live
/// generation. A handle is cancelled as soon as the counter no longer names its
/// generation, either because `cancel` cleared it or because a newer generation
/// replaced it. Workers and the apply context both check it before acting.
#[derive(Debug, Clone)]
pub struct FetchHandle {
    generation: Generation,
    live: Arc<AtomicU64>,
}

impl FetchHandle {
    /// Publishes `generation` as the live one and returns its handle.
    pub(crate) fn activate(generation: Generation, live: Arc<AtomicU64>) -> Self {
        live.store(generation.get(), Ordering::SeqCst);
        Self { generation, live }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.live.load(Ordering::SeqCst) != self.generation.get()
    }

    /// Returns `true` only for the call that actually retired the generation.
    pub fn cancel(&self) -> bool {
        self.live
            .compare_exchange(
                self.generation.get(),
                Generation::NONE.get(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent() {
        let live = Arc::new(AtomicU64::new(0));
        let handle = FetchHandle::activate(Generation::NONE.next(), live.clone());
        assert!(!handle.is_cancelled());
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn newer_generation_supersedes_older_handle() {
        let live = Arc::new(AtomicU64::new(0));
        let first = FetchHandle::activate(Generation(1), live.clone());
        let second = FetchHandle::activate(Generation(2), live.clone());
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        // retiring a superseded handle must not touch the live one
        assert!(!first.cancel());
        assert!(!second.is_cancelled());
    }
}

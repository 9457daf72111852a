//! Fetch sequencing for one session: resolve a resource by name, then fetch its
//! four slot images, one generation at a time.
//!
//! Every provider call runs as a job on the executor and reports back through a
//! `Completion` on the session's channel. `TaskSequencer::apply` runs on the
//! apply context and is the only place slot state changes, after checking that
//! the completion belongs to the live, uncancelled generation.
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crossbeam_channel::Sender;
use provider::{
    FetchError, ImageData, ResourceDescriptor, ResourceProvider, SlotIndex, SLOT_COUNT,
};
use spriteconfig::NameCase;
use tracing::{debug, info, warn};

use crate::executor::Executor;
use crate::generation::{FetchHandle, Generation};
use crate::slots::{ImageSlot, SlotSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Created,
    FetchingResource,
    FetchingImages { pending: usize },
    InvalidInput,
    Completed,
    Cancelled,
}

impl SequenceState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::InvalidInput | Self::Completed | Self::Cancelled)
    }
}

/// Result of one provider call, tagged with the generation that issued it.
#[derive(Debug)]
pub enum Completion {
    Resource {
        generation: Generation,
        outcome: Result<ResourceDescriptor, FetchError>,
    },
    Image {
        generation: Generation,
        slot: SlotIndex,
        outcome: Result<Option<ImageData>, FetchError>,
    },
}

impl Completion {
    pub fn generation(&self) -> Generation {
        match self {
            Self::Resource { generation, .. } | Self::Image { generation, .. } => *generation,
        }
    }
}

/// What applying a completion changed.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    /// The resource resolved; all slots were reset to pending.
    Resolved { name: String },
    InvalidInput { requested: String, error: FetchError },
    SlotUpdated(SlotIndex),
    Completed,
}

struct Flight {
    handle: FetchHandle,
    requested: String,
    state: SequenceState,
    applied: [bool; SLOT_COUNT],
}

pub struct TaskSequencer {
    provider: Arc<dyn ResourceProvider>,
    executor: Arc<dyn Executor>,
    completions: Sender<Completion>,
    name_case: NameCase,
    live: Arc<AtomicU64>,
    last: Generation,
    flight: Option<Flight>,
}

pub fn normalize_name(raw: &str, case: NameCase) -> Result<String, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidName(raw.to_string()));
    }
    Ok(match case {
        NameCase::Lower => trimmed.to_lowercase(),
        NameCase::Preserve => trimmed.to_string(),
    })
}

impl TaskSequencer {
    pub fn new(
        provider: Arc<dyn ResourceProvider>,
        executor: Arc<dyn Executor>,
        completions: Sender<Completion>,
        name_case: NameCase,
    ) -> Self {
        Self {
            provider,
            executor,
            completions,
            name_case,
            live: Arc::new(AtomicU64::new(Generation::NONE.get())),
            last: Generation::NONE,
            flight: None,
        }
    }

    /// Starts a new generation for `name`, retiring the current one first.
    pub fn start(&mut self, name: &str) -> FetchHandle {
        self.retire_flight();

        let generation = self.last.next();
        self.last = generation;
        let handle = FetchHandle::activate(generation, Arc::clone(&self.live));
        let mut flight = Flight {
            handle: handle.clone(),
            requested: name.to_string(),
            state: SequenceState::Created,
            applied: [false; SLOT_COUNT],
        };

        match normalize_name(name, self.name_case) {
            Ok(normalized) => {
                info!(%generation, name = %normalized, "starting fetch generation");
                self.dispatch_resource(&handle, normalized);
            }
            Err(error) => {
                warn!(%generation, %error, "rejecting request before lookup");
                self.report(Completion::Resource {
                    generation,
                    outcome: Err(error),
                });
            }
        }
        flight.state = SequenceState::FetchingResource;
        self.flight = Some(flight);
        handle
    }

    pub fn cancel(&mut self, handle: &FetchHandle) {
        let retired = handle.cancel();
        if let Some(flight) = self.flight.as_mut() {
            if flight.handle.generation() == handle.generation() && !flight.state.is_terminal() {
                flight.state = SequenceState::Cancelled;
                info!(generation = %handle.generation(), "fetch generation cancelled");
                return;
            }
        }
        if !retired {
            debug!(generation = %handle.generation(), "cancel had nothing to retire");
        }
    }

    pub fn state(&self) -> Option<SequenceState> {
        self.flight.as_ref().map(|flight| flight.state)
    }

    pub fn current(&self) -> Option<&FetchHandle> {
        self.flight.as_ref().map(|flight| &flight.handle)
    }

    pub fn last_generation(&self) -> Generation {
        self.last
    }

    /// Applies one completion to `slots`. Completions from superseded or
    /// cancelled generations are dropped without touching anything.
    pub fn apply(&mut self, completion: Completion, slots: &mut SlotSet) -> Vec<SequenceEvent> {
        let generation = completion.generation();
        let Some(flight) = self.flight.as_mut() else {
            debug!(%generation, "discarding completion with no active generation");
            return Vec::new();
        };
        if flight.handle.generation() != generation || flight.handle.is_cancelled() {
            debug!(
                %generation,
                current = %flight.handle.generation(),
                "discarding stale completion"
            );
            if flight.handle.generation() == generation && !flight.state.is_terminal() {
                flight.state = SequenceState::Cancelled;
            }
            return Vec::new();
        }

        match completion {
            Completion::Resource { outcome, .. } => {
                if flight.state != SequenceState::FetchingResource {
                    return Vec::new();
                }
                match outcome {
                    Err(error) => {
                        warn!(
                            %generation,
                            requested = %flight.requested,
                            %error,
                            "resource lookup failed"
                        );
                        flight.state = SequenceState::InvalidInput;
                        vec![SequenceEvent::InvalidInput {
                            requested: flight.requested.clone(),
                            error,
                        }]
                    }
                    Ok(descriptor) => {
                        slots.reset();
                        flight.state = SequenceState::FetchingImages {
                            pending: SLOT_COUNT,
                        };
                        let handle = flight.handle.clone();
                        let name = descriptor.name().to_string();
                        info!(
                            %generation,
                            name = %name,
                            available = descriptor.available_slots(),
                            "resource resolved; fetching images"
                        );
                        self.dispatch_images(&handle, Arc::new(descriptor));
                        vec![SequenceEvent::Resolved { name }]
                    }
                }
            }
            Completion::Image { slot, outcome, .. } => {
                let SequenceState::FetchingImages { pending } = flight.state else {
                    return Vec::new();
                };
                if flight.applied[slot.index()] {
                    return Vec::new();
                }
                flight.applied[slot.index()] = true;

                let value = match outcome {
                    Ok(Some(image)) => {
                        debug!(%generation, %slot, bytes = image.len(), "slot image loaded");
                        ImageSlot::Loaded(image)
                    }
                    Ok(None) => {
                        info!(%generation, %slot, "no image for slot");
                        ImageSlot::Absent
                    }
                    Err(error) => {
                        warn!(%generation, %slot, %error, "slot image fetch failed");
                        ImageSlot::Absent
                    }
                };
                slots.set(slot, value);

                let mut events = vec![SequenceEvent::SlotUpdated(slot)];
                let pending = pending - 1;
                if pending == 0 {
                    flight.state = SequenceState::Completed;
                    info!(
                        %generation,
                        loaded = slots.loaded_count(),
                        "fetch generation completed"
                    );
                    events.push(SequenceEvent::Completed);
                } else {
                    flight.state = SequenceState::FetchingImages { pending };
                }
                events
            }
        }
    }

    fn retire_flight(&mut self) {
        if let Some(flight) = self.flight.as_mut() {
            flight.handle.cancel();
            if !flight.state.is_terminal() {
                debug!(generation = %flight.handle.generation(), "superseding fetch generation");
                flight.state = SequenceState::Cancelled;
            }
        }
    }

    fn dispatch_resource(&self, handle: &FetchHandle, name: String) {
        let provider = Arc::clone(&self.provider);
        let completions = self.completions.clone();
        let handle = handle.clone();
        self.executor.execute(Box::new(move || {
            if handle.is_cancelled() {
                debug!(generation = %handle.generation(), "skipping resource fetch for cancelled generation");
                return;
            }
            let outcome = provider.fetch_resource(&name);
            let _ = completions.send(Completion::Resource {
                generation: handle.generation(),
                outcome,
            });
        }));
    }

    fn dispatch_images(&self, handle: &FetchHandle, descriptor: Arc<ResourceDescriptor>) {
        for slot in SlotIndex::ALL {
            let provider = Arc::clone(&self.provider);
            let completions = self.completions.clone();
            let handle = handle.clone();
            let descriptor = Arc::clone(&descriptor);
            self.executor.execute(Box::new(move || {
                if handle.is_cancelled() {
                    debug!(generation = %handle.generation(), %slot, "skipping image fetch for cancelled generation");
                    return;
                }
                let outcome = provider.fetch_image(&descriptor, slot);
                let _ = completions.send(Completion::Image {
                    generation: handle.generation(),
                    slot,
                    outcome,
                });
            }));
        }
    }

    fn report(&self, completion: Completion) {
        if self.completions.send(completion).is_err() {
            warn!("completion channel closed; dropping result");
        }
    }
}

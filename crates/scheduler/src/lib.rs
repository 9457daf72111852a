//! Sequencing and animation core for a four-slot sprite viewer.
//!
//! A [`Session`] owns the slot state for one view. It resolves a resource
//! through a [`provider::ResourceProvider`], fetches the four slot images in
//! parallel and cycles the visible slot on a fixed interval. Every state change
//! happens on a single apply context; provider calls run on an [`Executor`] and
//! report back as [`Completion`]s. [`SessionRuntime`] wires the two together on
//! background threads.
mod animation;
mod executor;
mod flash;
mod generation;
mod runtime;
mod sequencer;
mod session;
mod slots;
mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use animation::{AnimationHandle, AnimationLoop, AnimationState};
pub use executor::{Executor, Job, WorkerPool};
pub use flash::ErrorFlash;
pub use generation::{FetchHandle, Generation};
pub use runtime::{RuntimeError, SessionRuntime};
pub use sequencer::{normalize_name, Completion, SequenceEvent, SequenceState, TaskSequencer};
pub use session::Session;
pub use slots::{ImageSlot, SlotSet};
pub use view::SlotView;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use provider::{FetchError, ImageData, ResourceDescriptor, ResourceProvider, SlotIndex};

use crate::executor::{Executor, Job};
use crate::view::SlotView;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

pub fn png() -> ImageData {
    ImageData::from_bytes(PNG_MAGIC.to_vec()).unwrap()
}

/// A PNG-tagged payload unique to `name` and `slot`.
pub fn png_for(name: &str, slot: SlotIndex) -> ImageData {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(slot.index() as u8);
    ImageData::from_bytes(bytes).unwrap()
}

/// Queues jobs until the test decides to run them.
#[derive(Default)]
pub struct ManualExecutor {
    jobs: Mutex<VecDeque<Job>>,
}

impl ManualExecutor {
    pub fn pending(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn run_next(&self) -> bool {
        let job = self.jobs.lock().unwrap().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Runs every queued job, in the order given by queue positions.
    pub fn run_in_order(&self, order: &[usize]) {
        let mut jobs: Vec<Option<Job>> = self.jobs.lock().unwrap().drain(..).map(Some).collect();
        assert_eq!(jobs.len(), order.len(), "order must cover every queued job");
        for &index in order {
            let job = jobs[index].take().expect("job index used twice");
            job();
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job) {
        self.jobs.lock().unwrap().push_back(job);
    }
}

#[derive(Default)]
pub struct ScriptedProvider {
    resources: HashMap<String, Result<ResourceDescriptor, FetchError>>,
    image_failures: HashMap<(String, usize), FetchError>,
    resource_calls: Mutex<Vec<String>>,
    image_calls: Mutex<Vec<(String, SlotIndex)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, name: &str, images: [bool; 4]) -> Self {
        let refs = std::array::from_fn(|index| {
            images[index].then(|| format!("mem://{name}/{index}"))
        });
        self.resources
            .insert(name.to_string(), Ok(ResourceDescriptor::new(name, refs)));
        self
    }

    pub fn with_resource_failure(mut self, name: &str, error: FetchError) -> Self {
        self.resources.insert(name.to_string(), Err(error));
        self
    }

    pub fn with_image_failure(mut self, name: &str, slot: usize, error: FetchError) -> Self {
        self.image_failures.insert((name.to_string(), slot), error);
        self
    }

    pub fn resource_calls(&self) -> Vec<String> {
        self.resource_calls.lock().unwrap().clone()
    }

    pub fn image_calls(&self) -> Vec<(String, SlotIndex)> {
        self.image_calls.lock().unwrap().clone()
    }
}

impl ResourceProvider for ScriptedProvider {
    fn fetch_resource(&self, name: &str) -> Result<ResourceDescriptor, FetchError> {
        self.resource_calls.lock().unwrap().push(name.to_string());
        self.resources
            .get(name)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(name.to_string())))
    }

    fn fetch_image(
        &self,
        descriptor: &ResourceDescriptor,
        slot: SlotIndex,
    ) -> Result<Option<ImageData>, FetchError> {
        self.image_calls
            .lock()
            .unwrap()
            .push((descriptor.name().to_string(), slot));
        if let Some(error) = self
            .image_failures
            .get(&(descriptor.name().to_string(), slot.index()))
        {
            return Err(error.clone());
        }
        Ok(descriptor
            .image_ref(slot)
            .map(|_| png_for(descriptor.name(), slot)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    Visible(SlotIndex, bool),
    Image(SlotIndex, bool),
    Flash(Duration),
    ClearFlash,
    Name(String),
}

/// Records every view call; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    calls: Arc<Mutex<Vec<ViewCall>>>,
}

impl RecordingView {
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Slots made visible, in order.
    pub fn shown(&self) -> Vec<SlotIndex> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ViewCall::Visible(slot, true) => Some(slot),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &ViewCall) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    pub fn flash_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ViewCall::Flash(_)))
            .count()
    }
}

impl SlotView for RecordingView {
    fn set_slot_visible(&mut self, slot: SlotIndex, visible: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(ViewCall::Visible(slot, visible));
    }

    fn set_slot_image(&mut self, slot: SlotIndex, image: Option<&ImageData>) {
        self.calls
            .lock()
            .unwrap()
            .push(ViewCall::Image(slot, image.is_some()));
    }

    fn set_input_error_flash(&mut self, duration: Duration) {
        self.calls.lock().unwrap().push(ViewCall::Flash(duration));
    }

    fn clear_input_error_flash(&mut self) {
        self.calls.lock().unwrap().push(ViewCall::ClearFlash);
    }

    fn set_display_name(&mut self, name: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(ViewCall::Name(name.to_string()));
    }
}

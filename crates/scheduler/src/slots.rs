use provider::{ImageData, SlotIndex, SLOT_COUNT};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageSlot {
    #[default]
    Pending,
    Loaded(ImageData),
    Absent,
}

impl ImageSlot {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn image(&self) -> Option<&ImageData> {
        match self {
            Self::Loaded(image) => Some(image),
            _ => None,
        }
    }
}

/// The four slots written by the sequencer and read by the animation loop.
#[derive(Debug, Clone, Default)]
pub struct SlotSet {
    slots: [ImageSlot; SLOT_COUNT],
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotIndex) -> &ImageSlot {
        &self.slots[slot.index()]
    }

    pub fn set(&mut self, slot: SlotIndex, value: ImageSlot) {
        self.slots[slot.index()] = value;
    }

    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    pub fn is_loaded(&self, slot: SlotIndex) -> bool {
        self.get(slot).is_loaded()
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_loaded()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &ImageSlot)> {
        SlotIndex::ALL.into_iter().zip(self.slots.iter())
    }

    /// Next loaded slot after `from`, scanning at most one full cycle.
    /// Falls back to slot 0 when nothing is loaded.
    pub fn next_displayable(&self, from: SlotIndex) -> SlotIndex {
        let mut candidate = from;
        for _ in 0..SLOT_COUNT {
            candidate = candidate.next();
            if self.is_loaded(candidate) {
                return candidate;
            }
        }
        SlotIndex::FIRST
    }
}

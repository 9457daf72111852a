use std::fmt;
use std::sync::Arc;

use image::ImageFormat;

use crate::FetchError;

pub const SLOT_COUNT: usize = 4;

/// One of the four fixed image positions of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const ALL: [SlotIndex; SLOT_COUNT] =
        [SlotIndex(0), SlotIndex(1), SlotIndex(2), SlotIndex(3)];

    pub const FIRST: SlotIndex = SlotIndex(0);

    pub fn new(index: usize) -> Option<Self> {
        (index < SLOT_COUNT).then_some(SlotIndex(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The following slot, wrapping from 3 back to 0.
    pub fn next(self) -> Self {
        SlotIndex((self.0 + 1) % SLOT_COUNT as u8)
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "front_default",
            1 => "front_shiny",
            2 => "back_default",
            _ => "back_shiny",
        }
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

/// Immutable description of a fetched resource: its canonical name and an
/// optional opaque image reference per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    name: String,
    images: [Option<String>; SLOT_COUNT],
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, images: [Option<String>; SLOT_COUNT]) -> Self {
        Self {
            name: name.into(),
            images,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image_ref(&self, slot: SlotIndex) -> Option<&str> {
        self.images[slot.index()].as_deref()
    }

    pub fn available_slots(&self) -> usize {
        self.images.iter().filter(|image| image.is_some()).count()
    }
}

/// Encoded image bytes whose container format has been recognised.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Arc<[u8]>,
    format: ImageFormat,
}

impl ImageData {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, FetchError> {
        let bytes = bytes.into();
        let format = image::guess_format(&bytes).map_err(|err| {
            FetchError::NotAnImage(format!("{} bytes not recognised: {err}", bytes.len()))
        })?;
        Ok(Self {
            bytes: bytes.into(),
            format,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

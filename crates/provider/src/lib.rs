mod descriptor;
mod local;
mod remote;

pub use descriptor::{ImageData, ResourceDescriptor, SlotIndex, SLOT_COUNT};
pub use local::LocalProvider;
pub use remote::{HttpProvider, PokemonPayload, Sprites};

/// Failure taxonomy shared by every provider. "No image for this slot" is not an
/// error; `fetch_image` reports it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("not an image: {0}")]
    NotAnImage(String),
    #[error("invalid resource name '{0}'")]
    InvalidName(String),
    #[error("invalid url '{url}' for {slot} image")]
    InvalidImageUrl { url: String, slot: SlotIndex },
    #[error("resource '{0}' not found")]
    NotFound(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Source of resource descriptors and their slot images.
///
/// Calls are blocking and run on worker threads; implementations must be safe to
/// share between them.
pub trait ResourceProvider: Send + Sync {
    fn fetch_resource(&self, name: &str) -> Result<ResourceDescriptor, FetchError>;

    fn fetch_image(
        &self,
        descriptor: &ResourceDescriptor,
        slot: SlotIndex,
    ) -> Result<Option<ImageData>, FetchError>;
}

//! Directory-backed provider used for offline runs and integration tests.
//!
//! Layout: `<root>/<name>/resource.toml` describes one resource, with image
//! paths relative to the resource directory:
//!
//! ```toml
//! name = "ditto"
//!
//! [images]
//! front_default = "front.png"
//! back_default = "back.png"
//! ```
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::{FetchError, ImageData, ResourceDescriptor, ResourceProvider, SlotIndex};

const MANIFEST_FILE: &str = "resource.toml";

#[derive(Debug, Clone)]
pub struct LocalProvider {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LocalManifest {
    name: Option<String>,
    #[serde(default)]
    images: LocalImages,
}

#[derive(Debug, Default, Deserialize)]
struct LocalImages {
    front_default: Option<PathBuf>,
    front_shiny: Option<PathBuf>,
    back_default: Option<PathBuf>,
    back_shiny: Option<PathBuf>,
}

impl LocalProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resource_dir(&self, name: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(name);
        let single_component = matches!(
            relative.components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
        if !single_component {
            return Err(FetchError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ResourceProvider for LocalProvider {
    fn fetch_resource(&self, name: &str) -> Result<ResourceDescriptor, FetchError> {
        let dir = self.resource_dir(name)?;
        let manifest_path = dir.join(MANIFEST_FILE);
        debug!(path = %manifest_path.display(), "reading local resource");
        let contents = match fs::read_to_string(&manifest_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(name.to_string()));
            }
            Err(err) => {
                return Err(FetchError::Transport(format!(
                    "reading {}: {err}",
                    manifest_path.display()
                )));
            }
        };
        let manifest: LocalManifest = toml::from_str(&contents).map_err(|err| {
            FetchError::Decode(format!("{}: {err}", manifest_path.display()))
        })?;

        let resolve = |path: Option<PathBuf>| {
            path.map(|path| dir.join(path).to_string_lossy().into_owned())
        };
        let LocalImages {
            front_default,
            front_shiny,
            back_default,
            back_shiny,
        } = manifest.images;
        Ok(ResourceDescriptor::new(
            manifest.name.unwrap_or_else(|| name.to_string()),
            [
                resolve(front_default),
                resolve(front_shiny),
                resolve(back_default),
                resolve(back_shiny),
            ],
        ))
    }

    fn fetch_image(
        &self,
        descriptor: &ResourceDescriptor,
        slot: SlotIndex,
    ) -> Result<Option<ImageData>, FetchError> {
        let Some(path) = descriptor.image_ref(slot) else {
            return Ok(None);
        };
        let bytes = fs::read(path)
            .map_err(|err| FetchError::Transport(format!("reading {path}: {err}")))?;
        ImageData::from_bytes(bytes).map(Some)
    }
}

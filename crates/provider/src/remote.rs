use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FetchError, ImageData, ResourceDescriptor, ResourceProvider, SlotIndex};

/// Provider backed by a PokeAPI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    http: Client,
    api_base: Url,
}

impl HttpProvider {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
        let trimmed = api_base.trim();
        if trimmed.is_empty() {
            bail!("api base url must not be empty");
        }
        let api_base =
            Url::parse(trimmed).with_context(|| format!("parsing api base url '{trimmed}'"))?;
        if api_base.cannot_be_a_base() {
            bail!("api base url '{api_base}' cannot be used as a base");
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { http, api_base })
    }

    pub fn resource_url(&self, name: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("invalid api base url"))?;
            segments.pop_if_empty();
            segments.push("pokemon");
            segments.push(name);
            segments.push("");
        }
        Ok(url)
    }

    fn get(&self, url: Url) -> Result<reqwest::blocking::Response, FetchError> {
        self.http
            .get(url.clone())
            .send()
            .map_err(|err| FetchError::Transport(format!("requesting {url}: {err}")))
    }
}

impl ResourceProvider for HttpProvider {
    fn fetch_resource(&self, name: &str) -> Result<ResourceDescriptor, FetchError> {
        if name.trim().is_empty() {
            return Err(FetchError::InvalidName(name.to_string()));
        }
        let url = self
            .resource_url(name)
            .map_err(|_| FetchError::InvalidName(name.to_string()))?;
        debug!(%url, "requesting resource");
        let response = self.get(url.clone())?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(name.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|err| FetchError::Transport(format!("{url} returned an error: {err}")))?;
        let body = response
            .text()
            .map_err(|err| FetchError::Transport(format!("reading body of {url}: {err}")))?;
        let payload = serde_json::from_str::<PokemonPayload>(&body).map_err(|err| {
            let snippet = body.chars().take(200).collect::<String>();
            FetchError::Decode(format!("{err}; first 200 bytes: {snippet}"))
        })?;
        Ok(payload.into_descriptor())
    }

    fn fetch_image(
        &self,
        descriptor: &ResourceDescriptor,
        slot: SlotIndex,
    ) -> Result<Option<ImageData>, FetchError> {
        let Some(src) = descriptor.image_ref(slot) else {
            return Ok(None);
        };
        let url = Url::parse(src).map_err(|_| FetchError::InvalidImageUrl {
            url: src.to_string(),
            slot,
        })?;
        debug!(%url, slot = slot.index(), name = descriptor.name(), "downloading slot image");
        let response = self
            .get(url.clone())?
            .error_for_status()
            .map_err(|err| FetchError::Transport(format!("image request {url} failed: {err}")))?;
        let bytes = response
            .bytes()
            .map_err(|err| FetchError::Transport(format!("reading image {url}: {err}")))?;
        ImageData::from_bytes(bytes.to_vec())
            .map(Some)
            .map_err(|err| match err {
                FetchError::NotAnImage(reason) => FetchError::NotAnImage(format!(
                    "{reason} at {url} for {slot} image of {}",
                    descriptor.name()
                )),
                other => other,
            })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PokemonPayload {
    pub name: String,
    pub sprites: Sprites,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub front_shiny: Option<String>,
    #[serde(default)]
    pub back_default: Option<String>,
    #[serde(default)]
    pub back_shiny: Option<String>,
}

impl PokemonPayload {
    pub fn into_descriptor(self) -> ResourceDescriptor {
        let Sprites {
            front_default,
            front_shiny,
            back_default,
            back_shiny,
        } = self.sprites;
        ResourceDescriptor::new(
            self.name,
            [front_default, front_shiny, back_default, back_shiny],
        )
    }
}

//! Fluent [`LsfBuilder`]: the primary embedding surface.
//!
//! ```
//! use lsf::builder::LsfBuilder;
//!
//! let mut lsf = LsfBuilder::new();
//! lsf.add_container()
//!     .new_id()?
//!     .set_sound(b"RIFF\0\0\0\0WAVEfmt ".to_vec())?
//!     .detect_mime()?;
//! lsf.add_meta("title", "My Sound", None)?;
//! let bytes = lsf.build()?;
//!
//! let stream = lsf::decode(&bytes)?;
//! assert_eq!(stream.containers[0].mimetype, "audio/wav");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The builder remembers the most recently added container and metadata
//! record as indices into its own lists; the `set_*` calls edit those
//! entries in place.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::container::Container;
use crate::header::Version;
use crate::id::{IdSource, Identifier, UuidSource};
use crate::metadata::MetadataRecord;
use crate::mime::{MagicSniffer, MimeDetector};
use crate::stream::{encode_with, EncodeError};

/// Default bound on identifier draws per assignment.
pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 64;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("At least one container is required to build LSF")]
    EmptyContainerSet,
    #[error("No container is currently being built")]
    NoCurrentContainer,
    #[error("No metadata is currently being built")]
    NoCurrentMetadata,
    #[error("Invalid version: {0}")]
    InvalidVersion(String),
    #[error("No unused identifier after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

// ── BuildOptions ──────────────────────────────────────────────────────────────

/// Configuration for [`LsfBuilder::with_options`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub version:         Version,
    /// How many times identifier generation is retried on collision before
    /// giving up with [`BuildError::IdSpaceExhausted`].
    pub max_id_attempts: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            version:         Version::LOWEST,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

impl BuildOptions {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Pending entries ───────────────────────────────────────────────────────────

/// A container under construction.  Unset fields are filled in by `build()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingContainer {
    pub id:         Option<Identifier>,
    pub mimetype:   Option<String>,
    pub sound_data: Vec<u8>,
}

// ── LsfBuilder ────────────────────────────────────────────────────────────────

pub struct LsfBuilder {
    containers:        Vec<PendingContainer>,
    metadata:          Vec<MetadataRecord>,
    current_container: Option<usize>,
    current_metadata:  Option<usize>,
    options:           BuildOptions,
    ids:               Box<dyn IdSource>,
    mime:              Box<dyn MimeDetector>,
}

impl Default for LsfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LsfBuilder {
    pub fn new() -> Self {
        Self::with_options(BuildOptions::default())
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            containers:        Vec::new(),
            metadata:          Vec::new(),
            current_container: None,
            current_metadata:  None,
            options,
            ids:               Box::new(UuidSource),
            mime:              Box::new(MagicSniffer),
        }
    }

    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_mime_detector(mut self, mime: impl MimeDetector + 'static) -> Self {
        self.mime = Box::new(mime);
        self
    }

    // ── Version ──────────────────────────────────────────────────────────────

    pub fn set_version(&mut self, tag: u8) -> Result<&mut Self, BuildError> {
        self.options.version = Version::from_tag(tag)
            .ok_or_else(|| BuildError::InvalidVersion(tag.to_string()))?;
        Ok(self)
    }

    /// Accepts `"v0"`, `"v1"`, ...
    pub fn set_version_name(&mut self, name: &str) -> Result<&mut Self, BuildError> {
        self.options.version = Version::from_name(name)
            .ok_or_else(|| BuildError::InvalidVersion(name.to_owned()))?;
        Ok(self)
    }

    pub fn version(&self) -> Version {
        self.options.version
    }

    // ── Containers ───────────────────────────────────────────────────────────

    /// Append an empty container and make it current.
    pub fn add_container(&mut self) -> &mut Self {
        self.containers.push(PendingContainer::default());
        self.current_container = Some(self.containers.len() - 1);
        self
    }

    pub fn set_sound(&mut self, sound_data: impl Into<Vec<u8>>) -> Result<&mut Self, BuildError> {
        self.current_container_mut()?.sound_data = sound_data.into();
        Ok(self)
    }

    /// Give the current container a fresh identifier, unused anywhere in
    /// this builder.
    pub fn new_id(&mut self) -> Result<&mut Self, BuildError> {
        let index = self.current_container.ok_or(BuildError::NoCurrentContainer)?;
        let id = self.fresh_id()?;
        self.containers[index].id = Some(id);
        Ok(self)
    }

    /// Assign a caller-chosen identifier to the current container.
    pub fn set_id(&mut self, id: Identifier) -> Result<&mut Self, BuildError> {
        self.current_container_mut()?.id = Some(id);
        Ok(self)
    }

    pub fn set_mime(&mut self, mimetype: impl Into<String>) -> Result<&mut Self, BuildError> {
        self.current_container_mut()?.mimetype = Some(mimetype.into());
        Ok(self)
    }

    /// Label the current container from its sound data.
    pub fn detect_mime(&mut self) -> Result<&mut Self, BuildError> {
        let index = self.current_container.ok_or(BuildError::NoCurrentContainer)?;
        let label = self.mime.detect(&self.containers[index].sound_data);
        self.containers[index].mimetype = Some(label);
        Ok(self)
    }

    // ── Metadata ─────────────────────────────────────────────────────────────

    /// Append a tag and make it current.
    ///
    /// Without an explicit `id` the tag is bound to the current container,
    /// which receives a fresh identifier first if it has none yet.
    pub fn add_meta(
        &mut self,
        key:   impl Into<String>,
        value: impl Into<String>,
        id:    Option<Identifier>,
    ) -> Result<&mut Self, BuildError> {
        let id = match id {
            Some(id) => id,
            None => self.current_container_id()?,
        };
        self.metadata.push(MetadataRecord::with_id(id, key, value));
        self.current_metadata = Some(self.metadata.len() - 1);
        Ok(self)
    }

    pub fn set_key(&mut self, key: impl Into<String>) -> Result<&mut Self, BuildError> {
        self.current_metadata_mut()?.key = key.into();
        Ok(self)
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> Result<&mut Self, BuildError> {
        self.current_metadata_mut()?.value = value.into();
        Ok(self)
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    pub fn containers(&self) -> &[PendingContainer] {
        &self.containers
    }

    pub fn metadata(&self) -> &[MetadataRecord] {
        &self.metadata
    }

    pub fn current_container(&self) -> Option<&PendingContainer> {
        self.current_container.map(|i| &self.containers[i])
    }

    pub fn current_metadata(&self) -> Option<&MetadataRecord> {
        self.current_metadata.map(|i| &self.metadata[i])
    }

    // ── Build ────────────────────────────────────────────────────────────────

    /// Encode everything accumulated so far.
    ///
    /// Containers still lacking an id get a fresh unique one and containers
    /// lacking a MIME label are run through the detector; both are recorded
    /// in the builder so repeated builds agree.
    pub fn build(&mut self) -> Result<Vec<u8>, BuildError> {
        if self.containers.is_empty() {
            return Err(BuildError::EmptyContainerSet);
        }
        for index in 0..self.containers.len() {
            if self.containers[index].id.is_none() {
                let id = self.fresh_id()?;
                self.containers[index].id = Some(id);
            }
            if self.containers[index].mimetype.is_none() {
                let label = self.mime.detect(&self.containers[index].sound_data);
                self.containers[index].mimetype = Some(label);
            }
        }

        let containers: Vec<Container> = self
            .containers
            .iter()
            .map(|p| Container {
                id:         p.id.unwrap_or_default(),
                mimetype:   p.mimetype.clone().unwrap_or_default(),
                sound_data: p.sound_data.clone(),
            })
            .collect();

        debug!(
            version = %self.options.version,
            containers = containers.len(),
            metadata = self.metadata.len(),
            "Building LSF stream"
        );
        Ok(encode_with(&containers, &self.metadata, self.options.version, &mut *self.ids)?)
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn current_container_mut(&mut self) -> Result<&mut PendingContainer, BuildError> {
        let index = self.current_container.ok_or(BuildError::NoCurrentContainer)?;
        Ok(&mut self.containers[index])
    }

    fn current_metadata_mut(&mut self) -> Result<&mut MetadataRecord, BuildError> {
        let index = self.current_metadata.ok_or(BuildError::NoCurrentMetadata)?;
        Ok(&mut self.metadata[index])
    }

    fn current_container_id(&mut self) -> Result<Identifier, BuildError> {
        let index = self.current_container.ok_or(BuildError::NoCurrentContainer)?;
        if let Some(id) = self.containers[index].id {
            return Ok(id);
        }
        let id = self.fresh_id()?;
        self.containers[index].id = Some(id);
        Ok(id)
    }

    fn is_id_used(&self, id: &Identifier) -> bool {
        self.containers.iter().any(|c| c.id.as_ref() == Some(id))
            || self.metadata.iter().any(|m| m.id.as_ref() == Some(id))
    }

    fn fresh_id(&mut self) -> Result<Identifier, BuildError> {
        let attempts = self.options.max_id_attempts.max(1);
        for attempt in 1..=attempts {
            let id = self.ids.next_id();
            if !self.is_id_used(&id) {
                return Ok(id);
            }
            warn!(%id, attempt, "Identifier already in use, drawing again");
        }
        Err(BuildError::IdSpaceExhausted { attempts })
    }
}

//! Encode/decode engine for complete LSF streams.
//!
//! # Writer
//! [`encode`] validates every record up front, so a call either fails
//! before emitting anything or returns a finished buffer.  Records are
//! written in caller order; each container's SHA-512 is derived from its
//! current MIME label and sound data at this point, never taken from the
//! caller.  The last 8 bytes are a big-endian `total_size` equal to the
//! length of the whole buffer, trailer included.
//!
//! # Reader
//! [`decode`] is a single sequential pass.  Counts are read before the
//! records they announce, so nothing can be located without parsing what
//! precedes it.  Decoding is purely structural: neither `total_size` nor
//! the checksums are checked.  Call [`Stream::verify`] (or use
//! [`decode_verified`]) for integrity.

pub mod error;
pub mod fields;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::container::{Container, DecodedContainer};
use crate::header::{self, Version, MAX_RECORDS, SIGNATURE, SIGNATURE_LEN, TOTAL_SIZE_LEN};
use crate::id::{IdSource, Identifier, UuidSource};
use crate::metadata::{DecodedMetadata, MetadataRecord, METADATA_RECORD_LEN};

pub use error::{DecodeError, EncodeError, IntegrityError, VerifyError};
use fields::FieldReader;

/// Bytes every stream carries regardless of content:
/// signature, version, both counts and the size trailer.
pub const FRAMING_LEN: usize = SIGNATURE_LEN + 1 + 1 + 1 + TOTAL_SIZE_LEN;

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encode with random v4 identifiers for metadata records that have none.
pub fn encode(
    containers: &[Container],
    metadata:   &[MetadataRecord],
    version:    Version,
) -> Result<Vec<u8>, EncodeError> {
    encode_with(containers, metadata, version, &mut UuidSource)
}

/// Encode from a raw version tag, rejecting tags this build does not know.
pub fn encode_tagged(
    containers: &[Container],
    metadata:   &[MetadataRecord],
    tag:        u8,
) -> Result<Vec<u8>, EncodeError> {
    let version = Version::from_tag(tag).ok_or(EncodeError::InvalidVersion(tag))?;
    encode(containers, metadata, version)
}

pub fn encode_with(
    containers: &[Container],
    metadata:   &[MetadataRecord],
    version:    Version,
    ids:        &mut dyn IdSource,
) -> Result<Vec<u8>, EncodeError> {
    let container_count = record_count("container", containers.len())?;
    let metadata_count = record_count("metadata", metadata.len())?;
    for (i, c) in containers.iter().enumerate() {
        c.validate(i)?;
    }
    for (i, m) in metadata.iter().enumerate() {
        m.validate(i)?;
    }

    let capacity = FRAMING_LEN
        + containers.iter().map(Container::encoded_len).sum::<usize>()
        + metadata.len() * METADATA_RECORD_LEN;
    let mut buf = Vec::with_capacity(capacity);

    header::write_preamble(&mut buf, version)?;
    buf.push(container_count);
    for c in containers {
        trace!(id = %c.id, mimetype = %c.mimetype, len = c.sound_data.len(), "Writing container");
        c.write_record(&mut buf)?;
    }
    buf.push(metadata_count);
    for m in metadata {
        let id = m.resolve_id(ids);
        trace!(id = %id, key = %m.key, "Writing metadata");
        m.write_record(&mut buf, id)?;
    }
    buf.extend_from_slice(&[0u8; TOTAL_SIZE_LEN]);
    let total_size = header::patch_total_size(&mut buf)?;

    debug!(
        version = version.tag(),
        containers = containers.len(),
        metadata = metadata.len(),
        total_size,
        "Encoded LSF stream"
    );
    Ok(buf)
}

fn record_count(kind: &'static str, len: usize) -> Result<u8, EncodeError> {
    u8::try_from(len).map_err(|_| EncodeError::TooManyRecords {
        kind,
        max:    MAX_RECORDS,
        actual: len,
    })
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// A decoded stream.  Every field is exactly what the bytes said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub version:    Version,
    pub containers: Vec<DecodedContainer>,
    pub metadata:   Vec<DecodedMetadata>,
    /// The declared `total_size` trailer.
    pub total_size: u64,
    /// Bytes the parse consumed, trailer included.
    #[serde(skip)]
    pub consumed:   u64,
}

pub fn decode(bytes: &[u8]) -> Result<Stream, DecodeError> {
    let mut reader = FieldReader::new(bytes);

    let signature = reader.read_array::<SIGNATURE_LEN>("signature")?;
    if &signature != SIGNATURE {
        return Err(DecodeError::SignatureMismatch { found: signature.to_vec() });
    }
    let tag = reader.read_u8("version")?;
    let version = Version::from_tag(tag).ok_or(DecodeError::UnsupportedVersion(tag))?;

    let container_count = reader.read_u8("container_count")?;
    let mut containers = Vec::with_capacity(container_count as usize);
    for _ in 0..container_count {
        let c = DecodedContainer::read_record(&mut reader)?;
        trace!(id = %c.id, mimetype = %c.mimetype, len = c.sound_data.len(), "Read container");
        containers.push(c);
    }

    let metadata_count = reader.read_u8("metadata_count")?;
    let mut metadata = Vec::with_capacity(metadata_count as usize);
    for _ in 0..metadata_count {
        let m = DecodedMetadata::read_record(&mut reader)?;
        trace!(id = %m.id, key = %m.key, "Read metadata");
        metadata.push(m);
    }

    let total_size = reader.read_u64_be("total_size")?;
    let consumed = reader.offset();
    if reader.remaining() > 0 {
        debug!(trailing = reader.remaining(), "Ignoring bytes after total_size");
    }

    debug!(
        version = tag,
        containers = containers.len(),
        metadata = metadata.len(),
        total_size,
        "Decoded LSF stream"
    );
    Ok(Stream { version, containers, metadata, total_size, consumed })
}

/// [`decode`] followed by [`Stream::verify`].
pub fn decode_verified(bytes: &[u8]) -> Result<Stream, VerifyError> {
    let stream = decode(bytes)?;
    stream.verify()?;
    Ok(stream)
}

impl Stream {
    /// First container whose stored checksum differs from a fresh SHA-512
    /// of its MIME label and sound data.
    pub fn verify_checksums(&self) -> Result<(), IntegrityError> {
        match self.containers.iter().position(|c| !c.verify_checksum()) {
            Some(index) => Err(IntegrityError::ChecksumMismatch {
                index,
                id: self.containers[index].id,
            }),
            None => Ok(()),
        }
    }

    /// `total_size` must equal the number of bytes the stream occupied.
    pub fn verify_size(&self) -> Result<(), IntegrityError> {
        if self.total_size != self.consumed {
            return Err(IntegrityError::SizeMismatch {
                declared: self.total_size,
                actual:   self.consumed,
            });
        }
        Ok(())
    }

    pub fn verify(&self) -> Result<(), IntegrityError> {
        self.verify_size()?;
        self.verify_checksums()
    }

    pub fn container(&self, id: &Identifier) -> Option<&DecodedContainer> {
        self.containers.iter().find(|c| &c.id == id)
    }

    /// Metadata records bound to `container_id`, in stream order.
    pub fn metadata_for<'a>(&'a self, container_id: &Identifier) -> impl Iterator<Item = &'a DecodedMetadata> + 'a {
        let container_id = *container_id;
        self.metadata.iter().filter(move |m| m.id == container_id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

//! Key/value metadata records.
//!
//! Each record is 216 bytes on the wire:
//!
//! ```text
//! [ id (16 B) | type (100 B, zero-padded) | value (100 B, zero-padded) ]
//! ```
//!
//! The id normally repeats the id of the container the tag describes; that
//! is how a tag is bound to its asset.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::id::{IdSource, Identifier, ID_LEN};
use crate::stream::error::{DecodeError, EncodeError};
use crate::stream::fields::{write_padded, FieldReader};

pub const META_FIELD_LEN: usize = 100;
pub const METADATA_RECORD_LEN: usize = ID_LEN + 2 * META_FIELD_LEN;

/// A tag to be encoded.  `key` is the record's `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// `None` draws a fresh identifier from the encoder's [`IdSource`].
    #[serde(default)]
    pub id:    Option<Identifier>,
    #[serde(rename = "type")]
    pub key:   String,
    pub value: String,
}

impl MetadataRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id:    None,
            key:   key.into(),
            value: value.into(),
        }
    }

    pub fn with_id(id: Identifier, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id:    Some(id),
            key:   key.into(),
            value: value.into(),
        }
    }

    pub fn validate(&self, index: usize) -> Result<(), EncodeError> {
        for (field, text) in [("type", &self.key), ("value", &self.value)] {
            if text.len() > META_FIELD_LEN {
                return Err(EncodeError::FieldTooLarge {
                    field,
                    index,
                    max:    META_FIELD_LEN,
                    actual: text.len(),
                });
            }
            if text.ends_with('\0') {
                return Err(EncodeError::TrailingNul { field, index });
            }
        }
        Ok(())
    }

    /// The id this record will be written with.
    pub fn resolve_id(&self, ids: &mut dyn IdSource) -> Identifier {
        self.id.unwrap_or_else(|| ids.next_id())
    }

    pub fn write_record<W: Write>(&self, mut writer: W, id: Identifier) -> io::Result<()> {
        writer.write_all(id.as_bytes())?;
        write_padded(&mut writer, self.key.as_bytes(), META_FIELD_LEN)?;
        write_padded(&mut writer, self.value.as_bytes(), META_FIELD_LEN)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedMetadata {
    pub id:    Identifier,
    #[serde(rename = "type")]
    pub key:   String,
    pub value: String,
}

impl DecodedMetadata {
    pub fn read_record(reader: &mut FieldReader<'_>) -> Result<Self, DecodeError> {
        let id = Identifier::from_bytes(reader.read_array::<ID_LEN>("metadata.id")?);
        let key = reader.read_text("metadata.type", META_FIELD_LEN)?;
        let value = reader.read_text("metadata.value", META_FIELD_LEN)?;
        Ok(Self { id, key, value })
    }
}

impl From<DecodedMetadata> for MetadataRecord {
    fn from(d: DecodedMetadata) -> Self {
        MetadataRecord::with_id(d.id, d.key, d.value)
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};
use std::io::{self, Write};

use crate::id::{Identifier, ID_LEN};
use crate::stream::error::{DecodeError, EncodeError};
use crate::stream::fields::{write_padded, FieldReader};

pub const CHECKSUM_LEN: usize = 64;
pub const MIMETYPE_LEN: usize = 20;
pub const MAX_SOUND_DATA: usize = u8::MAX as usize;
/// Bytes of a container record before its variable-length sound data.
pub const CONTAINER_FIXED_LEN: usize = ID_LEN + CHECKSUM_LEN + MIMETYPE_LEN + 1;

pub type Checksum = [u8; CHECKSUM_LEN];

/// SHA-512 over the unpadded MIME label followed by the raw sound data.
pub fn compute_checksum(mimetype: &[u8], sound_data: &[u8]) -> Checksum {
    let mut hasher = Sha512::new();
    hasher.update(mimetype);
    hasher.update(sound_data);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest);
    out
}

// ── Container (encode side) ───────────────────────────────────────────────────

/// One audio asset to be encoded.  The checksum is never stored here; it is
/// derived from `mimetype` and `sound_data` every time the record is written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Container {
    pub id:         Identifier,
    pub mimetype:   String,
    pub sound_data: Vec<u8>,
}

impl Container {
    pub fn new(id: Identifier, mimetype: impl Into<String>, sound_data: Vec<u8>) -> Self {
        Self {
            id,
            mimetype:   mimetype.into(),
            sound_data,
        }
    }

    /// `index` is the record's position, reported back in the error.
    pub fn validate(&self, index: usize) -> Result<(), EncodeError> {
        let mime_len = self.mimetype.len();
        if mime_len > MIMETYPE_LEN {
            return Err(EncodeError::FieldTooLarge {
                field:  "mimetype",
                index,
                max:    MIMETYPE_LEN,
                actual: mime_len,
            });
        }
        if self.mimetype.ends_with('\0') {
            return Err(EncodeError::TrailingNul { field: "mimetype", index });
        }
        if self.sound_data.len() > MAX_SOUND_DATA {
            return Err(EncodeError::OversizedPayload {
                index,
                max:    MAX_SOUND_DATA,
                actual: self.sound_data.len(),
            });
        }
        Ok(())
    }

    pub fn checksum(&self) -> Checksum {
        compute_checksum(self.mimetype.as_bytes(), &self.sound_data)
    }

    pub fn encoded_len(&self) -> usize {
        CONTAINER_FIXED_LEN + self.sound_data.len()
    }

    /// Emit `id | checksum | mimetype (20 B, zero-padded) | len (1 B) | sound_data`.
    ///
    /// Must only be called on a record that passed [`validate`](Self::validate).
    pub fn write_record<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let len = u8::try_from(self.sound_data.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "sound data exceeds 255 bytes"))?;
        writer.write_all(self.id.as_bytes())?;
        writer.write_all(&self.checksum())?;
        write_padded(&mut writer, self.mimetype.as_bytes(), MIMETYPE_LEN)?;
        writer.write_all(&[len])?;
        writer.write_all(&self.sound_data)?;
        Ok(())
    }
}

// ── DecodedContainer (decode side) ────────────────────────────────────────────

/// A container as read back from a stream.  The stored checksum is exposed
/// as-is; [`verify_checksum`](Self::verify_checksum) recomputes it on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedContainer {
    pub id:         Identifier,
    #[serde(with = "checksum_hex")]
    pub checksum:   Checksum,
    pub mimetype:   String,
    pub sound_data: Vec<u8>,
}

impl DecodedContainer {
    pub fn read_record(reader: &mut FieldReader<'_>) -> Result<Self, DecodeError> {
        let id = Identifier::from_bytes(reader.read_array::<ID_LEN>("container.id")?);
        let checksum = reader.read_array::<CHECKSUM_LEN>("container.checksum")?;
        let mimetype = reader.read_text("container.mimetype", MIMETYPE_LEN)?;
        let len = reader.read_u8("container.sound_data_length")? as usize;
        let sound_data = reader.read_declared("container.sound_data", len)?;
        Ok(Self { id, checksum, mimetype, sound_data })
    }

    pub fn expected_checksum(&self) -> Checksum {
        compute_checksum(self.mimetype.as_bytes(), &self.sound_data)
    }

    pub fn verify_checksum(&self) -> bool {
        self.expected_checksum() == self.checksum
    }

    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }
}

impl From<DecodedContainer> for Container {
    fn from(d: DecodedContainer) -> Self {
        Container {
            id:         d.id,
            mimetype:   d.mimetype,
            sound_data: d.sound_data,
        }
    }
}

mod checksum_hex {
    use serde::de::Error;

    use super::{Checksum, Deserialize, Deserializer, Serializer, CHECKSUM_LEN};

    pub fn serialize<S: Serializer>(checksum: &Checksum, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(checksum))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Checksum, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut out = [0u8; CHECKSUM_LEN];
        hex::decode_to_slice(&s, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}

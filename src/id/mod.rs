//! 128-bit record identifiers and the identifier source collaborator.
//!
//! On the wire an identifier is 16 raw bytes.  Everywhere else (decoded
//! records, `Display`, JSON dumps) it is 32 lowercase hex characters with no
//! separators.  Parsing accepts the dashed UUID form too; dashes are dropped
//! before decoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const ID_LEN: usize = 16;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdParseError {
    #[error("Identifier must be {expected} hex characters, got {actual}", expected = ID_LEN * 2)]
    InvalidLength { actual: usize },
    #[error("Identifier is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

// ── Identifier ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier([u8; ID_LEN]);

impl Identifier {
    pub const NIL: Identifier = Identifier([0u8; ID_LEN]);

    #[inline]
    pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// 32 lowercase hex characters, no separators.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn parse_hex(s: &str) -> Result<Self, IdParseError> {
        let compact: String = s.chars().filter(|&c| c != '-').collect();
        if compact.len() != ID_LEN * 2 {
            return Err(IdParseError::InvalidLength { actual: compact.len() });
        }
        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(&compact, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<Uuid> for Identifier {
    fn from(u: Uuid) -> Self {
        Self(*u.as_bytes())
    }
}

impl From<[u8; ID_LEN]> for Identifier {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Identifier {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse_hex(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identifier::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ── Identifier sources ────────────────────────────────────────────────────────

/// Produces a fresh identifier on demand.
///
/// No ordering or uniqueness guarantee; callers that need uniqueness
/// (the builder) check against what they already hold and ask again.
pub trait IdSource {
    fn next_id(&mut self) -> Identifier;
}

/// Random version-4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&mut self) -> Identifier {
        Identifier::from(Uuid::new_v4())
    }
}

impl<F> IdSource for F
where
    F: FnMut() -> Identifier,
{
    fn next_id(&mut self) -> Identifier {
        (*self)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashed_and_compact_forms_parse_alike() {
        let dashed: Identifier = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        let compact: Identifier = "550e8400e29b41d4a716446655440000".parse().unwrap();
        assert_eq!(dashed, compact);
        assert_eq!(compact.to_string(), "550e8400e29b41d4a716446655440000");
        assert_eq!(compact.as_bytes()[0], 0x55);
    }

    #[test]
    fn rejects_wrong_length_and_bad_hex() {
        assert_eq!(
            "abcd".parse::<Identifier>(),
            Err(IdParseError::InvalidLength { actual: 4 })
        );
        assert!(matches!(
            "zz0e8400e29b41d4a716446655440000".parse::<Identifier>(),
            Err(IdParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn uuid_source_yields_distinct_values() {
        let mut src = UuidSource;
        assert_ne!(src.next_id(), src.next_id());
    }
}

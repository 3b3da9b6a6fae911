//! Stream framing: the signature/version preamble and the 8-byte trailer.
//!
//! ```text
//! [ "lsf" (3 B) | version (1 B) | container_count (1 B) ] ... [ total_size (8 B, BE) ]
//! ```
//!
//! The container records follow `container_count`; the metadata count and
//! records follow the containers.  `total_size` counts every byte of the
//! stream, including the trailer itself.

use byteorder::{BigEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

pub const SIGNATURE: &[u8; 3] = b"lsf";
pub const SIGNATURE_LEN: usize = 3;
/// Byte length of the trailing `total_size` field.
pub const TOTAL_SIZE_LEN: usize = 8;
/// Upper bound for both the container and the metadata count.
pub const MAX_RECORDS: usize = u8::MAX as usize;

/// Raised when a version tag or name is not one this build knows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized version: {0}")]
pub struct UnknownVersion(pub String);

// ── Version ───────────────────────────────────────────────────────────────────

/// Layout revision tag written into byte 3 of every stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Version {
    #[default]
    V0 = 0,
    V1 = 1,
}

impl Version {
    pub const ALL: [Version; 2] = [Version::V0, Version::V1];

    /// The lowest enumerated version; what a fresh builder encodes with.
    pub const LOWEST: Version = Version::V0;

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Version::V0 => "v0",
            Version::V1 => "v1",
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Version::V0),
            1 => Some(Version::V1),
            _ => None,
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "v0" => Some(Version::V0),
            "v1" => Some(Version::V1),
            _    => None,
        }
    }
}

impl TryFrom<u8> for Version {
    type Error = UnknownVersion;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Version::from_tag(tag).ok_or_else(|| UnknownVersion(tag.to_string()))
    }
}

impl From<Version> for u8 {
    fn from(v: Version) -> u8 {
        v.tag()
    }
}

impl FromStr for Version {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::from_name(s).ok_or_else(|| UnknownVersion(s.to_owned()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Preamble ──────────────────────────────────────────────────────────────────

/// Write signature and version.  The container count is written by the
/// caller, since it sits between the preamble and the records it counts.
pub fn write_preamble<W: Write>(mut writer: W, version: Version) -> io::Result<()> {
    writer.write_all(SIGNATURE)?;
    writer.write_u8(version.tag())?;
    Ok(())
}

// ── Trailer ───────────────────────────────────────────────────────────────────

/// Overwrite the final 8 bytes of `buf` with its own length, big-endian.
///
/// `buf` must already end in the 8-byte placeholder.
pub fn patch_total_size(buf: &mut [u8]) -> io::Result<u64> {
    let total = buf.len() as u64;
    let start = buf
        .len()
        .checked_sub(TOTAL_SIZE_LEN)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "buffer shorter than size trailer"))?;
    let mut tail = &mut buf[start..];
    tail.write_u64::<BigEndian>(total)?;
    Ok(total)
}

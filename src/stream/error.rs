use std::io;
use thiserror::Error;

use crate::id::Identifier;

/// Validation failures raised before any output is produced.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Invalid version tag: {0}")]
    InvalidVersion(u8),
    #[error("{field} of record {index} is {actual} bytes, limit is {max}")]
    FieldTooLarge {
        field:  &'static str,
        index:  usize,
        max:    usize,
        actual: usize,
    },
    /// Trailing NULs are indistinguishable from field padding on the wire.
    #[error("{field} of record {index} ends in a NUL byte")]
    TrailingNul { field: &'static str, index: usize },
    #[error("Sound data of container {index} is {actual} bytes, limit is {max}")]
    OversizedPayload { index: usize, max: usize, actual: usize },
    #[error("Too many {kind} records: {actual} (max {max})")]
    TooManyRecords { kind: &'static str, max: usize, actual: usize },
    /// Only reachable through a bug in record assembly; all writes go to
    /// an in-memory buffer.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Structural failures; decoding stops at the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Signature mismatch: expected \"lsf\", found {found:02x?}")]
    SignatureMismatch { found: Vec<u8> },
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("Truncated input reading {field} at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedInput {
        field:     &'static str,
        offset:    u64,
        needed:    usize,
        available: usize,
    },
    #[error("Malformed stream at {field} (offset {offset}): {reason}")]
    MalformedStream {
        field:  &'static str,
        offset: u64,
        reason: String,
    },
}

/// Integrity failures reported by the explicit verification operations.
/// A stream that fails these still decoded successfully.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Checksum mismatch in container {index} ({id})")]
    ChecksumMismatch { index: usize, id: Identifier },
    #[error("Size mismatch: total_size declares {declared} bytes, stream is {actual}")]
    SizeMismatch { declared: u64, actual: u64 },
}

/// Any failure of [`decode_verified`](super::decode_verified).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

//! Fixed-width field primitives shared by the record codecs.
//!
//! Writing goes straight to any `io::Write`.  Reading goes through
//! [`FieldReader`], a bounds-checked cursor over the input slice that turns
//! every short read into a [`DecodeError`] naming the field and offset.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Cursor, Read, Write};

use super::error::DecodeError;

/// Write `bytes` right-padded with zeros to exactly `width` bytes.
///
/// Callers validate lengths first; an over-long value here is a bug and
/// surfaces as `InvalidInput` rather than a silently truncated field.
pub fn write_padded<W: Write>(mut writer: W, bytes: &[u8], width: usize) -> io::Result<()> {
    if bytes.len() > width {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} bytes do not fit a {}-byte field", bytes.len(), width),
        ));
    }
    writer.write_all(bytes)?;
    writer.write_all(&vec![0u8; width - bytes.len()])?;
    Ok(())
}

/// Drop trailing zero bytes.
pub fn strip_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

// ── FieldReader ───────────────────────────────────────────────────────────────

pub struct FieldReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> FieldReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(input) }
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.cursor.position()
    }

    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn truncated(&self, field: &'static str, needed: usize) -> DecodeError {
        DecodeError::TruncatedInput {
            field,
            offset: self.offset(),
            needed,
            available: self.remaining(),
        }
    }

    fn ensure(&self, field: &'static str, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(self.truncated(field, needed));
        }
        Ok(())
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        self.ensure(field, 1)?;
        self.cursor.read_u8().map_err(|_| self.truncated(field, 1))
    }

    pub fn read_u64_be(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        self.ensure(field, 8)?;
        self.cursor
            .read_u64::<BigEndian>()
            .map_err(|_| self.truncated(field, 8))
    }

    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        self.ensure(field, N)?;
        let mut out = [0u8; N];
        self.cursor
            .read_exact(&mut out)
            .map_err(|_| self.truncated(field, N))?;
        Ok(out)
    }

    /// Read a length-prefixed payload whose length was declared by an
    /// earlier field.  A declaration that overruns the input is malformed,
    /// not merely truncated.
    pub fn read_declared(&mut self, field: &'static str, len: usize) -> Result<Vec<u8>, DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::MalformedStream {
                field,
                offset: self.offset(),
                reason: format!(
                    "declared length {} exceeds {} remaining bytes",
                    len,
                    self.remaining()
                ),
            });
        }
        let mut out = vec![0u8; len];
        self.cursor
            .read_exact(&mut out)
            .map_err(|_| self.truncated(field, len))?;
        Ok(out)
    }

    /// Read a zero-padded text field of `width` bytes.
    pub fn read_text(&mut self, field: &'static str, width: usize) -> Result<String, DecodeError> {
        self.ensure(field, width)?;
        let offset = self.offset();
        let mut raw = vec![0u8; width];
        self.cursor
            .read_exact(&mut raw)
            .map_err(|_| self.truncated(field, width))?;
        let text = strip_padding(&raw).to_vec();
        String::from_utf8(text).map_err(|e| DecodeError::MalformedStream {
            field,
            offset,
            reason: format!("invalid UTF-8: {e}"),
        })
    }
}

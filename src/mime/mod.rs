//! MIME label detection for sound payloads.
//!
//! The format only needs a short text label per container; where it comes
//! from is up to the caller.  [`MimeDetector`] is the seam, [`MagicSniffer`]
//! the built-in implementation.  Every label a detector returns must encode
//! to at most [`MIMETYPE_LEN`](crate::container::MIMETYPE_LEN) bytes, or the
//! encoder will reject the container.

/// Label used when nothing more specific is recognised.
pub const FALLBACK_MIME: &str = "audio/basic";

pub trait MimeDetector {
    fn detect(&self, sound_data: &[u8]) -> String;
}

impl<F> MimeDetector for F
where
    F: Fn(&[u8]) -> String,
{
    fn detect(&self, sound_data: &[u8]) -> String {
        self(sound_data)
    }
}

/// Recognises common audio containers by their leading magic bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl MagicSniffer {
    pub fn sniff(data: &[u8]) -> &'static str {
        match data {
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => "audio/wav",
            [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', b'F' | b'C', ..] => "audio/aiff",
            [b'f', b'L', b'a', b'C', ..] => "audio/flac",
            [b'O', b'g', b'g', b'S', ..] => "audio/ogg",
            [b'I', b'D', b'3', ..] => "audio/mpeg",
            // MPEG audio frame sync: 11 set bits.
            [0xFF, b, ..] if b & 0xE0 == 0xE0 => "audio/mpeg",
            [b'.', b's', b'n', b'd', ..] => "audio/basic",
            _ => FALLBACK_MIME,
        }
    }
}

impl MimeDetector for MagicSniffer {
    fn detect(&self, sound_data: &[u8]) -> String {
        Self::sniff(sound_data).to_owned()
    }
}

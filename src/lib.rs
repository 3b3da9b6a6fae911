//! Reader and writer for LSF, a small fixed-layout container bundling audio
//! payloads (each with a SHA-512 checksum and a MIME label) with key/value
//! metadata in a single byte stream.

pub mod header;
pub mod id;
pub mod container;
pub mod metadata;
pub mod mime;
pub mod stream;
pub mod builder;

pub use header::{Version, SIGNATURE};
pub use id::{IdSource, Identifier, UuidSource};
pub use container::{Container, DecodedContainer};
pub use metadata::{DecodedMetadata, MetadataRecord};
pub use mime::{MagicSniffer, MimeDetector};
pub use stream::{
    decode, decode_verified, encode, encode_tagged, encode_with,
    DecodeError, EncodeError, IntegrityError, Stream, VerifyError,
};
pub use builder::{BuildError, BuildOptions, LsfBuilder};

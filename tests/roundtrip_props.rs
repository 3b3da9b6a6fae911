use lsf::container::compute_checksum;
use lsf::{decode, encode, Container, DecodeError, Identifier, MetadataRecord, Version};
use proptest::prelude::*;

fn container_strategy() -> impl Strategy<Value = Container> {
    (
        any::<[u8; 16]>(),
        // At most 5 chars of up to 4 bytes each: always within 20 bytes.
        "\\PC{0,5}",
        proptest::collection::vec(any::<u8>(), 0..=255),
    )
        .prop_map(|(id, mime, data)| Container::new(Identifier::from_bytes(id), mime, data))
}

fn metadata_strategy() -> impl Strategy<Value = MetadataRecord> {
    (any::<[u8; 16]>(), "\\PC{0,25}", "\\PC{0,25}")
        .prop_map(|(id, key, value)| MetadataRecord::with_id(Identifier::from_bytes(id), key, value))
}

fn version_strategy() -> impl Strategy<Value = Version> {
    prop_oneof![Just(Version::V0), Just(Version::V1)]
}

proptest! {
    #[test]
    fn roundtrip_preserves_every_field(
        containers in proptest::collection::vec(container_strategy(), 0..4),
        metadata in proptest::collection::vec(metadata_strategy(), 0..4),
        version in version_strategy(),
    ) {
        let bytes = encode(&containers, &metadata, version).unwrap();
        let stream = decode(&bytes).unwrap();

        prop_assert_eq!(stream.version, version);
        prop_assert_eq!(stream.containers.len(), containers.len());
        for (orig, got) in containers.iter().zip(&stream.containers) {
            prop_assert_eq!(got.id.to_hex(), orig.id.to_hex());
            prop_assert_eq!(&got.mimetype, &orig.mimetype);
            prop_assert_eq!(&got.sound_data, &orig.sound_data);
        }
        prop_assert_eq!(stream.metadata.len(), metadata.len());
        for (orig, got) in metadata.iter().zip(&stream.metadata) {
            prop_assert_eq!(Some(got.id), orig.id);
            prop_assert_eq!(&got.key, &orig.key);
            prop_assert_eq!(&got.value, &orig.value);
        }
    }

    #[test]
    fn checksums_and_size_account_correctly(
        containers in proptest::collection::vec(container_strategy(), 0..4),
        metadata in proptest::collection::vec(metadata_strategy(), 0..4),
    ) {
        let bytes = encode(&containers, &metadata, Version::V0).unwrap();
        let stream = decode(&bytes).unwrap();

        prop_assert_eq!(stream.total_size, bytes.len() as u64);
        for c in &stream.containers {
            prop_assert_eq!(c.checksum, compute_checksum(c.mimetype.as_bytes(), &c.sound_data));
        }
        prop_assert!(stream.verify().is_ok());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_prefix_is_rejected(
        containers in proptest::collection::vec(container_strategy(), 1..3),
        metadata in proptest::collection::vec(metadata_strategy(), 0..3),
    ) {
        let bytes = encode(&containers, &metadata, Version::V0).unwrap();
        for len in 0..bytes.len() {
            let rejected = matches!(
                decode(&bytes[..len]),
                Err(DecodeError::TruncatedInput { .. }) | Err(DecodeError::MalformedStream { .. })
            );
            prop_assert!(rejected, "prefix of {} bytes was not rejected", len);
        }
    }
}

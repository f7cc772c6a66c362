//! Integer-keyed map bound to a fixed handle in a named context

use crate::common::*;
use indexmap::IndexMap;

fn sample_map() -> IndexMap<i32, String> {
    let mut map = IndexMap::new();
    map.insert(1, "a".to_string());
    map.insert(2, "b".to_string());
    map
}

fn scenario_codec() -> Codec {
    let registry = builtin_registry();
    registry
        .register_builtin_with_handle::<IndexMap<i32, String>>(100, "default")
        .unwrap();
    codec_for(&registry)
}

#[test]
fn map_wire_bytes_follow_insertion_order() {
    let bytes = scenario_codec().to_buffer(&sample_map(), "default").unwrap();

    let mut expected = vec![100, 0, 2, 0, 0, 0];
    for (key, value) in [(1i32, b'a'), (2, b'b')] {
        expected.extend_from_slice(&handles::I32.to_le_bytes());
        expected.extend_from_slice(&key.to_le_bytes());
        expected.extend_from_slice(&handles::STRING.to_le_bytes());
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.push(value);
    }
    assert_eq!(bytes, expected);
}

#[test]
fn map_roundtrips_in_its_context() {
    let codec = scenario_codec();
    let bytes = codec.to_buffer(&sample_map(), "default").unwrap();
    let back: IndexMap<i32, String> = codec.from_buffer_as(&bytes, "default").unwrap();
    assert_eq!(back, sample_map());
    assert_eq!(back.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn map_is_unknown_in_an_empty_context() {
    let codec = scenario_codec();
    let bytes = codec.to_buffer(&sample_map(), "default").unwrap();

    for context in ["", "empty"] {
        let err = codec.from_buffer(&bytes, context).unwrap_err();
        assert!(
            matches!(err, CodecError::UnknownHandle { handle: 100, .. }),
            "context {:?}: {}",
            context,
            err
        );
    }
}

//! Round trips through the public codec for every built-in shape

use crate::common::*;
use bytes::Bytes;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use compactwire::{ObjectList, ObjectMap};
use indexmap::IndexMap;
use proptest::prelude::*;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::io::Cursor;
use uuid::Uuid;

fn roundtrip<T: Any + Debug + PartialEq>(codec: &Codec, value: &T) {
    let bytes = codec.to_buffer(value, "").unwrap();
    let back: T = codec.from_buffer_as(&bytes, "").unwrap();
    assert_eq!(&back, value);
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn primitives_roundtrip_with_intrinsic_handles() {
    let codec = builtin_codec();
    roundtrip(&codec, &true);
    roundtrip(&codec, &-5i8);
    roundtrip(&codec, &250u8);
    roundtrip(&codec, &i16::MIN);
    roundtrip(&codec, &u16::MAX);
    roundtrip(&codec, &-123_456i32);
    roundtrip(&codec, &u32::MAX);
    roundtrip(&codec, &i64::MIN);
    roundtrip(&codec, &u64::MAX);
    roundtrip(&codec, &1.5f32);
    roundtrip(&codec, &-2.25f64);
    roundtrip(&codec, &Decimal::new(-123_456_789, 4).unwrap());
    roundtrip(&codec, &"héllo".to_string());
    roundtrip(&codec, &String::new());
    roundtrip(&codec, &Bytes::from_static(b"\x00\x01\xfe"));
    roundtrip(&codec, &Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef));
    roundtrip(&codec, &Duration::milliseconds(-90_061_001));
}

#[test]
fn timestamps_roundtrip() {
    let codec = builtin_codec();
    let naive = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_micro_opt(13, 45, 7, 123_400)
        .unwrap();
    roundtrip(&codec, &naive);

    let offset: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339("2023-11-05T08:30:00.5-05:00").unwrap();
    roundtrip(&codec, &offset);
}

#[test]
fn primitive_frame_is_handle_then_body() {
    let codec = builtin_codec();
    let bytes = codec.to_buffer(&"ab".to_string(), "").unwrap();
    assert_eq!(bytes, vec![handles::STRING as u8, 0, 2, 0, 0, 0, b'a', b'b']);
}

#[test]
fn null_roundtrips_as_null() {
    let codec = builtin_codec();
    let bytes = codec.to_buffer(&Null, "").unwrap();
    let back = codec.from_buffer(&bytes, "").unwrap();
    assert!(back.is::<Null>());
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn typed_collections_roundtrip() {
    let registry = builtin_registry();
    registry.register_builtin::<Vec<i32>>("").unwrap();
    registry.register_builtin::<Vec<String>>("").unwrap();
    registry.register_builtin::<Box<[u64]>>("").unwrap();
    registry.register_builtin::<HashMap<String, i64>>("").unwrap();
    registry.register_builtin::<BTreeMap<u8, String>>("").unwrap();
    let codec = codec_for(&registry);

    roundtrip(&codec, &vec![1i32, -2, 3]);
    roundtrip(&codec, &Vec::<i32>::new());
    roundtrip(&codec, &vec!["x".to_string(), String::new()]);
    roundtrip(&codec, &vec![7u64, 8].into_boxed_slice());

    let mut hash = HashMap::new();
    hash.insert("a".to_string(), 1i64);
    hash.insert("b".to_string(), -1i64);
    roundtrip(&codec, &hash);

    let mut tree = BTreeMap::new();
    tree.insert(2u8, "two".to_string());
    tree.insert(1u8, "one".to_string());
    roundtrip(&codec, &tree);
}

#[test]
fn list_elements_carry_frames() {
    let registry = builtin_registry();
    let binding = registry.register_builtin::<Vec<u8>>("").unwrap();
    let codec = codec_for(&registry);

    let bytes = codec.to_buffer(&vec![9u8], "").unwrap();
    let mut expected = binding.handle().to_le_bytes().to_vec();
    expected.extend_from_slice(&1i32.to_le_bytes());
    expected.extend_from_slice(&[handles::U8 as u8, 0, 9]);
    assert_eq!(bytes, expected);
}

#[test]
fn nested_collections_roundtrip() {
    let registry = builtin_registry();
    registry.register_builtin::<Vec<i32>>("").unwrap();
    registry.register_builtin::<Vec<Vec<i32>>>("").unwrap();
    registry.register_builtin::<IndexMap<String, Vec<i32>>>("").unwrap();
    let codec = codec_for(&registry);

    roundtrip(&codec, &vec![vec![1, 2], vec![], vec![3]]);

    let mut map = IndexMap::new();
    map.insert("evens".to_string(), vec![2, 4]);
    map.insert("odds".to_string(), vec![1, 3, 5]);
    roundtrip(&codec, &map);
}

#[test]
fn object_list_holds_mixed_types() {
    let codec = builtin_codec();
    let mut list = ObjectList::new();
    list.push(1i32);
    list.push("two".to_string());
    list.push(Null);
    list.push(3.0f64);

    let bytes = codec.to_buffer(&list, "").unwrap();
    let back: ObjectList = codec.from_buffer_as(&bytes, "").unwrap();
    assert_eq!(back.len(), 4);
    assert_eq!(back.get::<i32>(0), Some(&1));
    assert_eq!(back.get::<String>(1).map(String::as_str), Some("two"));
    assert!(back.get::<Null>(2).is_some());
    assert_eq!(back.get::<f64>(3), Some(&3.0));
}

#[test]
fn object_map_holds_mixed_types() {
    let codec = builtin_codec();
    let mut map = ObjectMap::new();
    map.insert("name".to_string(), "widget".to_string());
    map.insert(7i32, true);

    let bytes = codec.to_buffer(&map, "").unwrap();
    let back: ObjectMap = codec.from_buffer_as(&bytes, "").unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(
        back.get::<String, String>(&"name".to_string()).map(String::as_str),
        Some("widget")
    );
    assert_eq!(back.get::<i32, bool>(&7), Some(&true));
}

#[test]
fn list_element_of_wrong_type_is_type_mismatch() {
    let registry = builtin_registry();
    registry.register_builtin::<Vec<i32>>("").unwrap();
    registry.register_builtin::<Vec<u8>>("").unwrap();
    let codec = codec_for(&registry);

    let list_handle = registry
        .resolve_strict(std::any::TypeId::of::<Vec<i32>>(), "")
        .unwrap()
        .handle();
    let mut bytes = list_handle.to_le_bytes().to_vec();
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&[handles::U8 as u8, 0, 1]);

    let err = codec.from_buffer(&bytes, "").unwrap_err();
    assert!(matches!(err, CodecError::TypeMismatch { .. }));
}

// ============================================================================
// Enums and self-describing types
// ============================================================================

#[test]
fn enum_roundtrips_as_repr() {
    let registry = builtin_registry();
    registry.register_enum::<Side>(200, "").unwrap();
    let codec = codec_for(&registry);

    let bytes = codec.to_buffer(&Side::Sell, "").unwrap();
    assert_eq!(bytes, vec![200, 0, 1]);
    roundtrip(&codec, &Side::Buy);
}

#[test]
fn enum_rejects_unknown_discriminant() {
    let registry = builtin_registry();
    registry.register_enum::<Side>(200, "").unwrap();
    let codec = codec_for(&registry);

    let err = codec.from_buffer(&[200, 0, 9], "").unwrap_err();
    assert!(matches!(err, CodecError::InvalidData(_)));
}

#[test]
fn self_describing_type_nests_framed_objects() {
    let registry = builtin_registry();
    registry.register_self_describing::<Money>(201, "").unwrap();
    registry.register_builtin::<Vec<Money>>("").unwrap();
    let codec = codec_for(&registry);

    let money = Money {
        currency: "EUR".to_string(),
        amount: Decimal::new(1999, 2).unwrap(),
    };
    roundtrip(&codec, &money);
    roundtrip(&codec, &vec![money.clone(), money]);
}

#[test]
fn skip_advances_past_nested_graph() {
    let registry = builtin_registry();
    registry.register_self_describing::<Money>(201, "").unwrap();
    registry.register_builtin::<IndexMap<String, Money>>("").unwrap();
    let codec = codec_for(&registry);

    let mut map = IndexMap::new();
    map.insert(
        "a".to_string(),
        Money {
            currency: "USD".to_string(),
            amount: Decimal::new(5, 0).unwrap(),
        },
    );
    let mut bytes = codec.to_buffer(&map, "").unwrap();
    bytes.extend(codec.to_buffer(&77i16, "").unwrap());

    let mut cursor = Cursor::new(bytes);
    codec.skip(&mut cursor, "").unwrap();
    assert_eq!(codec.deserialize_as::<i16, _>(&mut cursor, "").unwrap(), 77);
}

#[test]
fn self_describing_skip_does_not_decode_body() {
    let registry = builtin_registry();
    registry.register_self_describing::<Money>(202, "").unwrap();
    let codec = codec_for(&registry);

    let money = Money {
        currency: "ab".to_string(),
        amount: Decimal::new(1, 0).unwrap(),
    };
    let mut bytes = codec.to_buffer(&money, "").unwrap();
    // [handle][len]["ab"]: make the currency invalid UTF-8
    bytes[6] = 0xff;
    bytes[7] = 0xfe;
    assert!(codec.from_buffer(&bytes, "").is_err());

    bytes.extend(codec.to_buffer(&9i32, "").unwrap());
    let mut cursor = Cursor::new(bytes);
    codec.skip(&mut cursor, "").unwrap();
    assert_eq!(codec.deserialize_as::<i32, _>(&mut cursor, "").unwrap(), 9);
}

proptest! {
    #[test]
    fn string_lists_roundtrip(values in proptest::collection::vec(".{0,12}", 0..20)) {
        let registry = builtin_registry();
        registry.register_builtin::<Vec<String>>("").unwrap();
        let codec = codec_for(&registry);

        let bytes = codec.to_buffer(&values, "").unwrap();
        let back: Vec<String> = codec.from_buffer_as(&bytes, "").unwrap();
        prop_assert_eq!(back, values);
    }
}

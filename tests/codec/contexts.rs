//! Cache-context isolation and default-context fallback

use crate::common::*;
use indexmap::IndexMap;

#[test]
fn same_handle_binds_different_types_per_context() {
    let registry = builtin_registry();
    registry.register_enum::<Side>(100, "alpha").unwrap();
    registry.register_self_describing::<Money>(100, "beta").unwrap();
    let codec = codec_for(&registry);

    let side = codec.to_buffer(&Side::Buy, "alpha").unwrap();
    let money = Money {
        currency: "JPY".to_string(),
        amount: Decimal::new(500, 0).unwrap(),
    };
    let money_bytes = codec.to_buffer(&money, "beta").unwrap();
    assert_eq!(&side[..2], &money_bytes[..2]);

    assert_eq!(codec.from_buffer_as::<Side>(&side, "alpha").unwrap(), Side::Buy);
    assert_eq!(codec.from_buffer_as::<Money>(&money_bytes, "beta").unwrap(), money);
}

#[test]
fn type_registered_in_one_context_is_invisible_to_another() {
    let registry = builtin_registry();
    registry.register_enum::<Side>(100, "alpha").unwrap();
    let codec = codec_for(&registry);

    let err = codec.to_buffer(&Side::Sell, "beta").unwrap_err();
    assert!(matches!(err, CodecError::NoSurrogate { .. }));
}

#[test]
fn named_context_overrides_default_binding() {
    let registry = builtin_registry();
    registry.register_enum::<Side>(150, "").unwrap();
    registry.register_enum::<Side>(151, "tenant").unwrap();
    let codec = codec_for(&registry);

    assert_eq!(codec.to_buffer(&Side::Buy, "").unwrap()[0], 150);
    assert_eq!(codec.to_buffer(&Side::Buy, "tenant").unwrap()[0], 151);
    assert_eq!(codec.to_buffer(&Side::Buy, "elsewhere").unwrap()[0], 150);
}

#[test]
fn default_bindings_decode_in_any_context() {
    let registry = builtin_registry();
    registry.register_self_describing::<Money>(160, "").unwrap();
    let codec = codec_for(&registry);

    let money = Money {
        currency: "GBP".to_string(),
        amount: Decimal::new(-1, 1).unwrap(),
    };
    let bytes = codec.to_buffer(&money, "").unwrap();
    assert_eq!(codec.from_buffer_as::<Money>(&bytes, "tenant").unwrap(), money);
}

#[test]
fn literal_default_name_is_its_own_context() {
    let registry = builtin_registry();
    registry
        .register_builtin_with_handle::<IndexMap<i32, String>>(100, "default")
        .unwrap();
    assert!(registry.is_registered::<IndexMap<i32, String>>("default"));
    assert!(!registry.is_registered::<IndexMap<i32, String>>(""));
}

#[test]
fn nested_values_resolve_in_call_context() {
    let registry = builtin_registry();
    registry.register_enum::<Side>(170, "tenant").unwrap();
    registry.register_builtin::<Vec<Side>>("tenant").unwrap();
    let codec = codec_for(&registry);

    let sides = vec![Side::Buy, Side::Sell];
    let bytes = codec.to_buffer(&sides, "tenant").unwrap();
    assert_eq!(codec.from_buffer_as::<Vec<Side>>(&bytes, "tenant").unwrap(), sides);
}

#[test]
fn named_context_cannot_shadow_default_handle() {
    let registry = builtin_registry();
    let err = registry
        .register_enum::<Side>(handles::STRING, "tenant")
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::HandleConflict {
            handle: handles::STRING,
            ..
        }
    ));

    let codec = codec_for(&registry);
    let text = "\u{1}".to_string();
    let bytes = codec.to_buffer(&text, "tenant").unwrap();
    assert_eq!(codec.from_buffer_as::<String>(&bytes, "tenant").unwrap(), text);
}

#[test]
fn default_binding_cannot_take_named_handle() {
    let registry = builtin_registry();
    registry.register_enum::<Side>(180, "tenant").unwrap();
    let err = registry
        .register_self_describing::<Money>(180, "")
        .unwrap_err();
    assert!(matches!(err, CodecError::HandleConflict { handle: 180, .. }));

    let codec = codec_for(&registry);
    let bytes = codec.to_buffer(&Side::Sell, "tenant").unwrap();
    assert_eq!(codec.from_buffer_as::<Side>(&bytes, "tenant").unwrap(), Side::Sell);
}

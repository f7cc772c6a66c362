//! Dynamic record surrogates built from a RecordSchema

use crate::common::*;
use std::sync::Arc;

fn order_codec(portable: bool) -> Codec {
    let registry = builtin_registry();
    registry
        .register_custom(&order_schema(), 600, "orders", 0, ORDER_MEMBERS, portable)
        .unwrap();
    codec_for(&registry)
}

#[test]
fn record_roundtrips_in_both_modes() {
    for portable in [false, true] {
        let codec = order_codec(portable);
        let bytes = codec.to_buffer(&sample_order(), "orders").unwrap();
        let back: Order = codec.from_buffer_as(&bytes, "orders").unwrap();
        assert_eq!(back, sample_order());
    }
}

#[test]
fn absent_optional_member_writes_null_frame() {
    let codec = order_codec(false);
    let order = Order {
        note: None,
        ..sample_order()
    };
    let bytes = codec.to_buffer(&order, "orders").unwrap();
    assert_eq!(&bytes[bytes.len() - 2..], &[0xff, 0xff]);
    assert_eq!(codec.from_buffer_as::<Order>(&bytes, "orders").unwrap(), order);
}

#[test]
fn independent_derivations_encode_identically() {
    let first = order_codec(false);
    let second = order_codec(false);
    let order = sample_order();
    assert_eq!(
        first.to_buffer(&order, "orders").unwrap(),
        second.to_buffer(&order, "orders").unwrap()
    );

    let first = order_codec(true);
    let second = order_codec(true);
    assert_eq!(
        first.to_buffer(&order, "orders").unwrap(),
        second.to_buffer(&order, "orders").unwrap()
    );
}

#[test]
fn portable_reader_ignores_added_members() {
    let writer = builtin_registry();
    writer
        .register_custom(
            &order_v2_schema(),
            600,
            "orders",
            0,
            &["venue", "id", "symbol", "quantity", "note"],
            true,
        )
        .unwrap();
    let newer = OrderV2 {
        id: 7,
        symbol: "XYZ".to_string(),
        quantity: 3,
        note: None,
        venue: "LSE".to_string(),
    };
    let bytes = codec_for(&writer).to_buffer(&newer, "orders").unwrap();

    let back: Order = order_codec(true).from_buffer_as(&bytes, "orders").unwrap();
    assert_eq!(
        back,
        Order {
            id: 7,
            symbol: "XYZ".to_string(),
            quantity: 3,
            note: None,
        }
    );
}

#[test]
fn portable_reader_defaults_missing_members() {
    let bytes = order_codec(true)
        .to_buffer(&sample_order(), "orders")
        .unwrap();

    let reader = builtin_registry();
    reader
        .register_custom(
            &order_v2_schema(),
            600,
            "orders",
            0,
            &["id", "symbol", "quantity", "note", "venue"],
            true,
        )
        .unwrap();
    let back: OrderV2 = codec_for(&reader).from_buffer_as(&bytes, "orders").unwrap();
    assert_eq!(back.id, 42);
    assert_eq!(back.note.as_deref(), Some("rush"));
    assert_eq!(back.venue, "");
}

#[test]
fn non_portable_record_trusts_member_layout() {
    let writer = builtin_registry();
    writer
        .register_custom(&order_v2_schema(), 600, "orders", 0, &["venue", "id"], false)
        .unwrap();
    let bytes = codec_for(&writer)
        .to_buffer(&OrderV2::default(), "orders")
        .unwrap();

    let reader = builtin_registry();
    reader
        .register_custom(&order_schema(), 600, "orders", 0, &["id"], false)
        .unwrap();
    // The empty venue string frame is read as the u64 id
    let back: Order = codec_for(&reader).from_buffer_as(&bytes, "orders").unwrap();
    assert_eq!(back.id, handles::STRING as u64);
}

#[test]
fn records_nest_inside_collections() {
    let registry = builtin_registry();
    registry
        .register_custom(&order_schema(), 600, "", 0, ORDER_MEMBERS, true)
        .unwrap();
    registry.register_builtin::<Vec<Order>>("").unwrap();
    let codec = Codec::new(Arc::clone(&registry));

    let orders = vec![sample_order(), Order::default()];
    let bytes = codec.to_buffer(&orders, "").unwrap();
    assert_eq!(codec.from_buffer_as::<Vec<Order>>(&bytes, "").unwrap(), orders);
}

#[test]
fn undeclared_attribute_is_no_surrogate() {
    let registry = builtin_registry();
    let err = registry
        .register_custom(&order_schema(), 600, "", 0, &["id", "price"], false)
        .unwrap_err();
    assert!(matches!(err, CodecError::NoSurrogate { .. }));
    assert!(!registry.is_registered::<Order>(""));
}

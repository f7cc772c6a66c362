//! Registry rules observed through registration and encoding

use crate::common::*;
use compactwire::{ShapeKind, AUTO_HANDLE_START, NO_SUBTYPE};
use std::any::TypeId;
use std::sync::Arc;
use std::thread;

#[test]
fn builtins_live_in_default_context() {
    let registry = SurrogateRegistry::with_builtins();
    assert_eq!(registry.contexts(), vec![String::new()]);
    assert!(registry.is_registered::<i32>(""));
    assert!(registry.is_registered::<Null>(""));
    assert!(!registry.is_registered::<i32>("tenant"));
    assert!(registry.resolve_for_type(TypeId::of::<i32>(), "tenant").is_some());
}

#[test]
fn empty_registry_still_resolves_null() {
    let codec = Codec::new(Arc::new(SurrogateRegistry::new()));
    let bytes = codec.to_buffer(&Null, "anything").unwrap();
    assert_eq!(bytes, handles::NULL.to_le_bytes().to_vec());
    assert!(codec.from_buffer(&bytes, "anything").unwrap().is::<Null>());
}

#[test]
fn same_registration_twice_is_a_no_op() {
    let registry = SurrogateRegistry::with_builtins();
    let first = registry.register_enum::<Side>(300, "t").unwrap();
    let second = registry.register_enum::<Side>(300, "t").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len("t"), 1);
}

#[test]
fn type_bound_twice_in_context_is_already_registered() {
    let registry = SurrogateRegistry::with_builtins();
    registry.register_enum::<Side>(300, "t").unwrap();
    let err = registry.register_enum::<Side>(301, "t").unwrap_err();
    assert!(matches!(
        err,
        CodecError::AlreadyRegistered {
            existing: 300,
            requested: 301,
            ..
        }
    ));
}

#[test]
fn occupied_handle_is_a_conflict() {
    let registry = SurrogateRegistry::with_builtins();
    registry.register_enum::<Side>(300, "t").unwrap();
    let err = registry
        .register_self_describing::<Money>(300, "t")
        .unwrap_err();
    assert!(matches!(err, CodecError::HandleConflict { handle: 300, .. }));
}

#[test]
fn null_handle_is_reserved() {
    let registry = SurrogateRegistry::new();
    let err = registry.register_enum::<Side>(handles::NULL, "").unwrap_err();
    assert!(matches!(err, CodecError::HandleConflict { .. }));
}

#[test]
fn subtyped_and_unsubtyped_cannot_share_a_handle() {
    let registry = SurrogateRegistry::with_builtins();
    registry
        .register_custom(&order_schema(), 400, "t", 1, ORDER_MEMBERS, false)
        .unwrap();
    let err = registry.register_enum::<Side>(400, "t").unwrap_err();
    assert!(matches!(err, CodecError::HandleConflict { .. }));

    // A default-context unsubtyped binding would shadow the subtyped one
    let err = registry.register_enum::<Side>(400, "").unwrap_err();
    assert!(matches!(err, CodecError::HandleConflict { .. }));

    // Unrelated named contexts stay independent
    registry.register_enum::<Side>(400, "other").unwrap();
}

#[test]
fn automatic_handles_are_distinct() {
    let registry = SurrogateRegistry::with_builtins();
    let a = registry.register_builtin::<Vec<i32>>("").unwrap();
    let b = registry.register_builtin::<Vec<String>>("").unwrap();
    assert!(a.handle() >= AUTO_HANDLE_START);
    assert!(b.handle() >= AUTO_HANDLE_START);
    assert_ne!(a.handle(), b.handle());
    assert_eq!(a.sub_handle(), NO_SUBTYPE);
    assert_eq!(a.surrogate().kind(), ShapeKind::List);
}

#[test]
fn automatic_handles_skip_taken_slots() {
    let registry = SurrogateRegistry::with_builtins();
    registry.register_enum::<Side>(AUTO_HANDLE_START, "").unwrap();
    let binding = registry.register_builtin::<Vec<i32>>("").unwrap();
    assert_eq!(binding.handle(), AUTO_HANDLE_START + 1);
}

#[test]
fn unregister_context_drops_bindings() {
    let registry = SurrogateRegistry::with_builtins();
    registry.register_enum::<Side>(300, "t").unwrap();
    registry.register_self_describing::<Money>(301, "t").unwrap();

    assert_eq!(registry.unregister_context("t").unwrap(), 2);
    assert!(!registry.is_registered::<Side>("t"));
    assert_eq!(registry.unregister_context("t").unwrap(), 0);
    assert!(matches!(
        registry.unregister_context("").unwrap_err(),
        CodecError::InvalidData(_)
    ));
}

#[test]
fn concurrent_registration_and_encoding() {
    let registry = builtin_registry();
    let codec = codec_for(&registry);

    thread::scope(|scope| {
        for worker in 0..8i16 {
            let registry = Arc::clone(&registry);
            let codec = codec.clone();
            scope.spawn(move || {
                let context = format!("tenant-{}", worker);
                registry.register_enum::<Side>(500 + worker, &context).unwrap();
                for _ in 0..100 {
                    let bytes = codec.to_buffer(&Side::Sell, &context).unwrap();
                    assert_eq!(&bytes[..2], &(500 + worker).to_le_bytes());
                    let back: Side = codec.from_buffer_as(&bytes, &context).unwrap();
                    assert_eq!(back, Side::Sell);
                }
            });
        }
    });

    assert_eq!(registry.contexts().len(), 9);
}

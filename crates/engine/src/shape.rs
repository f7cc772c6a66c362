//! Shape classification
//!
//! [`Shape`] maps a Rust type onto one of the built-in surrogate shapes at
//! registration time. Types outside these shapes register through
//! [`WireEnum`](crate::WireEnum), [`CompactSerializable`](crate::CompactSerializable)
//! or a [`RecordSchema`](crate::RecordSchema).

use crate::surrogate::{Null, ShapeKind, Surrogate};
use crate::surrogates::{
    ArraySurrogate, ListSurrogate, MapSurrogate, NullSurrogate, ObjectList, ObjectListSurrogate,
    ObjectMap, ObjectMapSurrogate, PrimitiveSurrogate, VirtualBufferSurrogate,
};
use bytes::Bytes;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use compactwire_core::{handles, Decimal, Primitive, TypeHandle, VirtualBuffer};
use indexmap::IndexMap;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use uuid::Uuid;

/// A type with a built-in surrogate
pub trait Shape: Any + Send + Sync + Sized {
    /// Structural shape
    const KIND: ShapeKind;

    /// Handle bound by `SurrogateRegistry::with_builtins`, if any
    const INTRINSIC_HANDLE: Option<TypeHandle> = None;

    /// Build the surrogate for this type
    fn surrogate() -> Arc<dyn Surrogate>;
}

macro_rules! primitive_shape {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Shape for $ty {
                const KIND: ShapeKind = ShapeKind::Primitive(<$ty as Primitive>::KIND);
                const INTRINSIC_HANDLE: Option<TypeHandle> =
                    Some(<$ty as Primitive>::KIND.intrinsic_handle());

                fn surrogate() -> Arc<dyn Surrogate> {
                    Arc::new(PrimitiveSurrogate::<$ty>::new())
                }
            }
        )*
    };
}

primitive_shape!(
    bool,
    i8,
    u8,
    i16,
    u16,
    i32,
    u32,
    i64,
    u64,
    f32,
    f64,
    Decimal,
    NaiveDateTime,
    DateTime<FixedOffset>,
    Duration,
    Uuid,
    String,
    Bytes,
);

impl Shape for Null {
    const KIND: ShapeKind = ShapeKind::Null;
    const INTRINSIC_HANDLE: Option<TypeHandle> = Some(handles::NULL);

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(NullSurrogate)
    }
}

impl Shape for VirtualBuffer {
    const KIND: ShapeKind = ShapeKind::VirtualBuffer;
    const INTRINSIC_HANDLE: Option<TypeHandle> = Some(handles::VIRTUAL_BUFFER);

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(VirtualBufferSurrogate)
    }
}

impl Shape for ObjectList {
    const KIND: ShapeKind = ShapeKind::ObjectList;
    const INTRINSIC_HANDLE: Option<TypeHandle> = Some(handles::OBJECT_LIST);

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(ObjectListSurrogate)
    }
}

impl Shape for ObjectMap {
    const KIND: ShapeKind = ShapeKind::ObjectMap;
    const INTRINSIC_HANDLE: Option<TypeHandle> = Some(handles::OBJECT_MAP);

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(ObjectMapSurrogate)
    }
}

impl<T: Any + Send + Sync> Shape for Vec<T> {
    const KIND: ShapeKind = ShapeKind::List;

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(ListSurrogate::<T>::new())
    }
}

impl<T: Any + Send + Sync> Shape for Box<[T]> {
    const KIND: ShapeKind = ShapeKind::Array;

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(ArraySurrogate::<T>::new())
    }
}

impl<K, V, S> Shape for HashMap<K, V, S>
where
    K: Eq + Hash + Any + Send + Sync,
    V: Any + Send + Sync,
    S: BuildHasher + Default + Any + Send + Sync,
{
    const KIND: ShapeKind = ShapeKind::Map;

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(MapSurrogate::<Self>::new())
    }
}

impl<K, V> Shape for BTreeMap<K, V>
where
    K: Ord + Any + Send + Sync,
    V: Any + Send + Sync,
{
    const KIND: ShapeKind = ShapeKind::Map;

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(MapSurrogate::<Self>::new())
    }
}

impl<K, V, S> Shape for IndexMap<K, V, S>
where
    K: Eq + Hash + Any + Send + Sync,
    V: Any + Send + Sync,
    S: BuildHasher + Default + Any + Send + Sync,
{
    const KIND: ShapeKind = ShapeKind::Map;

    fn surrogate() -> Arc<dyn Surrogate> {
        Arc::new(MapSurrogate::<Self>::new())
    }
}

//! Surrogate strategy trait
//!
//! A surrogate encodes and decodes values of exactly one source type. It is
//! built once at registration, shared behind an `Arc`, and holds no per-call
//! state: everything a call needs arrives through the [`ObjectWriter`] or
//! [`ObjectReader`] it is handed.
//!
//! ## Shape Classification
//!
//! Every surrogate reports a [`ShapeKind`]. The kind is fixed when the type is
//! classified at registration; encode and decode never re-inspect the type.

use crate::codec::{ObjectReader, ObjectWriter};
use compactwire_core::{CodecError, PrimitiveKind, Result};
use std::any::{Any, TypeId};

/// A decoded value of any registered type
pub type Object = Box<dyn Any + Send + Sync>;

/// The null value, bound to the reserved handle `-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Null;

/// Closed set of structural shapes a surrogate can encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// The null value
    Null,
    /// A value with a dedicated primitive encoding
    Primitive(PrimitiveKind),
    /// Fixed-length sequence (`Box<[T]>`)
    Array,
    /// Growable sequence (`Vec<T>`)
    List,
    /// Heterogeneous sequence of objects
    ObjectList,
    /// Statically typed key/value map
    Map,
    /// Heterogeneous key/value map
    ObjectMap,
    /// Enumeration written as its underlying representation
    Enumeration,
    /// Type that encodes itself
    SelfDescribing,
    /// Record derived from a member schema
    Record,
    /// Chunked virtual buffer
    VirtualBuffer,
}

impl ShapeKind {
    /// Get the kind name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Null => "null",
            ShapeKind::Primitive(kind) => kind.name(),
            ShapeKind::Array => "array",
            ShapeKind::List => "list",
            ShapeKind::ObjectList => "object_list",
            ShapeKind::Map => "map",
            ShapeKind::ObjectMap => "object_map",
            ShapeKind::Enumeration => "enumeration",
            ShapeKind::SelfDescribing => "self_describing",
            ShapeKind::Record => "record",
            ShapeKind::VirtualBuffer => "virtual_buffer",
        }
    }
}

/// Encode/decode strategy for one source type.
///
/// `skip` must consume exactly the bytes `read` would, without building
/// the value.
pub trait Surrogate: Send + Sync {
    /// Type this surrogate encodes
    fn source_type(&self) -> TypeId;

    /// Readable name of the source type
    fn type_name(&self) -> &'static str;

    /// Structural shape
    fn kind(&self) -> ShapeKind;

    /// Write the body of `value`; the frame has already been written
    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()>;

    /// Read a body
    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object>;

    /// Consume a body without decoding it
    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()>;
}

impl std::fmt::Debug for dyn Surrogate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surrogate")
            .field("type_name", &self.type_name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Borrow `value` as `T`, or fail with `TypeMismatch`
pub fn downcast_value<T: Any>(value: &dyn Any) -> Result<&T> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| CodecError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found: format!("{:?}", value.type_id()),
        })
}

/// Unbox a decoded object as `T`, or fail with `TypeMismatch`
pub fn downcast_object<T: Any>(object: Object, found: &str) -> Result<T> {
    object
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| CodecError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found: found.to_string(),
        })
}

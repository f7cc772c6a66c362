//! Object-graph codec engine for compactwire
//!
//! This crate sits on the primitive layer of `compactwire-core`:
//! - [`SurrogateRegistry`]: context-scoped catalog of type handles
//! - [`Codec`]: framing, recursive encode/decode and skip
//! - Built-in surrogates for primitives, collections, maps, enums,
//!   self-describing types and virtual buffers
//! - [`RecordSchema`]: dynamic record surrogates, optionally version tolerant
//!
//! Every call names a cache context. Lookups try that context first and fall
//! back to the default context `""`, which holds the built-in bindings.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod codec;
pub mod context;
pub mod registry;
pub mod shape;
pub mod surrogate;
pub mod surrogates;

pub use builder::{RecordSchema, RecordSurrogate};
pub use codec::{Codec, ObjectReader, ObjectWriter};
pub use context::{CallOptions, SerializationContext};
pub use registry::{Binding, SurrogateRegistry};
pub use shape::Shape;
pub use surrogate::{downcast_object, downcast_value, Null, Object, ShapeKind, Surrogate};
pub use surrogates::{
    ArraySurrogate, CompactSerializable, EnumSurrogate, ListSurrogate, MapSurrogate,
    NullSurrogate, ObjectList, ObjectListSurrogate, ObjectMap, ObjectMapSurrogate,
    PrimitiveSurrogate, SelfDescribingSurrogate, VirtualBufferSurrogate, WireEnum, WireMap,
};

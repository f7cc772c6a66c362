//! Built-in surrogates
//!
//! - `primitive`: every primitive kind plus null
//! - `collections`: arrays, lists, typed maps and heterogeneous object
//!   lists/maps, all written as `[count: i32][framed elements...]`
//! - `enumeration`: enums as their underlying representation
//! - `custom`: types that encode themselves
//! - `buffer`: chunked virtual buffers

mod buffer;
mod collections;
mod custom;
mod enumeration;
mod primitive;

pub use buffer::VirtualBufferSurrogate;
pub use collections::{
    ArraySurrogate, ListSurrogate, MapSurrogate, ObjectList, ObjectListSurrogate, ObjectMap,
    ObjectMapSurrogate, WireMap,
};
pub use custom::{CompactSerializable, SelfDescribingSurrogate};
pub use enumeration::{EnumSurrogate, WireEnum};
pub use primitive::{NullSurrogate, PrimitiveSurrogate};

//! Handle and context types
//!
//! This module defines the identities that appear on the wire:
//! - TypeHandle: primary 16-bit identity of a registered type
//! - SubHandle: secondary identity, `0` meaning "no subtype"
//! - Cache context names, where the empty string is the default namespace
//! - Intrinsic handles for the built-in shapes

/// Primary numeric identity of a registered type within a context
pub type TypeHandle = i16;

/// Secondary identity disambiguating bindings that share a primary handle
pub type SubHandle = i16;

/// Subtype handle meaning "no subtype"
pub const NO_SUBTYPE: SubHandle = 0;

/// Name of the default (global) cache context
pub const DEFAULT_CONTEXT: &str = "";

/// First handle handed out by automatic assignment
pub const AUTO_HANDLE_START: TypeHandle = 16_384;

/// True for the default (global) context
pub fn is_default_context(context: &str) -> bool {
    context == DEFAULT_CONTEXT
}

/// Intrinsic handles of the built-in shapes, bound in the default context.
pub mod handles {
    use super::TypeHandle;

    /// Reserved handle of the null surrogate
    pub const NULL: TypeHandle = -1;
    /// `bool`
    pub const BOOL: TypeHandle = 1;
    /// `i8`
    pub const I8: TypeHandle = 2;
    /// `u8`
    pub const U8: TypeHandle = 3;
    /// `i16`
    pub const I16: TypeHandle = 4;
    /// `u16`
    pub const U16: TypeHandle = 5;
    /// `i32`
    pub const I32: TypeHandle = 6;
    /// `u32`
    pub const U32: TypeHandle = 7;
    /// `i64`
    pub const I64: TypeHandle = 8;
    /// `u64`
    pub const U64: TypeHandle = 9;
    /// `f32`
    pub const F32: TypeHandle = 10;
    /// `f64`
    pub const F64: TypeHandle = 11;
    /// High-precision decimal
    pub const DECIMAL: TypeHandle = 12;
    /// Calendar timestamp
    pub const DATETIME: TypeHandle = 13;
    /// Timestamp with UTC offset
    pub const DATETIME_OFFSET: TypeHandle = 14;
    /// Elapsed-time interval
    pub const TIMESPAN: TypeHandle = 15;
    /// 128-bit unique identifier
    pub const GUID: TypeHandle = 16;
    /// UTF-8 string
    pub const STRING: TypeHandle = 17;
    /// Raw byte buffer
    pub const BYTES: TypeHandle = 18;
    /// Chunked virtual buffer
    pub const VIRTUAL_BUFFER: TypeHandle = 19;
    /// Heterogeneous ordered list
    pub const OBJECT_LIST: TypeHandle = 20;
    /// Heterogeneous key/value map
    pub const OBJECT_MAP: TypeHandle = 21;

    /// True if `handle` is one of the intrinsic handles above
    pub fn is_intrinsic(handle: TypeHandle) -> bool {
        handle == NULL || (BOOL..=OBJECT_MAP).contains(&handle)
    }
}

//! Primitive codec
//!
//! Symmetric low-level read/write contract for fixed-width values,
//! length-prefixed text and raw buffers. All integers are little-endian.
//!
//! ## Wire Formats
//!
//! ```text
//! bool            [u8: 0 | 1]
//! integers/floats [N bytes LE]
//! decimal         [lo: i32][mid: i32][hi: i32][flags: i32]
//! timestamp       [ticks: i64]
//! timestamp+off   [ticks: i64][offset ticks: i64]
//! interval        [ticks: i64]
//! guid            [16 raw bytes]
//! string          [byteLength: i32, -1 = null][UTF-8 bytes]
//! byte buffer     [length: i32, -1 = null][bytes]
//! char buffer     [byteLength: i32][UTF-8 bytes]
//! Option<T>       [present: u8][T if present]
//! ```

mod reader;
pub mod ticks;
mod writer;

pub use reader::{PrimitiveReader, ReadLimits};
pub use writer::PrimitiveWriter;

use crate::decimal::Decimal;
use crate::error::Result;
use crate::types::{handles, TypeHandle};
use bytes::Bytes;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use std::any::Any;
use std::io::{Read, Write};
use uuid::Uuid;

/// Closed set of primitive kinds with a dedicated wire encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `u8`
    U8,
    /// `i16`
    I16,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// [`Decimal`]
    Decimal,
    /// [`NaiveDateTime`]
    DateTime,
    /// [`DateTime<FixedOffset>`]
    DateTimeOffset,
    /// [`Duration`]
    TimeSpan,
    /// [`Uuid`]
    Guid,
    /// [`String`]
    String,
    /// [`Bytes`]
    Bytes,
}

impl PrimitiveKind {
    /// Encoded width for fixed-width kinds
    pub const fn fixed_width(&self) -> Option<usize> {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => Some(1),
            PrimitiveKind::I16 | PrimitiveKind::U16 => Some(2),
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => Some(4),
            PrimitiveKind::I64
            | PrimitiveKind::U64
            | PrimitiveKind::F64
            | PrimitiveKind::DateTime
            | PrimitiveKind::TimeSpan => Some(8),
            PrimitiveKind::Decimal | PrimitiveKind::DateTimeOffset | PrimitiveKind::Guid => {
                Some(16)
            }
            PrimitiveKind::String | PrimitiveKind::Bytes => None,
        }
    }

    /// Intrinsic handle of this kind in the default context
    pub const fn intrinsic_handle(&self) -> TypeHandle {
        match self {
            PrimitiveKind::Bool => handles::BOOL,
            PrimitiveKind::I8 => handles::I8,
            PrimitiveKind::U8 => handles::U8,
            PrimitiveKind::I16 => handles::I16,
            PrimitiveKind::U16 => handles::U16,
            PrimitiveKind::I32 => handles::I32,
            PrimitiveKind::U32 => handles::U32,
            PrimitiveKind::I64 => handles::I64,
            PrimitiveKind::U64 => handles::U64,
            PrimitiveKind::F32 => handles::F32,
            PrimitiveKind::F64 => handles::F64,
            PrimitiveKind::Decimal => handles::DECIMAL,
            PrimitiveKind::DateTime => handles::DATETIME,
            PrimitiveKind::DateTimeOffset => handles::DATETIME_OFFSET,
            PrimitiveKind::TimeSpan => handles::TIMESPAN,
            PrimitiveKind::Guid => handles::GUID,
            PrimitiveKind::String => handles::STRING,
            PrimitiveKind::Bytes => handles::BYTES,
        }
    }

    /// Get the kind name as a string
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::DateTimeOffset => "datetime_offset",
            PrimitiveKind::TimeSpan => "timespan",
            PrimitiveKind::Guid => "guid",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }
}

/// A value with a dedicated primitive wire encoding.
///
/// Implemented for every [`PrimitiveKind`] and for `Option<T>` of any
/// primitive, which writes a presence byte before the value.
pub trait Primitive: Any + Send + Sync + Sized {
    /// Wire kind of this type
    const KIND: PrimitiveKind;

    /// Write this value
    fn write_to<W: Write>(&self, writer: &mut PrimitiveWriter<W>) -> Result<()>;

    /// Read a value
    fn read_from<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<Self>;

    /// Consume exactly the bytes [`Primitive::read_from`] would
    fn skip_in<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<()> {
        match Self::KIND.fixed_width() {
            Some(width) => reader.skip_bytes(width as u64),
            None => Self::read_from(reader).map(drop),
        }
    }
}

macro_rules! fixed_primitive {
    ($ty:ty, $kind:ident, $write:ident, $read:ident) => {
        impl Primitive for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$kind;

            #[inline]
            fn write_to<W: Write>(&self, writer: &mut PrimitiveWriter<W>) -> Result<()> {
                writer.$write(*self)
            }

            #[inline]
            fn read_from<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<Self> {
                reader.$read()
            }
        }
    };
}

fixed_primitive!(bool, Bool, write_bool, read_bool);
fixed_primitive!(i8, I8, write_i8, read_i8);
fixed_primitive!(u8, U8, write_u8, read_u8);
fixed_primitive!(i16, I16, write_i16, read_i16);
fixed_primitive!(u16, U16, write_u16, read_u16);
fixed_primitive!(i32, I32, write_i32, read_i32);
fixed_primitive!(u32, U32, write_u32, read_u32);
fixed_primitive!(i64, I64, write_i64, read_i64);
fixed_primitive!(u64, U64, write_u64, read_u64);
fixed_primitive!(f32, F32, write_f32, read_f32);
fixed_primitive!(f64, F64, write_f64, read_f64);

macro_rules! borrowed_primitive {
    ($ty:ty, $kind:ident, $write:ident, $read:ident) => {
        impl Primitive for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$kind;

            fn write_to<W: Write>(&self, writer: &mut PrimitiveWriter<W>) -> Result<()> {
                writer.$write(self)
            }

            fn read_from<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<Self> {
                reader.$read()
            }
        }
    };
}

borrowed_primitive!(Decimal, Decimal, write_decimal, read_decimal);
borrowed_primitive!(NaiveDateTime, DateTime, write_datetime, read_datetime);
borrowed_primitive!(
    DateTime<FixedOffset>,
    DateTimeOffset,
    write_datetime_offset,
    read_datetime_offset
);
borrowed_primitive!(Duration, TimeSpan, write_timespan, read_timespan);
borrowed_primitive!(Uuid, Guid, write_guid, read_guid);

impl Primitive for String {
    const KIND: PrimitiveKind = PrimitiveKind::String;

    fn write_to<W: Write>(&self, writer: &mut PrimitiveWriter<W>) -> Result<()> {
        writer.write_str(self)
    }

    fn read_from<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<Self> {
        reader.read_str()
    }

    fn skip_in<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<()> {
        reader.skip_length_prefixed()
    }
}

impl Primitive for Bytes {
    const KIND: PrimitiveKind = PrimitiveKind::Bytes;

    fn write_to<W: Write>(&self, writer: &mut PrimitiveWriter<W>) -> Result<()> {
        writer.write_byte_buffer(Some(self.as_ref()))
    }

    fn read_from<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<Self> {
        reader
            .read_byte_buffer()?
            .map(Bytes::from)
            .ok_or_else(|| crate::error::CodecError::invalid("unexpected null byte buffer"))
    }

    fn skip_in<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<()> {
        reader.skip_length_prefixed()
    }
}

impl<T: Primitive> Primitive for Option<T> {
    const KIND: PrimitiveKind = T::KIND;

    fn write_to<W: Write>(&self, writer: &mut PrimitiveWriter<W>) -> Result<()> {
        match self {
            Some(value) => {
                writer.write_bool(true)?;
                value.write_to(writer)
            }
            None => writer.write_bool(false),
        }
    }

    fn read_from<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<Self> {
        if reader.read_bool()? {
            T::read_from(reader).map(Some)
        } else {
            Ok(None)
        }
    }

    fn skip_in<R: Read>(reader: &mut PrimitiveReader<R>) -> Result<()> {
        if reader.read_bool()? {
            T::skip_in(reader)
        } else {
            Ok(())
        }
    }
}

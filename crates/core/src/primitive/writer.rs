//! Primitive writer
//!
//! Every write appends to the underlying sink in call order. The writer adds
//! no buffering of its own.

use super::{ticks, Primitive};
use crate::decimal::Decimal;
use crate::error::{CodecError, Result};
use crate::types::{SubHandle, TypeHandle};
use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use std::any::Any;
use std::io::Write;
use uuid::Uuid;

/// Null sentinel for length-prefixed strings and buffers
pub(crate) const NULL_LENGTH: i32 = -1;

/// Little-endian primitive writer over any sink
#[derive(Debug)]
pub struct PrimitiveWriter<W> {
    inner: W,
}

impl<W: Write> PrimitiveWriter<W> {
    /// Create a writer over `inner`
    pub fn new(inner: W) -> Self {
        PrimitiveWriter { inner }
    }

    /// Unwrap the sink
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Borrow the sink
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the sink
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Flush the sink
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Write a `bool` as one byte
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.inner.write_u8(u8::from(value))?;
        Ok(())
    }

    /// Write an `i8`
    #[inline]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.inner.write_i8(value)?;
        Ok(())
    }

    /// Write a `u8`
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    /// Write an `i16`
    #[inline]
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.inner.write_i16::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a `u16`
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write an `i32`
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a `u32`
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write an `i64`
    #[inline]
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.inner.write_i64::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a `u64`
    #[inline]
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.inner.write_u64::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write an `f32`
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.inner.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write an `f64`
    #[inline]
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.inner.write_f64::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a decimal as `lo, mid, hi, flags`
    pub fn write_decimal(&mut self, value: &Decimal) -> Result<()> {
        for word in value.to_words() {
            self.write_i32(word)?;
        }
        Ok(())
    }

    /// Write a calendar timestamp as ticks
    pub fn write_datetime(&mut self, value: &NaiveDateTime) -> Result<()> {
        self.write_i64(ticks::datetime_to_ticks(value)?)
    }

    /// Write a timestamp-with-offset as local ticks followed by offset ticks
    pub fn write_datetime_offset(&mut self, value: &DateTime<FixedOffset>) -> Result<()> {
        let (local, offset) = ticks::offset_datetime_to_ticks(value)?;
        self.write_i64(local)?;
        self.write_i64(offset)
    }

    /// Write an interval as ticks
    pub fn write_timespan(&mut self, value: &Duration) -> Result<()> {
        self.write_i64(ticks::duration_to_ticks(value)?)
    }

    /// Write a 128-bit identifier as 16 raw bytes
    pub fn write_guid(&mut self, value: &Uuid) -> Result<()> {
        self.write_raw(value.as_bytes())
    }

    /// Write a type handle
    #[inline]
    pub fn write_handle(&mut self, handle: TypeHandle) -> Result<()> {
        self.write_i16(handle)
    }

    /// Write a subtype handle
    #[inline]
    pub fn write_sub_handle(&mut self, sub_handle: SubHandle) -> Result<()> {
        self.write_i16(sub_handle)
    }

    /// Write an element/entry count as `i32`
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = i32::try_from(count)
            .map_err(|_| CodecError::invalid(format!("count {} exceeds i32::MAX", count)))?;
        self.write_i32(count)
    }

    /// Write a length-prefixed UTF-8 string; `None` writes the `-1` sentinel
    pub fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(s) => self.write_str(s),
            None => self.write_i32(NULL_LENGTH),
        }
    }

    /// Write a non-null length-prefixed UTF-8 string
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_length(value.len())?;
        self.write_raw(value.as_bytes())
    }

    /// Write a length-prefixed byte buffer; `None` writes the `-1` sentinel
    pub fn write_byte_buffer(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(bytes) => {
                self.write_length(bytes.len())?;
                self.write_raw(bytes)
            }
            None => self.write_i32(NULL_LENGTH),
        }
    }

    /// Write raw bytes with no length prefix
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Write `len` raw bytes of `buf` starting at `offset`, with no length prefix
    pub fn write_raw_range(&mut self, buf: &[u8], offset: usize, len: usize) -> Result<()> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or(CodecError::OutOfRange {
                index: offset.saturating_add(len),
                size: buf.len(),
            })?;
        self.write_raw(&buf[offset..end])
    }

    /// Write a character buffer as UTF-8 with an `i32` byte-length prefix
    pub fn write_chars(&mut self, chars: &[char]) -> Result<()> {
        let encoded: String = chars.iter().collect();
        self.write_str(&encoded)
    }

    /// Write any [`Primitive`]
    #[inline]
    pub fn write_primitive<T: Primitive>(&mut self, value: &T) -> Result<()> {
        value.write_to(self)
    }

    /// Write a value by its declared type.
    ///
    /// Dispatches to the concrete primitive writer. `Option<T>` of a
    /// primitive is unwrapped one level: a presence byte, then the value.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` for any type with no primitive writer.
    pub fn write_any(&mut self, value: &dyn Any) -> Result<()> {
        macro_rules! dispatch {
            ($($ty:ty),* $(,)?) => {
                $(
                    if let Some(v) = value.downcast_ref::<$ty>() {
                        return v.write_to(self);
                    }
                    if let Some(v) = value.downcast_ref::<Option<$ty>>() {
                        return v.write_to(self);
                    }
                )*
            };
        }

        dispatch!(
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

        Err(CodecError::UnsupportedType(format!(
            "{:?} has no primitive writer",
            value.type_id()
        )))
    }

    fn write_length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| CodecError::invalid(format!("length {} exceeds i32::MAX", len)))?;
        self.write_i32(len)
    }
}

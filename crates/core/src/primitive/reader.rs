//! Primitive reader
//!
//! Mirror of [`PrimitiveWriter`](super::PrimitiveWriter). Length prefixes are
//! checked against [`ReadLimits`] before anything is allocated, and variable
//! payloads are read through `Read::take` so a lying prefix cannot force a
//! large up-front allocation.

use super::{ticks, Primitive};
use crate::decimal::Decimal;
use crate::error::{CodecError, Result};
use crate::memory::{HeapMemory, MemoryManager};
use crate::types::{SubHandle, TypeHandle};
use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use std::io::{self, Read};
use std::sync::Arc;
use uuid::Uuid;

use super::writer::NULL_LENGTH;

/// Largest capacity reserved up front for a variable-length payload
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Upper bounds on decoded lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Largest element/entry count accepted for a collection
    pub max_collection_len: usize,
    /// Largest byte length accepted for a string or buffer
    pub max_buffer_len: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        ReadLimits {
            max_collection_len: 16 * 1024 * 1024,
            max_buffer_len: 1024 * 1024 * 1024,
        }
    }
}

/// Little-endian primitive reader over any source
pub struct PrimitiveReader<R> {
    inner: R,
    limits: ReadLimits,
    memory: Arc<dyn MemoryManager>,
}

impl<R> std::fmt::Debug for PrimitiveReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveReader")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl<R: Read> PrimitiveReader<R> {
    /// Create a reader over `inner` with default limits
    pub fn new(inner: R) -> Self {
        PrimitiveReader {
            inner,
            limits: ReadLimits::default(),
            memory: Arc::new(HeapMemory),
        }
    }

    /// Replace the length limits
    pub fn with_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the scratch-buffer provider
    pub fn with_memory_manager(mut self, memory: Arc<dyn MemoryManager>) -> Self {
        self.memory = memory;
        self
    }

    /// Active limits
    pub fn limits(&self) -> ReadLimits {
        self.limits
    }

    /// Scratch-buffer provider
    pub fn memory_manager(&self) -> &Arc<dyn MemoryManager> {
        &self.memory
    }

    /// Unwrap the source
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Borrow the source
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the source
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Read a `bool`; any non-zero byte is `true`
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.inner.read_u8()? != 0)
    }

    /// Read an `i8`
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.inner.read_i8()?)
    }

    /// Read a `u8`
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    /// Read an `i16`
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.inner.read_i16::<LittleEndian>()?)
    }

    /// Read a `u16`
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    /// Read an `i32`
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    /// Read a `u32`
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    /// Read an `i64`
    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.inner.read_i64::<LittleEndian>()?)
    }

    /// Read a `u64`
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.inner.read_u64::<LittleEndian>()?)
    }

    /// Read an `f32`
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    /// Read an `f64`
    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(self.inner.read_f64::<LittleEndian>()?)
    }

    /// Read a decimal from its four wire words
    pub fn read_decimal(&mut self) -> Result<Decimal> {
        let mut words = [0i32; 4];
        for word in words.iter_mut() {
            *word = self.read_i32()?;
        }
        Decimal::from_words(words)
    }

    /// Read a calendar timestamp
    pub fn read_datetime(&mut self) -> Result<NaiveDateTime> {
        ticks::ticks_to_datetime(self.read_i64()?)
    }

    /// Read a timestamp-with-offset
    pub fn read_datetime_offset(&mut self) -> Result<DateTime<FixedOffset>> {
        let local = self.read_i64()?;
        let offset = self.read_i64()?;
        ticks::ticks_to_offset_datetime(local, offset)
    }

    /// Read an interval
    pub fn read_timespan(&mut self) -> Result<Duration> {
        Ok(ticks::ticks_to_duration(self.read_i64()?))
    }

    /// Read a 128-bit identifier
    pub fn read_guid(&mut self) -> Result<Uuid> {
        let mut raw = [0u8; 16];
        self.inner.read_exact(&mut raw)?;
        Ok(Uuid::from_bytes(raw))
    }

    /// Read a type handle
    #[inline]
    pub fn read_handle(&mut self) -> Result<TypeHandle> {
        self.read_i16()
    }

    /// Read a subtype handle
    #[inline]
    pub fn read_sub_handle(&mut self) -> Result<SubHandle> {
        self.read_i16()
    }

    /// Read an element/entry count.
    ///
    /// # Errors
    ///
    /// `InvalidData` for negative counts or counts above the collection limit.
    pub fn read_count(&mut self) -> Result<usize> {
        let raw = self.read_i32()?;
        let count = usize::try_from(raw)
            .map_err(|_| CodecError::invalid(format!("negative count {}", raw)))?;
        if count > self.limits.max_collection_len {
            return Err(CodecError::invalid(format!(
                "count {} exceeds limit {}",
                count, self.limits.max_collection_len
            )));
        }
        Ok(count)
    }

    /// Read a length-prefixed string; the `-1` sentinel yields `None`
    pub fn read_string(&mut self) -> Result<Option<String>> {
        match self.read_length()? {
            Some(len) => Ok(Some(String::from_utf8(self.read_raw(len)?)?)),
            None => Ok(None),
        }
    }

    /// Read a length-prefixed string that must not be null
    pub fn read_str(&mut self) -> Result<String> {
        self.read_string()?
            .ok_or_else(|| CodecError::invalid("unexpected null string"))
    }

    /// Read a length-prefixed byte buffer; the `-1` sentinel yields `None`
    pub fn read_byte_buffer(&mut self) -> Result<Option<Vec<u8>>> {
        match self.read_length()? {
            Some(len) => self.read_raw(len).map(Some),
            None => Ok(None),
        }
    }

    /// Read a character buffer written by `write_chars`
    pub fn read_chars(&mut self) -> Result<Vec<char>> {
        Ok(self.read_str()?.chars().collect())
    }

    /// Read exactly `len` raw bytes into a buffer from the memory manager
    pub fn read_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = self.memory.acquire(len.min(PREALLOC_LIMIT));
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if got != len {
            return Err(short_read(len, got));
        }
        Ok(buf)
    }

    /// Fill `buf[offset..offset + len]` from the source
    pub fn read_raw_into(&mut self, buf: &mut [u8], offset: usize, len: usize) -> Result<()> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or(CodecError::OutOfRange {
                index: offset.saturating_add(len),
                size: buf.len(),
            })?;
        self.inner.read_exact(&mut buf[offset..end])?;
        Ok(())
    }

    /// Read any [`Primitive`]
    #[inline]
    pub fn read_primitive<T: Primitive>(&mut self) -> Result<T> {
        T::read_from(self)
    }

    /// Consume exactly `count` bytes
    pub fn skip_bytes(&mut self, count: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(count), &mut io::sink())?;
        if skipped != count {
            return Err(short_read(count as usize, skipped as usize));
        }
        Ok(())
    }

    /// Consume a length-prefixed string or buffer without decoding it
    pub fn skip_length_prefixed(&mut self) -> Result<()> {
        match self.read_length()? {
            Some(len) => self.skip_bytes(len as u64),
            None => Ok(()),
        }
    }

    fn read_length(&mut self) -> Result<Option<usize>> {
        let raw = self.read_i32()?;
        if raw == NULL_LENGTH {
            return Ok(None);
        }
        let len = usize::try_from(raw)
            .map_err(|_| CodecError::invalid(format!("negative length {}", raw)))?;
        if len > self.limits.max_buffer_len {
            return Err(CodecError::invalid(format!(
                "length {} exceeds limit {}",
                len, self.limits.max_buffer_len
            )));
        }
        Ok(Some(len))
    }
}

fn short_read(expected: usize, got: usize) -> CodecError {
    CodecError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("expected {} bytes, stream ended after {}", expected, got),
    ))
}

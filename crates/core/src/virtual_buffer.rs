//! Chunked virtual buffer
//!
//! A logical byte sequence stored as an ordered list of fixed-size chunks so
//! that large payloads never need one contiguous allocation. Every chunk but
//! the last is exactly `chunk_size` bytes; the last holds the remainder.
//!
//! A [`VirtualIndex`] is the coordinate form of a linear offset:
//! `(chunk = offset / chunk_size, offset = offset % chunk_size)`.

use crate::error::{CodecError, Result};
use std::fmt;

/// Default chunk size in bytes
pub const CHUNK_SIZE: usize = 80_896;

/// Linear offset decomposed into (chunk, intra-chunk offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualIndex {
    chunk: usize,
    offset: usize,
    chunk_size: usize,
}

impl VirtualIndex {
    /// Decompose `linear` for chunks of `chunk_size` bytes
    pub fn new(linear: usize, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0);
        VirtualIndex {
            chunk: linear / chunk_size,
            offset: linear % chunk_size,
            chunk_size,
        }
    }

    /// Advance by `n` bytes, crossing chunk boundaries as needed
    pub fn increment(&mut self, n: usize) {
        let advanced = self.offset + n;
        self.chunk += advanced / self.chunk_size;
        self.offset = advanced % self.chunk_size;
    }

    /// Chunk number
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Offset inside the chunk
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Linear offset
    pub fn linear(&self) -> usize {
        self.chunk * self.chunk_size + self.offset
    }

    /// Bytes left in the current chunk of a full-size chunk layout
    fn remaining_in_chunk(&self) -> usize {
        self.chunk_size - self.offset
    }
}

/// Byte sequence split across fixed-size chunks
#[derive(Clone, PartialEq, Eq)]
pub struct VirtualBuffer {
    chunks: Vec<Vec<u8>>,
    size: usize,
    chunk_size: usize,
}

impl fmt::Debug for VirtualBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualBuffer")
            .field("size", &self.size)
            .field("chunks", &self.chunks.len())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl Default for VirtualBuffer {
    fn default() -> Self {
        VirtualBuffer::with_size(0)
    }
}

impl VirtualBuffer {
    /// Zero-filled buffer of `size` bytes with the default chunk size
    pub fn with_size(size: usize) -> Self {
        let chunk_size = CHUNK_SIZE;
        VirtualBuffer {
            chunks: allocate_chunks(size, chunk_size),
            size,
            chunk_size,
        }
    }

    /// Zero-filled buffer of `size` bytes with a custom chunk size
    pub fn with_chunk_size(size: usize, chunk_size: usize) -> Result<Self> {
        check_chunk_size(chunk_size)?;
        Ok(VirtualBuffer {
            chunks: allocate_chunks(size, chunk_size),
            size,
            chunk_size,
        })
    }

    /// Adopt existing chunks of the default chunk size
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Result<Self> {
        Self::from_chunks_with_size(chunks, CHUNK_SIZE)
    }

    /// Adopt existing chunks; the size is the sum of chunk lengths.
    ///
    /// # Errors
    ///
    /// `InvalidData` if a chunk other than the last is not exactly
    /// `chunk_size` bytes, or the last chunk is longer than that.
    pub fn from_chunks_with_size(chunks: Vec<Vec<u8>>, chunk_size: usize) -> Result<Self> {
        check_chunk_size(chunk_size)?;
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.iter().enumerate() {
            let ok = if i < last {
                chunk.len() == chunk_size
            } else {
                chunk.len() <= chunk_size
            };
            if !ok {
                return Err(CodecError::invalid(format!(
                    "chunk {} has {} bytes, chunk size is {}",
                    i,
                    chunk.len(),
                    chunk_size
                )));
            }
        }
        let size = chunks.iter().map(Vec::len).sum();
        Ok(VirtualBuffer {
            chunks,
            size,
            chunk_size,
        })
    }

    /// Logical size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// True if the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunk size in bytes
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Borrow the chunks in order
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Read the byte at `index`
    pub fn get(&self, index: usize) -> Result<u8> {
        self.check_index(index)?;
        let at = VirtualIndex::new(index, self.chunk_size);
        Ok(self.chunks[at.chunk()][at.offset()])
    }

    /// Overwrite the byte at `index`
    pub fn set(&mut self, index: usize, value: u8) -> Result<()> {
        self.check_index(index)?;
        let at = VirtualIndex::new(index, self.chunk_size);
        self.chunks[at.chunk()][at.offset()] = value;
        Ok(())
    }

    /// Copy the first `length` bytes of this buffer into
    /// `buffer[offset..offset + length]`.
    pub fn copy_into(&self, buffer: &mut [u8], offset: usize, length: usize) -> Result<()> {
        if length > self.size {
            return Err(CodecError::OutOfRange {
                index: length,
                size: self.size,
            });
        }
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= buffer.len())
            .ok_or(CodecError::OutOfRange {
                index: offset.saturating_add(length),
                size: buffer.len(),
            })?;

        let mut cursor = offset;
        for chunk in &self.chunks {
            if cursor == end {
                break;
            }
            let step = chunk.len().min(end - cursor);
            buffer[cursor..cursor + step].copy_from_slice(&chunk[..step]);
            cursor += step;
        }
        Ok(())
    }

    /// Overwrite bytes starting at `index` with `src`
    pub fn copy_from_slice(&mut self, index: usize, src: &[u8]) -> Result<()> {
        let end = index
            .checked_add(src.len())
            .filter(|end| *end <= self.size)
            .ok_or(CodecError::OutOfRange {
                index: index.saturating_add(src.len()),
                size: self.size,
            })?;

        let mut at = VirtualIndex::new(index, self.chunk_size);
        let mut copied = 0;
        while index + copied < end {
            let step = at.remaining_in_chunk().min(src.len() - copied);
            let chunk = &mut self.chunks[at.chunk()];
            chunk[at.offset()..at.offset() + step].copy_from_slice(&src[copied..copied + step]);
            copied += step;
            at.increment(step);
        }
        Ok(())
    }

    /// Copy `count` bytes from `src[src_index..]` to `dst[dst_index..]`.
    ///
    /// Each step copies the minimum of the bytes left in the current source
    /// chunk, the bytes left in the current destination chunk and the bytes
    /// left to copy. The two buffers may use different chunk sizes.
    ///
    /// When the destination is too small it is grown (new chunks appended,
    /// the last chunk lengthened) if `allow_expansion` is set.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if the source range extends past `src.size()`
    /// - `OutOfBounds` if the destination is too small and expansion is not
    ///   allowed; nothing is copied in that case
    pub fn copy_between(
        src: &VirtualBuffer,
        src_index: usize,
        dst: &mut VirtualBuffer,
        dst_index: usize,
        count: usize,
        allow_expansion: bool,
    ) -> Result<()> {
        let src_end = src_index
            .checked_add(count)
            .filter(|end| *end <= src.size)
            .ok_or(CodecError::OutOfRange {
                index: src_index.saturating_add(count),
                size: src.size,
            })?;
        let dst_end = dst_index.checked_add(count).ok_or(CodecError::OutOfBounds {
            index: dst_index,
            requested: count,
            size: dst.size,
        })?;

        if dst_end > dst.size {
            if !allow_expansion {
                return Err(CodecError::OutOfBounds {
                    index: dst_index,
                    requested: count,
                    size: dst.size,
                });
            }
            dst.grow_to(dst_end);
        }

        let mut from = VirtualIndex::new(src_index, src.chunk_size);
        let mut to = VirtualIndex::new(dst_index, dst.chunk_size);
        let mut remaining = src_end - src_index;
        while remaining > 0 {
            let step = from
                .remaining_in_chunk()
                .min(to.remaining_in_chunk())
                .min(remaining);
            let source = &src.chunks[from.chunk()][from.offset()..from.offset() + step];
            dst.chunks[to.chunk()][to.offset()..to.offset() + step].copy_from_slice(source);
            from.increment(step);
            to.increment(step);
            remaining -= step;
        }
        Ok(())
    }

    /// Gather all bytes into one contiguous vector
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Extend with zeros to `new_size`, filling the last chunk before
    /// appending new ones.
    fn grow_to(&mut self, new_size: usize) {
        let mut missing = new_size.saturating_sub(self.size);
        if let Some(last) = self.chunks.last_mut() {
            let room = self.chunk_size - last.len();
            let step = room.min(missing);
            last.resize(last.len() + step, 0);
            missing -= step;
        }
        while missing > 0 {
            let step = self.chunk_size.min(missing);
            self.chunks.push(vec![0u8; step]);
            missing -= step;
        }
        self.size = self.size.max(new_size);
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.size {
            return Err(CodecError::OutOfRange {
                index,
                size: self.size,
            });
        }
        Ok(())
    }
}

fn check_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(CodecError::invalid("chunk size must be positive"));
    }
    Ok(())
}

fn allocate_chunks(size: usize, chunk_size: usize) -> Vec<Vec<u8>> {
    let mut chunks = Vec::with_capacity((size + chunk_size - 1) / chunk_size);
    let mut left = size;
    while left > 0 {
        let len = chunk_size.min(left);
        chunks.push(vec![0u8; len]);
        left -= len;
    }
    chunks
}

//! Virtual buffer surrogate
//!
//! Wire format: `[size: i64][bytes]`. Decode rebuilds the buffer one chunk at
//! a time using the call's chunk size, so no contiguous allocation of the
//! whole payload is made.

use crate::codec::{ObjectReader, ObjectWriter};
use crate::surrogate::{downcast_value, Object, ShapeKind, Surrogate};
use compactwire_core::{CodecError, Result, VirtualBuffer};
use std::any::{Any, TypeId};

/// Surrogate for [`VirtualBuffer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualBufferSurrogate;

impl VirtualBufferSurrogate {
    fn read_size(reader: &mut ObjectReader<'_>) -> Result<usize> {
        let raw = reader.read_i64()?;
        let size = usize::try_from(raw)
            .map_err(|_| CodecError::invalid(format!("negative virtual buffer size {}", raw)))?;
        let limit = reader.limits().max_buffer_len;
        if size > limit {
            return Err(CodecError::invalid(format!(
                "virtual buffer size {} exceeds limit {}",
                size, limit
            )));
        }
        Ok(size)
    }
}

impl Surrogate for VirtualBufferSurrogate {
    fn source_type(&self) -> TypeId {
        TypeId::of::<VirtualBuffer>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<VirtualBuffer>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::VirtualBuffer
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        let buffer = downcast_value::<VirtualBuffer>(value)?;
        let size = i64::try_from(buffer.size())
            .map_err(|_| CodecError::invalid("virtual buffer size exceeds i64::MAX"))?;
        writer.write_i64(size)?;
        for chunk in buffer.chunks() {
            writer.write_raw(chunk)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        let size = Self::read_size(reader)?;
        let chunk_size = reader.context().chunk_size();

        let mut chunks = Vec::with_capacity((size + chunk_size - 1) / chunk_size);
        let mut left = size;
        while left > 0 {
            let len = chunk_size.min(left);
            chunks.push(reader.read_raw(len)?);
            left -= len;
        }
        Ok(Box::new(VirtualBuffer::from_chunks_with_size(chunks, chunk_size)?))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        let size = Self::read_size(reader)?;
        reader.skip_bytes(size as u64)
    }
}

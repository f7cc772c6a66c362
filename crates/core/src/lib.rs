//! Core types for the compact wire codec
//!
//! This crate defines the leaf layers the object codec is built on:
//! - CodecError: Error taxonomy shared by every layer
//! - TypeHandle / SubHandle: Wire identities and intrinsic handle table
//! - Decimal and tick conversions for calendar and interval values
//! - PrimitiveWriter / PrimitiveReader: Little-endian primitive codec
//! - VirtualBuffer: Chunked big-buffer storage
//! - MemoryManager: Scratch-buffer seam
//! - CodecConfig: TOML-loadable limits

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod decimal;
pub mod error;
pub mod memory;
pub mod primitive;
pub mod types;
pub mod virtual_buffer;

pub use config::CodecConfig;
pub use decimal::Decimal;
pub use error::{BoxError, CodecError, Result};
pub use memory::{HeapMemory, MemoryManager};
pub use primitive::{Primitive, PrimitiveKind, PrimitiveReader, PrimitiveWriter, ReadLimits};
pub use types::{
    handles, is_default_context, SubHandle, TypeHandle, AUTO_HANDLE_START,
    DEFAULT_CONTEXT, NO_SUBTYPE,
};
pub use virtual_buffer::{VirtualBuffer, VirtualIndex, CHUNK_SIZE};

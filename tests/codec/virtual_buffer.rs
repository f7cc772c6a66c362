//! Virtual buffers through the codec

use crate::common::*;
use compactwire::{CallOptions, CodecConfig, HeapMemory, MemoryManager, CHUNK_SIZE};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn multi_chunk_buffer_roundtrips() {
    let codec = builtin_codec();
    let buffer = patterned_buffer(CHUNK_SIZE * 2 + 17, CHUNK_SIZE);
    assert_eq!(buffer.chunk_count(), 3);

    let bytes = codec.to_buffer(&buffer, "").unwrap();
    assert_eq!(bytes.len(), 2 + 8 + buffer.size());
    let back: VirtualBuffer = codec.from_buffer_as(&bytes, "").unwrap();
    assert_eq!(back, buffer);
}

#[test]
fn decode_uses_configured_chunk_size() {
    let registry = builtin_registry();
    let config = CodecConfig {
        chunk_size: 64,
        ..CodecConfig::default()
    };
    let codec = Codec::with_config(registry, config).unwrap();

    let buffer = patterned_buffer(1000, CHUNK_SIZE);
    let bytes = codec.to_buffer(&buffer, "").unwrap();
    let back: VirtualBuffer = codec.from_buffer_as(&bytes, "").unwrap();
    assert_eq!(back.chunk_size(), 64);
    assert_eq!(back.chunk_count(), 16);
    assert_eq!(back.to_vec(), buffer.to_vec());
}

#[test]
fn empty_buffer_roundtrips() {
    let codec = builtin_codec();
    let bytes = codec.to_buffer(&VirtualBuffer::default(), "").unwrap();
    let back: VirtualBuffer = codec.from_buffer_as(&bytes, "").unwrap();
    assert!(back.is_empty());
}

#[test]
fn oversized_buffer_is_rejected_before_reading() {
    let registry = builtin_registry();
    let config = CodecConfig {
        max_buffer_len: 16,
        ..CodecConfig::default()
    };
    let codec = Codec::with_config(registry, config).unwrap();

    let mut bytes = handles::VIRTUAL_BUFFER.to_le_bytes().to_vec();
    bytes.extend_from_slice(&1_000_000i64.to_le_bytes());
    let err = codec.from_buffer(&bytes, "").unwrap_err();
    assert!(matches!(err, CodecError::InvalidData(_)));
}

#[test]
fn skip_moves_past_buffer_body() {
    let codec = builtin_codec();
    let mut bytes = codec.to_buffer(&patterned_buffer(300, 128), "").unwrap();
    bytes.extend(codec.to_buffer(&true, "").unwrap());

    let mut cursor = Cursor::new(bytes);
    codec.skip(&mut cursor, "").unwrap();
    assert!(codec.deserialize_as::<bool, _>(&mut cursor, "").unwrap());
}

#[derive(Default)]
struct CountingMemory {
    acquired: AtomicUsize,
}

impl MemoryManager for CountingMemory {
    fn acquire(&self, min_capacity: usize) -> Vec<u8> {
        self.acquired.fetch_add(1, Ordering::Relaxed);
        HeapMemory.acquire(min_capacity)
    }
}

#[test]
fn call_memory_manager_supplies_chunks() {
    let codec = builtin_codec();
    let buffer = patterned_buffer(CHUNK_SIZE + 1, CHUNK_SIZE);
    let bytes = codec.to_buffer(&buffer, "").unwrap();

    let memory = Arc::new(CountingMemory::default());
    let options = CallOptions::default().with_memory_manager(memory.clone());
    let back = codec
        .deserialize_with(&mut Cursor::new(bytes), "", options)
        .unwrap();
    assert_eq!(back.downcast_ref::<VirtualBuffer>(), Some(&buffer));
    assert_eq!(memory.acquired.load(Ordering::Relaxed), 2);
}

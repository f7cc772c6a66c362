//! Scratch-buffer provisioning
//!
//! Encoders that need a temporary buffer (portable member bodies, virtual
//! buffer staging) ask a [`MemoryManager`] instead of allocating directly, so
//! callers can plug in pooling.

/// Source of temporary byte buffers
pub trait MemoryManager: Send + Sync {
    /// Get an empty buffer with at least `min_capacity` bytes reserved
    fn acquire(&self, min_capacity: usize) -> Vec<u8>;

    /// Return a buffer obtained from [`MemoryManager::acquire`]
    fn release(&self, buffer: Vec<u8>) {
        drop(buffer);
    }
}

/// Plain heap allocation, no reuse
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapMemory;

impl MemoryManager for HeapMemory {
    fn acquire(&self, min_capacity: usize) -> Vec<u8> {
        Vec::with_capacity(min_capacity)
    }
}

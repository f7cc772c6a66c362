//! Per-call serialization context
//!
//! Created at the start of every top-level encode or decode and threaded
//! through all nested object reads and writes of that call.

use crate::registry::SurrogateRegistry;
use compactwire_core::{HeapMemory, MemoryManager};
use std::sync::Arc;

/// Options for a single serialize or deserialize call
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Flush the sink once the value is written. Has no effect on decode.
    pub close: bool,
    /// Scratch-buffer provider for this call; defaults to [`HeapMemory`]
    pub memory_manager: Option<Arc<dyn MemoryManager>>,
}

impl CallOptions {
    /// Flush the sink after writing
    pub fn closing() -> Self {
        CallOptions {
            close: true,
            memory_manager: None,
        }
    }

    /// Use `memory` for scratch buffers
    pub fn with_memory_manager(mut self, memory: Arc<dyn MemoryManager>) -> Self {
        self.memory_manager = Some(memory);
        self
    }
}

impl std::fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOptions")
            .field("close", &self.close)
            .field("memory_manager", &self.memory_manager.is_some())
            .finish()
    }
}

/// State shared by every nested read or write of one call
#[derive(Clone)]
pub struct SerializationContext {
    registry: Arc<SurrogateRegistry>,
    context: Arc<str>,
    memory: Arc<dyn MemoryManager>,
    chunk_size: usize,
}

impl SerializationContext {
    /// Create a context resolving through `registry` in cache context `context`
    pub fn new(
        registry: Arc<SurrogateRegistry>,
        context: &str,
        memory: Option<Arc<dyn MemoryManager>>,
        chunk_size: usize,
    ) -> Self {
        SerializationContext {
            registry,
            context: Arc::from(context),
            memory: memory.unwrap_or_else(|| Arc::new(HeapMemory)),
            chunk_size,
        }
    }

    /// Registry used for every lookup in this call
    pub fn registry(&self) -> &SurrogateRegistry {
        &self.registry
    }

    /// Active cache context name
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Scratch-buffer provider
    pub fn memory_manager(&self) -> &Arc<dyn MemoryManager> {
        &self.memory
    }

    /// Chunk size for virtual buffers rebuilt on decode
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl std::fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationContext")
            .field("context", &self.context)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

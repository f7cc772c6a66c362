//! compactwire - compact binary object-graph codec
//!
//! Encodes typed values as `[handle][subHandle?][body]` frames. Handles are
//! resolved through a [`SurrogateRegistry`] partitioned by cache context, so
//! independent tenants can bind the same handle to different types.
//!
//! # Quick Start
//!
//! ```ignore
//! use compactwire::{Codec, SurrogateRegistry};
//! use indexmap::IndexMap;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SurrogateRegistry::with_builtins());
//! registry.register_builtin_with_handle::<IndexMap<i32, String>>(100, "default")?;
//!
//! let codec = Codec::new(registry);
//! let mut map = IndexMap::new();
//! map.insert(1, "one".to_string());
//! let bytes = codec.to_buffer(&map, "default")?;
//! let back: IndexMap<i32, String> = codec.from_buffer_as(&bytes, "default")?;
//! ```
//!
//! # Layers
//!
//! - `compactwire-core`: errors, primitive reader/writer, virtual buffers, config
//! - `compactwire-engine`: registry, surrogates, codec orchestration

pub use compactwire_core::*;
pub use compactwire_engine::*;

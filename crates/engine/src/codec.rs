//! Codec orchestrator
//!
//! Frames every object as
//!
//! ```text
//! [handle: i16][subHandle: i16, only if primary resolution fails][body]
//! ```
//!
//! [`Codec`] is the public entry point. [`ObjectWriter`] and [`ObjectReader`]
//! are the handles passed into every surrogate call; they expose the
//! primitive codec through `Deref` and recurse into the registry for nested
//! objects.
//!
//! Failures abort the whole call. Bytes already written to the sink are not
//! rolled back.

use crate::context::{CallOptions, SerializationContext};
use crate::registry::{Binding, SurrogateRegistry};
use crate::surrogate::{downcast_object, Null, Object};
use compactwire_core::{
    CodecConfig, CodecError, MemoryManager, PrimitiveReader, PrimitiveWriter, Result,
    NO_SUBTYPE,
};
use std::any::Any;
use std::io::{Cursor, Read, Write};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{trace, warn};

/// Object-level writer handed to surrogates
pub struct ObjectWriter<'a> {
    inner: PrimitiveWriter<&'a mut dyn Write>,
    ctx: SerializationContext,
}

impl<'a> ObjectWriter<'a> {
    /// Create a writer over `sink` for one call
    pub fn new(sink: &'a mut dyn Write, ctx: SerializationContext) -> Self {
        ObjectWriter {
            inner: PrimitiveWriter::new(sink),
            ctx,
        }
    }

    /// Writer over another sink sharing this call's context
    pub fn nested<'b>(&self, sink: &'b mut dyn Write) -> ObjectWriter<'b> {
        ObjectWriter::new(sink, self.ctx.clone())
    }

    /// Per-call context
    pub fn context(&self) -> &SerializationContext {
        &self.ctx
    }

    /// Write a framed object: handle, subtype handle when bound to one, body
    pub fn write_object(&mut self, value: &dyn Any) -> Result<()> {
        let binding = self
            .ctx
            .registry()
            .resolve_for_value(value, self.ctx.context())?;
        self.write_frame(&binding)?;
        binding.surrogate().write(self, value)
    }

    /// Write a framed object, or the null frame for `None`
    pub fn write_optional(&mut self, value: Option<&dyn Any>) -> Result<()> {
        match value {
            Some(value) => self.write_object(value),
            None => self.write_null(),
        }
    }

    /// Write the null frame
    pub fn write_null(&mut self) -> Result<()> {
        self.write_object(&Null)
    }

    fn write_frame(&mut self, binding: &Binding) -> Result<()> {
        self.inner.write_handle(binding.handle())?;
        if binding.sub_handle() != NO_SUBTYPE {
            self.inner.write_sub_handle(binding.sub_handle())?;
        }
        Ok(())
    }
}

impl<'a> Deref for ObjectWriter<'a> {
    type Target = PrimitiveWriter<&'a mut dyn Write>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'a> DerefMut for ObjectWriter<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Object-level reader handed to surrogates
pub struct ObjectReader<'a> {
    inner: PrimitiveReader<&'a mut dyn Read>,
    ctx: SerializationContext,
}

impl<'a> ObjectReader<'a> {
    /// Create a reader over `source` for one call
    pub fn new(source: &'a mut dyn Read, ctx: SerializationContext) -> Self {
        let memory = Arc::clone(ctx.memory_manager());
        ObjectReader {
            inner: PrimitiveReader::new(source).with_memory_manager(memory),
            ctx,
        }
    }

    /// Reader over another source sharing this call's context and limits
    pub fn nested<'b>(&self, source: &'b mut dyn Read) -> ObjectReader<'b> {
        let mut reader = ObjectReader::new(source, self.ctx.clone());
        reader.inner = reader.inner.with_limits(self.inner.limits());
        reader
    }

    fn with_config(mut self, config: &CodecConfig) -> Self {
        self.inner = self.inner.with_limits(config.read_limits());
        self
    }

    /// Per-call context
    pub fn context(&self) -> &SerializationContext {
        &self.ctx
    }

    /// Read a framed object
    pub fn read_object(&mut self) -> Result<Object> {
        let binding = self.resolve_frame()?;
        binding.surrogate().read(self)
    }

    /// Read a framed object of a known type.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the frame names another type, including null.
    pub fn read_object_as<T: Any>(&mut self) -> Result<T> {
        let binding = self.resolve_frame()?;
        let object = binding.surrogate().read(self)?;
        downcast_object(object, binding.surrogate().type_name())
    }

    /// Read a framed object of a known type; the null frame yields `None`
    pub fn read_optional_as<T: Any>(&mut self) -> Result<Option<T>> {
        let binding = self.resolve_frame()?;
        let object = binding.surrogate().read(self)?;
        if object.is::<Null>() {
            return Ok(None);
        }
        downcast_object(object, binding.surrogate().type_name()).map(Some)
    }

    /// Consume a framed object without decoding its body
    pub fn skip_object(&mut self) -> Result<()> {
        let binding = self.resolve_frame()?;
        binding.surrogate().skip(self)
    }

    /// Read a handle and resolve it, reading a subtype handle only when the
    /// primary lookup fails.
    fn resolve_frame(&mut self) -> Result<Arc<Binding>> {
        let registry = self.ctx.registry();
        let context = self.ctx.context();
        let handle = self.inner.read_handle()?;
        if let Some(binding) = registry.resolve_for_handle(handle, context) {
            return Ok(binding);
        }

        let sub_handle = match self.inner.read_sub_handle() {
            Ok(sub_handle) => sub_handle,
            Err(e) if e.is_eof() => {
                warn!(
                    target: "compactwire::codec",
                    handle,
                    context,
                    "Unresolved type handle at end of stream"
                );
                return Err(CodecError::UnknownHandle {
                    handle,
                    sub_handle: None,
                    context: context.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        registry
            .resolve_for_sub_handle(handle, sub_handle, context)
            .ok_or_else(|| {
                warn!(
                    target: "compactwire::codec",
                    handle,
                    sub_handle,
                    context,
                    "Unresolved type handle"
                );
                CodecError::UnknownHandle {
                    handle,
                    sub_handle: Some(sub_handle),
                    context: context.to_string(),
                }
            })
    }
}

impl<'a> Deref for ObjectReader<'a> {
    type Target = PrimitiveReader<&'a mut dyn Read>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'a> DerefMut for ObjectReader<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Public encode/decode entry point
///
/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct Codec {
    registry: Arc<SurrogateRegistry>,
    config: CodecConfig,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Codec {
    /// Create a codec with the default configuration
    pub fn new(registry: Arc<SurrogateRegistry>) -> Self {
        Codec {
            registry,
            config: CodecConfig::default(),
        }
    }

    /// Create a codec with a validated configuration
    pub fn with_config(registry: Arc<SurrogateRegistry>, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Codec { registry, config })
    }

    /// Registry shared by every call
    pub fn registry(&self) -> &Arc<SurrogateRegistry> {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Write `value` as one framed object
    pub fn serialize<W: Write>(&self, sink: &mut W, value: &dyn Any, context: &str) -> Result<()> {
        self.serialize_with(sink, value, context, CallOptions::default())
    }

    /// Write `value` as one framed object with per-call options
    pub fn serialize_with<W: Write>(
        &self,
        sink: &mut W,
        value: &dyn Any,
        context: &str,
        options: CallOptions,
    ) -> Result<()> {
        trace!(target: "compactwire::codec", context, "serialize");
        let ctx = self.call_context(context, options.memory_manager);
        let mut writer = ObjectWriter::new(sink, ctx);
        let result = writer.write_object(value).and_then(|()| {
            if options.close {
                writer.flush()
            } else {
                Ok(())
            }
        });
        if let Err(e) = &result {
            warn!(target: "compactwire::codec", context, error = %e, "serialize failed");
        }
        result
    }

    /// Read one framed object
    pub fn deserialize<R: Read>(&self, source: &mut R, context: &str) -> Result<Object> {
        self.deserialize_with(source, context, CallOptions::default())
    }

    /// Read one framed object with per-call options
    pub fn deserialize_with<R: Read>(
        &self,
        source: &mut R,
        context: &str,
        options: CallOptions,
    ) -> Result<Object> {
        trace!(target: "compactwire::codec", context, "deserialize");
        let mut reader = self.reader(source, context, options.memory_manager);
        let result = reader.read_object();
        if let Err(e) = &result {
            warn!(target: "compactwire::codec", context, error = %e, "deserialize failed");
        }
        result
    }

    /// Read one framed object of a known type
    pub fn deserialize_as<T: Any, R: Read>(&self, source: &mut R, context: &str) -> Result<T> {
        trace!(target: "compactwire::codec", context, "deserialize");
        let mut reader = self.reader(source, context, None);
        let result = reader.read_object_as::<T>();
        if let Err(e) = &result {
            warn!(target: "compactwire::codec", context, error = %e, "deserialize failed");
        }
        result
    }

    /// Consume one framed object without decoding it
    pub fn skip<R: Read>(&self, source: &mut R, context: &str) -> Result<()> {
        let mut reader = self.reader(source, context, None);
        reader.skip_object()
    }

    /// Encode `value` into a new buffer
    pub fn to_buffer(&self, value: &dyn Any, context: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.serialize(&mut buf, value, context)?;
        Ok(buf)
    }

    /// Decode one framed object from `bytes`
    pub fn from_buffer(&self, bytes: &[u8], context: &str) -> Result<Object> {
        self.deserialize(&mut Cursor::new(bytes), context)
    }

    /// Decode one framed object of a known type from `bytes`
    pub fn from_buffer_as<T: Any>(&self, bytes: &[u8], context: &str) -> Result<T> {
        self.deserialize_as::<T, _>(&mut Cursor::new(bytes), context)
    }

    fn call_context(
        &self,
        context: &str,
        memory: Option<Arc<dyn MemoryManager>>,
    ) -> SerializationContext {
        SerializationContext::new(
            Arc::clone(&self.registry),
            context,
            memory,
            self.config.chunk_size,
        )
    }

    fn reader<'s, R: Read>(
        &self,
        source: &'s mut R,
        context: &str,
        memory: Option<Arc<dyn MemoryManager>>,
    ) -> ObjectReader<'s> {
        ObjectReader::new(source, self.call_context(context, memory)).with_config(&self.config)
    }
}

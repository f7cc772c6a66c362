//! Self-describing types
//!
//! A type implementing [`CompactSerializable`] owns its body encoding. It
//! receives the call's [`ObjectWriter`]/[`ObjectReader`] and may write nested
//! framed objects through them.

use crate::codec::{ObjectReader, ObjectWriter};
use crate::surrogate::{downcast_value, Object, ShapeKind, Surrogate};
use compactwire_core::Result;
use std::any::{Any, TypeId};
use std::marker::PhantomData;

/// A type that encodes its own body
pub trait CompactSerializable: Any + Send + Sync + Sized {
    /// Write the body
    fn serialize(&self, writer: &mut ObjectWriter<'_>) -> Result<()>;

    /// Read a body written by [`CompactSerializable::serialize`]
    fn deserialize(reader: &mut ObjectReader<'_>) -> Result<Self>;

    /// Consume a body without keeping it.
    ///
    /// The default decodes the whole value and drops it. Types whose body is
    /// more than a few primitives should override this to step over the
    /// bytes instead, e.g. with `skip_length_prefixed` for strings and
    /// [`ObjectReader::skip_object`] for nested frames:
    ///
    /// ```ignore
    /// fn skip(reader: &mut ObjectReader<'_>) -> Result<()> {
    ///     reader.skip_length_prefixed()?;
    ///     reader.skip_object()
    /// }
    /// ```
    fn skip(reader: &mut ObjectReader<'_>) -> Result<()> {
        Self::deserialize(reader).map(drop)
    }
}

/// Surrogate delegating to a [`CompactSerializable`] type
pub struct SelfDescribingSurrogate<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: CompactSerializable> SelfDescribingSurrogate<T> {
    /// Create the surrogate
    pub fn new() -> Self {
        SelfDescribingSurrogate {
            _marker: PhantomData,
        }
    }
}

impl<T: CompactSerializable> Default for SelfDescribingSurrogate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CompactSerializable> Surrogate for SelfDescribingSurrogate<T> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::SelfDescribing
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        downcast_value::<T>(value)?.serialize(writer)
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        Ok(Box::new(T::deserialize(reader)?))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        T::skip(reader)
    }
}

//! Primitive and null surrogates

use crate::codec::{ObjectReader, ObjectWriter};
use crate::surrogate::{downcast_value, Null, Object, ShapeKind, Surrogate};
use compactwire_core::{Primitive, Result};
use std::any::{Any, TypeId};
use std::marker::PhantomData;

/// Surrogate for a type with a dedicated primitive encoding
pub struct PrimitiveSurrogate<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Primitive> PrimitiveSurrogate<T> {
    /// Create the surrogate
    pub fn new() -> Self {
        PrimitiveSurrogate {
            _marker: PhantomData,
        }
    }
}

impl<T: Primitive> Default for PrimitiveSurrogate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Primitive> Surrogate for PrimitiveSurrogate<T> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Primitive(T::KIND)
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        downcast_value::<T>(value)?.write_to(&mut **writer)
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        Ok(Box::new(T::read_from(&mut **reader)?))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        T::skip_in(&mut **reader)
    }
}

/// Surrogate for [`Null`]; the body is empty
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurrogate;

impl Surrogate for NullSurrogate {
    fn source_type(&self) -> TypeId {
        TypeId::of::<Null>()
    }

    fn type_name(&self) -> &'static str {
        "null"
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Null
    }

    fn write(&self, _writer: &mut ObjectWriter<'_>, _value: &dyn Any) -> Result<()> {
        Ok(())
    }

    fn read(&self, _reader: &mut ObjectReader<'_>) -> Result<Object> {
        Ok(Box::new(Null))
    }

    fn skip(&self, _reader: &mut ObjectReader<'_>) -> Result<()> {
        Ok(())
    }
}

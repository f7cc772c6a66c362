//! Enumeration surrogate

use crate::codec::{ObjectReader, ObjectWriter};
use crate::surrogate::{downcast_value, Object, ShapeKind, Surrogate};
use compactwire_core::{CodecError, Primitive, Result};
use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::marker::PhantomData;

/// An enumeration encoded as its underlying representation
///
/// ```ignore
/// impl WireEnum for Side {
///     type Repr = u8;
///     fn to_repr(&self) -> u8 { *self as u8 }
///     fn from_repr(repr: u8) -> Option<Self> {
///         match repr { 0 => Some(Side::Buy), 1 => Some(Side::Sell), _ => None }
///     }
/// }
/// ```
pub trait WireEnum: Any + Send + Sync + Sized {
    /// Underlying integer representation
    type Repr: Primitive + Copy + Debug;

    /// Representation of this member
    fn to_repr(&self) -> Self::Repr;

    /// Member for a representation, `None` if there is none
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

/// Surrogate for a [`WireEnum`]
pub struct EnumSurrogate<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E: WireEnum> EnumSurrogate<E> {
    /// Create the surrogate
    pub fn new() -> Self {
        EnumSurrogate {
            _marker: PhantomData,
        }
    }
}

impl<E: WireEnum> Default for EnumSurrogate<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: WireEnum> Surrogate for EnumSurrogate<E> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<E>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Enumeration
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        downcast_value::<E>(value)?.to_repr().write_to(&mut **writer)
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        let repr = E::Repr::read_from(&mut **reader)?;
        let member = E::from_repr(repr).ok_or_else(|| {
            CodecError::invalid(format!(
                "{:?} is not a member of {}",
                repr,
                std::any::type_name::<E>()
            ))
        })?;
        Ok(Box::new(member))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        E::Repr::skip_in(&mut **reader)
    }
}

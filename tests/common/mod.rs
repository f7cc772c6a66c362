//! Shared fixtures for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

pub use compactwire::{
    handles, Codec, CodecError, CompactSerializable, Decimal, Null, Object, ObjectReader,
    ObjectWriter, RecordSchema, Result, SurrogateRegistry, VirtualBuffer, WireEnum,
};
use std::sync::Arc;

// ============================================================================
// Codec construction
// ============================================================================

/// Codec over a fresh registry holding only the built-in bindings
pub fn builtin_codec() -> Codec {
    Codec::new(Arc::new(SurrogateRegistry::with_builtins()))
}

/// Codec sharing `registry`
pub fn codec_for(registry: &Arc<SurrogateRegistry>) -> Codec {
    Codec::new(Arc::clone(registry))
}

/// Fresh registry with the built-in bindings
pub fn builtin_registry() -> Arc<SurrogateRegistry> {
    Arc::new(SurrogateRegistry::with_builtins())
}

// ============================================================================
// Fixture types
// ============================================================================

/// Order side, encoded as its `u8` discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl WireEnum for Side {
    type Repr = u8;

    fn to_repr(&self) -> u8 {
        *self as u8
    }

    fn from_repr(repr: u8) -> Option<Self> {
        match repr {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }
}

/// Self-describing amount with a nested framed decimal
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub currency: String,
    pub amount: Decimal,
}

impl CompactSerializable for Money {
    fn serialize(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
        writer.write_str(&self.currency)?;
        writer.write_object(&self.amount)
    }

    fn deserialize(reader: &mut ObjectReader<'_>) -> Result<Self> {
        let currency = reader.read_str()?;
        let amount = reader.read_object_as::<Decimal>()?;
        Ok(Money { currency, amount })
    }

    fn skip(reader: &mut ObjectReader<'_>) -> Result<()> {
        reader.skip_length_prefixed()?;
        reader.skip_object()
    }
}

/// Record type for dynamic surrogate tests
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Order {
    pub id: u64,
    pub symbol: String,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Same record as seen by a newer writer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OrderV2 {
    pub id: u64,
    pub symbol: String,
    pub quantity: i32,
    pub note: Option<String>,
    pub venue: String,
}

/// Member order used by every order registration
pub const ORDER_MEMBERS: &[&str] = &["id", "symbol", "quantity", "note"];

pub fn order_schema() -> RecordSchema<Order> {
    RecordSchema::new()
        .primitive("id", |o: &Order| &o.id, |o: &mut Order, v| o.id = v)
        .object("symbol", |o: &Order| &o.symbol, |o: &mut Order, v| o.symbol = v)
        .primitive("quantity", |o: &Order| &o.quantity, |o: &mut Order, v| o.quantity = v)
        .optional("note", |o: &Order| o.note.as_ref(), |o: &mut Order, v| o.note = v)
}

pub fn order_v2_schema() -> RecordSchema<OrderV2> {
    RecordSchema::new()
        .primitive("id", |o: &OrderV2| &o.id, |o: &mut OrderV2, v| o.id = v)
        .object("symbol", |o: &OrderV2| &o.symbol, |o: &mut OrderV2, v| o.symbol = v)
        .primitive("quantity", |o: &OrderV2| &o.quantity, |o: &mut OrderV2, v| o.quantity = v)
        .optional("note", |o: &OrderV2| o.note.as_ref(), |o: &mut OrderV2, v| o.note = v)
        .object("venue", |o: &OrderV2| &o.venue, |o: &mut OrderV2, v| o.venue = v)
}

pub fn sample_order() -> Order {
    Order {
        id: 42,
        symbol: "ACME".to_string(),
        quantity: -150,
        note: Some("rush".to_string()),
    }
}

/// Virtual buffer of `size` bytes with a repeating pattern
pub fn patterned_buffer(size: usize, chunk_size: usize) -> VirtualBuffer {
    let mut buffer = VirtualBuffer::with_chunk_size(size, chunk_size).unwrap();
    let pattern: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    buffer.copy_from_slice(0, &pattern).unwrap();
    buffer
}

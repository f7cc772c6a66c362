//! Dynamic record surrogates
//!
//! A [`RecordSchema`] declares the members of a record type as named
//! (write, read, skip) triples. [`RecordSchema::derive`] turns it into a
//! [`RecordSurrogate`] that walks exactly the caller's `attribute_order`, so
//! the encoding never depends on declaration order.
//!
//! ## Wire Format
//!
//! Non-portable: member bodies back to back, no names or lengths. Writer and
//! reader must agree on the member list byte for byte.
//!
//! ```text
//! [body(m1)][body(m2)]...
//! ```
//!
//! Portable: every member is named and length-delimited.
//!
//! ```text
//! [memberCount: i16]([name: string][bodyLength: i32][body])*
//! ```
//!
//! Portable readers match members by name in any order, skip members they do
//! not declare, and leave members absent from the stream at `T::default()`.
//! A member body must be consumed exactly. Renaming a member or changing its
//! type is not tolerated.

use crate::codec::{ObjectReader, ObjectWriter};
use crate::surrogate::{downcast_value, Object, ShapeKind, Surrogate};
use compactwire_core::{CodecError, Primitive, Result, SubHandle, NO_SUBTYPE};
use std::any::{Any, TypeId};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

type WriteFn<T> = Arc<dyn Fn(&T, &mut ObjectWriter<'_>) -> Result<()> + Send + Sync>;
type ReadFn<T> = Arc<dyn Fn(&mut T, &mut ObjectReader<'_>) -> Result<()> + Send + Sync>;
type SkipFn = Arc<dyn Fn(&mut ObjectReader<'_>) -> Result<()> + Send + Sync>;

struct Member<T> {
    name: Arc<str>,
    write: WriteFn<T>,
    read: ReadFn<T>,
    skip: SkipFn,
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Member {
            name: Arc::clone(&self.name),
            write: Arc::clone(&self.write),
            read: Arc::clone(&self.read),
            skip: Arc::clone(&self.skip),
        }
    }
}

/// Member declarations for a record type
///
/// # Example
///
/// ```ignore
/// let schema = RecordSchema::<Order>::new()
///     .primitive("id", |o: &Order| &o.id, |o: &mut Order, v| o.id = v)
///     .object("lines", |o: &Order| &o.lines, |o: &mut Order, v| o.lines = v)
///     .optional("note", |o: &Order| o.note.as_ref(), |o: &mut Order, v| o.note = v);
/// registry.register_custom(&schema, 500, "orders", 0, &["id", "lines", "note"], false)?;
/// ```
pub struct RecordSchema<T> {
    members: Vec<Member<T>>,
}

impl<T> Clone for RecordSchema<T> {
    fn clone(&self) -> Self {
        RecordSchema {
            members: self.members.clone(),
        }
    }
}

impl<T: Default + Any + Send + Sync> Default for RecordSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + Any + Send + Sync> RecordSchema<T> {
    /// Create an empty schema
    pub fn new() -> Self {
        RecordSchema {
            members: Vec::new(),
        }
    }

    /// Declare a member with hand-written encoders.
    ///
    /// Redeclaring a name replaces the earlier declaration.
    pub fn member<W, R, S>(mut self, name: &str, write: W, read: R, skip: S) -> Self
    where
        W: Fn(&T, &mut ObjectWriter<'_>) -> Result<()> + Send + Sync + 'static,
        R: Fn(&mut T, &mut ObjectReader<'_>) -> Result<()> + Send + Sync + 'static,
        S: Fn(&mut ObjectReader<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let member = Member {
            name: Arc::from(name),
            write: Arc::new(write),
            read: Arc::new(read),
            skip: Arc::new(skip),
        };
        match self.members.iter_mut().find(|m| *m.name == *name) {
            Some(existing) => *existing = member,
            None => self.members.push(member),
        }
        self
    }

    /// Declare a member with a primitive encoding (no frame)
    pub fn primitive<P, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        P: Primitive,
        G: Fn(&T) -> &P + Send + Sync + 'static,
        S: Fn(&mut T, P) + Send + Sync + 'static,
    {
        self.member(
            name,
            move |record, writer| get(record).write_to(&mut **writer),
            move |record, reader| {
                set(record, P::read_from(&mut **reader)?);
                Ok(())
            },
            |reader| P::skip_in(&mut **reader),
        )
    }

    /// Declare a member written as a framed object
    pub fn object<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Any + Send + Sync,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.member(
            name,
            move |record, writer| writer.write_object(get(record)),
            move |record, reader| {
                set(record, reader.read_object_as::<V>()?);
                Ok(())
            },
            |reader| reader.skip_object(),
        )
    }

    /// Declare an optional member written as a framed object or the null frame
    pub fn optional<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Any + Send + Sync,
        G: Fn(&T) -> Option<&V> + Send + Sync + 'static,
        S: Fn(&mut T, Option<V>) + Send + Sync + 'static,
    {
        self.member(
            name,
            move |record, writer| writer.write_optional(get(record).map(|v| v as &dyn Any)),
            move |record, reader| {
                set(record, reader.read_optional_as::<V>()?);
                Ok(())
            },
            |reader| reader.skip_object(),
        )
    }

    /// Declared member names, in declaration order
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| &*m.name).collect()
    }

    /// Build a surrogate traversing `attribute_order`.
    ///
    /// # Errors
    ///
    /// `NoSurrogate` if a name is not declared, appears twice, or a portable
    /// record would have more members than fit the `i16` count.
    pub fn derive(
        &self,
        attribute_order: &[&str],
        portable: bool,
        sub_handle: SubHandle,
    ) -> Result<RecordSurrogate<T>> {
        let type_name = std::any::type_name::<T>();
        let mut ordered: Vec<Member<T>> = Vec::with_capacity(attribute_order.len());
        for name in attribute_order {
            if ordered.iter().any(|m| *m.name == **name) {
                return Err(CodecError::no_surrogate(
                    type_name,
                    format!("member '{}' appears twice in the attribute order", name),
                ));
            }
            let member = self
                .members
                .iter()
                .find(|m| *m.name == **name)
                .ok_or_else(|| {
                    CodecError::no_surrogate(
                        type_name,
                        format!("member '{}' is not declared", name),
                    )
                })?;
            ordered.push(member.clone());
        }
        if portable && ordered.len() > i16::MAX as usize {
            return Err(CodecError::no_surrogate(
                type_name,
                format!("{} members exceed the portable member count", ordered.len()),
            ));
        }
        Ok(RecordSurrogate {
            members: ordered,
            portable,
            sub_handle,
        })
    }
}

/// Surrogate derived from a [`RecordSchema`]
pub struct RecordSurrogate<T> {
    members: Vec<Member<T>>,
    portable: bool,
    sub_handle: SubHandle,
}

impl<T> RecordSurrogate<T> {
    /// True if the surrogate writes the portable format
    pub fn is_portable(&self) -> bool {
        self.portable
    }

    /// Subtype handle the surrogate was derived for
    pub fn sub_handle(&self) -> SubHandle {
        self.sub_handle
    }

    /// True if derived without a subtype handle
    pub fn is_unsubtyped(&self) -> bool {
        self.sub_handle == NO_SUBTYPE
    }

    /// Member names in wire order
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| &*m.name).collect()
    }

    fn write_portable(&self, record: &T, writer: &mut ObjectWriter<'_>) -> Result<()> {
        // derive() bounds the member count
        writer.write_i16(self.members.len() as i16)?;
        let memory = Arc::clone(writer.context().memory_manager());
        for member in &self.members {
            let mut body = memory.acquire(64);
            {
                let mut nested = writer.nested(&mut body);
                (member.write)(record, &mut nested)?;
            }
            writer.write_str(&member.name)?;
            writer.write_byte_buffer(Some(body.as_slice()))?;
            memory.release(body);
        }
        Ok(())
    }

    fn read_portable(&self, record: &mut T, reader: &mut ObjectReader<'_>) -> Result<()> {
        let count = read_member_count(reader)?;
        for _ in 0..count {
            let name = reader.read_str()?;
            let len = read_body_len(reader, &name)?;
            let Some(member) = self.members.iter().find(|m| *m.name == *name) else {
                debug!(
                    target: "compactwire::codec",
                    member = %name,
                    len,
                    "Skipping undeclared record member"
                );
                reader.skip_bytes(len as u64)?;
                continue;
            };

            let body = reader.read_raw(len)?;
            let mut cursor = Cursor::new(body.as_slice());
            {
                let mut nested = reader.nested(&mut cursor);
                (member.read)(record, &mut nested)?;
            }
            let consumed = cursor.position() as usize;
            if consumed != len {
                return Err(CodecError::invalid(format!(
                    "member '{}' consumed {} of {} bytes",
                    name, consumed, len
                )));
            }
            reader.memory_manager().release(body);
        }
        Ok(())
    }
}

fn read_member_count(reader: &mut ObjectReader<'_>) -> Result<usize> {
    let raw = reader.read_i16()?;
    usize::try_from(raw).map_err(|_| CodecError::invalid(format!("negative member count {}", raw)))
}

fn read_body_len(reader: &mut ObjectReader<'_>, name: &str) -> Result<usize> {
    let raw = reader.read_i32()?;
    let len = usize::try_from(raw).map_err(|_| {
        CodecError::invalid(format!("member '{}' has negative length {}", name, raw))
    })?;
    let limit = reader.limits().max_buffer_len;
    if len > limit {
        return Err(CodecError::invalid(format!(
            "member '{}' length {} exceeds limit {}",
            name, len, limit
        )));
    }
    Ok(len)
}

impl<T: Default + Any + Send + Sync> Surrogate for RecordSurrogate<T> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Record
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        let record = downcast_value::<T>(value)?;
        if self.portable {
            return self.write_portable(record, writer);
        }
        for member in &self.members {
            (member.write)(record, writer)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        let mut record = T::default();
        if self.portable {
            self.read_portable(&mut record, reader)?;
        } else {
            for member in &self.members {
                (member.read)(&mut record, reader)?;
            }
        }
        Ok(Box::new(record))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        if !self.portable {
            for member in &self.members {
                (member.skip)(reader)?;
            }
            return Ok(());
        }
        let count = read_member_count(reader)?;
        for _ in 0..count {
            reader.skip_length_prefixed()?;
            reader.skip_length_prefixed()?;
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for RecordSurrogate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSurrogate")
            .field("members", &self.member_names())
            .field("portable", &self.portable)
            .field("sub_handle", &self.sub_handle)
            .finish()
    }
}

//! Collection surrogates
//!
//! ## Wire Format
//!
//! ```text
//! array / list     [count: i32][framed element]*
//! map              [count: i32]([framed key][framed value])*
//! ```
//!
//! Elements, keys and values always carry their own frame, so a reader can
//! skip a collection whose element type it cannot decode.

use crate::codec::{ObjectReader, ObjectWriter};
use crate::surrogate::{downcast_value, Object, ShapeKind, Surrogate};
use compactwire_core::Result;
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

/// Largest element capacity reserved before any element is decoded
const PREALLOC_LIMIT: usize = 1024;

// =============================================================================
// Heterogeneous containers
// =============================================================================

/// Ordered list of objects of any registered types
#[derive(Default)]
pub struct ObjectList(pub Vec<Object>);

impl ObjectList {
    /// Create an empty list
    pub fn new() -> Self {
        ObjectList(Vec::new())
    }

    /// Append a value
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.0.push(Box::new(value));
    }

    /// Borrow element `index` as `T`
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.0.get(index).and_then(|item| item.downcast_ref::<T>())
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the list has no elements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ObjectList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectList").field("len", &self.0.len()).finish()
    }
}

/// Key/value pairs of any registered types, in insertion order
#[derive(Default)]
pub struct ObjectMap(pub Vec<(Object, Object)>);

impl ObjectMap {
    /// Create an empty map
    pub fn new() -> Self {
        ObjectMap(Vec::new())
    }

    /// Append an entry
    pub fn insert<K: Any + Send + Sync, V: Any + Send + Sync>(&mut self, key: K, value: V) {
        self.0.push((Box::new(key), Box::new(value)));
    }

    /// Borrow the value of the first entry whose key equals `key`
    pub fn get<K: Any + PartialEq, V: Any>(&self, key: &K) -> Option<&V> {
        self.0
            .iter()
            .find(|(k, _)| k.downcast_ref::<K>() == Some(key))
            .and_then(|(_, v)| v.downcast_ref::<V>())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ObjectMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectMap").field("len", &self.0.len()).finish()
    }
}

/// Surrogate for [`ObjectList`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectListSurrogate;

impl Surrogate for ObjectListSurrogate {
    fn source_type(&self) -> TypeId {
        TypeId::of::<ObjectList>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<ObjectList>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::ObjectList
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        let list = downcast_value::<ObjectList>(value)?;
        writer.write_count(list.0.len())?;
        for item in &list.0 {
            writer.write_object(&**item)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        let count = reader.read_count()?;
        let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            items.push(reader.read_object()?);
        }
        Ok(Box::new(ObjectList(items)))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        skip_framed(reader, 1)
    }
}

/// Surrogate for [`ObjectMap`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectMapSurrogate;

impl Surrogate for ObjectMapSurrogate {
    fn source_type(&self) -> TypeId {
        TypeId::of::<ObjectMap>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<ObjectMap>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::ObjectMap
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        let map = downcast_value::<ObjectMap>(value)?;
        writer.write_count(map.0.len())?;
        for (key, value) in &map.0 {
            writer.write_object(&**key)?;
            writer.write_object(&**value)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        let count = reader.read_count()?;
        let mut entries = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let key = reader.read_object()?;
            let value = reader.read_object()?;
            entries.push((key, value));
        }
        Ok(Box::new(ObjectMap(entries)))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        skip_framed(reader, 2)
    }
}

// =============================================================================
// Typed sequences
// =============================================================================

/// Surrogate for `Vec<T>`
pub struct ListSurrogate<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ListSurrogate<T> {
    /// Create the surrogate
    pub fn new() -> Self {
        ListSurrogate {
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Send + Sync> Default for ListSurrogate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any + Send + Sync> Surrogate for ListSurrogate<T> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<Vec<T>>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Vec<T>>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::List
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        write_elements(writer, downcast_value::<Vec<T>>(value)?)
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        Ok(Box::new(read_elements::<T>(reader)?))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        skip_framed(reader, 1)
    }
}

/// Surrogate for `Box<[T]>`
pub struct ArraySurrogate<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ArraySurrogate<T> {
    /// Create the surrogate
    pub fn new() -> Self {
        ArraySurrogate {
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Send + Sync> Default for ArraySurrogate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any + Send + Sync> Surrogate for ArraySurrogate<T> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<Box<[T]>>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Box<[T]>>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Array
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        write_elements(writer, downcast_value::<Box<[T]>>(value)?)
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        Ok(Box::new(read_elements::<T>(reader)?.into_boxed_slice()))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        skip_framed(reader, 1)
    }
}

fn write_elements<T: Any>(writer: &mut ObjectWriter<'_>, items: &[T]) -> Result<()> {
    writer.write_count(items.len())?;
    for item in items {
        writer.write_object(item)?;
    }
    Ok(())
}

fn read_elements<T: Any>(reader: &mut ObjectReader<'_>) -> Result<Vec<T>> {
    let count = reader.read_count()?;
    let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        items.push(reader.read_object_as::<T>()?);
    }
    Ok(items)
}

/// Skip `[count]` followed by `count * per_entry` framed objects
fn skip_framed(reader: &mut ObjectReader<'_>, per_entry: usize) -> Result<()> {
    let count = reader.read_count()?;
    for _ in 0..count * per_entry {
        reader.skip_object()?;
    }
    Ok(())
}

// =============================================================================
// Typed maps
// =============================================================================

/// Map types the generic map surrogate can encode
pub trait WireMap: Any + Send + Sync + Sized {
    /// Key type
    type Key: Any + Send + Sync;
    /// Value type
    type Value: Any + Send + Sync;

    /// Number of entries
    fn entry_count(&self) -> usize;

    /// Entries in iteration order
    fn entries(&self) -> Box<dyn Iterator<Item = (&Self::Key, &Self::Value)> + '_>;

    /// Empty map sized for about `capacity` entries
    fn with_entry_capacity(capacity: usize) -> Self;

    /// Insert one decoded entry
    fn insert_entry(&mut self, key: Self::Key, value: Self::Value);
}

impl<K, V, S> WireMap for HashMap<K, V, S>
where
    K: Eq + Hash + Any + Send + Sync,
    V: Any + Send + Sync,
    S: BuildHasher + Default + Any + Send + Sync,
{
    type Key = K;
    type Value = V;

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn with_entry_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, S::default())
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K, V> WireMap for BTreeMap<K, V>
where
    K: Ord + Any + Send + Sync,
    V: Any + Send + Sync,
{
    type Key = K;
    type Value = V;

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn with_entry_capacity(_capacity: usize) -> Self {
        BTreeMap::new()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K, V, S> WireMap for IndexMap<K, V, S>
where
    K: Eq + Hash + Any + Send + Sync,
    V: Any + Send + Sync,
    S: BuildHasher + Default + Any + Send + Sync,
{
    type Key = K;
    type Value = V;

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn with_entry_capacity(capacity: usize) -> Self {
        IndexMap::with_capacity_and_hasher(capacity, S::default())
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

/// Surrogate for any [`WireMap`]
pub struct MapSurrogate<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M: WireMap> MapSurrogate<M> {
    /// Create the surrogate
    pub fn new() -> Self {
        MapSurrogate {
            _marker: PhantomData,
        }
    }
}

impl<M: WireMap> Default for MapSurrogate<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: WireMap> Surrogate for MapSurrogate<M> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<M>()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Map
    }

    fn write(&self, writer: &mut ObjectWriter<'_>, value: &dyn Any) -> Result<()> {
        let map = downcast_value::<M>(value)?;
        writer.write_count(map.entry_count())?;
        for (key, value) in map.entries() {
            writer.write_object(key)?;
            writer.write_object(value)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut ObjectReader<'_>) -> Result<Object> {
        let count = reader.read_count()?;
        let mut map = M::with_entry_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let key = reader.read_object_as::<M::Key>()?;
            let value = reader.read_object_as::<M::Value>()?;
            map.insert_entry(key, value);
        }
        Ok(Box::new(map))
    }

    fn skip(&self, reader: &mut ObjectReader<'_>) -> Result<()> {
        skip_framed(reader, 2)
    }
}

//! Surrogate registry
//!
//! Namespace-partitioned catalog resolving an outgoing value's type, or an
//! incoming handle, to its bound surrogate.
//!
//! ## Layout
//!
//! Each cache context owns one immutable [`ContextTable`] indexed both by
//! source type and by `(handle, subHandle)`. Registration serialises on a
//! single mutex, clones the affected table, inserts, and publishes the new
//! table with one map insert. Lookups take an `Arc` snapshot and never
//! observe a half-built entry.
//!
//! ## Resolution Order
//!
//! Lookups search the named context first and fall back to the default
//! context (`""`). A handle the named context binds only with subtypes does
//! not fall back, so the decoder reads the subtype handle instead.
//!
//! ## Invariants
//!
//! - A `(handle, subHandle, context)` triple names at most one surrogate.
//! - A named context may reuse a default-context slot only for the same type.
//! - Within one context a type is bound to at most one handle pair.
//! - A handle is either subtyped or unsubtyped across a context and the
//!   default context, never both.
//! - Handle `-1` always resolves to the null surrogate.

use crate::builder::RecordSchema;
use crate::shape::Shape;
use crate::surrogate::{Null, Surrogate};
use crate::surrogates::{
    CompactSerializable, EnumSurrogate, NullSurrogate, ObjectList, ObjectMap,
    SelfDescribingSurrogate, WireEnum,
};
use bytes::Bytes;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use compactwire_core::{
    handles, is_default_context, CodecError, Decimal, Result, SubHandle, TypeHandle,
    VirtualBuffer, AUTO_HANDLE_START, DEFAULT_CONTEXT, NO_SUBTYPE,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// =============================================================================
// Bindings
// =============================================================================

/// A surrogate bound to a handle pair within one context
pub struct Binding {
    handle: TypeHandle,
    sub_handle: SubHandle,
    portable: bool,
    surrogate: Arc<dyn Surrogate>,
}

impl Binding {
    fn new(
        handle: TypeHandle,
        sub_handle: SubHandle,
        portable: bool,
        surrogate: Arc<dyn Surrogate>,
    ) -> Self {
        Binding {
            handle,
            sub_handle,
            portable,
            surrogate,
        }
    }

    /// Primary handle
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    /// Subtype handle, [`NO_SUBTYPE`] if none
    pub fn sub_handle(&self) -> SubHandle {
        self.sub_handle
    }

    /// True for record surrogates registered in portable mode
    pub fn is_portable(&self) -> bool {
        self.portable
    }

    /// Bound surrogate
    pub fn surrogate(&self) -> &Arc<dyn Surrogate> {
        &self.surrogate
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("handle", &self.handle)
            .field("sub_handle", &self.sub_handle)
            .field("portable", &self.portable)
            .field("type_name", &self.surrogate.type_name())
            .finish()
    }
}

/// Immutable snapshot of one context's bindings
#[derive(Clone, Default)]
struct ContextTable {
    by_type: FxHashMap<TypeId, Arc<Binding>>,
    by_handle: FxHashMap<(TypeHandle, SubHandle), Arc<Binding>>,
}

impl ContextTable {
    fn insert(&mut self, binding: Arc<Binding>) {
        self.by_type
            .insert(binding.surrogate.source_type(), Arc::clone(&binding));
        self.by_handle
            .insert((binding.handle, binding.sub_handle), binding);
    }

    fn primary(&self, handle: TypeHandle) -> Option<&Arc<Binding>> {
        self.by_handle.get(&(handle, NO_SUBTYPE))
    }

    /// Any binding on `handle` that carries a subtype
    fn subtyped(&self, handle: TypeHandle) -> Option<&Arc<Binding>> {
        self.by_handle
            .iter()
            .find(|((h, sub), _)| *h == handle && *sub != NO_SUBTYPE)
            .map(|(_, binding)| binding)
    }

    fn len(&self) -> usize {
        self.by_type.len()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Namespace-partitioned surrogate catalog
///
/// Owned by the application and shared by `Arc` with every [`Codec`](crate::Codec).
pub struct SurrogateRegistry {
    contexts: DashMap<String, Arc<ContextTable>>,
    /// Serialises registration; holds the next automatic handle
    next_auto: Mutex<TypeHandle>,
    null: Arc<Binding>,
}

impl std::fmt::Debug for SurrogateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrogateRegistry")
            .field("contexts", &self.contexts())
            .finish()
    }
}

impl Default for SurrogateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl SurrogateRegistry {
    /// Create a registry with no bindings besides null
    pub fn new() -> Self {
        SurrogateRegistry {
            contexts: DashMap::new(),
            next_auto: Mutex::new(AUTO_HANDLE_START),
            null: Arc::new(Binding::new(
                handles::NULL,
                NO_SUBTYPE,
                false,
                Arc::new(NullSurrogate),
            )),
        }
    }

    /// Create a registry with every intrinsic shape bound in the default context
    pub fn with_builtins() -> Self {
        let registry = Self::new();

        let mut table = ContextTable::default();
        table.insert(Arc::clone(&registry.null));
        for (handle, surrogate) in builtin_surrogates() {
            table.insert(Arc::new(Binding::new(handle, NO_SUBTYPE, false, surrogate)));
        }
        debug!(
            target: "compactwire::registry",
            count = table.len(),
            "Registered builtin surrogates"
        );
        registry
            .contexts
            .insert(DEFAULT_CONTEXT.to_string(), Arc::new(table));
        registry
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Bind a built-in shape in `context`.
    ///
    /// Uses the shape's intrinsic handle, or the next free automatic handle
    /// from [`AUTO_HANDLE_START`] for generic shapes. A type already bound in
    /// `context` is returned unchanged.
    pub fn register_builtin<T: Shape>(&self, context: &str) -> Result<Arc<Binding>> {
        let mut next_auto = self.next_auto.lock();
        let table = self.snapshot(context).unwrap_or_default();
        if let Some(existing) = table.by_type.get(&TypeId::of::<T>()) {
            debug!(
                target: "compactwire::registry",
                context,
                handle = existing.handle,
                "Builtin already registered"
            );
            return Ok(Arc::clone(existing));
        }

        let handle = match T::INTRINSIC_HANDLE {
            Some(handle) => handle,
            None => {
                let mut candidate = *next_auto;
                while self
                    .slot_conflict(&table, context, TypeId::of::<T>(), candidate, NO_SUBTYPE)
                    .is_some()
                {
                    candidate = candidate.checked_add(1).ok_or_else(|| {
                        CodecError::invalid("automatic type handles exhausted")
                    })?;
                }
                *next_auto = candidate.saturating_add(1);
                candidate
            }
        };
        self.insert_locked(T::surrogate(), handle, context, NO_SUBTYPE, false)
    }

    /// Bind a built-in shape to a caller-chosen handle in `context`
    pub fn register_builtin_with_handle<T: Shape>(
        &self,
        handle: TypeHandle,
        context: &str,
    ) -> Result<Arc<Binding>> {
        self.register(T::surrogate(), handle, context, NO_SUBTYPE, false)
    }

    /// Bind an enumeration in `context`
    pub fn register_enum<E: WireEnum>(
        &self,
        handle: TypeHandle,
        context: &str,
    ) -> Result<Arc<Binding>> {
        self.register(
            Arc::new(EnumSurrogate::<E>::new()),
            handle,
            context,
            NO_SUBTYPE,
            false,
        )
    }

    /// Bind a self-describing type in `context`
    pub fn register_self_describing<T: CompactSerializable>(
        &self,
        handle: TypeHandle,
        context: &str,
    ) -> Result<Arc<Binding>> {
        self.register(
            Arc::new(SelfDescribingSurrogate::<T>::new()),
            handle,
            context,
            NO_SUBTYPE,
            false,
        )
    }

    /// Derive a record surrogate from `schema` and bind it in `context`.
    ///
    /// # Errors
    ///
    /// `NoSurrogate` if `attribute_order` names an undeclared member or
    /// repeats one; otherwise the errors of [`SurrogateRegistry::register`].
    pub fn register_custom<T: Default + Any + Send + Sync>(
        &self,
        schema: &RecordSchema<T>,
        handle: TypeHandle,
        context: &str,
        sub_handle: SubHandle,
        attribute_order: &[&str],
        portable: bool,
    ) -> Result<Arc<Binding>> {
        let surrogate = schema
            .derive(attribute_order, portable, sub_handle)
            .map_err(|e| {
                warn!(
                    target: "compactwire::registry",
                    context,
                    handle,
                    error = %e,
                    "Record derivation failed"
                );
                e
            })?;
        self.register(Arc::new(surrogate), handle, context, sub_handle, portable)
    }

    /// Bind `surrogate` to `(handle, sub_handle)` in `context`.
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered` if the type is bound to another handle pair in
    ///   `context`; the same pair is a no-op
    /// - `HandleConflict` if the pair is taken by another type in `context`
    ///   or in a context it shares resolution with, the handle is the
    ///   reserved null handle, or subtyped and unsubtyped bindings would
    ///   share the handle
    pub fn register(
        &self,
        surrogate: Arc<dyn Surrogate>,
        handle: TypeHandle,
        context: &str,
        sub_handle: SubHandle,
        portable: bool,
    ) -> Result<Arc<Binding>> {
        let _guard = self.next_auto.lock();
        self.insert_locked(surrogate, handle, context, sub_handle, portable)
    }

    /// Remove every binding of `context`; returns how many were removed.
    ///
    /// # Errors
    ///
    /// `InvalidData` for the default context, which is never cleared.
    pub fn unregister_context(&self, context: &str) -> Result<usize> {
        if is_default_context(context) {
            return Err(CodecError::invalid("the default context cannot be unregistered"));
        }
        let _guard = self.next_auto.lock();
        let removed = self
            .contexts
            .remove(context)
            .map(|(_, table)| table.len())
            .unwrap_or(0);
        info!(target: "compactwire::registry", context, removed, "Unregistered context");
        Ok(removed)
    }

    fn insert_locked(
        &self,
        surrogate: Arc<dyn Surrogate>,
        handle: TypeHandle,
        context: &str,
        sub_handle: SubHandle,
        portable: bool,
    ) -> Result<Arc<Binding>> {
        let type_name = surrogate.type_name();
        let source_type = surrogate.source_type();
        let table = self.snapshot(context).unwrap_or_default();

        if let Some(existing) = table.by_type.get(&source_type) {
            if existing.handle == handle && existing.sub_handle == sub_handle {
                debug!(
                    target: "compactwire::registry",
                    context,
                    handle,
                    sub_handle,
                    type_name,
                    "Already registered"
                );
                return Ok(Arc::clone(existing));
            }
            warn!(
                target: "compactwire::registry",
                context,
                handle,
                sub_handle,
                type_name,
                "Type already registered with a different handle"
            );
            return Err(CodecError::AlreadyRegistered {
                type_name: type_name.to_string(),
                context: context.to_string(),
                existing: existing.handle,
                existing_sub: existing.sub_handle,
                requested: handle,
                requested_sub: sub_handle,
            });
        }

        if let Some(err) = self.slot_conflict(&table, context, source_type, handle, sub_handle) {
            warn!(
                target: "compactwire::registry",
                context,
                handle,
                sub_handle,
                type_name,
                error = %err,
                "Handle conflict"
            );
            return Err(err);
        }

        let kind = surrogate.kind();
        let binding = Arc::new(Binding::new(handle, sub_handle, portable, surrogate));
        let mut updated = (*table).clone();
        updated.insert(Arc::clone(&binding));
        self.contexts.insert(context.to_string(), Arc::new(updated));

        info!(
            target: "compactwire::registry",
            context,
            handle,
            sub_handle,
            type_name,
            kind = kind.name(),
            "Registered surrogate"
        );
        Ok(binding)
    }

    /// Why `(handle, sub_handle)` cannot be bound to `source_type` in
    /// `context`, if it cannot
    fn slot_conflict(
        &self,
        table: &ContextTable,
        context: &str,
        source_type: TypeId,
        handle: TypeHandle,
        sub_handle: SubHandle,
    ) -> Option<CodecError> {
        let conflict = |existing_type: &str| CodecError::HandleConflict {
            handle,
            sub_handle,
            context: context.to_string(),
            existing_type: existing_type.to_string(),
        };

        if handle == handles::NULL {
            return Some(conflict(std::any::type_name::<Null>()));
        }
        if let Some(occupant) = table.by_handle.get(&(handle, sub_handle)) {
            return Some(conflict(occupant.surrogate.type_name()));
        }

        let related: Vec<Arc<ContextTable>> = if is_default_context(context) {
            self.contexts.iter().map(|e| Arc::clone(e.value())).collect()
        } else {
            self.snapshot(DEFAULT_CONTEXT).into_iter().collect()
        };

        // Encoding falls back to the default context while decoding tries the
        // named context first, so a slot shared between the two must name
        // the same type.
        for t in &related {
            if let Some(occupant) = t.by_handle.get(&(handle, sub_handle)) {
                if occupant.surrogate.source_type() != source_type {
                    return Some(conflict(occupant.surrogate.type_name()));
                }
            }
        }

        // The frame only carries a subtype handle when primary resolution
        // fails, so one handle cannot be both subtyped and unsubtyped where
        // the two could meet during resolution.
        let tables = std::iter::once(table).chain(related.iter().map(|t| t.as_ref()));
        for t in tables {
            let clash = if sub_handle == NO_SUBTYPE {
                t.subtyped(handle)
            } else {
                t.primary(handle)
            };
            if let Some(other) = clash {
                return Some(conflict(other.surrogate.type_name()));
            }
        }
        None
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Surrogate for an outgoing value.
    ///
    /// # Errors
    ///
    /// `NoSurrogate` if the value's type is bound in neither `context` nor
    /// the default context.
    pub fn resolve_for_value(&self, value: &dyn Any, context: &str) -> Result<Arc<Binding>> {
        let type_id = value.type_id();
        self.resolve_for_type(type_id, context).ok_or_else(|| {
            CodecError::no_surrogate(
                format!("{:?}", type_id),
                format!("not registered in context '{}' or the default context", context),
            )
        })
    }

    /// Surrogate for a source type, with default-context fallback
    pub fn resolve_for_type(&self, type_id: TypeId, context: &str) -> Option<Arc<Binding>> {
        if type_id == TypeId::of::<Null>() {
            return Some(Arc::clone(&self.null));
        }
        self.lookup(context, |table| table.by_type.get(&type_id).cloned())
    }

    /// Surrogate bound to `handle` without a subtype
    pub fn resolve_for_handle(&self, handle: TypeHandle, context: &str) -> Option<Arc<Binding>> {
        if handle == handles::NULL {
            return Some(Arc::clone(&self.null));
        }
        if let Some(table) = self.snapshot(context) {
            if let Some(binding) = table.primary(handle) {
                return Some(Arc::clone(binding));
            }
            if table.subtyped(handle).is_some() {
                return None;
            }
        }
        if is_default_context(context) {
            return None;
        }
        self.snapshot(DEFAULT_CONTEXT)
            .and_then(|table| table.primary(handle).cloned())
    }

    /// Surrogate bound to `(handle, sub_handle)`
    pub fn resolve_for_sub_handle(
        &self,
        handle: TypeHandle,
        sub_handle: SubHandle,
        context: &str,
    ) -> Option<Arc<Binding>> {
        self.lookup(context, |table| table.by_handle.get(&(handle, sub_handle)).cloned())
    }

    /// Binding of a source type in exactly `context`, no fallback
    pub fn resolve_strict(&self, type_id: TypeId, context: &str) -> Option<Arc<Binding>> {
        self.snapshot(context)
            .and_then(|table| table.by_type.get(&type_id).cloned())
    }

    /// True if `T` is bound in exactly `context`
    pub fn is_registered<T: Any>(&self, context: &str) -> bool {
        self.resolve_strict(TypeId::of::<T>(), context).is_some()
    }

    /// Names of all contexts with bindings, sorted
    pub fn contexts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contexts.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of types bound in exactly `context`
    pub fn len(&self, context: &str) -> usize {
        self.snapshot(context).map_or(0, |table| table.len())
    }

    fn snapshot(&self, context: &str) -> Option<Arc<ContextTable>> {
        self.contexts.get(context).map(|entry| Arc::clone(entry.value()))
    }

    fn lookup<F>(&self, context: &str, find: F) -> Option<Arc<Binding>>
    where
        F: Fn(&ContextTable) -> Option<Arc<Binding>>,
    {
        if let Some(found) = self.snapshot(context).and_then(|table| find(&table)) {
            return Some(found);
        }
        if is_default_context(context) {
            return None;
        }
        self.snapshot(DEFAULT_CONTEXT).and_then(|table| find(&table))
    }
}

fn builtin_surrogates() -> Vec<(TypeHandle, Arc<dyn Surrogate>)> {
    fn entry<T: Shape>(handle: TypeHandle) -> (TypeHandle, Arc<dyn Surrogate>) {
        (handle, T::surrogate())
    }

    vec![
        entry::<bool>(handles::BOOL),
        entry::<i8>(handles::I8),
        entry::<u8>(handles::U8),
        entry::<i16>(handles::I16),
        entry::<u16>(handles::U16),
        entry::<i32>(handles::I32),
        entry::<u32>(handles::U32),
        entry::<i64>(handles::I64),
        entry::<u64>(handles::U64),
        entry::<f32>(handles::F32),
        entry::<f64>(handles::F64),
        entry::<Decimal>(handles::DECIMAL),
        entry::<NaiveDateTime>(handles::DATETIME),
        entry::<DateTime<FixedOffset>>(handles::DATETIME_OFFSET),
        entry::<Duration>(handles::TIMESPAN),
        entry::<Uuid>(handles::GUID),
        entry::<String>(handles::STRING),
        entry::<Bytes>(handles::BYTES),
        entry::<VirtualBuffer>(handles::VIRTUAL_BUFFER),
        entry::<ObjectList>(handles::OBJECT_LIST),
        entry::<ObjectMap>(handles::OBJECT_MAP),
    ]
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type dispatch tables.
//!
//! A [`DispatchTable`] bundles every type-specific operation a variant needs
//! (access, destroy, release, clone, export, import, compare) plus the
//! type's flags. Tables are built by an explicit factory,
//! [`DispatchTable::of`], which picks the inline or boxed function set from
//! [`Shape::of`] and interns the result, so exactly one table exists per
//! concrete type for the whole process. Comparing table addresses is therefore
//! equivalent to comparing type identities.

use super::storage::{Shape, Storage};
use crate::convert::Intermediate;
use crate::error::{VariantError, VariantResult};
use crate::identity::{identity_of, TypeIdentity};
use crate::value::{Value, ValueClass};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr;
use std::sync::OnceLock;

/// Function bundle shared by every variant holding one concrete type.
pub struct DispatchTable {
    identity: TypeIdentity,
    type_id: Option<TypeId>,
    type_name: &'static str,
    label: fn() -> Cow<'static, str>,
    shape: Shape,
    size: usize,
    class: ValueClass,
    structural_eq: bool,

    access: unsafe fn(&Storage) -> *const u8,
    access_mut: unsafe fn(&mut Storage) -> *mut u8,
    destroy: unsafe fn(&mut Storage),
    release: unsafe fn(&mut Storage),
    clone: unsafe fn(*const u8) -> Storage,
    export: unsafe fn(*const u8) -> VariantResult<String>,
    import: unsafe fn(*mut u8, &Intermediate) -> VariantResult<()>,
    compare: unsafe fn(*const u8, *const u8) -> bool,
    as_any: unsafe fn(*const u8) -> *const dyn Any,
    as_any_mut: unsafe fn(*mut u8) -> *mut dyn Any,
}

static EMPTY: DispatchTable = DispatchTable {
    identity: TypeIdentity::NIL,
    type_id: None,
    type_name: "",
    label: empty::label,
    shape: Shape::Empty,
    size: 0,
    class: ValueClass::Composite,
    structural_eq: true,
    access: empty::access,
    access_mut: empty::access_mut,
    destroy: empty::destroy,
    release: empty::destroy,
    clone: empty::clone,
    export: empty::export,
    import: empty::import,
    compare: empty::compare,
    as_any: empty::as_any,
    as_any_mut: empty::as_any_mut,
};

fn interned() -> &'static DashMap<TypeId, &'static DispatchTable> {
    static TABLES: OnceLock<DashMap<TypeId, &'static DispatchTable>> = OnceLock::new();
    TABLES.get_or_init(DashMap::new)
}

impl DispatchTable {
    /// Return the unique table for `T`, building it on first use.
    pub fn of<T: Value>() -> &'static DispatchTable {
        let tables = interned();
        let key = TypeId::of::<T>();
        if let Some(hit) = tables.get(&key) {
            return *hit;
        }

        let table: &'static DispatchTable = *tables.entry(key).or_insert_with(|| {
            let built = Self::build::<T>();
            log::debug!(
                "[DispatchTable] built {:?} table for {} ({} bytes)",
                built.shape,
                built.type_name,
                built.size
            );
            Box::leak(Box::new(built))
        });
        table
    }

    /// The empty sentinel table.
    #[inline]
    pub fn empty() -> &'static DispatchTable {
        &EMPTY
    }

    fn build<T: Value>() -> DispatchTable {
        let shape = Shape::of::<T>();
        let ops = match shape {
            Shape::Inline => inline::ops::<T>(),
            _ => boxed::ops::<T>(),
        };

        let compare: unsafe fn(*const u8, *const u8) -> bool = if T::EQUALITY.is_some() {
            compare_structural::<T>
        } else {
            compare_address
        };

        DispatchTable {
            identity: identity_of::<T>(),
            type_id: Some(TypeId::of::<T>()),
            type_name: std::any::type_name::<T>(),
            label: T::type_label,
            shape,
            size: std::mem::size_of::<T>(),
            class: T::CLASS,
            structural_eq: T::EQUALITY.is_some(),
            access: ops.access,
            access_mut: ops.access_mut,
            destroy: ops.destroy,
            release: ops.release,
            clone: ops.clone,
            export: export::<T>,
            import: import::<T>,
            compare,
            as_any: as_any::<T>,
            as_any_mut: as_any_mut::<T>,
        }
    }

    /// Identity of the payload type (`TypeIdentity::NIL` for the empty table).
    #[inline]
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Fully qualified Rust type name (empty for the empty table).
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Human-readable label (see [`Value::type_label`]).
    pub fn label(&self) -> Cow<'static, str> {
        (self.label)()
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Payload size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn class(&self) -> ValueClass {
        self.class
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        ptr::eq(self, &EMPTY)
    }

    #[inline]
    pub fn is_plain_data(&self) -> bool {
        self.class.is_plain_data()
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        self.class.is_number()
    }

    /// True when `compare` uses the type's own equality.
    #[inline]
    pub fn has_structural_eq(&self) -> bool {
        self.structural_eq
    }

    #[inline]
    pub(crate) fn is_type(&self, type_id: TypeId) -> bool {
        self.type_id == Some(type_id)
    }

    // -----------------------------------------------------------------------
    // Erased entry points. Callers guarantee the storage/pointers belong to
    // this table's type.
    // -----------------------------------------------------------------------

    #[inline]
    pub(crate) unsafe fn access(&self, storage: &Storage) -> *const u8 {
        (self.access)(storage)
    }

    #[inline]
    pub(crate) unsafe fn access_mut(&self, storage: &mut Storage) -> *mut u8 {
        (self.access_mut)(storage)
    }

    #[inline]
    pub(crate) unsafe fn destroy(&self, storage: &mut Storage) {
        (self.destroy)(storage)
    }

    #[inline]
    pub(crate) unsafe fn release(&self, storage: &mut Storage) {
        (self.release)(storage)
    }

    #[inline]
    pub(crate) unsafe fn clone_payload(&self, payload: *const u8) -> Storage {
        (self.clone)(payload)
    }

    #[inline]
    pub(crate) unsafe fn export(&self, payload: *const u8) -> VariantResult<String> {
        (self.export)(payload)
    }

    #[inline]
    pub(crate) unsafe fn import(&self, payload: *mut u8, repr: &Intermediate) -> VariantResult<()> {
        (self.import)(payload, repr)
    }

    #[inline]
    pub(crate) unsafe fn compare(&self, a: *const u8, b: *const u8) -> bool {
        (self.compare)(a, b)
    }

    #[inline]
    pub(crate) unsafe fn as_any(&self, payload: *const u8) -> *const dyn Any {
        (self.as_any)(payload)
    }

    #[inline]
    pub(crate) unsafe fn as_any_mut(&self, payload: *mut u8) -> *mut dyn Any {
        (self.as_any_mut)(payload)
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("type_name", &self.type_name)
            .field("identity", &self.identity)
            .field("shape", &self.shape)
            .field("size", &self.size)
            .field("class", &self.class)
            .field("structural_eq", &self.structural_eq)
            .finish()
    }
}

/// Storage-dependent half of a table.
struct ShapeOps {
    access: unsafe fn(&Storage) -> *const u8,
    access_mut: unsafe fn(&mut Storage) -> *mut u8,
    destroy: unsafe fn(&mut Storage),
    release: unsafe fn(&mut Storage),
    clone: unsafe fn(*const u8) -> Storage,
}

// ---------------------------------------------------------------------------
// Inline shape
// ---------------------------------------------------------------------------

mod inline {
    use super::*;

    pub(super) fn ops<T: Clone>() -> ShapeOps {
        ShapeOps {
            access,
            access_mut,
            destroy: destroy::<T>,
            release,
            clone: clone::<T>,
        }
    }

    pub(super) unsafe fn access(storage: &Storage) -> *const u8 {
        match storage {
            Storage::Inline(buf) => buf.as_ptr(),
            Storage::Borrowed(p) => p.as_ptr().cast_const(),
            _ => ptr::null(),
        }
    }

    pub(super) unsafe fn access_mut(storage: &mut Storage) -> *mut u8 {
        match storage {
            Storage::Inline(buf) => buf.as_mut_ptr(),
            _ => ptr::null_mut(),
        }
    }

    pub(super) unsafe fn destroy<T>(storage: &mut Storage) {
        if let Storage::Inline(buf) = storage {
            ptr::drop_in_place(buf.as_mut_ptr().cast::<T>());
        }
        *storage = Storage::Empty;
    }

    pub(super) unsafe fn release(storage: &mut Storage) {
        *storage = Storage::Empty;
    }

    pub(super) unsafe fn clone<T: Clone>(payload: *const u8) -> Storage {
        Storage::inline((*payload.cast::<T>()).clone())
    }
}

// ---------------------------------------------------------------------------
// Boxed shape
// ---------------------------------------------------------------------------

mod boxed {
    use super::*;

    pub(super) fn ops<T: Clone>() -> ShapeOps {
        ShapeOps {
            access,
            access_mut,
            destroy: destroy::<T>,
            release: release::<T>,
            clone: clone::<T>,
        }
    }

    pub(super) unsafe fn access(storage: &Storage) -> *const u8 {
        match storage {
            Storage::Heap(p) | Storage::Borrowed(p) => p.as_ptr().cast_const(),
            _ => ptr::null(),
        }
    }

    pub(super) unsafe fn access_mut(storage: &mut Storage) -> *mut u8 {
        match storage {
            Storage::Heap(p) => p.as_ptr(),
            _ => ptr::null_mut(),
        }
    }

    pub(super) unsafe fn destroy<T>(storage: &mut Storage) {
        if let Storage::Heap(p) = storage {
            drop(Box::from_raw(p.as_ptr().cast::<T>()));
        }
        *storage = Storage::Empty;
    }

    /// Free the block without running `T`'s destructor (payload moved out).
    pub(super) unsafe fn release<T>(storage: &mut Storage) {
        if let Storage::Heap(p) = storage {
            drop(Box::from_raw(p.as_ptr().cast::<ManuallyDrop<T>>()));
        }
        *storage = Storage::Empty;
    }

    pub(super) unsafe fn clone<T: Clone>(payload: *const u8) -> Storage {
        Storage::boxed((*payload.cast::<T>()).clone())
    }
}

// ---------------------------------------------------------------------------
// Empty sentinel
// ---------------------------------------------------------------------------

mod empty {
    use super::*;

    pub(super) fn label() -> Cow<'static, str> {
        Cow::Borrowed("")
    }

    pub(super) unsafe fn access(_: &Storage) -> *const u8 {
        ptr::null()
    }

    pub(super) unsafe fn access_mut(_: &mut Storage) -> *mut u8 {
        ptr::null_mut()
    }

    pub(super) unsafe fn destroy(storage: &mut Storage) {
        *storage = Storage::Empty;
    }

    pub(super) unsafe fn clone(_: *const u8) -> Storage {
        Storage::Empty
    }

    pub(super) unsafe fn export(_: *const u8) -> VariantResult<String> {
        Err(VariantError::not_allowed("<empty>"))
    }

    pub(super) unsafe fn import(_: *mut u8, _: &Intermediate) -> VariantResult<()> {
        Err(VariantError::not_allowed("<empty>"))
    }

    pub(super) unsafe fn compare(_: *const u8, _: *const u8) -> bool {
        true
    }

    // Never dereferenced: variants check for an empty payload first.
    pub(super) unsafe fn as_any(_: *const u8) -> *const dyn Any {
        ptr::null::<()>() as *const dyn Any
    }

    pub(super) unsafe fn as_any_mut(_: *mut u8) -> *mut dyn Any {
        ptr::null_mut::<()>() as *mut dyn Any
    }
}

// ---------------------------------------------------------------------------
// Shape-independent entries
// ---------------------------------------------------------------------------

unsafe fn export<T: Value>(payload: *const u8) -> VariantResult<String> {
    (*payload.cast::<T>()).export()
}

unsafe fn import<T: Value>(payload: *mut u8, repr: &Intermediate) -> VariantResult<()> {
    (*payload.cast::<T>()).import(repr)
}

unsafe fn as_any<T: Value>(payload: *const u8) -> *const dyn Any {
    payload.cast::<T>() as *const dyn Any
}

unsafe fn as_any_mut<T: Value>(payload: *mut u8) -> *mut dyn Any {
    payload.cast::<T>() as *mut dyn Any
}

unsafe fn compare_structural<T: Value>(a: *const u8, b: *const u8) -> bool {
    match T::EQUALITY {
        Some(eq) => eq(&*a.cast::<T>(), &*b.cast::<T>()),
        None => ptr::eq(a, b),
    }
}

// Types without an equality only compare equal to the very same payload.
unsafe fn compare_address(a: *const u8, b: *const u8) -> bool {
    ptr::eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Opaque(#[allow(dead_code)] u8);
    impl Value for Opaque {}

    #[derive(Clone, PartialEq)]
    struct Wide([u64; 8]);
    impl Value for Wide {
        const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<Wide as PartialEq>::eq);
    }

    #[test]
    fn test_one_table_per_type() {
        let a = DispatchTable::of::<u32>();
        let b = DispatchTable::of::<u32>();
        assert!(ptr::eq(a, b));
        assert!(!ptr::eq(a, DispatchTable::of::<i32>()));
    }

    #[test]
    fn test_table_shape_and_flags() {
        let small = DispatchTable::of::<u16>();
        assert_eq!(small.shape(), Shape::Inline);
        assert!(small.is_plain_data());
        assert!(small.is_number());
        assert!(small.has_structural_eq());
        assert_eq!(small.identity(), identity_of::<u16>());

        let wide = DispatchTable::of::<Wide>();
        assert_eq!(wide.shape(), Shape::Boxed);
        assert!(!wide.is_plain_data());
        assert_eq!(wide.size(), 64);

        let opaque = DispatchTable::of::<Opaque>();
        assert!(!opaque.has_structural_eq());
    }

    #[test]
    fn test_empty_table() {
        let empty = DispatchTable::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.shape(), Shape::Empty);
        assert!(empty.identity().is_nil());
        assert_eq!(empty.label(), "");
        assert!(!DispatchTable::of::<u8>().is_empty());
    }

    #[test]
    fn test_clone_and_destroy_boxed() {
        let table = DispatchTable::of::<Wide>();
        let mut original = Storage::store(Wide([3; 8]));
        unsafe {
            let copy_ptr = table.access(&original);
            let mut copy = table.clone_payload(copy_ptr);
            assert!(matches!(copy, Storage::Heap(_)));
            assert!(table.compare(table.access(&original), table.access(&copy)));
            assert_ne!(table.access(&original), table.access(&copy));
            table.destroy(&mut copy);
            table.destroy(&mut original);
        }
        assert!(matches!(original, Storage::Empty));
    }

    #[test]
    fn test_address_compare_fallback() {
        let table = DispatchTable::of::<Opaque>();
        let mut a = Storage::store(Opaque(1));
        let mut b = Storage::store(Opaque(1));
        unsafe {
            let pa = table.access(&a);
            assert!(table.compare(pa, pa));
            assert!(!table.compare(pa, table.access(&b)));
            table.destroy(&mut a);
            table.destroy(&mut b);
        }
    }
}

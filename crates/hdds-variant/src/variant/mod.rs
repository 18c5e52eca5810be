// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Variant - type-erased value container.
//!
//! A [`Variant`] is a dispatch table reference plus storage. Small payloads
//! (`<= INLINE_CAPACITY` bytes) live inline; larger ones are boxed. The
//! ownership policy is a type parameter:
//!
//! - [`Owned`] (default): the variant owns a private copy. Cloning clones the
//!   payload, dropping destroys it.
//! - [`Alias`]: the variant references caller-owned storage. Cloning copies
//!   the reference, dropping leaves the payload alone. Never allocates.
//!
//! Reads check the exact type first. Only [`Variant::like`] falls back to the
//! conversion bridge on a mismatch.
//!
//! # Example
//!
//! ```
//! use hdds_variant::Variant;
//!
//! let v = Variant::new(42i32);
//! assert!(v.is_exactly::<i32>());
//! assert_eq!(v.extract_if::<i32>(), Some(&42));
//! assert_eq!(v.extract_if::<i64>(), None);
//!
//! // Heavy conversion through the global registry.
//! let text: String = v.like().unwrap();
//! assert_eq!(text, "42");
//! ```

mod dispatch;
mod storage;

pub use dispatch::DispatchTable;
pub use storage::Shape;

use crate::convert;
use crate::error::VariantResult;
use crate::identity::TypeIdentity;
use crate::registry::Registry;
use crate::value::Value;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use storage::Storage;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Owned {}
    impl Sealed for super::Alias<'_> {}
}

/// Ownership policy of a variant.
pub trait Policy: sealed::Sealed {
    /// True when the variant owns (and destroys) its payload.
    const OWNS: bool;
}

/// Copy policy: the variant owns a private copy of the payload.
#[derive(Debug)]
pub enum Owned {}

/// Alias policy: the variant references storage owned elsewhere for `'a`.
#[derive(Debug)]
pub struct Alias<'a>(PhantomData<&'a ()>);

impl Policy for Owned {
    const OWNS: bool = true;
}

impl Policy for Alias<'_> {
    const OWNS: bool = false;
}

/// Type-erased value container.
pub struct Variant<P: Policy = Owned> {
    table: &'static DispatchTable,
    storage: Storage,
    _policy: PhantomData<P>,
}

// SAFETY: every payload type is `Send + Sync` (required by `Value`), and an
// alias only hands out shared references to its target.
unsafe impl<P: Policy> Send for Variant<P> {}
unsafe impl<P: Policy> Sync for Variant<P> {}

impl Variant<Owned> {
    /// Store a private copy of `value`.
    pub fn new<T: Value>(value: T) -> Self {
        Self {
            table: DispatchTable::of::<T>(),
            storage: Storage::store(value),
            _policy: PhantomData,
        }
    }

    /// The empty variant.
    #[inline]
    pub fn empty() -> Self {
        Self {
            table: DispatchTable::empty(),
            storage: Storage::Empty,
            _policy: PhantomData,
        }
    }

    /// Mutable reference to the payload iff it is exactly `T`.
    pub fn extract_if_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if !self.table.is_type(TypeId::of::<T>()) {
            return None;
        }
        // SAFETY: the table matches T and owned storage is inline or heap.
        unsafe {
            let payload = self.table.access_mut(&mut self.storage);
            NonNull::new(payload).map(|p| &mut *p.as_ptr().cast::<T>())
        }
    }

    /// Replace the payload; the old one is destroyed.
    pub fn set<T: Value>(&mut self, value: T) {
        *self = Variant::new(value);
    }

    /// Move the payload out iff it is exactly `T`; otherwise give the variant back.
    pub fn take<T: Value>(self) -> Result<T, Self> {
        if !self.is_exactly::<T>() {
            return Err(self);
        }
        let mut this = ManuallyDrop::new(self);
        // SAFETY: type checked above; the payload is read exactly once and the
        // storage released without running the destructor again.
        unsafe {
            let value = ptr::read(this.table.access(&this.storage).cast::<T>());
            let table = this.table;
            table.release(&mut this.storage);
            Ok(value)
        }
    }

    /// Reset to the empty variant, destroying the payload.
    pub fn clear(&mut self) {
        *self = Variant::empty();
    }

    /// Overwrite the payload from an intermediate block.
    ///
    /// Used by descriptors to fill a default-constructed variant.
    pub(crate) fn import_raw(&mut self, repr: &convert::Intermediate) -> VariantResult<()> {
        let table = self.table;
        // SAFETY: pointer comes from this variant's own table and storage.
        unsafe {
            let payload = table.access_mut(&mut self.storage);
            if payload.is_null() {
                return Err(crate::error::VariantError::not_allowed("<empty>"));
            }
            table.import(payload, repr)
        }
    }

    pub(crate) fn payload_any_mut(&mut self) -> Option<&mut (dyn Any + 'static)> {
        let table = self.table;
        // SAFETY: pointer comes from this variant's own table and storage.
        unsafe {
            let payload = table.access_mut(&mut self.storage);
            if payload.is_null() {
                return None;
            }
            Some(&mut *table.as_any_mut(payload))
        }
    }
}

impl<'a> Variant<Alias<'a>> {
    /// Reference `value` without copying it.
    pub fn alias<T: Value>(value: &'a T) -> Self {
        Self {
            table: DispatchTable::of::<T>(),
            storage: Storage::borrowed(value),
            _policy: PhantomData,
        }
    }

    /// The empty alias.
    #[inline]
    pub fn empty_alias() -> Self {
        Self {
            table: DispatchTable::empty(),
            storage: Storage::Empty,
            _policy: PhantomData,
        }
    }

    /// Shared reference to the aliased payload, valid for `'a`.
    pub fn extract_ref<T: 'static>(&self) -> Option<&'a T> {
        if !self.table.is_type(TypeId::of::<T>()) {
            return None;
        }
        match self.storage {
            // SAFETY: built from a `&'a T` in `alias`.
            Storage::Borrowed(p) => Some(unsafe { &*p.as_ptr().cast::<T>() }),
            _ => None,
        }
    }
}

impl<P: Policy> Variant<P> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// True iff the payload is exactly `T`. Never converts.
    #[inline]
    pub fn is_exactly<T: 'static>(&self) -> bool {
        self.table.is_type(TypeId::of::<T>())
    }

    /// Reference to the payload iff it is exactly `T`. Never converts.
    pub fn extract_if<T: 'static>(&self) -> Option<&T> {
        if !self.is_exactly::<T>() {
            return None;
        }
        let payload = self.payload_ptr();
        // SAFETY: the table matches T; the pointer targets a live T.
        (!payload.is_null()).then(|| unsafe { &*payload.cast::<T>() })
    }

    /// Copy the payload into `out` iff it is exactly `T`; `out` is untouched otherwise.
    pub fn extract_to<T: Clone + 'static>(&self, out: &mut T) -> bool {
        match self.extract_if::<T>() {
            Some(value) => {
                out.clone_from(value);
                true
            }
            None => false,
        }
    }

    /// Read the payload as `T`, converting through the global registry on a mismatch.
    pub fn like<T: Value>(&self) -> VariantResult<T> {
        self.like_in(Registry::global())
    }

    /// Read the payload as `T`, converting through `registry` on a mismatch.
    pub fn like_in<T: Value>(&self, registry: &Registry) -> VariantResult<T> {
        if let Some(value) = self.extract_if::<T>() {
            return Ok(value.clone());
        }
        convert::convert::<T, P>(self, registry)
    }

    /// Plain data (numbers, enumerations, `bool`, `char`).
    #[inline]
    pub fn is_pod(&self) -> bool {
        self.table.is_plain_data()
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        self.table.is_number()
    }

    /// Human-readable name of the payload type (empty for the empty variant).
    pub fn type_name(&self) -> Cow<'static, str> {
        self.table.label()
    }

    #[inline]
    pub fn identity(&self) -> TypeIdentity {
        self.table.identity()
    }

    #[inline]
    pub fn dispatch_table(&self) -> &'static DispatchTable {
        self.table
    }

    /// True when the payload sits in the variant's inline buffer.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.storage.is_inline()
    }

    /// Owned copy of the payload, whatever the policy.
    pub fn to_owned_variant(&self) -> Variant<Owned> {
        // SAFETY: payload pointer comes from this variant's own table.
        let storage = unsafe { self.table.clone_payload(self.payload_ptr()) };
        Variant {
            table: self.table,
            storage,
            _policy: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn payload_ptr(&self) -> *const u8 {
        // SAFETY: storage and table always belong together.
        unsafe { self.table.access(&self.storage) }
    }

    pub(crate) fn payload_any(&self) -> Option<&(dyn Any + 'static)> {
        let payload = self.payload_ptr();
        if payload.is_null() {
            return None;
        }
        // SAFETY: non-null payload of this table's type.
        Some(unsafe { &*self.table.as_any(payload) })
    }

    /// Body text of the payload via the dispatch table's export.
    pub(crate) fn export_raw(&self) -> VariantResult<String> {
        let payload = self.payload_ptr();
        // SAFETY: same table, live payload (the empty table ignores the pointer).
        unsafe { self.table.export(payload) }
    }
}

impl<P: Policy> Clone for Variant<P> {
    fn clone(&self) -> Self {
        let storage = if P::OWNS {
            // SAFETY: payload pointer comes from this variant's own table.
            unsafe { self.table.clone_payload(self.payload_ptr()) }
        } else {
            self.storage.share()
        };
        Self {
            table: self.table,
            storage,
            _policy: PhantomData,
        }
    }
}

impl<P: Policy> Drop for Variant<P> {
    fn drop(&mut self) {
        if P::OWNS {
            let table = self.table;
            // SAFETY: owned storage created for this table's type.
            unsafe { table.destroy(&mut self.storage) };
        }
    }
}

impl<P: Policy, Q: Policy> PartialEq<Variant<Q>> for Variant<P> {
    fn eq(&self, other: &Variant<Q>) -> bool {
        if !ptr::eq(self.table, other.table) {
            return false;
        }
        // SAFETY: identical tables, so both payloads have the table's type.
        unsafe { self.table.compare(self.payload_ptr(), other.payload_ptr()) }
    }
}

impl Default for Variant<Owned> {
    fn default() -> Self {
        Variant::empty()
    }
}

impl<P: Policy> fmt::Debug for Variant<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Variant(<empty>)");
        }
        let policy = if P::OWNS { "" } else { "&" };
        match self.export_raw() {
            Ok(body) => write!(f, "Variant({}{} = {})", policy, self.type_name(), body),
            Err(_) => write!(f, "Variant({}{})", policy, self.type_name()),
        }
    }
}

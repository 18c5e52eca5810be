// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload storage: inline small buffer or heap box.
//!
//! ```text
//! Storage::Inline    [ payload bytes ............ ]   size <= INLINE_CAPACITY
//! Storage::Heap      [ ptr ] ---> Box<T>              everything else
//! Storage::Borrowed  [ ptr ] ---> caller-owned T      alias policy
//! Storage::Empty                                      empty sentinel
//! ```
//!
//! `Storage` never drops its payload by itself. The owning [`Variant`](super::Variant)
//! drives destruction through its dispatch table, which knows the concrete type.

use crate::config::{INLINE_ALIGN, INLINE_CAPACITY};
use std::mem::MaybeUninit;
use std::ptr::NonNull;

/// Storage strategy of a payload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Empty sentinel (no payload).
    Empty,
    /// Payload lives inside the variant.
    Inline,
    /// Payload lives in a separate heap block.
    Boxed,
}

impl Shape {
    /// Pick the shape for a payload layout.
    ///
    /// Pure function of size, alignment and the inline threshold.
    #[inline]
    pub const fn for_layout(size: usize, align: usize) -> Shape {
        if size <= INLINE_CAPACITY && align <= INLINE_ALIGN {
            Shape::Inline
        } else {
            Shape::Boxed
        }
    }

    /// Shape chosen for `T`.
    #[inline]
    pub const fn of<T>() -> Shape {
        Shape::for_layout(std::mem::size_of::<T>(), std::mem::align_of::<T>())
    }
}

/// Inline payload buffer.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
pub(crate) struct InlineBuffer([MaybeUninit<u8>; INLINE_CAPACITY]);

const _: () = assert!(std::mem::align_of::<InlineBuffer>() == INLINE_ALIGN);
const _: () = assert!(std::mem::size_of::<InlineBuffer>() == INLINE_CAPACITY);

impl InlineBuffer {
    #[inline]
    fn uninit() -> Self {
        InlineBuffer([MaybeUninit::uninit(); INLINE_CAPACITY])
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr().cast()
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr().cast()
    }
}

pub(crate) enum Storage {
    Empty,
    Inline(InlineBuffer),
    Heap(NonNull<u8>),
    Borrowed(NonNull<u8>),
}

impl Storage {
    /// Move `value` into a fresh inline buffer.
    ///
    /// Caller guarantees `Shape::of::<T>() == Shape::Inline`.
    #[inline]
    pub(crate) fn inline<T>(value: T) -> Storage {
        debug_assert_eq!(Shape::of::<T>(), Shape::Inline);
        let mut buf = InlineBuffer::uninit();
        // SAFETY: the buffer is large and aligned enough for T (checked by Shape).
        unsafe { buf.as_mut_ptr().cast::<T>().write(value) };
        Storage::Inline(buf)
    }

    /// Move `value` into a new heap block.
    #[inline]
    pub(crate) fn boxed<T>(value: T) -> Storage {
        let raw = Box::into_raw(Box::new(value));
        // SAFETY: Box::into_raw never returns null.
        Storage::Heap(unsafe { NonNull::new_unchecked(raw) }.cast())
    }

    /// Store `value` using the shape chosen for its type.
    #[inline]
    pub(crate) fn store<T>(value: T) -> Storage {
        match Shape::of::<T>() {
            Shape::Inline => Storage::inline(value),
            _ => Storage::boxed(value),
        }
    }

    /// Reference caller-owned storage.
    #[inline]
    pub(crate) fn borrowed<T>(value: &T) -> Storage {
        Storage::Borrowed(NonNull::from(value).cast())
    }

    /// Copy a non-owning storage (alias policy clone).
    #[inline]
    pub(crate) fn share(&self) -> Storage {
        match self {
            Storage::Borrowed(ptr) => Storage::Borrowed(*ptr),
            Storage::Empty => Storage::Empty,
            Storage::Inline(_) | Storage::Heap(_) => {
                debug_assert!(false, "owned storage cannot be shared");
                Storage::Empty
            }
        }
    }

    #[inline]
    pub(crate) fn is_inline(&self) -> bool {
        matches!(self, Storage::Inline(_))
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-variant - type-erased values with a runtime type registry
//!
//! A [`Variant`] holds one value of any registered-or-not Rust type behind a
//! per-type [`DispatchTable`]. Reading it back as the exact stored type is a
//! pointer comparison; reading it as another type goes through the
//! [`Registry`] and an intermediate text form ("heavy conversion").
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_variant::{NotNull, Variant};
//!
//! let v = Variant::new(42i32);
//!
//! // Fast path: exact type, no conversion.
//! assert_eq!(v.extract_if::<i32>(), Some(&42));
//! assert_eq!(v.extract_if::<i64>(), None);
//!
//! // Heavy path: conversion through the global registry.
//! let wrapped: NotNull<i32> = v.like().unwrap();
//! let back: i32 = Variant::new(wrapped).like().unwrap();
//! assert_eq!(back, 42);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   Variant<Owned> / Variant<Alias<'a>>                               |
//! |   table: &'static DispatchTable  +  storage: Empty|Inline|Heap|Ref   |
//! +---------------------------------------------------------------------+
//! |   DispatchTable (one per type, interned)                            |
//! |   access | destroy | release | clone | export | import | compare    |
//! +---------------------------------------------------------------------+
//! |   Registry: BTreeMap<TypeIdentity, TypeDescriptor>                  |
//! |   convert: export -> Intermediate -> encode/decode -> import        |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Variant`] | Type-erased container (copy or alias policy) |
//! | [`Value`] | Trait a type implements to be stored |
//! | [`TypeIdentity`] | 128-bit process-wide type identifier |
//! | [`Registry`] | Ordered map of conversion descriptors |
//! | [`RecordDescriptor`] | Per-field reflection over a record |
//!
//! ## Modules Overview
//!
//! - [`config`] - Storage constants and runtime conversion policy
//! - [`convert`] - Intermediate text form and heavy conversion
//! - [`reflect`] - Field reflection built on variants

/// Storage constants and runtime conversion config.
pub mod config;
/// Intermediate text block and heavy conversion.
pub mod convert;
mod error;
mod identity;
/// Per-field reflection.
pub mod reflect;
mod registry;
mod types;
mod value;
mod variant;

pub use convert::Intermediate;
pub use error::{VariantError, VariantResult};
pub use identity::{identity_of, TypeIdentity};
pub use reflect::{FieldDescriptor, RecordDescriptor, RecordDescriptorBuilder};
pub use registry::{
    register_all_types, Registry, RegistryStats, TypeDescriptor, TypeDescriptorBuilder,
};
pub use types::{Index, NotNull};
pub use value::{Value, ValueClass};
pub use variant::{Alias, DispatchTable, Owned, Policy, Shape, Variant};

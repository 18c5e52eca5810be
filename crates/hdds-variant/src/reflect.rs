// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-field reflection over plain Rust records.
//!
//! A [`RecordDescriptor`] lists a record's fields with typed accessors. Reads
//! return copy-policy variants; writes take any variant and go through
//! [`Variant::like_in`], so a field can be set from a value of another
//! registered type.
//!
//! # Example
//!
//! ```
//! use hdds_variant::{RecordDescriptor, Variant};
//!
//! #[derive(Default)]
//! struct Person {
//!     id: u32,
//!     name: String,
//! }
//!
//! let person_fields = RecordDescriptor::<Person>::builder("Person")
//!     .field("id", |p: &Person| &p.id, |p: &mut Person| &mut p.id)
//!     .field("name", |p: &Person| &p.name, |p: &mut Person| &mut p.name)
//!     .build();
//!
//! let mut person = Person::default();
//! person_fields.set(&mut person, "id", &Variant::new(7i64)).unwrap();
//! person_fields.set(&mut person, "name", &Variant::new(String::from("Ada"))).unwrap();
//!
//! assert_eq!(person.id, 7);
//! assert_eq!(person_fields.get(&person, "name").unwrap().extract_if::<String>().unwrap(), "Ada");
//! ```

use crate::error::{VariantError, VariantResult};
use crate::registry::Registry;
use crate::value::Value;
use crate::variant::{Policy, Variant};
use std::fmt;

type Getter<R> = Box<dyn Fn(&R) -> Variant + Send + Sync>;
type Setter<R> = Box<dyn Fn(&mut R, &Variant, &Registry) -> VariantResult<()> + Send + Sync>;

/// One reflected field.
pub struct FieldDescriptor<R> {
    name: String,
    type_label: String,
    get: Getter<R>,
    set: Setter<R>,
}

impl<R> FieldDescriptor<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label of the field's value type.
    pub fn type_label(&self) -> &str {
        &self.type_label
    }

    /// Copy the field into a variant.
    pub fn get(&self, record: &R) -> Variant {
        (self.get)(record)
    }

    /// Assign the field from `value`, converting through `registry` if needed.
    pub fn set(&self, record: &mut R, value: &Variant, registry: &Registry) -> VariantResult<()> {
        (self.set)(record, value, registry)
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("type", &self.type_label)
            .finish()
    }
}

/// Ordered field list of a record type.
pub struct RecordDescriptor<R> {
    name: String,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R: 'static> RecordDescriptor<R> {
    pub fn builder(name: impl Into<String>) -> RecordDescriptorBuilder<R> {
        RecordDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Copy of field `name`, or `None` if the record has no such field.
    pub fn get(&self, record: &R, name: &str) -> Option<Variant> {
        self.field(name).map(|f| f.get(record))
    }

    /// Assign field `name` through the global registry.
    pub fn set<P: Policy>(&self, record: &mut R, name: &str, value: &Variant<P>) -> VariantResult<()> {
        self.set_in(record, name, value, Registry::global())
    }

    /// Assign field `name` through `registry`.
    ///
    /// The record is unchanged on error.
    pub fn set_in<P: Policy>(
        &self,
        record: &mut R,
        name: &str,
        value: &Variant<P>,
        registry: &Registry,
    ) -> VariantResult<()> {
        let field = self
            .field(name)
            .ok_or_else(|| VariantError::UnknownField(format!("{}.{}", self.name, name)))?;
        field.set(record, &value.to_owned_variant(), registry).map_err(|e| {
            log::debug!("[reflect] {}.{} not set: {}", self.name, name, e);
            e
        })
    }

    /// `(name, value)` pairs for every field, in declaration order.
    pub fn values(&self, record: &R) -> Vec<(&str, Variant)> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), f.get(record)))
            .collect()
    }
}

impl<R> fmt::Debug for RecordDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`RecordDescriptor`].
pub struct RecordDescriptorBuilder<R> {
    name: String,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R: 'static> RecordDescriptorBuilder<R> {
    /// Add a field with its shared and mutable accessors.
    ///
    /// A later field with the same name replaces the earlier one.
    pub fn field<T, G, M>(mut self, name: impl Into<String>, get: G, get_mut: M) -> Self
    where
        T: Value,
        G: Fn(&R) -> &T + Send + Sync + 'static,
        M: Fn(&mut R) -> &mut T + Send + Sync + 'static,
    {
        let name = name.into();
        let field = FieldDescriptor {
            name: name.clone(),
            type_label: T::type_label().into_owned(),
            get: Box::new(move |record: &R| Variant::new(get(record).clone())),
            set: Box::new(move |record: &mut R, value: &Variant, registry: &Registry| {
                let converted = value.like_in::<T>(registry)?;
                *get_mut(record) = converted;
                Ok(())
            }),
        };
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn build(self) -> RecordDescriptor<R> {
        RecordDescriptor {
            name: self.name,
            fields: self.fields,
        }
    }
}

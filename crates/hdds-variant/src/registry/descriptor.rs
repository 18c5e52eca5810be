// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptor: registry metadata and conversion hooks for one type.
//!
//! A descriptor carries the type's identity, its registered name, a factory
//! for a default-valued variant, and the export/import pair used by heavy
//! conversion. By default export and import go through the type's
//! [`Value`] implementation (via its dispatch table); the builder can
//! override either side with a closure.

use crate::convert::Intermediate;
use crate::error::{VariantError, VariantResult};
use crate::identity::{identity_of, TypeIdentity};
use crate::value::Value;
use crate::variant::{Policy, Variant};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type ExportFn = Box<dyn Fn(&(dyn Any + 'static)) -> VariantResult<String> + Send + Sync>;
type ImportFn =
    Box<dyn Fn(&mut (dyn Any + 'static), &Intermediate) -> VariantResult<()> + Send + Sync>;

/// Registry entry for a concrete value type.
pub struct TypeDescriptor {
    identity: TypeIdentity,
    name: Arc<str>,
    rust_name: &'static str,
    default_value: fn() -> Variant,
    exporter: Option<ExportFn>,
    importer: Option<ImportFn>,
}

impl TypeDescriptor {
    /// Descriptor for `T` with its `Value` conversion hooks.
    pub fn of<T: Value + Default>() -> Self {
        Self::builder::<T>().build()
    }

    /// Start building a descriptor for `T`.
    pub fn builder<T: Value + Default>() -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new()
    }

    #[inline]
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Registered name; also the tag of exported intermediates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified Rust type name.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// Fresh variant holding the type's default value.
    pub fn default_value(&self) -> Variant {
        (self.default_value)()
    }

    /// Export `variant` into an intermediate tagged with this descriptor's name.
    pub fn export<P: Policy>(&self, variant: &Variant<P>) -> VariantResult<Intermediate> {
        self.check(variant.identity())?;
        let body = match &self.exporter {
            Some(exporter) => {
                let payload = variant
                    .payload_any()
                    .ok_or_else(|| VariantError::not_allowed("<empty>"))?;
                exporter(payload)?
            }
            None => variant.export_raw()?,
        };
        Ok(Intermediate::new(&*self.name, body))
    }

    /// Overwrite `target`'s payload from `repr`.
    pub fn import(&self, target: &mut Variant, repr: &Intermediate) -> VariantResult<()> {
        self.check(target.identity())?;
        match &self.importer {
            Some(importer) => {
                let payload = target
                    .payload_any_mut()
                    .ok_or_else(|| VariantError::not_allowed("<empty>"))?;
                importer(payload, repr)
            }
            None => target.import_raw(repr),
        }
    }

    fn check(&self, identity: TypeIdentity) -> VariantResult<()> {
        if identity == self.identity {
            Ok(())
        } else {
            Err(VariantError::RegistryMiss { identity })
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("rust_name", &self.rust_name)
            .field("custom_export", &self.exporter.is_some())
            .field("custom_import", &self.importer.is_some())
            .finish()
    }
}

/// Builder for [`TypeDescriptor`].
///
/// # Example
///
/// ```
/// use hdds_variant::{Registry, TypeDescriptor, Variant};
///
/// let registry = Registry::new();
/// let descriptor = TypeDescriptor::builder::<u8>()
///     .name("octet")
///     .exporter(|v: &u8| Ok(format!("{:#04x}", v)))
///     .build();
/// registry.register(descriptor);
///
/// let repr = hdds_variant::convert::export(&Variant::new(10u8), &registry).unwrap();
/// assert_eq!(repr.tag(), "octet");
/// assert_eq!(repr.body(), "0x0a");
/// ```
pub struct TypeDescriptorBuilder<T: Value + Default> {
    name: Option<String>,
    exporter: Option<Box<dyn Fn(&T) -> VariantResult<String> + Send + Sync>>,
    importer: Option<Box<dyn Fn(&mut T, &Intermediate) -> VariantResult<()> + Send + Sync>>,
}

impl<T: Value + Default> TypeDescriptorBuilder<T> {
    fn new() -> Self {
        Self {
            name: None,
            exporter: None,
            importer: None,
        }
    }

    /// Registered name (defaults to [`Value::type_label`]).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override how the payload is formatted.
    pub fn exporter<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> VariantResult<String> + Send + Sync + 'static,
    {
        self.exporter = Some(Box::new(f));
        self
    }

    /// Override how an intermediate is read back.
    pub fn importer<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &Intermediate) -> VariantResult<()> + Send + Sync + 'static,
    {
        self.importer = Some(Box::new(f));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        let name = self.name.unwrap_or_else(|| T::type_label().into_owned());

        let exporter = self.exporter.map(|f| -> ExportFn {
            Box::new(move |payload: &(dyn Any + 'static)| match payload.downcast_ref::<T>() {
                Some(value) => f(value),
                None => Err(VariantError::RegistryMiss {
                    identity: identity_of::<T>(),
                }),
            })
        });
        let importer = self.importer.map(|f| -> ImportFn {
            Box::new(move |payload: &mut (dyn Any + 'static), repr: &Intermediate| {
                match payload.downcast_mut::<T>() {
                    Some(value) => f(value, repr),
                    None => Err(VariantError::RegistryMiss {
                        identity: identity_of::<T>(),
                    }),
                }
            })
        });

        TypeDescriptor {
            identity: identity_of::<T>(),
            name: Arc::from(name),
            rust_name: std::any::type_name::<T>(),
            default_value: default_variant::<T>,
            exporter,
            importer,
        }
    }
}

fn default_variant<T: Value + Default>() -> Variant {
    Variant::new(T::default())
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry - ordered map from [`TypeIdentity`] to [`TypeDescriptor`].
//!
//! Heavy conversion only works between registered types. Entries are kept in a
//! `BTreeMap` (ordered, `O(log n)` lookup) behind a `parking_lot::RwLock`:
//! lookups run concurrently, registrations are serialized. The first
//! registration of an identity wins; later ones are rejected.
//!
//! A process-wide instance is available through [`Registry::global`] and is
//! bootstrapped with [`register_all_types`] on first use. Independent
//! registries (e.g. in tests) are created with [`Registry::new`].

mod descriptor;

pub use descriptor::{TypeDescriptor, TypeDescriptorBuilder};

use crate::config::{ConfigCell, RuntimeConfig};
use crate::identity::{identity_of, TypeIdentity};
use crate::types::{Index, NotNull};
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Registry lookup statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
    /// Registrations rejected because the identity was already present.
    pub duplicates: u64,
}

/// Live counters behind [`RegistryStats`]; lookups never take a lock for them.
#[derive(Debug, Default)]
struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    duplicates: AtomicU64,
}

/// Ordered map of registered value types.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<TypeIdentity, Arc<TypeDescriptor>>>,
    stats: StatCounters,
    config: ConfigCell,
}

impl Registry {
    /// Empty registry with the default conversion config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, with every built-in type registered.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let registry = Registry::new();
            let count = register_all_types(&registry);
            log::debug!("[Registry] global registry ready ({} types)", count);
            registry
        })
    }

    /// Insert `descriptor` under its identity.
    ///
    /// Returns false (and keeps the existing entry) if the identity is
    /// already registered.
    pub fn register(&self, descriptor: TypeDescriptor) -> bool {
        let identity = descriptor.identity();
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&identity) {
            log::debug!(
                "[Registry] duplicate registration of {} ignored (kept {})",
                descriptor.name(),
                existing.name()
            );
            drop(entries);
            self.record_duplicate();
            return false;
        }
        log::trace!("[Registry] registered {} as {}", descriptor.name(), identity);
        entries.insert(identity, Arc::new(descriptor));
        true
    }

    /// Register `T` with its default descriptor.
    pub fn register_type<T: Value + Default>(&self) -> bool {
        if self.contains(identity_of::<T>()) {
            self.record_duplicate();
            return false;
        }
        self.register(TypeDescriptor::of::<T>())
    }

    /// Descriptor registered under `identity`.
    pub fn find(&self, identity: TypeIdentity) -> Option<Arc<TypeDescriptor>> {
        let found = self.entries.read().get(&identity).map(Arc::clone);
        if found.is_some() {
            self.record_hit();
        } else {
            self.record_miss();
        }
        found
    }

    /// Registered name of `identity`, or an empty string.
    #[must_use]
    pub fn type_name(&self, identity: TypeIdentity) -> String {
        self.entries
            .read()
            .get(&identity)
            .map(|d| d.name().to_string())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, identity: TypeIdentity) -> bool {
        self.entries.read().contains_key(&identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered identities in map order.
    #[must_use]
    pub fn identities(&self) -> Vec<TypeIdentity> {
        self.entries.read().keys().copied().collect()
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            duplicates: self.stats.duplicates.load(Ordering::Relaxed),
        }
    }

    /// Current conversion config.
    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        self.config.load()
    }

    /// Replace the conversion config. Takes effect for the next conversion.
    pub fn set_config(&self, config: RuntimeConfig) {
        log::debug!("[Registry] config updated: {:?}", config);
        self.config.store(config);
    }

    fn record_hit(&self) {
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duplicate(&self) {
        self.stats.duplicates.fetch_add(1, Ordering::Relaxed);
    }
}

/// Register every built-in value type; returns how many were newly added.
///
/// Safe to call repeatedly: already-registered types are skipped.
pub fn register_all_types(registry: &Registry) -> usize {
    let added = [
        registry.register_type::<bool>(),
        registry.register_type::<char>(),
        registry.register_type::<i8>(),
        registry.register_type::<i16>(),
        registry.register_type::<i32>(),
        registry.register_type::<i64>(),
        registry.register_type::<isize>(),
        registry.register_type::<u8>(),
        registry.register_type::<u16>(),
        registry.register_type::<u32>(),
        registry.register_type::<u64>(),
        registry.register_type::<usize>(),
        registry.register_type::<f32>(),
        registry.register_type::<f64>(),
        registry.register_type::<String>(),
        registry.register_type::<NotNull<i8>>(),
        registry.register_type::<NotNull<i16>>(),
        registry.register_type::<NotNull<i32>>(),
        registry.register_type::<NotNull<i64>>(),
        registry.register_type::<NotNull<u8>>(),
        registry.register_type::<NotNull<u16>>(),
        registry.register_type::<NotNull<u32>>(),
        registry.register_type::<NotNull<u64>>(),
        registry.register_type::<Index>(),
    ];
    added.iter().filter(|&&new| new).count()
}

#[cfg(test)]
mod tests;

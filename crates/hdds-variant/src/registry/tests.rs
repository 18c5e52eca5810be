// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::convert::Intermediate;
use crate::error::VariantError;
use crate::variant::Variant;

const BUILTIN_TYPES: usize = 24;

#[test]
fn test_register_and_find() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert!(registry.register_type::<u32>());

    let id = identity_of::<u32>();
    let descriptor = registry.find(id).expect("registered");
    assert_eq!(descriptor.identity(), id);
    assert_eq!(descriptor.name(), "uint32");
    assert_eq!(descriptor.rust_name(), "u32");
    assert_eq!(registry.type_name(id), "uint32");
    assert!(registry.contains(id));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_absent_identity() {
    let registry = Registry::new();
    let id = identity_of::<i8>();
    assert!(registry.find(id).is_none());
    assert_eq!(registry.type_name(id), "");
    assert_eq!(registry.stats().misses, 1);
}

#[test]
fn test_first_registration_wins() {
    let registry = Registry::new();
    let first = TypeDescriptor::builder::<u16>().name("first").build();
    let second = TypeDescriptor::builder::<u16>().name("second").build();

    assert!(registry.register(first));
    assert!(!registry.register(second));
    assert!(!registry.register_type::<u16>());

    assert_eq!(registry.type_name(identity_of::<u16>()), "first");
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.stats().duplicates, 2);
}

#[test]
fn test_register_all_types_is_idempotent() {
    let registry = Registry::new();
    assert_eq!(register_all_types(&registry), BUILTIN_TYPES);
    assert_eq!(registry.len(), BUILTIN_TYPES);

    assert_eq!(register_all_types(&registry), 0);
    assert_eq!(registry.len(), BUILTIN_TYPES);
}

#[test]
fn test_identities_are_ordered() {
    let registry = Registry::new();
    register_all_types(&registry);
    let ids = registry.identities();
    assert_eq!(ids.len(), BUILTIN_TYPES);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_stats_count_lookups() {
    let registry = Registry::new();
    registry.register_type::<f32>();
    let _ = registry.find(identity_of::<f32>());
    let _ = registry.find(identity_of::<f32>());
    let _ = registry.find(identity_of::<f64>());

    let stats = registry.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_global_has_builtins() {
    let global = Registry::global();
    assert!(global.contains(identity_of::<String>()));
    assert!(global.contains(identity_of::<NotNull<i32>>()));
    assert!(global.contains(identity_of::<Index>()));
    assert!(std::ptr::eq(global, Registry::global()));
}

#[test]
fn test_descriptor_default_value() {
    let descriptor = TypeDescriptor::of::<i64>();
    let v = descriptor.default_value();
    assert_eq!(v.extract_if::<i64>(), Some(&0));
}

#[test]
fn test_descriptor_rejects_foreign_variant() {
    let descriptor = TypeDescriptor::of::<i64>();
    let err = descriptor.export(&Variant::new(1i32)).unwrap_err();
    assert!(matches!(err, VariantError::RegistryMiss { .. }));

    let mut target = Variant::new(1u8);
    assert!(descriptor
        .import(&mut target, &Intermediate::new("int64", "5"))
        .is_err());
    assert_eq!(target.extract_if::<u8>(), Some(&1));
}

#[test]
fn test_custom_importer() {
    let descriptor = TypeDescriptor::builder::<u32>()
        .name("hex32")
        .importer(|v: &mut u32, repr: &Intermediate| {
            *v = u32::from_str_radix(repr.body().trim_start_matches("0x"), 16)
                .map_err(|e| VariantError::malformed(e.to_string()))?;
            Ok(())
        })
        .build();

    let mut target = descriptor.default_value();
    descriptor
        .import(&mut target, &Intermediate::new("string", "0xff"))
        .expect("import");
    assert_eq!(target.extract_if::<u32>(), Some(&255));

    // Export still goes through the Value implementation.
    let repr = descriptor.export(&target).expect("export");
    assert_eq!(repr, Intermediate::new("hex32", "255"));
}

#[test]
fn test_concurrent_registration() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || register_all_types(&registry))
        })
        .collect();

    let added: usize = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .sum();
    assert_eq!(added, BUILTIN_TYPES);
    assert_eq!(registry.len(), BUILTIN_TYPES);
}

#[test]
fn test_concurrent_lookups_are_all_counted() {
    let registry = Arc::new(Registry::new());
    registry.register_type::<u8>();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    assert!(registry.find(identity_of::<u8>()).is_some());
                    assert!(registry.find(identity_of::<u16>()).is_none());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("thread panicked");
    }

    let stats = registry.stats();
    assert_eq!(stats.hits, 8000);
    assert_eq!(stats.misses, 8000);
    assert_eq!(stats.duplicates, 0);
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Heavy conversion through an intermediate text block.
//!
//! When a variant is read as a type it does not hold, the payload is exported
//! by its registered descriptor into an [`Intermediate`] (type tag plus
//! formatted body), encoded to text, decoded again, and imported into a
//! default-constructed value of the target type.
//!
//! ```text
//! Variant<i32>(42) --export--> Intermediate { tag: "int32", body: "42" }
//!                  --encode--> "5:int3242"
//!                  --decode--> Intermediate { tag: "int32", body: "42" }
//!                  --import--> NotNull<i32>::default() <- "42"
//! ```
//!
//! This path allocates and parses; it is meant for the rare cross-type read,
//! not for hot loops. Set `warn_on_heavy` in the registry config to find
//! callers that hit it too often.

use crate::config::INTERMEDIATE_SEPARATOR;
use crate::error::{VariantError, VariantResult};
use crate::identity::identity_of;
use crate::registry::Registry;
use crate::value::Value;
use crate::variant::{Policy, Variant};
use std::fmt;

/// Type-tagged textual form of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intermediate {
    tag: String,
    body: String,
}

impl Intermediate {
    pub fn new(tag: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            body: body.into(),
        }
    }

    /// Registered name of the type that produced the body.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Encode as a single text block: `<tag length>:<tag><body>`.
    pub fn encode(&self) -> String {
        let mut block = String::with_capacity(self.tag.len() + self.body.len() + 8);
        block.push_str(&self.tag.len().to_string());
        block.push(INTERMEDIATE_SEPARATOR);
        block.push_str(&self.tag);
        block.push_str(&self.body);
        block
    }

    /// Decode a block produced by [`Intermediate::encode`].
    pub fn decode(block: &str) -> VariantResult<Self> {
        let (len, rest) = block
            .split_once(INTERMEDIATE_SEPARATOR)
            .ok_or_else(|| VariantError::malformed("missing tag length"))?;
        let len: usize = len
            .parse()
            .map_err(|_| VariantError::malformed(format!("bad tag length {:?}", len)))?;
        if len > rest.len() || !rest.is_char_boundary(len) {
            return Err(VariantError::malformed(format!(
                "tag length {} exceeds block",
                len
            )));
        }
        let (tag, body) = rest.split_at(len);
        Ok(Self::new(tag, body))
    }
}

impl fmt::Display for Intermediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.tag, self.body)
    }
}

/// Export a variant's payload through its registered descriptor.
pub fn export<P: Policy>(variant: &Variant<P>, registry: &Registry) -> VariantResult<Intermediate> {
    if variant.is_empty() {
        return Err(VariantError::not_allowed("<empty>"));
    }
    let descriptor = registry
        .find(variant.identity())
        .ok_or(VariantError::RegistryMiss {
            identity: variant.identity(),
        })?;
    descriptor.export(variant)
}

/// Overwrite `target` from `repr` through the target's registered descriptor.
///
/// `target` is left untouched when the import fails.
pub fn import(target: &mut Variant, repr: &Intermediate, registry: &Registry) -> VariantResult<()> {
    if target.is_empty() {
        return Err(VariantError::not_allowed("<empty>"));
    }
    let descriptor = registry
        .find(target.identity())
        .ok_or(VariantError::RegistryMiss {
            identity: target.identity(),
        })?;

    let mut scratch = target.clone();
    descriptor.import(&mut scratch, repr)?;
    *target = scratch;
    Ok(())
}

/// Heavy conversion of `source` into a `T`.
///
/// The source is never modified. Failures surface as `ConversionNotAllowed`
/// (one side opted out, or the registry disables heavy conversion) or
/// `NotConstructible`. An empty source is always `NotConstructible`.
pub fn convert<T: Value, P: Policy>(source: &Variant<P>, registry: &Registry) -> VariantResult<T> {
    if source.is_empty() {
        return Err(VariantError::NotConstructible {
            target: T::type_label().into_owned(),
            reason: "empty variant has no payload".to_string(),
        });
    }
    let config = registry.config();
    if !config.heavy_conversion {
        return Err(VariantError::not_allowed(source.type_name()));
    }

    if config.warn_on_heavy {
        log::warn!(
            "[convert] heavy conversion {} -> {}",
            source.type_name(),
            T::type_label()
        );
    } else {
        log::trace!(
            "[convert] heavy conversion {} -> {}",
            source.type_name(),
            T::type_label()
        );
    }

    convert_via_block::<T, P>(source, registry).map_err(|e| {
        let e = e.for_target(&T::type_label());
        log::debug!("[convert] {} -> {} failed: {}", source.type_name(), T::type_label(), e);
        e
    })
}

fn convert_via_block<T: Value, P: Policy>(source: &Variant<P>, registry: &Registry) -> VariantResult<T> {
    let block = export(source, registry)?.encode();
    let repr = Intermediate::decode(&block)?;

    let target = identity_of::<T>();
    let descriptor = registry
        .find(target)
        .ok_or(VariantError::RegistryMiss { identity: target })?;

    let mut temp = descriptor.default_value();
    descriptor.import(&mut temp, &repr)?;
    temp.take::<T>().map_err(|other| VariantError::NotConstructible {
        target: T::type_label().into_owned(),
        reason: format!("descriptor produced {}", other.type_name()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::registry::register_all_types;
    use crate::types::NotNull;

    fn registry() -> Registry {
        let registry = Registry::new();
        register_all_types(&registry);
        registry
    }

    #[test]
    fn test_block_roundtrip() {
        let repr = Intermediate::new("int32", "42");
        let block = repr.encode();
        assert_eq!(Intermediate::decode(&block), Ok(repr));
    }

    #[test]
    fn test_block_body_may_contain_separator() {
        let repr = Intermediate::new("string", "a:b:7:c");
        assert_eq!(Intermediate::decode(&repr.encode()), Ok(repr));

        let unicode = Intermediate::new("étiquette", "ü");
        assert_eq!(Intermediate::decode(&unicode.encode()), Ok(unicode));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Intermediate::decode("no separator").is_err());
        assert!(Intermediate::decode("x:int32").is_err());
        assert!(Intermediate::decode("99:int32").is_err());
        // Tag length ending inside a multi-byte char.
        assert!(Intermediate::decode("1:é").is_err());
    }

    #[test]
    fn test_export_uses_registered_name() {
        let registry = registry();
        let repr = export(&Variant::new(42i32), &registry).expect("export");
        assert_eq!(repr.tag(), "int32");
        assert_eq!(repr.body(), "42");
        assert_eq!(repr.to_string(), "int32(42)");
    }

    #[test]
    fn test_export_unregistered_is_miss() {
        #[derive(Clone)]
        struct Unlisted;
        impl Value for Unlisted {}

        let err = export(&Variant::new(Unlisted), &registry()).unwrap_err();
        assert!(matches!(err, VariantError::RegistryMiss { .. }));
    }

    #[test]
    fn test_import_failure_keeps_target() {
        let registry = registry();
        let mut target = Variant::new(7u8);
        let err = import(&mut target, &Intermediate::new("int32", "300"), &registry);
        assert!(err.is_err());
        assert_eq!(target.extract_if::<u8>(), Some(&7));

        import(&mut target, &Intermediate::new("int32", "200"), &registry).expect("import");
        assert_eq!(target.extract_if::<u8>(), Some(&200));
    }

    #[test]
    fn test_convert_through_wrapper() {
        let registry = registry();
        let wrapped: NotNull<i32> = convert(&Variant::new(42i32), &registry).expect("convert");
        assert_eq!(wrapped, NotNull(42));

        let back: i32 = convert(&Variant::new(wrapped), &registry).expect("convert back");
        assert_eq!(back, 42);
    }

    #[test]
    fn test_convert_unregistered_target() {
        #[derive(Clone, Debug, Default)]
        struct Unlisted;
        impl Value for Unlisted {}

        let err = convert::<Unlisted, _>(&Variant::new(1i32), &registry()).unwrap_err();
        assert!(err.is_not_constructible());
    }

    #[test]
    fn test_convert_bad_body_is_not_constructible() {
        let registry = registry();
        let err = convert::<u8, _>(&Variant::new(-1i32), &registry).unwrap_err();
        assert!(err.is_not_constructible());
        assert!(err.to_string().contains("uint8"));
    }

    #[test]
    fn test_convert_disabled() {
        let registry = registry();
        registry.set_config(RuntimeConfig::fast_path_only());
        let err = convert::<i64, _>(&Variant::new(1i32), &registry).unwrap_err();
        assert!(err.is_not_allowed());
    }

    #[test]
    fn test_convert_empty_source() {
        let err = convert::<i32, _>(&Variant::empty(), &registry()).unwrap_err();
        assert!(err.is_not_constructible());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Variant configuration - storage constants and runtime conversion policy.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (inline threshold, identity width)
//! - **Level 2 (Dynamic)**: `RuntimeConfig`, held per [`Registry`](crate::Registry)
//!   behind an `ArcSwap` so readers never take a lock
//!
//! # Example
//!
//! ```
//! use hdds_variant::config::{RuntimeConfig, INLINE_CAPACITY};
//! use hdds_variant::Registry;
//!
//! assert_eq!(INLINE_CAPACITY, 16);
//!
//! let registry = Registry::new();
//! registry.set_config(RuntimeConfig::fast_path_only());
//! assert!(!registry.config().heavy_conversion);
//! ```

use arc_swap::ArcSwap;
use std::sync::Arc;

// =======================================================================
// Storage
// =======================================================================

/// Largest payload (in bytes) stored inside the variant itself.
///
/// One machine-maximum scalar (`u128`). Anything larger is boxed.
/// **NEVER hardcode 16 elsewhere!**
pub const INLINE_CAPACITY: usize = std::mem::size_of::<u128>();

/// Alignment of the inline buffer.
///
/// Payloads with a stricter alignment are boxed even when they fit.
pub const INLINE_ALIGN: usize = 16;

// =======================================================================
// Identity
// =======================================================================

/// Number of 32-bit words in a [`TypeIdentity`](crate::TypeIdentity).
pub const IDENTITY_WORDS: usize = 4;

/// Size of a serialized identity (bytes).
pub const IDENTITY_BYTES: usize = IDENTITY_WORDS * 4;

/// Upper bound on salt attempts when two type names digest to the same identity.
///
/// A collision needs an MD5 clash between two distinct Rust type paths, so in
/// practice the first attempt always succeeds.
pub const MAX_IDENTITY_SALT: u32 = 64;

// =======================================================================
// Intermediate text block
// =======================================================================

/// Separator between the tag length prefix and the tag itself.
///
/// Block layout: `<tag length>:<tag><body>`
pub const INTERMEDIATE_SEPARATOR: char = ':';

// =======================================================================
// Runtime configuration
// =======================================================================

/// Conversion policy applied by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Allow `like` to fall back to heavy conversion on a type mismatch.
    pub heavy_conversion: bool,
    /// Log every heavy conversion at `warn` level (hot path hunting).
    pub warn_on_heavy: bool,
}

impl RuntimeConfig {
    /// Exact-type reads only; every heavy conversion is refused.
    #[must_use]
    pub const fn fast_path_only() -> Self {
        Self {
            heavy_conversion: false,
            warn_on_heavy: false,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heavy_conversion: true,
            warn_on_heavy: false,
        }
    }
}

/// Lock-free holder for a [`RuntimeConfig`].
#[derive(Debug)]
pub(crate) struct ConfigCell {
    inner: ArcSwap<RuntimeConfig>,
}

impl ConfigCell {
    pub(crate) fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: ArcSwap::from_pointee(config),
        }
    }

    #[inline]
    pub(crate) fn load(&self) -> RuntimeConfig {
        **self.inner.load()
    }

    pub(crate) fn store(&self, config: RuntimeConfig) {
        self.inner.store(Arc::new(config));
    }
}

impl Default for ConfigCell {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

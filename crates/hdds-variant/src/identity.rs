// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TypeIdentity - 128-bit process-wide type identifier.
//!
//! Each concrete Rust type gets exactly one identity, computed on first use
//! as the MD5 digest of its fully qualified type name. The digest is split
//! into four little-endian `u32` words.
//!
//! Two distinct types whose names digest to the same value (which would take
//! an MD5 clash between type paths) are told apart by re-salting the later
//! one, so identities still distinguish concrete types exactly.
//!
//! The ordering on identities is lexicographic over the words. It carries no
//! meaning beyond placing entries in the registry tree.

use crate::config::{IDENTITY_BYTES, IDENTITY_WORDS, MAX_IDENTITY_SALT};
use dashmap::DashMap;
use md5::{Digest, Md5};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Opaque 128-bit identifier for a concrete value type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TypeIdentity([u32; IDENTITY_WORDS]);

impl TypeIdentity {
    /// Reserved identity of the empty variant. Never assigned to a real type.
    pub const NIL: TypeIdentity = TypeIdentity([0; IDENTITY_WORDS]);

    #[inline]
    pub const fn from_words(words: [u32; IDENTITY_WORDS]) -> Self {
        TypeIdentity(words)
    }

    #[inline]
    pub const fn words(self) -> [u32; IDENTITY_WORDS] {
        self.0
    }

    #[inline]
    pub const fn is_nil(self) -> bool {
        let w = self.0;
        w[0] == 0 && w[1] == 0 && w[2] == 0 && w[3] == 0
    }

    pub fn to_bytes(self) -> [u8; IDENTITY_BYTES] {
        let mut bytes = [0u8; IDENTITY_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.0) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: [u8; IDENTITY_BYTES]) -> Self {
        let mut words = [0u32; IDENTITY_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        TypeIdentity(words)
    }

    /// Digest a type name (plus salt) into an identity.
    ///
    /// Salt 0 hashes the bare name so identities are reproducible from the
    /// name alone in the common case.
    pub(crate) fn digest(type_name: &str, salt: u32) -> Self {
        let mut hasher = Md5::new();
        hasher.update(type_name.as_bytes());
        if salt != 0 {
            hasher.update(salt.to_le_bytes());
        }
        let result = hasher.finalize();

        let mut bytes = [0u8; IDENTITY_BYTES];
        bytes.copy_from_slice(&result[..IDENTITY_BYTES]);
        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TypeIdentity({:08x}-{:08x}-{:08x}-{:08x})",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}{:08x}{:08x}{:08x}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl From<[u32; IDENTITY_WORDS]> for TypeIdentity {
    fn from(words: [u32; IDENTITY_WORDS]) -> Self {
        Self::from_words(words)
    }
}

// ---------------------------------------------------------------------------
// Process-wide identity table
// ---------------------------------------------------------------------------

struct IdentityTable {
    by_type: DashMap<TypeId, TypeIdentity>,
    // Serializes first-use assignment; also the collision set.
    assigned: Mutex<BTreeSet<TypeIdentity>>,
}

impl IdentityTable {
    fn new() -> Self {
        let mut assigned = BTreeSet::new();
        assigned.insert(TypeIdentity::NIL);
        Self {
            by_type: DashMap::new(),
            assigned: Mutex::new(assigned),
        }
    }

    fn get_or_assign(&self, type_id: TypeId, type_name: &'static str) -> TypeIdentity {
        if let Some(hit) = self.by_type.get(&type_id) {
            return *hit;
        }

        let mut assigned = self.assigned.lock();
        // Another thread may have won the race while we waited.
        if let Some(hit) = self.by_type.get(&type_id) {
            return *hit;
        }

        let mut identity = TypeIdentity::digest(type_name, 0);
        let mut salt = 0;
        while assigned.contains(&identity) && salt < MAX_IDENTITY_SALT {
            salt += 1;
            identity = TypeIdentity::digest(type_name, salt);
        }
        if salt > 0 {
            log::debug!(
                "[identity] digest collision for {}, resolved with salt {}",
                type_name,
                salt
            );
        }
        // Exhausting the salt budget means the table is corrupt, not unlucky.
        assert!(
            !assigned.contains(&identity),
            "no free identity for {}",
            type_name
        );

        assigned.insert(identity);
        self.by_type.insert(type_id, identity);
        identity
    }
}

fn table() -> &'static IdentityTable {
    static TABLE: OnceLock<IdentityTable> = OnceLock::new();
    TABLE.get_or_init(IdentityTable::new)
}

/// Return the process-wide identity of `T`, assigning it on first call.
///
/// Safe under concurrent first use: every caller observes the same identity.
///
/// # Example
///
/// ```
/// use hdds_variant::identity_of;
///
/// assert_eq!(identity_of::<u32>(), identity_of::<u32>());
/// assert_ne!(identity_of::<u32>(), identity_of::<i32>());
/// ```
pub fn identity_of<T: ?Sized + 'static>() -> TypeIdentity {
    table().get_or_assign(TypeId::of::<T>(), std::any::type_name::<T>())
}

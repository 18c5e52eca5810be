// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for variant conversion and reflection.
//!
//! Type mismatches on the fast path are not errors: `extract_if` returns
//! `None` and `extract_to` returns `false`. Only heavy conversion (and the
//! reflection setters built on it) reports failure through [`VariantError`].

use crate::identity::TypeIdentity;
use std::fmt;

/// Result type for variant operations
pub type VariantResult<T> = Result<T, VariantError>;

/// Errors that can occur during heavy conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    /// The type deliberately opted out of cross-type conversion
    ConversionNotAllowed { type_name: String },

    /// Heavy conversion could not produce a valid target value
    NotConstructible { target: String, reason: String },

    /// No descriptor registered for this identity (internal, surfaced as `NotConstructible`)
    RegistryMiss { identity: TypeIdentity },

    /// Intermediate text block could not be parsed or imported
    MalformedIntermediate(String),

    /// Reflection lookup on a field the record does not declare
    UnknownField(String),
}

impl VariantError {
    /// Create a conversion opt-out error
    pub fn not_allowed(type_name: impl Into<String>) -> Self {
        Self::ConversionNotAllowed {
            type_name: type_name.into(),
        }
    }

    /// Create a malformed-intermediate error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedIntermediate(msg.into())
    }

    /// Surface an internal failure as `NotConstructible` for `target`.
    ///
    /// `ConversionNotAllowed` passes through untouched; the caller must be
    /// able to tell an opt-out from a failed import.
    pub(crate) fn for_target(self, target: &str) -> Self {
        match self {
            Self::ConversionNotAllowed { .. } | Self::NotConstructible { .. } => self,
            Self::RegistryMiss { identity } => Self::NotConstructible {
                target: target.to_string(),
                reason: format!("type {} is not registered", identity),
            },
            Self::MalformedIntermediate(msg) => Self::NotConstructible {
                target: target.to_string(),
                reason: msg,
            },
            Self::UnknownField(name) => Self::NotConstructible {
                target: target.to_string(),
                reason: format!("unknown field {}", name),
            },
        }
    }

    /// True for `ConversionNotAllowed`.
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, Self::ConversionNotAllowed { .. })
    }

    /// True for `NotConstructible`.
    pub fn is_not_constructible(&self) -> bool {
        matches!(self, Self::NotConstructible { .. })
    }
}

impl fmt::Display for VariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConversionNotAllowed { type_name } => {
                write!(f, "Conversion not allowed for type {}", type_name)
            }
            Self::NotConstructible { target, reason } => {
                write!(f, "Cannot construct {}: {}", target, reason)
            }
            Self::RegistryMiss { identity } => write!(f, "Type not registered: {}", identity),
            Self::MalformedIntermediate(msg) => write!(f, "Malformed intermediate: {}", msg),
            Self::UnknownField(name) => write!(f, "Unknown field: {}", name),
        }
    }
}

impl std::error::Error for VariantError {}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Domain wrapper types registered alongside the primitives.
//!
//! Both wrappers convert through their inner value, so a `NotNull<i32>` can be
//! read as an `i64` and an `Index` as a `u32` via heavy conversion.

use crate::convert::Intermediate;
use crate::error::{VariantError, VariantResult};
use crate::value::{parse_body, Value, ValueClass};
use std::borrow::Cow;
use std::fmt;

/// Integer column value that is guaranteed present.
///
/// Generic over the integer width, so `NotNull<i32>` and `NotNull<i64>` are
/// distinct types with distinct identities.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotNull<T>(pub T);

impl<T> NotNull<T> {
    #[inline]
    pub fn get(self) -> T {
        self.0
    }
}

impl<T> From<T> for NotNull<T> {
    fn from(value: T) -> Self {
        NotNull(value)
    }
}

impl<T: fmt::Display> fmt::Display for NotNull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: Value + PartialEq> Value for NotNull<T> {
    const CLASS: ValueClass = T::CLASS;
    const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<NotNull<T> as PartialEq>::eq);

    fn type_label() -> Cow<'static, str> {
        Cow::Owned(format!("not_null<{}>", T::type_label()))
    }

    fn export(&self) -> VariantResult<String> {
        self.0.export()
    }

    // An empty body would be a null; refuse it before the inner parse.
    fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
        if repr.body().trim().is_empty() {
            return Err(VariantError::malformed(format!(
                "{} from {}: empty value",
                Self::type_label(),
                repr.tag()
            )));
        }
        self.0.import(repr)
    }
}

/// Row index into a table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Index(pub u32);

impl Index {
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Index(value)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Value for Index {
    const CLASS: ValueClass = ValueClass::Number;
    const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<Index as PartialEq>::eq);

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("index")
    }

    fn export(&self) -> VariantResult<String> {
        Ok(self.0.to_string())
    }

    fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
        self.0 = parse_body::<u32>(repr, "index")?;
        Ok(())
    }
}

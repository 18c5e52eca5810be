// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `Value` trait - what a type declares to live inside a variant.
//!
//! Capabilities are explicit associated items rather than inferred:
//!
//! | Item | Default | Used for |
//! |------|---------|----------|
//! | `CLASS` | `Composite` | `is_pod` / `is_number` |
//! | `EQUALITY` | `None` (address comparison) | variant `==` |
//! | `type_label` | Rust type path | registry name, intermediate tag |
//! | `export` / `import` | opt out | heavy conversion |
//!
//! # Example
//!
//! ```
//! use hdds_variant::{Intermediate, Value, ValueClass, VariantResult};
//!
//! #[derive(Clone, Default, PartialEq)]
//! struct Celsius(f64);
//!
//! impl Value for Celsius {
//!     const CLASS: ValueClass = ValueClass::Number;
//!     const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<Celsius as PartialEq>::eq);
//!
//!     fn export(&self) -> VariantResult<String> {
//!         self.0.export()
//!     }
//!
//!     fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
//!         self.0.import(repr)
//!     }
//! }
//! ```

use crate::convert::Intermediate;
use crate::error::{VariantError, VariantResult};
use std::borrow::Cow;
use std::str::FromStr;

/// Coarse classification of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    /// Integer or floating point number
    Number,
    /// Enumerated kind (discriminant-backed)
    Enumerated,
    /// Other primitive plain data (`bool`, `char`)
    Plain,
    /// Text
    Text,
    /// Everything else
    Composite,
}

impl ValueClass {
    /// Plain data: numbers, enumerations and other primitives.
    #[inline]
    pub const fn is_plain_data(self) -> bool {
        matches!(
            self,
            ValueClass::Number | ValueClass::Enumerated | ValueClass::Plain
        )
    }

    /// Numbers and enumerations.
    #[inline]
    pub const fn is_number(self) -> bool {
        matches!(self, ValueClass::Number | ValueClass::Enumerated)
    }
}

/// A type that can be stored in a [`Variant`](crate::Variant).
pub trait Value: Clone + Send + Sync + 'static {
    /// Classification reported by `is_pod` / `is_number`.
    const CLASS: ValueClass = ValueClass::Composite;

    /// Structural equality, when the type has one.
    ///
    /// `None` makes variant equality fall back to payload address comparison.
    const EQUALITY: Option<fn(&Self, &Self) -> bool> = None;

    /// Human-readable type name.
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Format the value as the body of an intermediate block.
    ///
    /// The default opts out of heavy conversion.
    fn export(&self) -> VariantResult<String> {
        Err(VariantError::not_allowed(Self::type_label()))
    }

    /// Overwrite the value from an intermediate block.
    ///
    /// The default opts out of heavy conversion.
    fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
        let _ = repr;
        Err(VariantError::not_allowed(Self::type_label()))
    }
}

/// Parse an intermediate body with `FromStr`.
pub(crate) fn parse_body<T>(repr: &Intermediate, label: &str) -> VariantResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let body = repr.body().trim();
    body.parse::<T>().map_err(|e| {
        VariantError::malformed(format!(
            "cannot read {} {:?} as {}: {}",
            repr.tag(),
            body,
            label,
            e
        ))
    })
}

macro_rules! impl_number_value {
    ($ty:ty, $label:expr) => {
        impl Value for $ty {
            const CLASS: ValueClass = ValueClass::Number;
            const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<$ty as PartialEq>::eq);

            fn type_label() -> Cow<'static, str> {
                Cow::Borrowed($label)
            }

            fn export(&self) -> VariantResult<String> {
                Ok(self.to_string())
            }

            fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
                *self = parse_body::<$ty>(repr, $label)?;
                Ok(())
            }
        }
    };
}

impl_number_value!(i8, "int8");
impl_number_value!(i16, "int16");
impl_number_value!(i32, "int32");
impl_number_value!(i64, "int64");
impl_number_value!(isize, "isize");
impl_number_value!(u8, "uint8");
impl_number_value!(u16, "uint16");
impl_number_value!(u32, "uint32");
impl_number_value!(u64, "uint64");
impl_number_value!(usize, "usize");

/// Parse a float body, refusing results that do not represent it.
///
/// Overflow to infinity is rejected unless the body spells a non-finite
/// value. Integral bodies must land on exactly the same integer; fractional
/// bodies round to the nearest representable value.
pub(crate) fn parse_float_body<T>(repr: &Intermediate, label: &str) -> VariantResult<T>
where
    T: FromStr + Copy + Into<f64>,
    T::Err: std::fmt::Display,
{
    let value = parse_body::<T>(repr, label)?;
    let body = repr.body().trim();
    let wide: f64 = value.into();

    if !wide.is_finite() {
        let spelled_non_finite = body
            .trim_start_matches(['+', '-'])
            .chars()
            .all(|c| c.is_ascii_alphabetic());
        if !spelled_non_finite {
            return Err(VariantError::malformed(format!(
                "{} {:?} is out of range for {}",
                repr.tag(),
                body,
                label
            )));
        }
        return Ok(value);
    }

    if let Ok(exact) = body.parse::<i128>() {
        // Finite floats below 2^127 convert to i128 without saturation.
        if wide.abs() >= 2f64.powi(127) || wide as i128 != exact {
            return Err(VariantError::malformed(format!(
                "{} {:?} is not exactly representable as {}",
                repr.tag(),
                body,
                label
            )));
        }
    }
    Ok(value)
}

macro_rules! impl_float_value {
    ($ty:ty, $label:expr) => {
        impl Value for $ty {
            const CLASS: ValueClass = ValueClass::Number;
            const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<$ty as PartialEq>::eq);

            fn type_label() -> Cow<'static, str> {
                Cow::Borrowed($label)
            }

            fn export(&self) -> VariantResult<String> {
                Ok(self.to_string())
            }

            fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
                *self = parse_float_body::<$ty>(repr, $label)?;
                Ok(())
            }
        }
    };
}

impl_float_value!(f32, "float32");
impl_float_value!(f64, "float64");

impl Value for bool {
    const CLASS: ValueClass = ValueClass::Plain;
    const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<bool as PartialEq>::eq);

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("bool")
    }

    fn export(&self) -> VariantResult<String> {
        Ok(self.to_string())
    }

    // Integers convert too: zero is false, anything else true.
    fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
        let body = repr.body().trim();
        *self = match body {
            "true" => true,
            "false" => false,
            other => match other.parse::<i64>() {
                Ok(n) => n != 0,
                Err(_) => {
                    return Err(VariantError::malformed(format!(
                        "cannot read {} {:?} as bool",
                        repr.tag(),
                        other
                    )))
                }
            },
        };
        Ok(())
    }
}

impl Value for char {
    const CLASS: ValueClass = ValueClass::Plain;
    const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<char as PartialEq>::eq);

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("char")
    }

    fn export(&self) -> VariantResult<String> {
        Ok(self.to_string())
    }

    fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
        // No trimming: a single space is a valid char.
        *self = repr.body().parse::<char>().map_err(|e| {
            VariantError::malformed(format!("cannot read {:?} as char: {}", repr.body(), e))
        })?;
        Ok(())
    }
}

impl Value for String {
    const CLASS: ValueClass = ValueClass::Text;
    const EQUALITY: Option<fn(&Self, &Self) -> bool> = Some(<String as PartialEq>::eq);

    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("string")
    }

    fn export(&self) -> VariantResult<String> {
        Ok(self.clone())
    }

    fn import(&mut self, repr: &Intermediate) -> VariantResult<()> {
        self.clear();
        self.push_str(repr.body());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct NoCapabilities;
    impl Value for NoCapabilities {}

    #[test]
    fn test_class_predicates() {
        assert!(ValueClass::Number.is_plain_data());
        assert!(ValueClass::Number.is_number());
        assert!(ValueClass::Enumerated.is_number());
        assert!(ValueClass::Plain.is_plain_data());
        assert!(!ValueClass::Plain.is_number());
        assert!(!ValueClass::Text.is_plain_data());
        assert!(!ValueClass::Composite.is_plain_data());
    }

    #[test]
    fn test_number_export_import() {
        assert_eq!(42i32.export().unwrap(), "42");

        let mut target = 0u64;
        target
            .import(&Intermediate::new("int32", "42"))
            .expect("import");
        assert_eq!(target, 42);

        let err = target
            .import(&Intermediate::new("float64", "4.5"))
            .unwrap_err();
        assert!(matches!(err, VariantError::MalformedIntermediate(_)));
        assert_eq!(target, 42, "failed import must not change the value");
    }

    #[test]
    fn test_float_rejects_overflow() {
        let mut narrow = 1.5f32;
        let err = narrow
            .import(&Intermediate::new("float64", &1e300f64.to_string()))
            .unwrap_err();
        assert!(matches!(err, VariantError::MalformedIntermediate(_)));
        assert_eq!(narrow, 1.5);

        narrow
            .import(&Intermediate::new("float64", "-inf"))
            .expect("spelled infinity");
        assert_eq!(narrow, f32::NEG_INFINITY);
        narrow.import(&Intermediate::new("float64", "NaN")).expect("nan");
        assert!(narrow.is_nan());
    }

    #[test]
    fn test_float_integral_body_must_be_exact() {
        let mut narrow = 0f32;
        assert!(narrow.import(&Intermediate::new("int64", "16777217")).is_err());
        narrow
            .import(&Intermediate::new("int64", "16777216"))
            .expect("exact");
        assert_eq!(narrow, 16_777_216.0);

        let mut wide = 0f64;
        assert!(wide
            .import(&Intermediate::new("uint64", &u64::MAX.to_string()))
            .is_err());
        wide.import(&Intermediate::new("float32", "0.1")).expect("fraction");
        assert_eq!(wide, 0.1);
    }

    #[test]
    fn test_bool_accepts_integers() {
        let mut flag = false;
        flag.import(&Intermediate::new("int32", "7")).expect("import");
        assert!(flag);
        flag.import(&Intermediate::new("bool", "false")).expect("import");
        assert!(!flag);
        assert!(flag.import(&Intermediate::new("string", "maybe")).is_err());
    }

    #[test]
    fn test_char_import() {
        let mut c = 'a';
        c.import(&Intermediate::new("char", " ")).expect("import");
        assert_eq!(c, ' ');
        assert!(c.import(&Intermediate::new("string", "ab")).is_err());
    }

    #[test]
    fn test_string_takes_any_body() {
        let mut s = String::from("old");
        s.import(&Intermediate::new("float64", "2.5")).expect("import");
        assert_eq!(s, "2.5");
    }

    #[test]
    fn test_default_opts_out() {
        let err = NoCapabilities.export().unwrap_err();
        assert!(err.is_not_allowed());
        assert!(NoCapabilities::EQUALITY.is_none());
        assert_eq!(NoCapabilities::CLASS, ValueClass::Composite);
    }

    #[test]
    fn test_labels() {
        assert_eq!(i32::type_label(), "int32");
        assert_eq!(f64::type_label(), "float64");
        assert_eq!(String::type_label(), "string");
    }
}

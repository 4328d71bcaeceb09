//! # Money Module
//!
//! Provides the `Money` type for unit prices, unit costs and line totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount lives in memory as i64 cents.                          │
//! │    The backend stores NUMERIC columns, so the wire format is a         │
//! │    decimal number: 500 cents ⇄ 5.0                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(500); // $5.00
//! let line_total = price.multiply_quantity(3);
//! assert_eq!(line_total.to_string(), "$15.00");
//!
//! // Form input is parsed as text, never through a float
//! assert_eq!(Money::parse("5.25"), Some(Money::from_cents(525)));
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Money Type
// =============================================================================

/// Largest distance from a whole cent still treated as float noise.
const SUB_CENT_TOLERANCE: f64 = 1e-6;

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// InventoryItem.price ──┬──► Sale.price (snapshot at sale time)
///                       │          │
///                       │          ▼
///                       │    SaleLine.total = quantity × price
///                       │
///                       └──► Displayed as "$5.00"
/// InventoryItem.cost  ─────► Displayed as "$3.10"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit amount by a quantity.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Parses a decimal amount typed into a form.
    ///
    /// Accepts an optional leading `-`, digits, and up to two fractional
    /// digits. Returns `None` for anything else, including empty input.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::parse("5"), Some(Money::from_cents(500)));
    /// assert_eq!(Money::parse("5.5"), Some(Money::from_cents(550)));
    /// assert_eq!(Money::parse(" 0.99 "), Some(Money::from_cents(99)));
    /// assert_eq!(Money::parse("5.001"), None);
    /// assert_eq!(Money::parse("five"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Money> {
        let input = input.trim();
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return None;
        }
        if minor.len() > 2 || !major.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !minor.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let major: i64 = if major.is_empty() { 0 } else { major.parse().ok()? };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().ok()? * 10,
            _ => minor.parse().ok()?,
        };

        let cents = major.checked_mul(100)?.checked_add(minor)?;
        Some(Money(if negative { -cents } else { cents }))
    }

    /// Returns the amount as a decimal number for the wire.
    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Converts a decimal number received from the backend.
    ///
    /// Binary noise such as `0.30000000000000004` snaps to the nearest cent.
    /// A value with a real fraction of a cent (`5.001`) or outside the i64
    /// range returns `None`.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(19.99), Some(Money::from_cents(1999)));
    /// assert_eq!(Money::from_decimal(5.001), None);
    /// ```
    pub fn from_decimal(value: f64) -> Option<Self> {
        let scaled = value * 100.0;
        let cents = scaled.round();
        if !cents.is_finite() || (scaled - cents).abs() > SUB_CENT_TOLERANCE {
            return None;
        }
        if cents < i64::MIN as f64 || cents >= i64::MAX as f64 {
            return None;
        }
        Some(Money(cents as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

// =============================================================================
// Wire Format
// =============================================================================
// NUMERIC columns come back as JSON numbers (5, 5.0, 5.25) and, from some
// gateways, as strings ("5.25").

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal amount")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                v.checked_mul(100)
                    .map(Money)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .map(Money)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                if !v.is_finite() {
                    return Err(E::custom("amount is not finite"));
                }
                Money::from_decimal(v).ok_or_else(|| {
                    E::custom(format!("amount {} is not a whole number of cents", v))
                })
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                Money::parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("5.00"), Some(Money::from_cents(500)));
        assert_eq!(Money::parse(".5"), Some(Money::from_cents(50)));
        assert_eq!(Money::parse("-1.25"), Some(Money::from_cents(-125)));
        assert_eq!(Money::parse(""), None);
        assert_eq!(Money::parse("."), None);
        assert_eq!(Money::parse("1.2.3"), None);
        assert_eq!(Money::parse("1e3"), None);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&Money::from_cents(500)).unwrap();
        assert_eq!(json, "5.0");

        let from_float: Money = serde_json::from_str("5.25").unwrap();
        assert_eq!(from_float.cents(), 525);

        let from_int: Money = serde_json::from_str("7").unwrap();
        assert_eq!(from_int.cents(), 700);

        let from_string: Money = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(from_string.cents(), 1999);
    }

    #[test]
    fn test_decimal_noise() {
        // 0.1 + 0.2 style noise from the backend is absorbed
        assert_eq!(
            Money::from_decimal(0.30000000000000004),
            Some(Money::from_cents(30))
        );
        assert_eq!(Money::from_decimal(19.99), Some(Money::from_cents(1999)));
        assert_eq!(Money::from_decimal(-2.5), Some(Money::from_cents(-250)));
    }

    #[test]
    fn test_sub_cent_amounts_are_rejected() {
        assert_eq!(Money::from_decimal(5.001), None);
        assert_eq!(Money::from_decimal(0.125), None);
        assert_eq!(Money::from_decimal(1e300), None);

        let err = serde_json::from_str::<Money>("5.001").unwrap_err();
        assert!(err.to_string().contains("whole number of cents"));
        assert!(serde_json::from_str::<Money>("\"5.001\"").is_err());
    }
}

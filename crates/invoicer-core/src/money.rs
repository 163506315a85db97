//! # Money Module
//!
//! Provides the `Money` type and the conversions between the major units
//! clients send (`12.50`) and the minor units stored and compared (`1250`).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │    0.29 * 100 = 28.999999999999996  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Convert exactly once at the boundary, then every sum, difference    │
//! │    and equality check runs on i64 cents.                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use invoicer_core::money::{to_major_units, to_minor_units, Money};
//!
//! let price = to_minor_units(12.50).unwrap();
//! assert_eq!(price, Money::from_cents(1250));
//! assert_eq!(to_major_units(price), 12.50);
//!
//! // Sub-cent input is rejected, never rounded
//! assert!(to_minor_units(12.345).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ArithmeticError;
use crate::MINOR_UNITS_PER_MAJOR;

/// Largest cent count an `f64` holds exactly (2^53 - 1).
pub const MAX_EXACT_CENTS: i64 = 9_007_199_254_740_991;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor currency units (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts may be negative adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serializes as the raw cent count**: the major-unit JSON shape lives
///   in [`crate::wire`], never here
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use invoicer_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a major-unit amount. See [`to_minor_units`].
    #[inline]
    pub fn from_major(major: f64) -> Result<Self, ArithmeticError> {
        to_minor_units(major)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units. See [`to_major_units`].
    #[inline]
    pub fn to_major(&self) -> f64 {
        to_major_units(*self)
    }

    /// Returns the whole major-unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / MINOR_UNITS_PER_MAJOR
    }

    /// Returns the minor-unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % MINOR_UNITS_PER_MAJOR).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Adds two amounts, failing instead of wrapping.
    pub fn checked_add(self, other: Money, operation: &'static str) -> Result<Money, ArithmeticError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(ArithmeticError::Overflow { operation })
    }

    /// Subtracts two amounts, failing instead of wrapping.
    pub fn checked_sub(self, other: Money, operation: &'static str) -> Result<Money, ArithmeticError> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or(ArithmeticError::Overflow { operation })
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ```rust
    /// use invoicer_core::money::Money;
    ///
    /// let line_total = Money::from_cents(299).multiply_quantity(3).unwrap();
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    pub fn multiply_quantity(self, qty: u32) -> Result<Money, ArithmeticError> {
        self.0
            .checked_mul(i64::from(qty))
            .map(Money)
            .ok_or(ArithmeticError::Overflow {
                operation: "price x quantity",
            })
    }
}

// =============================================================================
// Boundary Conversions
// =============================================================================

/// Converts a major-unit amount (e.g. `12.50`) to minor units (`1250`).
///
/// ## Rules
/// - The input must be finite.
/// - The scaled value must fit in the exact-integer range of an `f64`.
/// - The input must be the nearest double to a whole-cent amount. This
///   accepts `0.29` (whose `* 100` is `28.999999999999996`) and rejects
///   `12.345` as well as float artifacts such as `19.999999999999996`.
///
/// Nothing is ever rounded silently: an amount either maps to one exact cent
/// count or is rejected.
pub fn to_minor_units(major: f64) -> Result<Money, ArithmeticError> {
    if !major.is_finite() {
        return Err(ArithmeticError::NotFinite { value: major });
    }

    let scale = MINOR_UNITS_PER_MAJOR as f64;
    let scaled = major * scale;
    if scaled.abs() > MAX_EXACT_CENTS as f64 {
        return Err(ArithmeticError::OutOfRange { value: major });
    }

    let cents = scaled.round();
    // Division is correctly rounded, so this reproduces the literal the
    // client would have written for a whole-cent amount.
    if cents / scale != major {
        return Err(ArithmeticError::SubCentPrecision { value: major });
    }

    Ok(Money(cents as i64))
}

/// Converts minor units back to major units for display and export.
///
/// No rounding beyond the single division: cent counts up to
/// [`MAX_EXACT_CENTS`] divide to the nearest double of the decimal amount.
pub fn to_major_units(minor: Money) -> f64 {
    minor.0 as f64 / MINOR_UNITS_PER_MAJOR as f64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount in major units with two decimals, e.g. `-5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

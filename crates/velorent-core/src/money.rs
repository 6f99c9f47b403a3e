//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A rental ledger kept in floats drifts:                                 │
//! │    3 days × 19.99 = 59.969999999999995  ❌ WRONG!                       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    3 × 1999 = 5997 cents, exactly                                       │
//! │                                                                         │
//! │  The one place fractions are unavoidable - the late-fee day fraction -  │
//! │  rounds to cents at a single, documented boundary.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use velorent_core::money::Money;
//!
//! // Create from cents (preferred)
//! let daily_rate = Money::from_cents(1999); // $19.99
//!
//! // Arithmetic operations
//! let three_days = daily_rate * 3;                  // $59.97
//! let with_deposit = three_days + Money::from_cents(5000); // $109.97
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for deposit refunds and
///   corrections, even though stored amounts are validated non-negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// CatalogItem tier price ──► RentalContract.unit_price ──► base price
///                                                      │
/// RentalExtra.price ──► extras total ──────────────────┼──► total amount
///                                                      │
/// Late-return surcharge ───────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use velorent_core::money::Money;
    ///
    /// let rate = Money::from_cents(1999); // Represents $19.99
    /// assert_eq!(rate.cents(), 1999);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors the value at zero.
    ///
    /// ## Why
    /// Derived amounts like the base price must never go negative even if
    /// an operator keys a pathological quantity/price combination; billing
    /// a customer a negative rental is always wrong.
    ///
    /// ## Example
    /// ```rust
    /// use velorent_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-250).clamp_non_negative().cents(), 0);
    /// assert_eq!(Money::from_cents(250).clamp_non_negative().cents(), 250);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity. Saturates at the `i64` bounds: a
    /// pathological price/quantity combination caps out instead of wrapping.
    ///
    /// ## Example
    /// ```rust
    /// use velorent_core::money::Money;
    ///
    /// let daily_rate = Money::from_cents(1999); // $19.99/day
    /// let base = daily_rate.multiply_quantity(3);
    /// assert_eq!(base.cents(), 5997); // $59.97 for 3 days
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Scales money by a floating-point factor, rounding half away from
    /// zero to cents.
    ///
    /// ## The ONE Permitted Float Boundary
    /// Late fees multiply a fractional day count by a rate and a surcharge
    /// factor. The fraction is inherent (a bike can be 6 hours late), so
    /// the rounding happens here, once, instead of leaking f64 through the
    /// ledger.
    ///
    /// ## Example
    /// ```rust
    /// use velorent_core::money::Money;
    ///
    /// // 1.5 days late at $10.00/day, 150% surcharge:
    /// let charge = Money::from_cents(1000).scale(1.5 * 1.5);
    /// assert_eq!(charge.cents(), 2250); // $22.50
    /// ```
    pub fn scale(&self, factor: f64) -> Money {
        Money::from_cents((self.0 as f64 * factor).round() as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for logs and debugging. Presentation layers format for
/// localization themselves.
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

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
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
        let money = Money::from_cents(1999);
        assert_eq!(money.cents(), 1999);
        assert_eq!(money.dollars(), 19);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(19, 99);
        assert_eq!(money.cents(), 1999);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1999)), "$19.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-1).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(0).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(1).clamp_non_negative().cents(), 1);
    }

    #[test]
    fn test_multiply_quantity() {
        let daily_rate = Money::from_cents(1999);
        let base = daily_rate.multiply_quantity(3);
        assert_eq!(base.cents(), 5997);
    }

    #[test]
    fn test_multiply_quantity_saturates() {
        let absurd = Money::from_cents(i64::MAX);
        assert_eq!(absurd.multiply_quantity(2).cents(), i64::MAX);
        assert_eq!(absurd.multiply_quantity(-2).cents(), i64::MIN);
    }

    #[test]
    fn test_scale_rounds_to_cents() {
        // 1/3 of a day at $10.00 with no surcharge: 333.33... -> 333
        assert_eq!(Money::from_cents(1000).scale(1.0 / 3.0).cents(), 333);
        // Half-cent rounds away from zero
        assert_eq!(Money::from_cents(1).scale(0.5).cents(), 1);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }
}

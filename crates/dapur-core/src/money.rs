//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A day of 10% discounts on Rp 24.990 items drifts by whole rupiah      │
//! │  when every line is rounded on its own.                                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units, one rounding at the order total    │
//! │    Line math is exact (price × qty), only the total is rounded         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dapur_core::money::Money;
//!
//! let price = Money::from_minor(25_000); // Rp 25.000
//! let line = price * 2;                  // Rp 50.000
//! let total = line + Money::from_minor(16_000);
//! assert_eq!(total.minor(), 66_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit of the outlet's currency.
///
/// ## Design Decisions
/// - **i64 (signed)**: Differences (balance due, change) may be computed freely
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent serde**: Serialized as a plain integer in JSON payloads
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Catalog price ──► OrderItem.unit_price ──► OrderItem.subtotal          │
/// │                                                  │                      │
/// │  Modifier price ──► OrderItemModifier.unit_price─┘                      │
/// │                                                                         │
/// │  Σ item.subtotal ──► Order.subtotal ──► discount/tax ──► total_amount   │
/// │                                                                         │
/// │  Payment.amount ──► amount_paid ──► completion / catering settlement    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use dapur_core::money::Money;
    ///
    /// let price = Money::from_minor(22_000);
    /// assert_eq!(price.minor(), 22_000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
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

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use dapur_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(8_000);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 24_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the smaller of two values.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Clamps negative values to zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        Money(self.0.max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display groups thousands with dots, the way receipts print rupiah.
///
/// ## Note
/// This is for logs and debugging. Front-ends format for display themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}", sign, grouped)
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Rates
// =============================================================================

/// A rate in basis points (1 bps = 0.01%).
///
/// Used for both percentage discounts and the outlet's flat tax rate.
/// 1000 bps = 10%, 1100 bps = 11% (PPN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(66_000);
        assert_eq!(money.minor(), 66_000);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_minor(66_000).to_string(), "66.000");
        assert_eq!(Money::from_minor(499_800).to_string(), "499.800");
        assert_eq!(Money::from_minor(1_250_000).to_string(), "1.250.000");
        assert_eq!(Money::from_minor(500).to_string(), "500");
        assert_eq!(Money::from_minor(-34_000).to_string(), "-34.000");
        assert_eq!(Money::zero().to_string(), "0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
    }

    #[test]
    fn test_sum() {
        let items = [Money::from_minor(50_000), Money::from_minor(16_000)];
        let total: Money = items.iter().sum();
        assert_eq!(total.minor(), 66_000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_minor(100).is_positive());
        assert!(Money::from_minor(-100).is_negative());
        assert_eq!(Money::from_minor(-100).non_negative(), Money::zero());
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_minor(34_000)).unwrap();
        assert_eq!(json, "34000");
    }
}

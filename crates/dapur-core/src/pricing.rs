//! # Order Totals
//!
//! Derives `discount_amount`, `tax_amount` and `total_amount` from a subtotal.
//!
//! ## Rounding Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal S (exact, integer)                                           │
//! │       │                                                                 │
//! │       ▼  discount D (exact rational: S × bps / 10000, or fixed)        │
//! │  net  N = S − D                       ← not rounded                    │
//! │       │                                                                 │
//! │       ▼  tax rate r (bps)                                               │
//! │  total T = N × (10000 + r) / 10000    ← ROUNDED ONCE, half-up          │
//! │                                                                         │
//! │  Stored:                                                                │
//! │    discount_amount = S − round(N)                                      │
//! │    tax_amount      = T − round(N)                                      │
//! │  so   total_amount == subtotal − discount_amount + tax_amount  always  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is carried in `i128` numerators over a fixed denominator, so no
//! intermediate value is ever truncated.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, TaxRate};

/// 100% in basis points.
pub const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Discount
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `value` is basis points of the subtotal (1000 = 10%).
    Percentage,
    /// `value` is minor units, clamped to the subtotal.
    FixedAmount,
}

/// Order-level discount configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub discount_type: DiscountType,
    pub value: i64,
}

impl Discount {
    pub const fn new(discount_type: DiscountType, value: i64) -> Self {
        Discount {
            discount_type,
            value,
        }
    }

    pub const fn percentage(bps: i64) -> Self {
        Discount::new(DiscountType::Percentage, bps)
    }

    pub const fn fixed(amount: Money) -> Self {
        Discount::new(DiscountType::FixedAmount, amount.minor())
    }

    /// Rejects negative values and percentages above 100%.
    pub fn validate(&self) -> CoreResult<()> {
        match self.discount_type {
            DiscountType::Percentage if !(0..=BPS_SCALE as i64).contains(&self.value) => {
                Err(ValidationError::OutOfRange {
                    field: "discount.value".to_string(),
                    min: 0,
                    max: BPS_SCALE as i64,
                }
                .into())
            }
            DiscountType::FixedAmount if self.value < 0 => Err(ValidationError::OutOfRange {
                field: "discount.value".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Exact discount as a numerator over [`BPS_SCALE`].
    fn scaled(&self, subtotal: i128) -> i128 {
        match self.discount_type {
            DiscountType::Percentage => subtotal * i128::from(self.value.clamp(0, BPS_SCALE as i64)),
            DiscountType::FixedAmount => {
                i128::from(self.value.max(0)).min(subtotal.max(0)) * BPS_SCALE
            }
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Derived monetary fields of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
}

/// Computes order totals with a single rounding step at the end.
///
/// ## Example
/// ```rust
/// use dapur_core::money::{Money, TaxRate};
/// use dapur_core::pricing::{compute_totals, Discount};
///
/// // 10% off 66.000, then 11% PPN
/// let totals = compute_totals(
///     Money::from_minor(66_000),
///     Some(&Discount::percentage(1_000)),
///     TaxRate::from_bps(1_100),
/// );
/// assert_eq!(totals.discount_amount.minor(), 6_600);
/// assert_eq!(totals.tax_amount.minor(), 6_534);
/// assert_eq!(totals.total_amount.minor(), 65_934);
/// ```
pub fn compute_totals(subtotal: Money, discount: Option<&Discount>, tax_rate: TaxRate) -> Totals {
    let s = i128::from(subtotal.minor());
    let discount_scaled = discount.map(|d| d.scaled(s)).unwrap_or(0);

    // Net of discount over BPS_SCALE; total over BPS_SCALE².
    let net_scaled = s * BPS_SCALE - discount_scaled;
    let total_scaled = net_scaled * (BPS_SCALE + i128::from(tax_rate.bps()));

    let net = round_half_up(net_scaled, BPS_SCALE);
    let total = round_half_up(total_scaled, BPS_SCALE * BPS_SCALE);

    let discount_amount = s - net;
    let tax_amount = total - net;

    Totals {
        subtotal,
        discount_amount: Money::from_minor(to_i64(discount_amount)),
        tax_amount: Money::from_minor(to_i64(tax_amount)),
        total_amount: Money::from_minor(to_i64(total)),
    }
}

/// Rounds `numerator / denominator` half away from zero.
fn round_half_up(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    }
}

fn to_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Unit Tests
// =============================================================================

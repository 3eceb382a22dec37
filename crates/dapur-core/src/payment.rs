//! # Payment Reconciliation
//!
//! Decides whether a payment is acceptable and what it does to the order.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PaymentRequest                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  order CANCELLED / COMPLETED? ──────────────── OrderNotPayable          │
//! │  amount ≤ 0? ───────────────────────────────── Validation               │
//! │  paid + amount > total? ────────────────────── PaymentExceedsBalance    │
//! │  CASH and received < amount? ───────────────── InsufficientCashReceived │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  amount_paid += amount                                                  │
//! │       │                                                                 │
//! │       ├── CATERING ─┬─ paid ≥ total ──► SETTLED + COMPLETED            │
//! │       │             └─ first payment ─► DP_PAID (deposit)              │
//! │       │                                                                 │
//! │       └── other ────── paid ≥ total ──► COMPLETED                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A first payment that already covers the total goes straight from BOOKED
//! to SETTLED; DP_PAID is never observable in between.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    CateringStatus, Order, OrderStatus, Payment, PaymentMethod, PaymentRequest, PaymentStatus,
};
use crate::validation::validate_payment_request;

/// Result of applying one payment to an order header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The COMPLETED payment row to persist.
    pub payment: Payment,
    pub previous_status: OrderStatus,
    pub previous_catering_status: Option<CateringStatus>,
}

impl Reconciliation {
    /// Whether the order status or catering status moved.
    pub fn order_changed(&self, order: &Order) -> bool {
        self.previous_status != order.status
            || self.previous_catering_status != order.catering_status
    }
}

/// Validates `request` against `order` and applies it.
///
/// On error the order is left untouched.
///
/// ## Example
/// ```rust,ignore
/// let rec = reconcile(&mut order, &request, "cashier-1", Utc::now())?;
/// assert_eq!(rec.payment.change_amount, Some(Money::from_minor(34_000)));
/// ```
pub fn reconcile(
    order: &mut Order,
    request: &PaymentRequest,
    actor_id: &str,
    now: DateTime<Utc>,
) -> CoreResult<Reconciliation> {
    order.ensure_payable()?;
    validate_payment_request(request)?;

    let balance_due = order.balance_due();
    if request.amount > balance_due {
        return Err(CoreError::PaymentExceedsBalance {
            balance_due,
            requested: request.amount,
        });
    }

    let (amount_received, change_amount) = match request.payment_method {
        PaymentMethod::Cash => {
            let received = request.amount_received.unwrap_or(request.amount);
            if received < request.amount {
                return Err(CoreError::InsufficientCashReceived {
                    amount: request.amount,
                    received,
                });
            }
            (Some(received), Some(received - request.amount))
        }
        PaymentMethod::Qris | PaymentMethod::Transfer => (None, None),
    };

    let previous_status = order.status;
    let previous_catering_status = order.catering_status;

    order.amount_paid += request.amount;
    order.updated_at = now;
    let fully_paid = order.amount_paid >= order.total_amount;

    if fully_paid {
        order.settle(now)?;
    } else if order.is_catering()
        && matches!(order.catering_status, None | Some(CateringStatus::Booked))
    {
        order.catering_status = Some(CateringStatus::DpPaid);
        order.catering_dp_amount = Some(request.amount);
    }

    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        payment_method: request.payment_method,
        amount: request.amount,
        status: PaymentStatus::Completed,
        reference_number: request
            .reference_number
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        amount_received,
        change_amount,
        created_by: actor_id.to_string(),
        created_at: now,
    };

    Ok(Reconciliation {
        payment,
        previous_status,
        previous_catering_status,
    })
}

/// Σ amount of COMPLETED payments.
pub fn completed_total(payments: &[Payment]) -> Money {
    payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .map(|p| p.amount)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;
    use crate::types::OrderType;

    fn dine_in(total: i64) -> Order {
        let mut order = sample_order(OrderType::DineIn);
        order.subtotal = Money::from_minor(total);
        order.total_amount = Money::from_minor(total);
        order
    }

    fn catering(total: i64) -> Order {
        let mut order = sample_order(OrderType::Catering);
        order.subtotal = Money::from_minor(total);
        order.total_amount = Money::from_minor(total);
        order
    }

    fn cash(amount: i64, received: Option<i64>) -> PaymentRequest {
        PaymentRequest {
            payment_method: PaymentMethod::Cash,
            amount: Money::from_minor(amount),
            amount_received: received.map(Money::from_minor),
            reference_number: None,
        }
    }

    fn transfer(amount: i64) -> PaymentRequest {
        PaymentRequest {
            payment_method: PaymentMethod::Transfer,
            amount: Money::from_minor(amount),
            amount_received: None,
            reference_number: Some(" TRX-001 ".into()),
        }
    }

    #[test]
    fn test_full_cash_payment_completes_order() {
        let mut order = dine_in(66_000);
        let rec = reconcile(&mut order, &cash(66_000, Some(100_000)), "c1", Utc::now()).unwrap();

        assert_eq!(rec.payment.change_amount, Some(Money::from_minor(34_000)));
        assert_eq!(rec.payment.amount_received, Some(Money::from_minor(100_000)));
        assert_eq!(rec.payment.status, PaymentStatus::Completed);
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());
        assert!(rec.order_changed(&order));
    }

    #[test]
    fn test_partial_payment_keeps_order_open() {
        let mut order = dine_in(66_000);
        let rec = reconcile(&mut order, &cash(50_000, None), "c1", Utc::now()).unwrap();

        assert_eq!(rec.payment.change_amount, Some(Money::zero()));
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.amount_paid.minor(), 50_000);
        assert_eq!(order.balance_due().minor(), 16_000);
        assert!(!rec.order_changed(&order));
    }

    #[test]
    fn test_overpayment_rejected_and_order_untouched() {
        let mut order = dine_in(66_000);
        order.amount_paid = Money::from_minor(50_000);
        let before = order.clone();

        let err = reconcile(&mut order, &cash(20_000, None), "c1", Utc::now()).unwrap_err();
        assert_eq!(
            err,
            CoreError::PaymentExceedsBalance {
                balance_due: Money::from_minor(16_000),
                requested: Money::from_minor(20_000),
            }
        );
        assert_eq!(order, before);
    }

    #[test]
    fn test_cash_received_must_cover_amount() {
        let mut order = dine_in(66_000);
        let err = reconcile(&mut order, &cash(66_000, Some(50_000)), "c1", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCashReceived { .. }));
        assert!(order.amount_paid.is_zero());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut order = dine_in(66_000);
        let err = reconcile(&mut order, &transfer(0), "c1", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_terminal_orders_not_payable() {
        for status in [OrderStatus::Cancelled, OrderStatus::Completed] {
            let mut order = dine_in(66_000);
            order.status = status;
            let err = reconcile(&mut order, &transfer(1_000), "c1", Utc::now()).unwrap_err();
            assert!(matches!(err, CoreError::OrderNotPayable { .. }));
        }
    }

    #[test]
    fn test_catering_deposit_then_settlement() {
        let mut order = catering(499_800);

        let rec = reconcile(&mut order, &transfer(249_900), "c1", Utc::now()).unwrap();
        assert_eq!(order.catering_status, Some(CateringStatus::DpPaid));
        assert_eq!(order.catering_dp_amount, Some(Money::from_minor(249_900)));
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(rec.payment.reference_number.as_deref(), Some("TRX-001"));
        assert_eq!(rec.payment.change_amount, None);
        assert!(rec.order_changed(&order));

        reconcile(&mut order, &transfer(249_900), "c1", Utc::now()).unwrap();
        assert_eq!(order.catering_status, Some(CateringStatus::Settled));
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.amount_paid.minor(), 499_800);
    }

    #[test]
    fn test_catering_full_first_payment_skips_deposit() {
        let mut order = catering(499_800);
        let rec = reconcile(&mut order, &transfer(499_800), "c1", Utc::now()).unwrap();

        assert_eq!(rec.previous_catering_status, Some(CateringStatus::Booked));
        assert_eq!(order.catering_status, Some(CateringStatus::Settled));
        assert_eq!(order.catering_dp_amount, None);
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn test_second_deposit_stays_dp_paid() {
        let mut order = catering(300_000);
        reconcile(&mut order, &transfer(100_000), "c1", Utc::now()).unwrap();
        reconcile(&mut order, &transfer(100_000), "c1", Utc::now()).unwrap();

        assert_eq!(order.catering_status, Some(CateringStatus::DpPaid));
        assert_eq!(order.catering_dp_amount, Some(Money::from_minor(100_000)));
        assert_eq!(order.amount_paid.minor(), 200_000);
    }

    #[test]
    fn test_paid_never_exceeds_total() {
        let mut order = dine_in(10_000);
        let amounts = [3_000, 4_000, 5_000, 3_000, 1_000];
        for amount in amounts {
            let _ = reconcile(&mut order, &transfer(amount), "c1", Utc::now());
            assert!(order.amount_paid <= order.total_amount);
        }
        assert_eq!(order.amount_paid.minor(), 10_000);
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn test_completed_total_ignores_failed() {
        let mut order = dine_in(66_000);
        let mut first = reconcile(&mut order, &transfer(10_000), "c1", Utc::now())
            .unwrap()
            .payment;
        let second = reconcile(&mut order, &transfer(5_000), "c1", Utc::now())
            .unwrap()
            .payment;
        first.status = PaymentStatus::Failed;
        assert_eq!(completed_total(&[first, second]).minor(), 5_000);
    }
}

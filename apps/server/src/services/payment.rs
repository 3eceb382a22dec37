//! # Payment Reconciliation
//!
//! ```text
//!  BEGIN
//!    lock_order                       second payer waits here
//!    amount_paid ◄── Σ COMPLETED payments (fresh, under the lock)
//!    reconcile()                      OrderNotPayable / PaymentExceedsBalance /
//!                                     InsufficientCashReceived
//!    insert payment, update header    catering BOOKED ─► DP_PAID ─► SETTLED
//!                                     fully paid ─► COMPLETED
//!  COMMIT ─► order.paid (+ order.updated when a status moved)
//! ```
//!
//! A rejected payment rolls back with the transaction. No row is written.

use chrono::Utc;
use tracing::info;

use dapur_core::payment::reconcile;
use dapur_core::{EventType, Money, OrderDetail, Payment, PaymentRequest};
use dapur_db::repository::{order, payment};

use super::{retry_on_conflict, OrderService};
use crate::error::ServiceResult;
use crate::scope::RequestScope;

/// A recorded payment with the order it was applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub order: OrderDetail,
    /// The order status or catering status moved because of this payment.
    pub order_changed: bool,
}

impl OrderService {
    /// Records one payment against an order.
    pub async fn add_payment(
        &self,
        scope: &RequestScope,
        order_id: &str,
        request: PaymentRequest,
    ) -> ServiceResult<PaymentReceipt> {
        let request = &request;
        let receipt = retry_on_conflict("add_payment", move || {
            self.try_add_payment(scope, order_id, request)
        })
        .await?;

        let order = &receipt.order.order;
        info!(
            order_id = %order_id,
            payment_id = %receipt.payment.id,
            method = %receipt.payment.payment_method,
            amount = %receipt.payment.amount,
            amount_paid = %order.amount_paid,
            status = %order.status,
            "Payment recorded"
        );
        self.publish(EventType::OrderPaid, &receipt.order);
        if receipt.order_changed {
            self.publish(EventType::OrderUpdated, &receipt.order);
        }
        Ok(receipt)
    }

    async fn try_add_payment(
        &self,
        scope: &RequestScope,
        order_id: &str,
        request: &PaymentRequest,
    ) -> ServiceResult<PaymentReceipt> {
        let mut tx = self.db.begin().await?;
        order::lock_order(&mut tx, &scope.outlet_id, order_id).await?;
        let mut detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;

        detail.order.amount_paid = payment::completed_total(&mut tx, order_id).await?;
        let reconciliation = reconcile(&mut detail.order, request, &scope.actor_id, Utc::now())?;
        let order_changed = reconciliation.order_changed(&detail.order);

        payment::insert_payment(&mut tx, &reconciliation.payment).await?;
        order::update_order_header(&mut tx, &detail.order).await?;

        let detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;
        tx.commit().await?;
        debug_assert!(detail.order.amount_paid <= detail.order.total_amount);

        Ok(PaymentReceipt {
            payment: reconciliation.payment,
            order: detail,
            order_changed,
        })
    }
}

impl PaymentReceipt {
    pub fn balance_due(&self) -> Money {
        self.order.order.balance_due()
    }
}

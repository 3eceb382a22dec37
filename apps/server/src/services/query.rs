//! Read path. No transaction, no events.

use tracing::debug;

use dapur_core::{Order, OrderDetail, OrderFilter};
use dapur_db::repository::order::DEFAULT_LIST_LIMIT;

use super::OrderService;
use crate::error::{ServiceError, ServiceResult};
use crate::scope::RequestScope;

impl OrderService {
    /// Gets an order with items, modifiers and payments.
    ///
    /// Orders of other outlets are reported as not found.
    pub async fn get_order(&self, scope: &RequestScope, order_id: &str) -> ServiceResult<OrderDetail> {
        self.db
            .orders()
            .get(&scope.outlet_id, order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    /// Lists order headers of the caller's outlet, newest first.
    pub async fn list_orders(
        &self,
        scope: &RequestScope,
        filter: &OrderFilter,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<Order>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let orders = self.db.orders().list(&scope.outlet_id, filter, limit).await?;
        debug!(outlet_id = %scope.outlet_id, count = orders.len(), ?filter, "Listed orders");
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dapur_core::{Money, OrderStatus, PaymentMethod, PaymentRequest};

    use crate::services::create::tests::{catering, sixty_six_thousand};
    use crate::services::tests::{kwr, service, smg};

    #[tokio::test]
    async fn test_get_is_outlet_scoped() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();

        let detail = service.get_order(&kwr(), &created.order.id).await.unwrap();
        assert_eq!(detail, created);

        let err = service.get_order(&smg(), &created.order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_active_keeps_unsettled_catering() {
        let (service, _) = service().await;
        let open = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let done = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let booking = service.create_order(&kwr(), catering(20)).await.unwrap();
        service.create_order(&smg(), sixty_six_thousand()).await.unwrap();

        service.cancel_order(&kwr(), &done.order.id).await.unwrap();
        let deposit = PaymentRequest {
            payment_method: PaymentMethod::Transfer,
            amount: Money::from_minor(100_000),
            amount_received: None,
            reference_number: None,
        };
        service.add_payment(&kwr(), &booking.order.id, deposit).await.unwrap();

        let all = service.list_orders(&kwr(), &OrderFilter::default(), None).await.unwrap();
        assert_eq!(all.len(), 3);

        let active = OrderFilter {
            statuses: vec![],
            active: true,
        };
        let mut ids: Vec<String> = service
            .list_orders(&kwr(), &active, None)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        ids.sort();
        let mut expected = vec![open.order.id.clone(), booking.order.id.clone()];
        expected.sort();
        assert_eq!(ids, expected);

        let cancelled = OrderFilter {
            statuses: vec![OrderStatus::Cancelled],
            active: false,
        };
        let found = service.list_orders(&kwr(), &cancelled, Some(10)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, done.order.id);
    }
}

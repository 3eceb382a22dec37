//! Order and item status changes.
//!
//! ```text
//! order:  NEW ─► PREPARING ─► READY ─► COMPLETED
//!          │         │
//!          └────┬────┘
//!               ▼
//!           CANCELLED        (catering booking cancelled with it)
//!
//! item:   PENDING ─► PREPARING ─► READY
//! ```

use chrono::Utc;
use tracing::info;

use dapur_core::{EventType, ItemStatus, OrderDetail, OrderStatus};
use dapur_db::repository::order;

use super::{retry_on_conflict, OrderService};
use crate::error::ServiceResult;
use crate::scope::RequestScope;

impl OrderService {
    /// Moves an order along a legal status edge.
    pub async fn transition_order(
        &self,
        scope: &RequestScope,
        order_id: &str,
        next: OrderStatus,
    ) -> ServiceResult<OrderDetail> {
        let (detail, previous) = retry_on_conflict("transition_order", move || {
            self.try_transition(scope, order_id, next)
        })
        .await?;

        info!(
            order_id = %order_id,
            from = %previous,
            to = %detail.order.status,
            actor_id = %scope.actor_id,
            "Order status changed"
        );
        self.publish(EventType::OrderUpdated, &detail);
        Ok(detail)
    }

    /// Cancels a NEW or PREPARING order.
    pub async fn cancel_order(&self, scope: &RequestScope, order_id: &str) -> ServiceResult<OrderDetail> {
        self.transition_order(scope, order_id, OrderStatus::Cancelled).await
    }

    async fn try_transition(
        &self,
        scope: &RequestScope,
        order_id: &str,
        next: OrderStatus,
    ) -> ServiceResult<(OrderDetail, OrderStatus)> {
        let mut tx = self.db.begin().await?;
        order::lock_order(&mut tx, &scope.outlet_id, order_id).await?;
        let mut detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;

        let previous = detail.order.status;
        detail.order.transition_to(next, Utc::now())?;
        order::update_order_header(&mut tx, &detail.order).await?;

        let detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;
        tx.commit().await?;
        Ok((detail, previous))
    }

    /// Sets the kitchen status of one item.
    pub async fn set_item_status(
        &self,
        scope: &RequestScope,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ServiceResult<OrderDetail> {
        let detail = retry_on_conflict("set_item_status", move || {
            self.try_set_item_status(scope, order_id, item_id, next)
        })
        .await?;

        info!(order_id = %order_id, item_id = %item_id, status = %next, "Item status changed");
        self.publish(EventType::ItemUpdated, &detail);
        Ok(detail)
    }

    async fn try_set_item_status(
        &self,
        scope: &RequestScope,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ServiceResult<OrderDetail> {
        let mut tx = self.db.begin().await?;
        order::lock_order(&mut tx, &scope.outlet_id, order_id).await?;
        let mut detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;

        let item = detail.set_item_status(item_id, next, Utc::now())?.clone();
        order::update_item(&mut tx, &item).await?;
        order::update_order_header(&mut tx, &detail.order).await?;

        let detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;
        tx.commit().await?;
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dapur_core::{CateringStatus, CoreError};

    use crate::error::ServiceError;
    use crate::services::create::tests::{catering, sixty_six_thousand};
    use crate::services::tests::{kwr, service, smg};

    #[tokio::test]
    async fn test_happy_path_to_completed() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let id = &created.order.id;

        for next in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Completed] {
            let detail = service.transition_order(&kwr(), id, next).await.unwrap();
            assert_eq!(detail.order.status, next);
        }

        let detail = service.get_order(&kwr(), id).await.unwrap();
        assert!(detail.order.completed_at.is_some());
        assert_eq!(
            publisher.types(),
            vec![
                EventType::OrderCreated,
                EventType::OrderUpdated,
                EventType::OrderUpdated,
                EventType::OrderUpdated,
            ]
        );
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let id = &created.order.id;

        let err = service
            .transition_order(&kwr(), id, OrderStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::InvalidTransition {
                from: OrderStatus::New,
                to: OrderStatus::Ready
            })
        ));

        service.cancel_order(&kwr(), id).await.unwrap();
        for next in OrderStatus::ALL {
            let err = service.transition_order(&kwr(), id, next).await.unwrap_err();
            assert!(matches!(err, ServiceError::Domain(CoreError::InvalidTransition { .. })));
        }

        // created + cancelled only
        assert_eq!(publisher.types().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_catering_cancels_booking() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), catering(20)).await.unwrap();

        let detail = service.cancel_order(&kwr(), &created.order.id).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Cancelled);
        assert_eq!(detail.order.catering_status, Some(CateringStatus::Cancelled));
        assert!(!detail.order.is_active());
    }

    #[tokio::test]
    async fn test_item_status_progression() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let (id, item_id) = (&created.order.id, &created.items[0].id);

        let err = service
            .set_item_status(&kwr(), id, item_id, ItemStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::InvalidItemTransition { .. })));

        service
            .set_item_status(&kwr(), id, item_id, ItemStatus::Preparing)
            .await
            .unwrap();
        let detail = service
            .set_item_status(&kwr(), id, item_id, ItemStatus::Ready)
            .await
            .unwrap();

        assert_eq!(detail.items[0].status, ItemStatus::Ready);
        assert_eq!(detail.items[1].status, ItemStatus::Pending);
        // item status does not drive the order status
        assert_eq!(detail.order.status, OrderStatus::New);
        assert_eq!(publisher.types().last(), Some(&EventType::ItemUpdated));
    }

    #[tokio::test]
    async fn test_other_outlet_cannot_transition() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();

        let err = service
            .transition_order(&smg(), &created.order.id, OrderStatus::Preparing)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}

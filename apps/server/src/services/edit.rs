//! # Item Edits
//!
//! Single-item edits and the bulk diff-save. All of them require the order
//! to be NEW and all of them emit `item.updated` with the new totals.
//!
//! An edit that brings the total down to exactly what was already paid
//! settles the order in the same transaction and also emits `order.updated`.
//!
//! ```text
//! desired cart            current items
//!   A qty 1 (id)            A qty 1
//!   C qty 1 (no id)         B qty 2
//!        │                      │
//!        └──── plan_item_diff ──┘
//!                  │
//!        remove {B}  update {}  add {C}
//!                  │
//!        applied in one transaction, in that order
//! ```

use chrono::Utc;
use tracing::{debug, info};

use dapur_core::catalog::CatalogSnapshot;
use dapur_core::diff::{plan_item_diff, DesiredItem, ItemDiff};
use dapur_core::validation::validate_line;
use dapur_core::{CoreResult, EventType, OrderDetail, OrderLineRequest, UpdateItemRequest};
use dapur_db::repository::order;

use super::{retry_on_conflict, OrderService};
use crate::error::ServiceResult;
use crate::scope::RequestScope;

impl OrderService {
    /// Appends one line, priced from the current catalog.
    pub async fn add_item(
        &self,
        scope: &RequestScope,
        order_id: &str,
        line: OrderLineRequest,
    ) -> ServiceResult<OrderDetail> {
        validate_line(&line)?;
        let snapshot = self.db.catalog().resolve(&[line.product_id.as_str()]).await?;
        let (line, snapshot) = (&line, &snapshot);

        let detail = retry_on_conflict("add_item", move || {
            self.try_add_item(scope, order_id, line, snapshot)
        })
        .await?;

        info!(
            order_id = %order_id,
            product_id = %line.product_id,
            total = %detail.order.total_amount,
            "Item added"
        );
        self.publish(EventType::ItemUpdated, &detail);
        Ok(detail)
    }

    async fn try_add_item(
        &self,
        scope: &RequestScope,
        order_id: &str,
        line: &OrderLineRequest,
        snapshot: &CatalogSnapshot,
    ) -> ServiceResult<OrderDetail> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        order::lock_order(&mut tx, &scope.outlet_id, order_id).await?;
        let mut detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;

        detail.order.ensure_editable()?;
        let item = snapshot.price_line(line)?.into_item(order_id, now);
        detail.add_item(item.clone(), now)?;

        order::insert_item(&mut tx, &item).await?;
        order::update_order_header(&mut tx, &detail.order).await?;
        let detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Changes quantity and/or notes of one item. The price snapshot stays.
    pub async fn update_item(
        &self,
        scope: &RequestScope,
        order_id: &str,
        item_id: &str,
        update: UpdateItemRequest,
    ) -> ServiceResult<OrderDetail> {
        let update = &update;
        let (detail, settled) = retry_on_conflict("update_item", move || {
            self.try_update_item(scope, order_id, item_id, update)
        })
        .await?;

        info!(order_id = %order_id, item_id = %item_id, total = %detail.order.total_amount, "Item updated");
        self.publish_edit(&detail, settled);
        Ok(detail)
    }

    async fn try_update_item(
        &self,
        scope: &RequestScope,
        order_id: &str,
        item_id: &str,
        update: &UpdateItemRequest,
    ) -> ServiceResult<(OrderDetail, bool)> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        order::lock_order(&mut tx, &scope.outlet_id, order_id).await?;
        let mut detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;

        let item = detail.update_item(item_id, update, now)?.clone();
        detail.ensure_total_covers_paid()?;
        let settled = detail.settle_if_fully_paid(now)?;

        order::update_item(&mut tx, &item).await?;
        order::update_order_header(&mut tx, &detail.order).await?;
        let detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;
        tx.commit().await?;
        Ok((detail, settled))
    }

    /// Deletes one item with its modifiers.
    ///
    /// Removing the last item leaves an empty NEW order.
    pub async fn remove_item(
        &self,
        scope: &RequestScope,
        order_id: &str,
        item_id: &str,
    ) -> ServiceResult<OrderDetail> {
        let (detail, settled) = retry_on_conflict("remove_item", move || {
            self.try_remove_item(scope, order_id, item_id)
        })
        .await?;

        info!(
            order_id = %order_id,
            item_id = %item_id,
            remaining_items = detail.items.len(),
            "Item removed"
        );
        self.publish_edit(&detail, settled);
        Ok(detail)
    }

    async fn try_remove_item(
        &self,
        scope: &RequestScope,
        order_id: &str,
        item_id: &str,
    ) -> ServiceResult<(OrderDetail, bool)> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        order::lock_order(&mut tx, &scope.outlet_id, order_id).await?;
        let mut detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;

        detail.remove_item(item_id, now)?;
        detail.ensure_total_covers_paid()?;
        let settled = detail.settle_if_fully_paid(now)?;

        order::delete_item(&mut tx, order_id, item_id).await?;
        order::update_order_header(&mut tx, &detail.order).await?;
        let detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;
        tx.commit().await?;
        Ok((detail, settled))
    }

    /// Re-saves a bulk-edited cart.
    ///
    /// Lines with an id are existing items (quantity and notes may change),
    /// lines without one are added, and current items missing from the cart
    /// are removed. Either every change lands or none does.
    pub async fn save_items(
        &self,
        scope: &RequestScope,
        order_id: &str,
        desired: Vec<DesiredItem>,
    ) -> ServiceResult<OrderDetail> {
        let new_products: Vec<&str> = desired
            .iter()
            .filter(|d| d.id.is_none())
            .map(|d| d.line.product_id.as_str())
            .collect();
        let snapshot = self.db.catalog().resolve(&new_products).await?;
        let (desired, snapshot) = (desired.as_slice(), &snapshot);

        let (detail, diff, settled) = retry_on_conflict("save_items", move || {
            self.try_save_items(scope, order_id, desired, snapshot)
        })
        .await?;

        if !diff.is_empty() {
            info!(
                order_id = %order_id,
                added = diff.to_add.len(),
                updated = diff.to_update.len(),
                removed = diff.to_remove.len(),
                total = %detail.order.total_amount,
                "Cart saved"
            );
            self.publish_edit(&detail, settled);
        }
        Ok(detail)
    }

    async fn try_save_items(
        &self,
        scope: &RequestScope,
        order_id: &str,
        desired: &[DesiredItem],
        snapshot: &CatalogSnapshot,
    ) -> ServiceResult<(OrderDetail, ItemDiff, bool)> {
        let mut tx = self.db.begin().await?;
        order::lock_order(&mut tx, &scope.outlet_id, order_id).await?;
        let mut detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;

        detail.order.ensure_editable()?;
        let diff = plan_item_diff(order_id, &detail.items, desired)?;
        if diff.is_empty() {
            debug!(order_id = %order_id, "Cart unchanged, nothing to save");
            return Ok((detail, diff, false));
        }

        let settled = apply_diff(&mut detail, &diff, snapshot)?;
        persist_diff(&mut tx, &detail, &diff).await?;

        let detail = order::require_detail(&mut tx, &scope.outlet_id, order_id).await?;
        tx.commit().await?;
        Ok((detail, diff, settled))
    }

    fn publish_edit(&self, detail: &OrderDetail, settled: bool) {
        self.publish(EventType::ItemUpdated, detail);
        if settled {
            info!(order_id = %detail.order.id, status = %detail.order.status, "Order settled by edit");
            self.publish(EventType::OrderUpdated, detail);
        }
    }
}

/// Applies the planned diff to the in-memory aggregate. Returns whether the
/// order was settled by it.
fn apply_diff(detail: &mut OrderDetail, diff: &ItemDiff, snapshot: &CatalogSnapshot) -> CoreResult<bool> {
    let now = Utc::now();
    for item_id in &diff.to_remove {
        detail.remove_item(item_id, now)?;
    }
    for change in &diff.to_update {
        detail.update_item(&change.item_id, &change.update, now)?;
    }
    let order_id = detail.order.id.clone();
    for line in &diff.to_add {
        let item = snapshot.price_line(line)?.into_item(&order_id, now);
        detail.add_item(item, now)?;
    }
    detail.ensure_total_covers_paid()?;
    detail.settle_if_fully_paid(now)
}

/// Writes the rows touched by `diff`. New items are the tail of `detail.items`.
async fn persist_diff(
    conn: &mut sqlx::SqliteConnection,
    detail: &OrderDetail,
    diff: &ItemDiff,
) -> ServiceResult<()> {
    for item_id in &diff.to_remove {
        order::delete_item(conn, &detail.order.id, item_id).await?;
    }
    for change in &diff.to_update {
        if let Some(item) = detail.item(&change.item_id) {
            order::update_item(conn, item).await?;
        }
    }
    let added = detail.items.len() - diff.to_add.len();
    for item in &detail.items[added..] {
        order::insert_item(conn, item).await?;
    }
    order::update_order_header(conn, &detail.order).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dapur_core::{
        CateringStatus, CoreError, ItemStatus, Money, OrderStatus, PaymentMethod, PaymentRequest,
    };
    use dapur_db::seed::ids;

    use crate::error::ServiceError;
    use crate::services::create::tests::{
        assert_totals_consistent, catering, dine_in, sixty_six_thousand,
    };
    use crate::services::tests::{kwr, line, service, smg};

    fn keep(detail: &OrderDetail, index: usize) -> DesiredItem {
        let item = &detail.items[index];
        DesiredItem {
            id: Some(item.id.clone()),
            line: OrderLineRequest {
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                modifier_ids: item.modifiers.iter().map(|m| m.modifier_id.clone()).collect(),
                notes: item.notes.clone(),
            },
        }
    }

    fn new_line(product_id: &str, quantity: i64) -> DesiredItem {
        DesiredItem {
            id: None,
            line: line(product_id, quantity, &[]),
        }
    }

    #[tokio::test]
    async fn test_add_item_recomputes_totals() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        publisher.clear();

        let mut jumbo = line(ids::ES_TEH, 1, &[]);
        jumbo.variant_id = Some(ids::ES_TEH_JUMBO.to_string());
        let detail = service.add_item(&kwr(), &created.order.id, jumbo).await.unwrap();

        assert_eq!(detail.items.len(), 3);
        assert_eq!(detail.items[2].variant_name.as_deref(), Some("Jumbo"));
        assert_eq!(detail.order.total_amount.minor(), 78_000);
        assert_totals_consistent(&detail);
        assert_eq!(publisher.types(), vec![EventType::ItemUpdated]);
    }

    #[tokio::test]
    async fn test_update_keeps_price_snapshot() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();

        sqlx::query("UPDATE products SET base_price = 10000 WHERE id = ?1")
            .bind(ids::ES_TEH)
            .execute(service.database().pool())
            .await
            .unwrap();

        let es_teh = &created.items[1];
        let update = UpdateItemRequest {
            quantity: Some(3),
            notes: Some("  es sedikit ".to_string()),
        };
        let detail = service
            .update_item(&kwr(), &created.order.id, &es_teh.id, update)
            .await
            .unwrap();

        let item = detail.item(&es_teh.id).unwrap();
        assert_eq!(item.unit_price.minor(), 8_000);
        assert_eq!(item.subtotal.minor(), 24_000);
        assert_eq!(item.notes.as_deref(), Some("es sedikit"));
        assert_eq!(detail.order.total_amount.minor(), 74_000);
        assert_totals_consistent(&detail);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected_not_deleted() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();

        let update = UpdateItemRequest {
            quantity: Some(0),
            notes: None,
        };
        let err = service
            .update_item(&kwr(), &created.order.id, &created.items[0].id, update)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::Validation(_))));

        let detail = service.get_order(&kwr(), &created.order.id).await.unwrap();
        assert_eq!(detail.items.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_last_item_keeps_order_open() {
        let (service, _) = service().await;
        let created = service
            .create_order(&kwr(), dine_in(vec![line(ids::ES_TEH, 1, &[])]))
            .await
            .unwrap();

        let detail = service
            .remove_item(&kwr(), &created.order.id, &created.items[0].id)
            .await
            .unwrap();
        assert!(detail.items.is_empty());
        assert_eq!(detail.order.status, OrderStatus::New);
        assert!(detail.order.total_amount.is_zero());

        let err = service
            .remove_item(&kwr(), &created.order.id, &created.items[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::ItemNotFound { .. })));
    }

    #[tokio::test]
    async fn test_edits_refused_once_preparing() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        service
            .transition_order(&kwr(), &created.order.id, OrderStatus::Preparing)
            .await
            .unwrap();

        let err = service
            .add_item(&kwr(), &created.order.id, line(ids::ES_TEH, 1, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::OrderNotEditable { .. })));

        let err = service
            .remove_item(&kwr(), &created.order.id, &created.items[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::OrderNotEditable { .. })));

        // kitchen status is still settable
        let detail = service
            .set_item_status(&kwr(), &created.order.id, &created.items[0].id, ItemStatus::Preparing)
            .await
            .unwrap();
        assert_eq!(detail.items[0].status, ItemStatus::Preparing);
    }

    #[tokio::test]
    async fn test_edit_cannot_drop_total_below_paid() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let payment = PaymentRequest {
            payment_method: PaymentMethod::Qris,
            amount: Money::from_minor(60_000),
            amount_received: None,
            reference_number: None,
        };
        service.add_payment(&kwr(), &created.order.id, payment).await.unwrap();

        let err = service
            .remove_item(&kwr(), &created.order.id, &created.items[1].id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::TotalBelowAmountPaid { .. })
        ));

        let detail = service.get_order(&kwr(), &created.order.id).await.unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.order.total_amount.minor(), 66_000);
    }

    fn qris(amount: i64) -> PaymentRequest {
        PaymentRequest {
            payment_method: PaymentMethod::Qris,
            amount: Money::from_minor(amount),
            amount_received: None,
            reference_number: None,
        }
    }

    #[tokio::test]
    async fn test_edit_down_to_paid_amount_completes_order() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let id = &created.order.id;
        service.add_payment(&kwr(), id, qris(50_000)).await.unwrap();
        publisher.clear();

        let detail = service.remove_item(&kwr(), id, &created.items[1].id).await.unwrap();
        assert_eq!(detail.order.total_amount.minor(), 50_000);
        assert_eq!(detail.order.amount_paid.minor(), 50_000);
        assert_eq!(detail.order.status, OrderStatus::Completed);
        assert!(detail.order.completed_at.is_some());
        assert_eq!(
            publisher.types(),
            vec![EventType::ItemUpdated, EventType::OrderUpdated]
        );

        let stored = service.get_order(&kwr(), id).await.unwrap();
        assert_eq!(stored.order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_catering_edit_down_to_deposit_settles() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), catering(20)).await.unwrap();
        let id = &created.order.id;
        service.add_payment(&kwr(), id, qris(249_900)).await.unwrap();
        publisher.clear();

        let update = UpdateItemRequest {
            quantity: Some(10),
            notes: None,
        };
        let detail = service
            .update_item(&kwr(), id, &created.items[0].id, update)
            .await
            .unwrap();
        assert_eq!(detail.order.total_amount.minor(), 249_900);
        assert_eq!(detail.order.catering_status, Some(CateringStatus::Settled));
        assert_eq!(detail.order.status, OrderStatus::Completed);
        assert!(!detail.order.is_active());
        assert_eq!(
            publisher.types(),
            vec![EventType::ItemUpdated, EventType::OrderUpdated]
        );
    }

    #[tokio::test]
    async fn test_diff_save_down_to_paid_amount_settles() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        let id = &created.order.id;
        service.add_payment(&kwr(), id, qris(50_000)).await.unwrap();
        publisher.clear();

        let detail = service
            .save_items(&kwr(), id, vec![keep(&created, 0)])
            .await
            .unwrap();
        assert_eq!(detail.order.status, OrderStatus::Completed);
        assert_eq!(
            publisher.types(),
            vec![EventType::ItemUpdated, EventType::OrderUpdated]
        );
    }

    #[tokio::test]
    async fn test_diff_save_applies_add_and_remove() {
        let (service, publisher) = service().await;
        // A = Es Teh ×1, B = Nasi Goreng ×2
        let created = service
            .create_order(
                &kwr(),
                dine_in(vec![
                    line(ids::ES_TEH, 1, &[]),
                    line(ids::NASI_GORENG, 2, &[ids::MOD_PEDAS]),
                ]),
            )
            .await
            .unwrap();
        publisher.clear();
        let a = created.items[0].clone();

        // keep A unchanged, drop B, add C = Nasi Box ×1
        let desired = vec![keep(&created, 0), new_line(ids::NASI_BOX, 1)];
        let detail = service
            .save_items(&kwr(), &created.order.id, desired)
            .await
            .unwrap();

        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0], a);
        assert_eq!(detail.items[1].product_id, ids::NASI_BOX);
        assert_eq!(detail.order.subtotal.minor(), 8_000 + 24_990);
        assert_totals_consistent(&detail);
        assert_eq!(publisher.types(), vec![EventType::ItemUpdated]);
    }

    #[tokio::test]
    async fn test_diff_save_updates_and_noop() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        publisher.clear();

        let unchanged = vec![keep(&created, 0), keep(&created, 1)];
        let detail = service
            .save_items(&kwr(), &created.order.id, unchanged.clone())
            .await
            .unwrap();
        assert_eq!(detail, created);
        assert!(publisher.types().is_empty());

        let mut more_tea = unchanged;
        more_tea[1].line.quantity = 4;
        let detail = service
            .save_items(&kwr(), &created.order.id, more_tea)
            .await
            .unwrap();
        assert_eq!(detail.items[1].quantity, 4);
        assert_eq!(detail.order.total_amount.minor(), 82_000);
    }

    #[tokio::test]
    async fn test_failed_diff_leaves_order_untouched() {
        let (service, publisher) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();
        publisher.clear();

        // removes Es Teh, then fails pricing the new line
        let desired = vec![keep(&created, 0), new_line(ids::KOPI_TUBRUK, 1)];
        let err = service
            .save_items(&kwr(), &created.order.id, desired)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::UnknownProduct { .. })));

        let detail = service.get_order(&kwr(), &created.order.id).await.unwrap();
        assert_eq!(detail, created);
        assert!(publisher.types().is_empty());
    }

    #[tokio::test]
    async fn test_other_outlet_cannot_edit() {
        let (service, _) = service().await;
        let created = service.create_order(&kwr(), sixty_six_thousand()).await.unwrap();

        let err = service
            .remove_item(&smg(), &created.order.id, &created.items[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err = service
            .save_items(&smg(), &created.order.id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}

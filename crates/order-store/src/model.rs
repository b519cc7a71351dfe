//! Row models persisted by the order store.

use chrono::{DateTime, Utc};

use crate::{CustomerId, OrderId, OrderStatus, ProductId};

/// A catalog product and its available stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    /// Unit price in minor currency units.
    pub price_cents: i64,
    /// Available quantity. Never negative.
    pub stock: i64,
}

/// Values for inserting a catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

/// Partial update of a catalog product.
///
/// `stock` is the new on-hand level, not a delta. Units already reserved by
/// open orders are not added back: setting 10 while 3 units sit in an order
/// leaves 10 available, and canceling that order later raises it to 13.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.price_cents.is_none() && self.stock.is_none()
    }
}

/// An order header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    /// Sum of item subtotals, fixed at creation.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A line of an order. Written once together with its order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub qty: i64,
    /// Product price snapshotted when the order was created.
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// An order together with its items, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithItems {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
}

/// Values for inserting an order and its items in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<NewOrderItem>,
}

/// Values for one line of a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub qty: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// A cached response for an idempotent operation.
///
/// The pair `(key, target_type)` is unique. `response_body` holds the exact
/// bytes returned the first time so replays are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub key: String,
    pub target_type: String,
    pub target_id: i64,
    pub status: String,
    pub response_body: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Returns true if the record is still live at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProductPatch::default().is_empty());
        assert!(
            !ProductPatch {
                stock: Some(3),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn idempotency_record_expires_at_boundary() {
        let now = Utc::now();
        let record = IdempotencyRecord {
            key: "k1".to_string(),
            target_type: "order_confirm".to_string(),
            target_id: 1,
            status: "CONFIRMED".to_string(),
            response_body: "{}".to_string(),
            created_at: now,
            expires_at: now + Duration::hours(1),
        };
        assert!(record.is_live(now));
        assert!(!record.is_live(now + Duration::hours(1)));
    }
}

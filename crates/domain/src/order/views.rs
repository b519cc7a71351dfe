//! Response shapes returned by the order service.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderStatus, ProductId};
use order_store::{OrderItemRecord, OrderRecord, OrderWithItems};
use serde::{Deserialize, Serialize};

/// One line of an order as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub qty: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<OrderItemRecord> for OrderItemView {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            product_id: item.product_id,
            qty: item.qty,
            unit_price_cents: item.unit_price_cents,
            subtotal_cents: item.subtotal_cents,
        }
    }
}

/// An order header, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRecord> for OrderSummary {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            total_cents: order.total_cents,
            created_at: order.created_at,
        }
    }
}

/// An order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl From<OrderWithItems> for OrderView {
    fn from(OrderWithItems { order, items }: OrderWithItems) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            total_cents: order.total_cents,
            created_at: order.created_at,
            items: items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}

/// The body stored and replayed for a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub items: Vec<OrderItemView>,
}

impl ConfirmationResponse {
    /// Builds the canonical confirmed response for an order.
    pub fn confirmed(order: &OrderWithItems) -> Self {
        Self {
            id: order.order.id,
            status: OrderStatus::Confirmed,
            total_cents: order.order.total_cents,
            items: order.items.iter().cloned().map(OrderItemView::from).collect(),
        }
    }
}

/// Outcome of a confirmation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// The exact response body; identical for every call with the same key.
    pub body: String,
    /// True if the body came from an earlier call with the same key.
    pub replayed: bool,
}

impl Confirmation {
    /// Decodes the stored body.
    pub fn response(&self) -> serde_json::Result<ConfirmationResponse> {
        serde_json::from_str(&self.body)
    }
}

/// Body returned by a successful cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationResponse {
    pub id: OrderId,
    pub status: OrderStatus,
}

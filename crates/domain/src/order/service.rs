//! Order service: the lifecycle engine over an [`OrderStore`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use common::{CustomerId, OrderId, OrderStatus, ProductId};
use order_store::{
    IdempotencyRecord, NewOrder, NewOrderItem, OrderQuery, OrderStore, Product, UnitOfWork,
};

use super::rules;
use super::{
    CancellationResponse, Confirmation, ConfirmationResponse, Money, OrderLine, OrderSummary,
    OrderView,
};
use crate::clock::{Clock, DefaultClock};
use crate::customer::CustomerDirectory;
use crate::error::DomainError;

/// Target type under which confirmation responses are cached.
pub const CONFIRM_TARGET: &str = "order_confirm";

/// Tunables for [`OrderService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderServiceConfig {
    /// How long a confirmation response stays replayable.
    pub idempotency_ttl: Duration,
    /// How long after creation a confirmed order may still be canceled.
    pub cancellation_window: Duration,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl: Duration::hours(24),
            cancellation_window: Duration::minutes(10),
        }
    }
}

/// Service for managing orders.
///
/// Creation, confirmation and cancellation each run inside a single unit of
/// work; any failure drops it and nothing is written.
pub struct OrderService<S, C, K = DefaultClock> {
    store: S,
    customers: C,
    clock: K,
    config: OrderServiceConfig,
}

impl<S: OrderStore, C: CustomerDirectory> OrderService<S, C> {
    /// Creates a service on the system clock with the default configuration.
    pub fn new(store: S, customers: C) -> Self {
        Self::with_clock(store, customers, DefaultClock, OrderServiceConfig::default())
    }
}

impl<S: OrderStore, C: CustomerDirectory, K: Clock> OrderService<S, C, K> {
    pub fn with_clock(store: S, customers: C, clock: K, config: OrderServiceConfig) -> Self {
        Self {
            store,
            customers,
            clock,
            config,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OrderServiceConfig {
        &self.config
    }

    /// Creates an order, reserving stock for every line.
    ///
    /// The customer must exist and every product must have enough stock for
    /// its line. Unit prices are snapshotted and the total is fixed here.
    #[tracing::instrument(skip(self, lines), fields(customer_id = %customer_id, lines = lines.len()))]
    pub async fn create_order(
        &self,
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
    ) -> Result<OrderView, DomainError> {
        rules::validate_lines(&lines)?;
        self.ensure_customer(customer_id).await?;

        let mut tx = self.store.begin().await?;

        // Lock rows in id order so concurrent orders over the same products
        // queue instead of deadlocking.
        let product_ids: BTreeSet<ProductId> = lines.iter().map(|l| l.product_id).collect();
        let mut products: BTreeMap<ProductId, Product> = BTreeMap::new();
        for id in product_ids {
            let product = tx
                .lock_product(id)
                .await?
                .ok_or(DomainError::UnknownProduct(id))?;
            products.insert(id, product);
        }

        let mut total = Money::zero();
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = products
                .get_mut(&line.product_id)
                .ok_or(DomainError::UnknownProduct(line.product_id))?;

            if line.qty > product.stock {
                return Err(violation(DomainError::InsufficientStock {
                    product_id: product.id,
                    requested: line.qty,
                    available: product.stock,
                }));
            }

            let unit_price = Money::from_cents(product.price_cents);
            let subtotal = unit_price.checked_multiply(line.qty);
            let new_total = subtotal.and_then(|s| total.checked_add(s));
            let (Some(subtotal), Some(new_total)) = (subtotal, new_total) else {
                return Err(DomainError::InvalidQuantity {
                    product_id: line.product_id,
                    qty: line.qty,
                });
            };

            product.stock = tx.adjust_stock(product.id, -line.qty).await?;
            total = new_total;
            items.push(NewOrderItem {
                product_id: product.id,
                qty: line.qty,
                unit_price_cents: unit_price.cents(),
                subtotal_cents: subtotal.cents(),
            });
        }

        let created = tx
            .insert_order(NewOrder {
                customer_id,
                total_cents: total.cents(),
                created_at: self.clock.utc(),
                items,
            })
            .await?;
        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %created.order.id, total_cents = created.order.total_cents, "order created");

        Ok(OrderView::from(created))
    }

    /// Confirms an order exactly once per idempotency key.
    ///
    /// Every call with the same key returns the body stored by the first
    /// successful call, whatever happened to the order since.
    #[tracing::instrument(skip(self, idempotency_key), fields(order_id = %order_id))]
    pub async fn confirm_order(
        &self,
        order_id: OrderId,
        idempotency_key: &str,
    ) -> Result<Confirmation, DomainError> {
        let key = rules::validate_idempotency_key(idempotency_key)?;
        let now = self.clock.utc();

        let mut tx = self.store.begin().await?;

        if let Some(record) = tx.find_idempotency(key, CONFIRM_TARGET, now).await? {
            if record.target_id != order_id.as_i64() {
                tracing::warn!(
                    stored_order_id = record.target_id,
                    "idempotency key reused for a different order"
                );
            }
            metrics::counter!("order_confirm_replays_total").increment(1);
            tracing::debug!("replaying stored confirmation");
            return Ok(Confirmation {
                body: record.response_body,
                replayed: true,
            });
        }

        let order = tx
            .lock_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let status = order.order.status;
        if status.is_terminal() {
            return Err(violation(DomainError::NotConfirmable { order_id, status }));
        }
        // A CONFIRMED order under a fresh key is answered without a transition.
        let transitioned = status.can_confirm();
        if transitioned {
            tx.set_order_status(order_id, OrderStatus::Confirmed)
                .await?;
        }

        let body = serde_json::to_string(&ConfirmationResponse::confirmed(&order))?;
        let stored = tx
            .save_idempotency(IdempotencyRecord {
                key: key.to_string(),
                target_type: CONFIRM_TARGET.to_string(),
                target_id: order_id.as_i64(),
                status: OrderStatus::Confirmed.as_str().to_string(),
                response_body: body,
                created_at: now,
                expires_at: now + self.config.idempotency_ttl,
            })
            .await?;
        tx.commit().await?;

        if transitioned {
            metrics::counter!("orders_confirmed_total").increment(1);
            tracing::info!("order confirmed");
        }

        Ok(Confirmation {
            body: stored.response_body,
            replayed: false,
        })
    }

    /// Cancels an order and returns its reserved stock.
    ///
    /// CREATED orders can always be canceled; CONFIRMED ones only within the
    /// configured window. Canceling twice always fails.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<CancellationResponse, DomainError> {
        let now = self.clock.utc();
        let mut tx = self.store.begin().await?;

        let order = tx
            .lock_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        rules::check_cancellable(&order.order, now, self.config.cancellation_window)
            .map_err(violation)?;

        for item in &order.items {
            tx.adjust_stock(item.product_id, item.qty).await?;
        }
        tx.set_order_status(order_id, OrderStatus::Canceled)
            .await?;
        tx.commit().await?;

        metrics::counter!("orders_canceled_total").increment(1);
        tracing::info!(previous_status = %order.order.status, "order canceled");

        Ok(CancellationResponse {
            id: order_id,
            status: OrderStatus::Canceled,
        })
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderView>, DomainError> {
        Ok(self.store.get_order(order_id).await?.map(OrderView::from))
    }

    /// Lists order headers, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, query: OrderQuery) -> Result<Vec<OrderSummary>, DomainError> {
        let orders = self.store.list_orders(query).await?;
        Ok(orders.into_iter().map(OrderSummary::from).collect())
    }

    /// Deletes idempotency records that are no longer live.
    pub async fn purge_expired_idempotency(&self) -> Result<u64, DomainError> {
        let removed = self
            .store
            .purge_expired_idempotency(self.clock.utc())
            .await?;
        if removed > 0 {
            tracing::info!(removed, "purged expired idempotency records");
        }
        Ok(removed)
    }

    async fn ensure_customer(&self, customer_id: CustomerId) -> Result<(), DomainError> {
        match self.customers.find_customer(customer_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(DomainError::UnknownCustomer(customer_id)),
            Err(e) => {
                tracing::error!(error = %e, "customer lookup failed");
                Err(e.into())
            }
        }
    }
}

/// Records a business rule violation and hands the error back.
fn violation(err: DomainError) -> DomainError {
    if let Some(rule) = err.rule() {
        metrics::counter!("order_rule_violations_total", "rule" => rule).increment(1);
        tracing::warn!(rule, error = %err, "order rule violated");
    }
    err
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use order_store::{InMemoryOrderStore, NewProduct};

    use super::*;
    use crate::clock::FixedClock;
    use crate::customer::InMemoryCustomerDirectory;

    type TestService = OrderService<InMemoryOrderStore, InMemoryCustomerDirectory, FixedClock>;

    async fn setup() -> (TestService, FixedClock, ProductId) {
        let store = InMemoryOrderStore::new();
        let product = store
            .insert_product(NewProduct {
                sku: "SKU-001".to_string(),
                name: "Widget".to_string(),
                price_cents: 1000,
                stock: 5,
            })
            .await
            .unwrap();

        let customers = InMemoryCustomerDirectory::new();
        customers.add(CustomerId::new(1), "Ada").await;

        let clock = FixedClock::new(Utc::now());
        let service = OrderService::with_clock(
            store,
            customers,
            clock.clone(),
            OrderServiceConfig::default(),
        );
        (service, clock, product.id)
    }

    async fn stock(service: &TestService, id: ProductId) -> i64 {
        service.store().get_product(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_create_order_reserves_stock() {
        let (service, _, product_id) = setup().await;

        let order = service
            .create_order(CustomerId::new(1), vec![OrderLine::new(product_id, 3)])
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.total_cents, 3000);
        assert_eq!(order.items[0].unit_price_cents, 1000);
        assert_eq!(stock(&service, product_id).await, 2);
    }

    #[tokio::test]
    async fn test_unknown_customer_creates_nothing() {
        let (service, _, product_id) = setup().await;

        let result = service
            .create_order(CustomerId::new(99), vec![OrderLine::new(product_id, 1)])
            .await;

        assert!(matches!(result, Err(DomainError::UnknownCustomer(_))));
        assert_eq!(stock(&service, product_id).await, 5);
        assert_eq!(service.store().order_count().await, 0);
    }

    #[tokio::test]
    async fn test_repeated_product_lines_share_stock() {
        let (service, _, product_id) = setup().await;

        let result = service
            .create_order(
                CustomerId::new(1),
                vec![OrderLine::new(product_id, 3), OrderLine::new(product_id, 3)],
            )
            .await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));
        assert_eq!(stock(&service, product_id).await, 5);
    }

    #[tokio::test]
    async fn test_confirm_requires_key() {
        let (service, _, _) = setup().await;
        let result = service.confirm_order(OrderId::new(1), " ").await;
        assert!(matches!(result, Err(DomainError::MissingIdempotencyKey)));
    }

    #[tokio::test]
    async fn test_confirm_replays_stored_body() {
        let (service, _, product_id) = setup().await;
        let order = service
            .create_order(CustomerId::new(1), vec![OrderLine::new(product_id, 1)])
            .await
            .unwrap();

        let first = service.confirm_order(order.id, "k1").await.unwrap();
        let second = service.confirm_order(order.id, "k1").await.unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.body, second.body);
    }

    #[tokio::test]
    async fn test_confirm_missing_order() {
        let (service, _, _) = setup().await;
        let result = service.confirm_order(OrderId::new(42), "k1").await;
        assert!(matches!(result, Err(DomainError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let (service, _, product_id) = setup().await;
        let order = service
            .create_order(CustomerId::new(1), vec![OrderLine::new(product_id, 4)])
            .await
            .unwrap();
        assert_eq!(stock(&service, product_id).await, 1);

        let canceled = service.cancel_order(order.id).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(stock(&service, product_id).await, 5);
    }

    #[tokio::test]
    async fn test_expired_idempotency_records_are_purged() {
        let (service, clock, product_id) = setup().await;
        let order = service
            .create_order(CustomerId::new(1), vec![OrderLine::new(product_id, 1)])
            .await
            .unwrap();
        service.confirm_order(order.id, "k1").await.unwrap();

        assert_eq!(service.purge_expired_idempotency().await.unwrap(), 0);
        clock.advance(Duration::hours(25));
        assert_eq!(service.purge_expired_idempotency().await.unwrap(), 1);
    }
}

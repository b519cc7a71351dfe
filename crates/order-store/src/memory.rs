use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    IdempotencyRecord, NewOrder, NewProduct, OrderId, OrderItemRecord, OrderQuery, OrderRecord,
    OrderStatus, OrderWithItems, Product, ProductId, ProductPatch, ProductQuery, Result,
    StoreError,
    store::{OrderStore, UnitOfWork},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, OrderRecord>,
    items: BTreeMap<OrderId, Vec<OrderItemRecord>>,
    idempotency: HashMap<(String, String), IdempotencyRecord>,
    last_product_id: i64,
    last_order_id: i64,
}

impl Tables {
    fn order_with_items(&self, id: OrderId) -> Option<OrderWithItems> {
        let order = self.orders.get(&id)?.clone();
        let items = self.items.get(&id).cloned().unwrap_or_default();
        Some(OrderWithItems { order, items })
    }

    fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<i64> {
        let product = self
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        let stock = product.stock + delta;
        if stock < 0 {
            return Err(StoreError::StockUnderflow { product_id: id });
        }
        product.stock = stock;
        Ok(stock)
    }
}

/// In-memory order store for testing and local runs.
///
/// A unit of work holds the store's single lock for its whole lifetime and
/// writes to a staged copy of the tables; commit swaps the copy in. Units of
/// work are therefore fully serialized.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }

    /// Returns the number of idempotency records stored, live or expired.
    pub async fn idempotency_count(&self) -> usize {
        self.tables.lock().await.idempotency.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    type Tx = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryUnitOfWork { guard, staged })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderWithItems>> {
        Ok(self.tables.lock().await.order_with_items(id))
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| query.status.is_none_or(|status| o.status == status))
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders.truncate(query.limit);
        Ok(orders)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let tables = self.tables.lock().await;
        let products = tables
            .products
            .values()
            .filter(|p| query.cursor.is_none_or(|cursor| p.id > cursor))
            .filter(|p| query.matches(&p.name, &p.sku))
            .take(query.limit)
            .cloned()
            .collect();
        Ok(products)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut tables = self.tables.lock().await;
        if tables.products.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::DuplicateSku(product.sku));
        }

        tables.last_product_id += 1;
        let stored = Product {
            id: ProductId::new(tables.last_product_id),
            sku: product.sku,
            name: product.name,
            price_cents: product.price_cents,
            stock: product.stock,
        };
        tables.products.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let mut tables = self.tables.lock().await;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        if patch.stock.is_some_and(|stock| stock < 0) {
            return Err(StoreError::StockUnderflow { product_id: id });
        }

        if let Some(price_cents) = patch.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        Ok(Some(product.clone()))
    }

    async fn purge_expired_idempotency(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.idempotency.len();
        tables.idempotency.retain(|_, record| record.is_live(now));
        Ok((before - tables.idempotency.len()) as u64)
    }
}

/// Unit of work over [`InMemoryOrderStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        // The store lock is already held exclusively.
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<i64> {
        self.staged.adjust_stock(id, delta)
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderWithItems> {
        self.staged.last_order_id += 1;
        let id = OrderId::new(self.staged.last_order_id);

        let record = OrderRecord {
            id,
            customer_id: order.customer_id,
            status: OrderStatus::Created,
            total_cents: order.total_cents,
            created_at: order.created_at,
        };
        let items: Vec<OrderItemRecord> = order
            .items
            .into_iter()
            .map(|item| OrderItemRecord {
                order_id: id,
                product_id: item.product_id,
                qty: item.qty,
                unit_price_cents: item.unit_price_cents,
                subtotal_cents: item.subtotal_cents,
            })
            .collect();

        self.staged.orders.insert(id, record.clone());
        self.staged.items.insert(id, items.clone());
        Ok(OrderWithItems {
            order: record,
            items,
        })
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<OrderWithItems>> {
        Ok(self.staged.order_with_items(id))
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()> {
        let order = self
            .staged
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        order.status = status;
        Ok(())
    }

    async fn find_idempotency(
        &mut self,
        key: &str,
        target_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>> {
        let record = self
            .staged
            .idempotency
            .get(&(key.to_string(), target_type.to_string()))
            .filter(|record| record.is_live(now))
            .cloned();
        Ok(record)
    }

    async fn save_idempotency(&mut self, record: IdempotencyRecord) -> Result<IdempotencyRecord> {
        let slot = (record.key.clone(), record.target_type.clone());
        if let Some(existing) = self.staged.idempotency.get(&slot)
            && existing.is_live(record.created_at)
        {
            return Ok(existing.clone());
        }
        self.staged.idempotency.insert(slot, record.clone());
        Ok(record)
    }

    async fn commit(self) -> Result<()> {
        let Self { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

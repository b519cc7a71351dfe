use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    IdempotencyRecord, NewOrder, NewProduct, OrderId, OrderQuery, OrderRecord, OrderStatus,
    OrderWithItems, Product, ProductId, ProductPatch, ProductQuery, Result,
};

/// Core trait for order store implementations.
///
/// Plain reads and catalog writes run directly against the store. Every
/// operation that touches the stock ledger or an order's status goes through
/// a [`UnitOfWork`] obtained from [`OrderStore::begin`].
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The transaction type handed out by [`OrderStore::begin`].
    type Tx: UnitOfWork;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Loads an order and its items.
    ///
    /// Returns None if the order doesn't exist.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderWithItems>>;

    /// Lists order headers, newest first.
    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>>;

    /// Loads a product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists products ascending by id.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    /// Inserts a catalog product.
    ///
    /// Fails with `DuplicateSku` if the SKU is taken.
    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Applies a partial update to a product.
    ///
    /// Returns None if the product doesn't exist.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>>;

    /// Deletes idempotency records that expired at or before `now`.
    ///
    /// Returns the number of records removed.
    async fn purge_expired_idempotency(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// An atomic, isolated group of reads and writes.
///
/// Nothing becomes visible to other units of work until [`UnitOfWork::commit`]
/// succeeds. Dropping the value without committing discards every write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads a product and holds an exclusive lock on its row until the unit
    /// of work ends.
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Adds `delta` to a product's stock and returns the new stock.
    ///
    /// Fails with `StockUnderflow` if the result would be negative.
    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<i64>;

    /// Inserts an order with status CREATED and its items.
    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderWithItems>;

    /// Reads an order with its items and holds an exclusive lock on the order
    /// row until the unit of work ends.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<OrderWithItems>>;

    /// Sets an order's status.
    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()>;

    /// Finds a live idempotency record for `(key, target_type)`.
    async fn find_idempotency(
        &mut self,
        key: &str,
        target_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>>;

    /// Stores an idempotency record unless a live one already exists for the
    /// same `(key, target_type)`; an expired one is replaced.
    ///
    /// Returns the record that is stored afterwards, which is the existing
    /// one when a live record won.
    async fn save_idempotency(&mut self, record: IdempotencyRecord) -> Result<IdempotencyRecord>;

    /// Makes every write of this unit of work durable and visible.
    async fn commit(self) -> Result<()>;
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    CustomerId, IdempotencyRecord, NewOrder, NewProduct, OrderId, OrderItemRecord, OrderQuery,
    OrderRecord, OrderStatus, OrderWithItems, Product, ProductId, ProductPatch, ProductQuery,
    Result, StoreError,
    store::{OrderStore, UnitOfWork},
};

const STOCK_CONSTRAINT: &str = "products_stock_non_negative";

const PRODUCT_COLUMNS: &str = "id, sku, name, price_cents, stock";
const ORDER_COLUMNS: &str = "id, customer_id, status, total_cents, created_at";
const ITEM_COLUMNS: &str = "order_id, product_id, qty, unit_price_cents, subtotal_cents";
const IDEMPOTENCY_COLUMNS: &str =
    "key, target_type, target_id, status, response_body, created_at, expires_at";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("order store migrations applied");
        Ok(())
    }
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        price_cents: row.try_get("price_cents")?,
        stock: row.try_get("stock")?,
    })
}

fn row_to_order(row: PgRow) -> Result<OrderRecord> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;

    Ok(OrderRecord {
        id: OrderId::new(row.try_get("id")?),
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        status,
        total_cents: row.try_get("total_cents")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn row_to_item(row: PgRow) -> Result<OrderItemRecord> {
    Ok(OrderItemRecord {
        order_id: OrderId::new(row.try_get("order_id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        qty: row.try_get("qty")?,
        unit_price_cents: row.try_get("unit_price_cents")?,
        subtotal_cents: row.try_get("subtotal_cents")?,
    })
}

fn row_to_idempotency(row: PgRow) -> Result<IdempotencyRecord> {
    Ok(IdempotencyRecord {
        key: row.try_get("key")?,
        target_type: row.try_get("target_type")?,
        target_id: row.try_get("target_id")?,
        status: row.try_get("status")?,
        response_body: row.try_get("response_body")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn map_stock_error(product_id: ProductId, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.constraint() == Some(STOCK_CONSTRAINT)
    {
        return StoreError::StockUnderflow { product_id };
    }
    StoreError::Database(e)
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    type Tx = PostgresUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnitOfWork { tx })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderWithItems>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = row_to_order(row)?;

        let items = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(row_to_item)
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(OrderWithItems { order, items }))
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        ))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_product).transpose()
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let pattern = query.search.as_deref().map(common::like_contains);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::TEXT IS NULL OR name ILIKE $1 ESCAPE '\' OR sku ILIKE $1 ESCAPE '\')
              AND id > $2
            ORDER BY id ASC
            LIMIT $3
            "#
        ))
        .bind(pattern)
        .bind(query.cursor.map(|c| c.as_i64()).unwrap_or(0))
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_product).collect()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (sku, name, price_cents, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::DuplicateSku(product.sku.clone());
            }
            StoreError::Database(e)
        })?;

        row_to_product(row)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET price_cents = COALESCE($2, price_cents),
                stock = COALESCE($3, stock)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(patch.price_cents)
        .bind(patch.stock)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_stock_error(id, e))?;

        row.map(row_to_product).transpose()
    }

    async fn purge_expired_idempotency(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM idempotency_keys WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Unit of work backed by a PostgreSQL transaction.
///
/// Row locks are taken with `SELECT … FOR UPDATE` and released when the
/// transaction commits or rolls back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_product).transpose()
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<i64> {
        let stock: Option<i64> =
            sqlx::query_scalar("UPDATE products SET stock = stock + $2 WHERE id = $1 RETURNING stock")
                .bind(id.as_i64())
                .bind(delta)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| map_stock_error(id, e))?;

        stock.ok_or(StoreError::ProductNotFound(id))
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderWithItems> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (customer_id, status, total_cents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.customer_id.as_i64())
        .bind(OrderStatus::Created.as_str())
        .bind(order.total_cents)
        .bind(order.created_at)
        .fetch_one(&mut *self.tx)
        .await?;
        let record = row_to_order(row)?;

        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO order_items (order_id, product_id, qty, unit_price_cents, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {ITEM_COLUMNS}
                "#
            ))
            .bind(record.id.as_i64())
            .bind(item.product_id.as_i64())
            .bind(item.qty)
            .bind(item.unit_price_cents)
            .bind(item.subtotal_cents)
            .fetch_one(&mut *self.tx)
            .await?;
            items.push(row_to_item(row)?);
        }

        Ok(OrderWithItems {
            order: record,
            items,
        })
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<OrderWithItems>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = row_to_order(row)?;

        let items = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(row_to_item)
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(OrderWithItems { order, items }))
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id.as_i64())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn find_idempotency(
        &mut self,
        key: &str,
        target_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {IDEMPOTENCY_COLUMNS}
            FROM idempotency_keys
            WHERE key = $1 AND target_type = $2 AND expires_at > $3
            "#
        ))
        .bind(key)
        .bind(target_type)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_idempotency).transpose()
    }

    async fn save_idempotency(&mut self, record: IdempotencyRecord) -> Result<IdempotencyRecord> {
        // A live record is left untouched; an expired one is overwritten.
        sqlx::query(
            r#"
            INSERT INTO idempotency_keys
                (key, target_type, target_id, status, response_body, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (key, target_type) DO UPDATE SET
                target_id = EXCLUDED.target_id,
                status = EXCLUDED.status,
                response_body = EXCLUDED.response_body,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            WHERE idempotency_keys.expires_at <= EXCLUDED.created_at
            "#,
        )
        .bind(&record.key)
        .bind(&record.target_type)
        .bind(record.target_id)
        .bind(&record.status)
        .bind(&record.response_body)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {IDEMPOTENCY_COLUMNS} FROM idempotency_keys WHERE key = $1 AND target_type = $2"
        ))
        .bind(&record.key)
        .bind(&record.target_type)
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_idempotency(row)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}


use async_trait::async_trait;
use common::CustomerId;
use domain::{Customer, CustomerDirectory, CustomerDirectoryError};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::{CustomerError, Result};
use crate::model::{CustomerQuery, NewCustomer};
use crate::store::CustomerStore;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, created_at";

/// PostgreSQL-backed customer store.
#[derive(Clone)]
pub struct PostgresCustomerStore {
    pool: PgPool,
}

impl PostgresCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the shared workspace migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("customer store migrations applied");
        Ok(())
    }
}

fn row_to_customer(row: PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CustomerStore for PostgresCustomerStore {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO customers (name, email, phone)
            VALUES ($1, $2, $3)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return CustomerError::DuplicateEmail(customer.email.clone());
            }
            CustomerError::Database(e)
        })?;

        row_to_customer(row)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_customer).transpose()
    }

    async fn list_customers(&self, query: CustomerQuery) -> Result<Vec<Customer>> {
        let pattern = query.search.as_deref().map(common::like_contains);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE ($1::TEXT IS NULL OR name ILIKE $1 ESCAPE '\' OR email ILIKE $1 ESCAPE '\')
            ORDER BY id ASC
            LIMIT $2
            "#
        ))
        .bind(pattern)
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_customer).collect()
    }
}

#[async_trait]
impl CustomerDirectory for PostgresCustomerStore {
    async fn find_customer(
        &self,
        id: CustomerId,
    ) -> std::result::Result<Option<Customer>, CustomerDirectoryError> {
        self.get_customer(id)
            .await
            .map_err(|e| CustomerDirectoryError::Transport(e.to_string()))
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::CustomerId;
use domain::{Customer, CustomerDirectory, CustomerDirectoryError};
use tokio::sync::RwLock;

use crate::error::{CustomerError, Result};
use crate::model::{CustomerQuery, NewCustomer};
use crate::store::CustomerStore;

#[derive(Debug, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    last_id: i64,
}

/// In-memory customer store for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn customer_count(&self) -> usize {
        self.tables.read().await.customers.len()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let mut tables = self.tables.write().await;
        if tables
            .customers
            .values()
            .any(|c| c.email.eq_ignore_ascii_case(&customer.email))
        {
            return Err(CustomerError::DuplicateEmail(customer.email));
        }

        tables.last_id += 1;
        let stored = Customer {
            id: CustomerId::new(tables.last_id),
            name: customer.name,
            email: customer.email,
            phone: Some(customer.phone),
            created_at: Some(Utc::now()),
        };
        tables.customers.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn list_customers(&self, query: CustomerQuery) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .filter(|c| query.matches(&c.name, &c.email))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerStore {
    async fn find_customer(
        &self,
        id: CustomerId,
    ) -> std::result::Result<Option<Customer>, CustomerDirectoryError> {
        self.get_customer(id)
            .await
            .map_err(|e| CustomerDirectoryError::Transport(e.to_string()))
    }
}

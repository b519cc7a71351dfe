//! Customer lookup port.
//!
//! Customers are owned by a separate service. The lifecycle engine only needs
//! to know whether a customer exists; [`CustomerDirectory`] is that seam.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// A customer as returned by the customers service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Failures talking to the customer directory.
#[derive(Debug, Error)]
pub enum CustomerDirectoryError {
    /// The lookup did not finish within its time budget.
    #[error("Customer lookup timed out")]
    Timeout,

    /// The directory answered with an unexpected HTTP status.
    #[error("Customer lookup failed with status {0}")]
    Status(u16),

    /// The directory could not be reached.
    #[error("Customer lookup failed: {0}")]
    Transport(String),

    /// The directory answered with a body that is not a customer.
    #[error("Invalid customer payload: {0}")]
    InvalidPayload(String),
}

/// Resolves customers by id.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Looks a customer up. `Ok(None)` means the customer does not exist.
    async fn find_customer(
        &self,
        id: CustomerId,
    ) -> Result<Option<Customer>, CustomerDirectoryError>;
}

#[async_trait]
impl<T: CustomerDirectory + ?Sized> CustomerDirectory for Arc<T> {
    async fn find_customer(
        &self,
        id: CustomerId,
    ) -> Result<Option<Customer>, CustomerDirectoryError> {
        (**self).find_customer(id).await
    }
}

/// In-memory customer directory for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer with the given id and name.
    pub async fn add(&self, id: CustomerId, name: impl Into<String>) -> Customer {
        let name = name.into();
        let customer = Customer {
            id,
            email: format!("customer{}@example.com", id),
            name,
            phone: None,
            created_at: None,
        };
        self.insert(customer.clone()).await;
        customer
    }

    /// Registers a fully specified customer.
    pub async fn insert(&self, customer: Customer) {
        self.customers.write().await.insert(customer.id, customer);
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn find_customer(
        &self,
        id: CustomerId,
    ) -> Result<Option<Customer>, CustomerDirectoryError> {
        Ok(self.customers.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_registered_customers_only() {
        let directory = InMemoryCustomerDirectory::new();
        directory.add(CustomerId::new(1), "Ada").await;

        let found = directory.find_customer(CustomerId::new(1)).await.unwrap();
        assert_eq!(found.map(|c| c.name), Some("Ada".to_string()));
        assert!(
            directory
                .find_customer(CustomerId::new(2))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn customer_payload_tolerates_missing_optional_fields() {
        let customer: Customer =
            serde_json::from_str(r#"{"id":3,"name":"Lin","email":"lin@example.com"}"#).unwrap();
        assert_eq!(customer.id, CustomerId::new(3));
        assert!(customer.phone.is_none());
    }
}

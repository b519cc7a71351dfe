use std::sync::Arc;

use async_trait::async_trait;
use common::CustomerId;
use domain::Customer;

use crate::error::Result;
use crate::model::{CustomerQuery, NewCustomer};

/// Storage for registered customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Registers a customer and assigns its id.
    ///
    /// Fails with `DuplicateEmail` if the email is taken in any letter case.
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer>;

    /// Loads a customer.
    ///
    /// Returns None if the customer doesn't exist.
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Lists customers ascending by id.
    async fn list_customers(&self, query: CustomerQuery) -> Result<Vec<Customer>>;
}

#[async_trait]
impl<T: CustomerStore + ?Sized> CustomerStore for Arc<T> {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        (**self).insert_customer(customer).await
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        (**self).get_customer(id).await
    }

    async fn list_customers(&self, query: CustomerQuery) -> Result<Vec<Customer>> {
        (**self).list_customers(query).await
    }
}

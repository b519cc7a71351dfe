//! Order gateway trait and its implementations.

use std::sync::Arc;

use async_trait::async_trait;
use clients::{ClientError, HttpOrdersClient};
use common::{CustomerId, OrderId};
use domain::{
    CancellationResponse, Clock, ConfirmationResponse, CustomerDirectory, DomainError, OrderLine,
    OrderService, OrderView,
};
use order_store::OrderStore;
use thiserror::Error;

/// Failure reported by an [`OrderGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The orders API call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The in-process order service refused or failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// The orders service as seen by the orchestrator.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Creates an order in CREATED status.
    async fn create_order(
        &self,
        customer_id: CustomerId,
        items: &[OrderLine],
    ) -> Result<OrderView, GatewayError>;

    /// Confirms an order under an idempotency key.
    async fn confirm_order(
        &self,
        order_id: OrderId,
        idempotency_key: &str,
    ) -> Result<ConfirmationResponse, GatewayError>;

    /// Cancels an order. Only used for compensation.
    async fn cancel_order(&self, order_id: OrderId) -> Result<CancellationResponse, GatewayError>;
}

#[async_trait]
impl OrderGateway for HttpOrdersClient {
    async fn create_order(
        &self,
        customer_id: CustomerId,
        items: &[OrderLine],
    ) -> Result<OrderView, GatewayError> {
        Ok(HttpOrdersClient::create_order(self, customer_id, items).await?)
    }

    async fn confirm_order(
        &self,
        order_id: OrderId,
        idempotency_key: &str,
    ) -> Result<ConfirmationResponse, GatewayError> {
        Ok(HttpOrdersClient::confirm_order(self, order_id, idempotency_key).await?)
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancellationResponse, GatewayError> {
        Ok(HttpOrdersClient::cancel_order(self, order_id).await?)
    }
}

/// Gateway that calls an [`OrderService`] in the same process.
pub struct LocalOrderGateway<S, C, K> {
    service: Arc<OrderService<S, C, K>>,
}

impl<S, C, K> LocalOrderGateway<S, C, K> {
    pub fn new(service: Arc<OrderService<S, C, K>>) -> Self {
        Self { service }
    }
}

impl<S, C, K> Clone for LocalOrderGateway<S, C, K> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

#[async_trait]
impl<S, C, K> OrderGateway for LocalOrderGateway<S, C, K>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    async fn create_order(
        &self,
        customer_id: CustomerId,
        items: &[OrderLine],
    ) -> Result<OrderView, GatewayError> {
        Ok(self.service.create_order(customer_id, items.to_vec()).await?)
    }

    async fn confirm_order(
        &self,
        order_id: OrderId,
        idempotency_key: &str,
    ) -> Result<ConfirmationResponse, GatewayError> {
        let confirmation = self
            .service
            .confirm_order(order_id, idempotency_key)
            .await?;
        Ok(confirmation.response().map_err(DomainError::from)?)
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancellationResponse, GatewayError> {
        Ok(self.service.cancel_order(order_id).await?)
    }
}

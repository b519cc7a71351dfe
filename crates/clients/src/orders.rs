//! Reqwest-backed orders API client.

use common::{CustomerId, OrderId};
use domain::{CancellationResponse, ConfirmationResponse, OrderLine, OrderView};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ClientError, map_status_error, map_transport_error};

/// Header carrying the confirmation idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    customer_id: CustomerId,
    items: &'a [OrderLine],
}

/// Client for the orders API.
#[derive(Debug, Clone)]
pub struct HttpOrdersClient {
    client: Client,
    config: ClientConfig,
}

impl HttpOrdersClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { client, config })
    }

    /// `POST /orders`
    #[tracing::instrument(skip(self, items), fields(customer_id = %customer_id))]
    pub async fn create_order(
        &self,
        customer_id: CustomerId,
        items: &[OrderLine],
    ) -> Result<OrderView, ClientError> {
        let request = self
            .client
            .post(self.config.url("orders"))
            .json(&CreateOrderBody { customer_id, items });
        self.send(request).await
    }

    /// `POST /orders/{id}/confirm` with the idempotency key header.
    #[tracing::instrument(skip(self, idempotency_key), fields(order_id = %order_id))]
    pub async fn confirm_order(
        &self,
        order_id: OrderId,
        idempotency_key: &str,
    ) -> Result<ConfirmationResponse, ClientError> {
        let request = self
            .client
            .post(self.config.url(&format!("orders/{order_id}/confirm")))
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key);
        self.send(request).await
    }

    /// `POST /orders/{id}/cancel`
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<CancellationResponse, ClientError> {
        let request = self
            .client
            .post(self.config.url(&format!("orders/{order_id}/cancel")));
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, mut request: RequestBuilder) -> Result<T, ClientError> {
        if let Some(token) = &self.config.service_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::Decode(format!("invalid orders API payload: {e}")))
    }
}

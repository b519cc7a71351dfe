//! Reqwest-backed customer directory.

use async_trait::async_trait;
use common::CustomerId;
use domain::{Customer, CustomerDirectory, CustomerDirectoryError};
use reqwest::{Client, StatusCode};

use crate::config::ClientConfig;
use crate::error::{ClientError, map_status_error, map_transport_error};

/// Looks customers up through the customers service's internal endpoint.
#[derive(Debug, Clone)]
pub struct HttpCustomerDirectory {
    client: Client,
    config: ClientConfig,
}

impl HttpCustomerDirectory {
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

    /// Fetches a customer. A 404 answer means the customer does not exist.
    #[tracing::instrument(skip(self), fields(customer_id = %id))]
    pub async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>, ClientError> {
        let mut request = self
            .client
            .get(self.config.url(&format!("internal/customers/{id}")))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.config.service_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }

        let customer = serde_json::from_slice(&body)
            .map_err(|e| ClientError::Decode(format!("invalid customer payload: {e}")))?;
        Ok(Some(customer))
    }
}

#[async_trait]
impl CustomerDirectory for HttpCustomerDirectory {
    async fn find_customer(
        &self,
        id: CustomerId,
    ) -> Result<Option<Customer>, CustomerDirectoryError> {
        self.fetch_customer(id).await.map_err(|e| match e {
            ClientError::Timeout(_) => CustomerDirectoryError::Timeout,
            ClientError::Status { status, .. } => CustomerDirectoryError::Status(status),
            ClientError::Decode(msg) => CustomerDirectoryError::InvalidPayload(msg),
            other => CustomerDirectoryError::Transport(other.to_string()),
        })
    }
}

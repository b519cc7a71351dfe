//! Orchestrator sequencing customer validation, order creation and
//! confirmation across independently owned services.

use std::time::Instant;

use common::{CustomerId, OrderId};
use domain::{ConfirmationResponse, Customer, CustomerDirectory, OrderLine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrchestrationFailure, OrchestratorError};
use crate::gateway::OrderGateway;

/// What to do when confirmation fails after the order was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompensationPolicy {
    /// Leave the order in CREATED status.
    #[default]
    None,
    /// Cancel the created order once, returning its stock.
    CancelOrder,
}

/// Input to [`OrderOrchestrator::orchestrate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    pub customer_id: CustomerId,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub idempotency_key: String,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// Customer and confirmed order returned by a successful orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationData {
    pub customer: Customer,
    pub order: ConfirmationResponse,
}

/// A successful orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub correlation_id: String,
    pub data: OrchestrationData,
}

/// Runs customer validation → order creation → confirmation.
///
/// Calls are strictly sequential and never retried. The first failure stops
/// the sequence.
pub struct OrderOrchestrator<C, G> {
    customers: C,
    orders: G,
    compensation: CompensationPolicy,
}

impl<C: CustomerDirectory, G: OrderGateway> OrderOrchestrator<C, G> {
    pub fn new(customers: C, orders: G) -> Self {
        Self {
            customers,
            orders,
            compensation: CompensationPolicy::None,
        }
    }

    pub fn with_compensation(mut self, compensation: CompensationPolicy) -> Self {
        self.compensation = compensation;
        self
    }

    #[tracing::instrument(
        skip(self, request),
        fields(customer_id = %request.customer_id, correlation_id = tracing::field::Empty)
    )]
    pub async fn orchestrate(
        &self,
        request: OrchestrationRequest,
    ) -> Result<OrchestrationResult, OrchestrationFailure> {
        let correlation_id = request
            .correlation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("correlation_id", correlation_id.as_str());

        let started = Instant::now();
        let outcome = self.run(&request).await;
        metrics::histogram!("orchestration_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(data) => {
                metrics::counter!("orchestrations_total", "outcome" => "success").increment(1);
                tracing::info!(order_id = %data.order.id, "orchestration completed");
                Ok(OrchestrationResult {
                    correlation_id,
                    data,
                })
            }
            Err(error) => {
                metrics::counter!("orchestrations_total", "outcome" => error.step()).increment(1);
                tracing::warn!(step = error.step(), error = %error, "orchestration failed");
                Err(OrchestrationFailure {
                    correlation_id,
                    error,
                })
            }
        }
    }

    async fn run(
        &self,
        request: &OrchestrationRequest,
    ) -> Result<OrchestrationData, OrchestratorError> {
        let key = request.idempotency_key.trim();
        if key.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "idempotency_key is required".into(),
            ));
        }
        if request.items.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "items must not be empty".into(),
            ));
        }

        // 1. Validate the customer
        let customer = self
            .customers
            .find_customer(request.customer_id)
            .await
            .map_err(OrchestratorError::CustomerLookup)?
            .ok_or(OrchestratorError::CustomerNotFound(request.customer_id))?;

        // 2. Create the order
        let order = self
            .orders
            .create_order(request.customer_id, &request.items)
            .await
            .map_err(OrchestratorError::CreateOrder)?;
        tracing::info!(order_id = %order.id, "order created");

        // 3. Confirm it
        match self.orders.confirm_order(order.id, key).await {
            Ok(confirmed) => Ok(OrchestrationData {
                customer,
                order: confirmed,
            }),
            Err(source) => {
                if self.compensation == CompensationPolicy::CancelOrder {
                    self.compensate(order.id).await;
                }
                Err(OrchestratorError::ConfirmOrder {
                    order_id: order.id,
                    source,
                })
            }
        }
    }

    async fn compensate(&self, order_id: OrderId) {
        match self.orders.cancel_order(order_id).await {
            Ok(_) => tracing::info!(%order_id, "compensation: order canceled"),
            Err(e) => tracing::error!(%order_id, error = %e, "compensation failed"),
        }
    }
}

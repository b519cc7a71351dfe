//! Orchestrator error types.

use common::{CustomerId, OrderId};
use domain::CustomerDirectoryError;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during an orchestration.
///
/// Each variant names the step that failed; nothing after it was attempted.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request is missing required fields.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The customers service does not know the customer.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// The customers service could not be queried.
    #[error("Customer validation failed: {0}")]
    CustomerLookup(#[source] CustomerDirectoryError),

    /// The orders service refused or failed to create the order.
    #[error("Order creation failed: {0}")]
    CreateOrder(#[source] GatewayError),

    /// The order was created but could not be confirmed.
    #[error("Order {order_id} confirmation failed: {source}")]
    ConfirmOrder {
        order_id: OrderId,
        #[source]
        source: GatewayError,
    },
}

impl OrchestratorError {
    /// Name of the step that failed, used as a metric label.
    pub fn step(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::CustomerNotFound(_) | Self::CustomerLookup(_) => "customer_validation",
            Self::CreateOrder(_) => "create_order",
            Self::ConfirmOrder { .. } => "confirm_order",
        }
    }
}

/// A failed orchestration, annotated with its correlation id.
#[derive(Debug, Error)]
#[error("[{correlation_id}] {error}")]
pub struct OrchestrationFailure {
    pub correlation_id: String,
    #[source]
    pub error: OrchestratorError,
}

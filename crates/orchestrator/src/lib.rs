//! Cross-service orchestrator for order placement.
//!
//! The orchestrator validates the customer with the customers service, creates
//! the order and confirms it with an idempotency key. There is no shared
//! transaction: a failure after creation leaves the order in CREATED status
//! unless compensation is enabled.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod orchestrator;
pub mod server;

pub use config::OrchestratorConfig;
pub use error::{OrchestrationFailure, OrchestratorError};
pub use gateway::{GatewayError, LocalOrderGateway, OrderGateway};
pub use handler::{HandlerResponse, handle};
pub use orchestrator::{
    CompensationPolicy, OrchestrationData, OrchestrationRequest, OrchestrationResult,
    OrderOrchestrator,
};
pub use server::create_app;

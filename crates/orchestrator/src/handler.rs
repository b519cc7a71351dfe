//! Event-style entry point: raw JSON in, status code and JSON body out.

use domain::CustomerDirectory;
use serde_json::{Value, json};

use crate::gateway::OrderGateway;
use crate::orchestrator::{OrchestrationRequest, OrderOrchestrator};

/// Status code and body produced by [`handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: Value,
}

/// Parses `event_body` (a JSON object, or a string holding one), runs the
/// orchestration and shapes the outcome.
///
/// Success is `201 {success: true, correlationId, data}`; any failure is
/// `500 {success: false, correlationId, error}`.
pub async fn handle<C, G>(
    orchestrator: &OrderOrchestrator<C, G>,
    event_body: Value,
) -> HandlerResponse
where
    C: CustomerDirectory,
    G: OrderGateway,
{
    let request = match parse_request(event_body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed orchestration request");
            return failure(Value::Null, format!("Invalid request body: {e}"));
        }
    };

    match orchestrator.orchestrate(request).await {
        Ok(result) => HandlerResponse {
            status_code: 201,
            body: json!({
                "success": true,
                "correlationId": result.correlation_id,
                "data": result.data,
            }),
        },
        Err(failure_info) => {
            tracing::error!(error = %failure_info, "error in orchestrator");
            failure(
                Value::String(failure_info.correlation_id),
                failure_info.error.to_string(),
            )
        }
    }
}

fn parse_request(event_body: Value) -> serde_json::Result<OrchestrationRequest> {
    match event_body {
        Value::String(raw) => serde_json::from_str(&raw),
        other => serde_json::from_value(other),
    }
}

fn failure(correlation_id: Value, error: String) -> HandlerResponse {
    HandlerResponse {
        status_code: 500,
        body: json!({
            "success": false,
            "correlationId": correlation_id,
            "error": error,
        }),
    }
}

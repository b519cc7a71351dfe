//! HTTP entry point for the orchestrator.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use domain::CustomerDirectory;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::gateway::OrderGateway;
use crate::handler;
use crate::orchestrator::OrderOrchestrator;

/// Creates the router serving `POST /orchestrate`, `/health` and `/metrics`.
pub fn create_app<C, G>(
    orchestrator: Arc<OrderOrchestrator<C, G>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    C: CustomerDirectory + 'static,
    G: OrderGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/orchestrate", post(orchestrate::<C, G>))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .with_state(orchestrator)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}

/// POST /orchestrate
async fn orchestrate<C, G>(
    State(orchestrator): State<Arc<OrderOrchestrator<C, G>>>,
    body: Bytes,
) -> impl IntoResponse
where
    C: CustomerDirectory + 'static,
    G: OrderGateway + 'static,
{
    // Non-JSON bodies are handed over as a string and rejected by the parser.
    let event_body = serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));

    let response = handler::handle(&orchestrator, event_body).await;
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}

//! Orders HTTP API.
//!
//! Serves the order lifecycle (create, confirm, cancel) and the product
//! catalog over an `OrderStore`, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use domain::{Clock, CustomerDirectory};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// With a `service_token`, order and product routes require
/// `Authorization: Bearer <token>`; `/health` and `/metrics` stay open.
pub fn create_app<S, C, K>(
    state: Arc<AppState<S, C, K>>,
    metrics_handle: PrometheusHandle,
    service_token: Option<String>,
) -> Router
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    use routes::{orders, products, system};

    let mut business = Router::new()
        .route(
            "/orders",
            post(orders::create::<S, C, K>).get(orders::list::<S, C, K>),
        )
        .route("/orders/{id}", get(orders::get::<S, C, K>))
        .route("/orders/{id}/confirm", post(orders::confirm::<S, C, K>))
        .route("/orders/{id}/cancel", post(orders::cancel::<S, C, K>))
        .route(
            "/products",
            post(products::create::<S, C, K>).get(products::list::<S, C, K>),
        )
        .route(
            "/products/{id}",
            get(products::get::<S, C, K>).patch(products::update::<S, C, K>),
        );

    if let Some(token) = service_token {
        business = business.route_layer(middleware::from_fn_with_state(
            Arc::<str>::from(token),
            auth::require_service_token,
        ));
    }

    let metrics_router = Router::new()
        .route("/metrics", get(system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(system::health))
        .merge(business.with_state(state))
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

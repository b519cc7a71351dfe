//! Customers HTTP service.
//!
//! Registers and searches customers, and answers the internal lookup the
//! orders API uses to check that a customer exists.

pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod routes;
pub mod store;

use std::sync::Arc;

use api::auth;
use api::routes::system;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{CustomerError, Result};
pub use memory::InMemoryCustomerStore;
pub use model::{CustomerQuery, DEFAULT_LIMIT, MAX_LIMIT, NewCustomer};
pub use postgres::PostgresCustomerStore;
pub use store::CustomerStore;

/// Creates the customers router.
///
/// With a `service_token`, `/internal/customers/{id}` requires
/// `Authorization: Bearer <token>`. Public routes stay open.
pub fn create_app<S>(
    store: Arc<S>,
    metrics_handle: PrometheusHandle,
    service_token: Option<String>,
) -> Router
where
    S: CustomerStore + 'static,
{
    let public = Router::new()
        .route("/customers", get(routes::list::<S>).post(routes::create::<S>))
        .route("/customers/{id}", get(routes::get::<S>));

    let mut internal = Router::new().route("/internal/customers/{id}", get(routes::get::<S>));
    if let Some(token) = service_token {
        internal = internal.route_layer(middleware::from_fn_with_state(
            Arc::<str>::from(token),
            auth::require_service_token,
        ));
    }

    let metrics_router = Router::new()
        .route("/metrics", get(system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(system::health))
        .merge(public.merge(internal).with_state(store))
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use domain::{
    CancellationResponse, Clock, CustomerDirectory, CustomerId, OrderId, OrderLine, OrderStatus,
    OrderSummary, OrderView,
};
use order_store::{OrderQuery, OrderStore};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

/// Header carrying the client-chosen confirmation key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub items: Vec<OrderLine>,
}

#[derive(Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

// -- Handlers --

/// POST /orders: reserve stock and create an order in CREATED status.
#[tracing::instrument(skip_all)]
pub async fn create<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderView>), ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Json(req) = body?;
    let order = state.orders.create_order(req.customer_id, req.items).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}: load an order with its items.
#[tracing::instrument(skip_all)]
pub async fn get<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderView>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Path(id) = path?;
    let order_id = OrderId::new(id);
    let order = state
        .orders
        .get_order(order_id)
        .await?
        .ok_or(domain::DomainError::OrderNotFound(order_id))?;
    Ok(Json(order))
}

/// GET /orders?status=&limit=: newest orders first.
#[tracing::instrument(skip_all)]
pub async fn list<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<Vec<OrderSummary>>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Query(params) = params?;
    let mut query = OrderQuery::new();
    if let Some(status) = params.status.as_deref().filter(|s| !s.trim().is_empty()) {
        let status: OrderStatus = status
            .parse()
            .map_err(|e: common::UnknownStatus| ApiError::BadRequest(e.to_string()))?;
        query = query.status(status);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }

    Ok(Json(state.orders.list_orders(query).await?))
}

/// POST /orders/{id}/confirm: confirm once per `X-Idempotency-Key`.
///
/// The body is the stored confirmation, byte-identical on every replay.
#[tracing::instrument(skip_all)]
pub async fn confirm<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Path(id) = path?;
    let key = match headers.get(IDEMPOTENCY_KEY_HEADER) {
        Some(value) => value.to_str().map_err(|_| {
            ApiError::BadRequest("X-Idempotency-Key must be visible ASCII".to_string())
        })?,
        None => "",
    };

    let confirmation = state.orders.confirm_order(OrderId::new(id), key).await?;
    if confirmation.replayed {
        tracing::debug!(order_id = id, "served stored confirmation");
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        confirmation.body,
    ))
}

/// POST /orders/{id}/cancel: cancel and give the stock back.
#[tracing::instrument(skip_all)]
pub async fn cancel<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CancellationResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Path(id) = path?;
    Ok(Json(state.orders.cancel_order(OrderId::new(id)).await?))
}

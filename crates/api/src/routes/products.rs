//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{Clock, CustomerDirectory, DomainError, ProductId, ProductPage, ProductView};
use order_store::{NewProduct, OrderStore, ProductPatch, ProductQuery};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
}

#[derive(Deserialize)]
pub struct ListProductsParams {
    pub search: Option<String>,
    pub cursor: Option<i64>,
    pub limit: Option<usize>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

// -- Handlers --

/// POST /products
#[tracing::instrument(skip_all)]
pub async fn create<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductView>), ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Json(req) = body?;
    let product = NewProduct {
        sku: required(req.sku, "sku")?,
        name: required(req.name, "name")?,
        price_cents: required(req.price_cents, "price_cents")?,
        stock: required(req.stock, "stock")?,
    };

    let created = state.catalog.create_product(product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /products/{id}: change price and/or restock.
#[tracing::instrument(skip_all)]
pub async fn update<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductView>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Path(id) = path?;
    let Json(req) = body?;
    let patch = ProductPatch {
        price_cents: req.price_cents,
        stock: req.stock,
    };

    let updated = state
        .catalog
        .update_product(ProductId::new(id), patch)
        .await?;
    Ok(Json(updated))
}

/// GET /products/{id}
#[tracing::instrument(skip_all)]
pub async fn get<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProductView>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Path(id) = path?;
    let product_id = ProductId::new(id);
    let product = state
        .catalog
        .get_product(product_id)
        .await?
        .ok_or(DomainError::ProductNotFound(product_id))?;
    Ok(Json(product))
}

/// GET /products?search=&cursor=&limit=
#[tracing::instrument(skip_all)]
pub async fn list<S, C, K>(
    State(state): State<Arc<AppState<S, C, K>>>,
    params: Result<Query<ListProductsParams>, QueryRejection>,
) -> Result<Json<ProductPage>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerDirectory + 'static,
    K: Clock + 'static,
{
    let Query(params) = params?;
    let mut query = ProductQuery::new();
    if let Some(search) = params.search {
        query = query.search(search);
    }
    if let Some(cursor) = params.cursor {
        query = query.after(ProductId::new(cursor));
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }

    Ok(Json(state.catalog.list_products(query).await?))
}

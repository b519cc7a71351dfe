//! Customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::CustomerId;
use domain::Customer;
use serde::Deserialize;
use validator::Validate;

use crate::error::{CustomerError, Result};
use crate::model::{CustomerQuery, NewCustomer};
use crate::store::CustomerStore;

#[derive(Deserialize)]
pub struct ListCustomersParams {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// POST /customers
#[tracing::instrument(skip_all)]
pub async fn create<S>(
    State(store): State<Arc<S>>,
    body: std::result::Result<Json<NewCustomer>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>)>
where
    S: CustomerStore + 'static,
{
    let Json(customer) = body?;
    customer.validate()?;

    let created = store.insert_customer(customer).await?;
    metrics::counter!("customers_created_total").increment(1);
    tracing::info!(customer_id = %created.id, "customer registered");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /customers?search=&limit=
#[tracing::instrument(skip_all)]
pub async fn list<S>(
    State(store): State<Arc<S>>,
    params: std::result::Result<Query<ListCustomersParams>, QueryRejection>,
) -> Result<Json<Vec<Customer>>>
where
    S: CustomerStore + 'static,
{
    let Query(params) = params?;
    let mut query = CustomerQuery::new();
    if let Some(search) = params.search {
        query = query.search(search);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }

    Ok(Json(store.list_customers(query).await?))
}

/// GET /customers/{id} and GET /internal/customers/{id}
#[tracing::instrument(skip_all)]
pub async fn get<S>(
    State(store): State<Arc<S>>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Customer>>
where
    S: CustomerStore + 'static,
{
    let Path(id) = path?;
    let id = CustomerId::new(id);
    let customer = store
        .get_customer(id)
        .await?
        .ok_or(CustomerError::NotFound(id))?;
    Ok(Json(customer))
}

//! Customer service errors and their HTTP mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::CustomerId;
use thiserror::Error;

/// Errors raised by customer stores and handlers.
#[derive(Debug, Error)]
pub enum CustomerError {
    /// The request is malformed or fails field validation.
    #[error("{0}")]
    Invalid(String),

    /// Another customer already uses this email, compared case-insensitively.
    #[error("Email already exists")]
    DuplicateEmail(String),

    #[error("Customer not found")]
    NotFound(CustomerId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CustomerError {
    fn status(&self) -> StatusCode {
        match self {
            CustomerError::Invalid(_) => StatusCode::BAD_REQUEST,
            CustomerError::DuplicateEmail(_) => StatusCode::CONFLICT,
            CustomerError::NotFound(_) => StatusCode::NOT_FOUND,
            CustomerError::Database(_) | CustomerError::Migration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for CustomerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "customer request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for CustomerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        CustomerError::Invalid(messages.join("; "))
    }
}

impl From<JsonRejection> for CustomerError {
    fn from(rejection: JsonRejection) -> Self {
        CustomerError::Invalid(rejection.body_text())
    }
}

impl From<PathRejection> for CustomerError {
    fn from(rejection: PathRejection) -> Self {
        CustomerError::Invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for CustomerError {
    fn from(rejection: QueryRejection) -> Self {
        CustomerError::Invalid(rejection.body_text())
    }
}

/// Result type for customer operations.
pub type Result<T> = std::result::Result<T, CustomerError>;

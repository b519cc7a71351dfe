//! Static service-token gate for internal callers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::ApiError;

/// Rejects requests whose `Authorization: Bearer <token>` doesn't match.
pub async fn require_service_token(
    State(expected): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| tokens_match(token, &expected));

    if authorized {
        return next.run(request).await;
    }

    metrics::counter!("service_token_rejections_total").increment(1);
    tracing::warn!(
        path = %request.uri().path(),
        "rejected request without valid service token"
    );
    ApiError::Unauthorized.into_response()
}

/// Compares in constant time; a length mismatch is folded into the result.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let width = presented.len().max(expected.len());
    let mut lhs = vec![0u8; width];
    let mut rhs = vec![0xFFu8; width];
    lhs[..presented.len()].copy_from_slice(presented.as_bytes());
    rhs[..expected.len()].copy_from_slice(expected.as_bytes());

    let same_len = presented.len().ct_eq(&expected.len());
    (same_len & lhs.as_slice().ct_eq(rhs.as_slice())).into()
}

//! Lifecycle rules that don't need storage.

use chrono::{DateTime, Duration, Utc};
use common::OrderStatus;
use order_store::OrderRecord;

use super::OrderLine;
use crate::error::DomainError;

/// Longest idempotency key accepted.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Checks that an order request has at least one line and only positive
/// quantities.
pub fn validate_lines(lines: &[OrderLine]) -> Result<(), DomainError> {
    if lines.is_empty() {
        return Err(DomainError::EmptyOrder);
    }
    if let Some(line) = lines.iter().find(|line| line.qty <= 0) {
        return Err(DomainError::InvalidQuantity {
            product_id: line.product_id,
            qty: line.qty,
        });
    }
    Ok(())
}

/// Returns the trimmed key, rejecting blank or oversized keys.
pub fn validate_idempotency_key(key: &str) -> Result<&str, DomainError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(DomainError::MissingIdempotencyKey);
    }
    if key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(DomainError::IdempotencyKeyTooLong {
            max: MAX_IDEMPOTENCY_KEY_LEN,
        });
    }
    Ok(key)
}

/// Decides whether `order` may be canceled at `now`.
///
/// A confirmed order may be canceled while the time since creation is at
/// most `window`; the boundary itself is inside the window.
pub fn check_cancellable(
    order: &OrderRecord,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<(), DomainError> {
    if !order.status.can_cancel() {
        return Err(DomainError::AlreadyCanceled(order.id));
    }
    if order.status != OrderStatus::Confirmed {
        return Ok(());
    }

    let elapsed = now - order.created_at;
    if elapsed > window {
        return Err(DomainError::CancellationWindowExpired {
            order_id: order.id,
            elapsed_secs: elapsed.num_seconds(),
        });
    }
    Ok(())
}
